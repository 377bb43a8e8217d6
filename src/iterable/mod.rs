//! Reusable traversal descriptions.
//!
//! An [`Iterable`] records a store, shared read options and a chain of
//! shaping layers (reverse, range, prefix). Every call to
//! [`get_iterator`](Iterable::get_iterator) builds a fresh iterator chain
//! from that description, so an iterable can be traversed any number of
//! times and from several threads.
//!
//! Iterables derived from one another (by `range`, `prefix`, `reverse` or
//! `join`) share the read options of their origin: refreshing the snapshot
//! of one is seen by all of them. `fill_cache` and `verify_checksums` are
//! the exception and return an iterable with its own copy of the options.

use std::{fmt, sync::Arc};

use parking_lot::RwLock;

use crate::{
    db::{ReadOptions, Store},
    iterator::{DBIterator, Entries, Iterator},
    join::JoinComparator,
    marshal::Marshal,
    observability::{log_debug, log_info},
    transaction::Snapshot,
    util::{Result, Slice, Status},
};

mod merge_join;
mod typed;

pub use merge_join::MergeJoinIterable;
pub use typed::{TypedEntries, TypedIterable, TypedJoinEntries, TypedMergeJoinIterable};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Layer {
    Reverse,
    Range {
        from: Option<Slice>,
        to: Option<Slice>,
    },
    Prefix(Slice),
}

#[derive(Clone)]
pub struct Iterable {
    store: Arc<dyn Store>,
    options: Arc<RwLock<ReadOptions>>,
    layers: Vec<Layer>,
}

impl Iterable {
    /// Full ascending traversal of `store`.
    pub fn new(store: Arc<dyn Store>, options: ReadOptions) -> Self {
        Iterable {
            store,
            options: Arc::new(RwLock::new(options)),
            layers: Vec::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Read options a new iterator would be created with.
    pub fn read_options(&self) -> ReadOptions {
        self.options.read().clone()
    }

    /// Build a fresh iterator for this traversal.
    ///
    /// The cursor is opened lazily, on the iterator's first positioning
    /// call, with the read options current at this point.
    pub fn get_iterator(&self) -> Result<Box<dyn Iterator>> {
        let options = self.read_options();
        log_debug!(
            component = "iterable",
            event = "iterator_created",
            db_id = self.store.id(),
            layers = self.layers.len(),
            pinned = options.snapshot.is_some(),
        );
        self.build(options)
    }

    pub fn iter(&self) -> Result<Entries> {
        Ok(Entries::new(self.get_iterator()?))
    }

    pub fn reverse(&self) -> Self {
        let mut layers = self.layers.clone();
        if layers.last() == Some(&Layer::Reverse) {
            layers.pop();
        } else {
            layers.push(Layer::Reverse);
        }
        self.derive(layers)
    }

    /// Keys in `[from, to)` of this traversal's order.
    pub fn range(&self, from: impl Into<Slice>, to: impl Into<Slice>) -> Result<Self> {
        self.range_opt(Some(from.into()), Some(to.into()))
    }

    /// Like [`range`](Iterable::range); `None` leaves that side unbounded.
    pub fn range_opt(&self, from: Option<Slice>, to: Option<Slice>) -> Result<Self> {
        self.with_layer(Layer::Range { from, to })
    }

    pub fn prefix(&self, prefix: impl Into<Slice>) -> Result<Self> {
        self.with_layer(Layer::Prefix(prefix.into()))
    }

    /// Pin this iterable, and every iterable sharing its options, to the
    /// current state of the store. Calling it again refreshes the pin.
    pub fn snapshot(&self) -> &Self {
        let snapshot = self.store.create_snapshot();
        log_info!(
            component = "snapshot",
            event = "snapshot_refreshed",
            db_id = self.store.id(),
            sequence = snapshot.sequence(),
        );
        self.set_snapshot(snapshot);
        self
    }

    /// Pin to an existing snapshot of the same store.
    pub fn with_snapshot(&self, snapshot: Snapshot) -> Result<&Self> {
        if snapshot.db_id() != self.store.id() {
            return Err(Status::invalid_argument(format!(
                "snapshot belongs to store {}, not store {}",
                snapshot.db_id(),
                self.store.id()
            )));
        }
        self.set_snapshot(snapshot);
        Ok(self)
    }

    /// Unpin; later iterators read the latest state.
    pub fn release_snapshot(&self) -> &Self {
        if let Some(snapshot) = self.options.write().snapshot.take() {
            log_debug!(
                component = "snapshot",
                event = "snapshot_detached",
                sequence = snapshot.sequence(),
            );
        }
        self
    }

    pub fn current_snapshot(&self) -> Option<Snapshot> {
        self.options.read().snapshot.clone()
    }

    /// A copy of this iterable whose reads do or do not populate caches.
    pub fn fill_cache(&self, fill_cache: bool) -> Self {
        let mut options = self.read_options();
        options.fill_cache = fill_cache;
        self.detached(options)
    }

    /// A copy of this iterable whose reads do or do not verify checksums.
    pub fn verify_checksums(&self, verify_checksums: bool) -> Self {
        let mut options = self.read_options();
        options.verify_checksums = verify_checksums;
        self.detached(options)
    }

    /// Inner join of this traversal (left) with `other` (right).
    pub fn join(&self, other: &Iterable, comparator: JoinComparator) -> MergeJoinIterable {
        MergeJoinIterable::new(self.clone(), other.clone(), comparator)
    }

    /// Typed view of the same traversal.
    pub fn cast<K: Marshal, V: Marshal>(&self) -> TypedIterable<K, V> {
        TypedIterable::new(self.clone())
    }

    fn build(&self, options: ReadOptions) -> Result<Box<dyn Iterator>> {
        let mut iter: Box<dyn Iterator> = Box::new(DBIterator::new(self.store.clone(), options));
        for layer in &self.layers {
            iter = match layer {
                Layer::Reverse => iter.reverse(),
                Layer::Range { from, to } => iter.range(from.clone(), to.clone())?,
                Layer::Prefix(prefix) => iter.prefix(prefix.clone())?,
            };
        }
        Ok(iter)
    }

    fn derive(&self, layers: Vec<Layer>) -> Self {
        Iterable {
            store: self.store.clone(),
            options: self.options.clone(),
            layers,
        }
    }

    /// Add a bounding layer, validating the whole chain now. Building the
    /// chain does not open a cursor.
    fn with_layer(&self, layer: Layer) -> Result<Self> {
        let mut layers = self.layers.clone();
        layers.push(layer);
        let derived = self.derive(layers);
        derived.build(ReadOptions::default())?;
        Ok(derived)
    }

    fn detached(&self, options: ReadOptions) -> Self {
        Iterable {
            store: self.store.clone(),
            options: Arc::new(RwLock::new(options)),
            layers: self.layers.clone(),
        }
    }

    /// Attach `snapshot` without checking which store issued it.
    pub(crate) fn set_snapshot(&self, snapshot: Snapshot) {
        self.options.write().snapshot = Some(snapshot);
    }

    pub(crate) fn shares_options_with(&self, other: &Iterable) -> bool {
        Arc::ptr_eq(&self.options, &other.options)
    }
}

impl fmt::Debug for Iterable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iterable")
            .field("store", &self.store.id())
            .field("layers", &self.layers)
            .field("options", &*self.options.read())
            .finish()
    }
}
