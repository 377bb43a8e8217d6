use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{
    db::{Cursor, DBOptions, ReadOptions, Store, TypedDB, WriteOptions},
    import_export::{self, ExportFileInfo},
    iterable::Iterable,
    marshal::Marshal,
    memtable::{MemTable, MemTableCursor},
    observability::{log_debug, log_info},
    statistics::Statistics,
    transaction::{Snapshot, SnapshotList, WriteBatch, WriteOp},
    util::{Result, Slice, Status},
};

static NEXT_DB_ID: AtomicU64 = AtomicU64::new(1);

/// In-memory, multi-version ordered key-value store.
///
/// Every write takes the next sequence number. Reads and cursors observe
/// the state as of a read sequence: the attached snapshot's, or the latest
/// published sequence at the time the read starts.
pub struct DB {
    id: u64,
    mem: MemTable,
    /// Serializes writers so sequence assignment and insertion are atomic.
    write_lock: Mutex<()>,
    /// Highest sequence whose writes are fully inserted.
    last_sequence: AtomicU64,
    snapshots: Arc<SnapshotList>,
    options: DBOptions,
    statistics: Option<Arc<Statistics>>,
}

impl DB {
    pub fn open(options: DBOptions) -> Arc<Self> {
        let id = NEXT_DB_ID.fetch_add(1, Ordering::Relaxed);
        let statistics = options.statistics.then(|| Arc::new(Statistics::new()));
        log_info!(
            component = "db",
            event = "db_opened",
            db_id = id,
            paranoid_checks = options.paranoid_checks,
        );
        Arc::new(DB {
            id,
            mem: MemTable::new(),
            write_lock: Mutex::new(()),
            last_sequence: AtomicU64::new(0),
            snapshots: SnapshotList::new(id, statistics.clone()),
            options,
            statistics,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn options(&self) -> &DBOptions {
        &self.options
    }

    /// Highest published sequence number.
    pub fn latest_sequence(&self) -> u64 {
        self.last_sequence.load(Ordering::Acquire)
    }

    pub fn put(&self, _options: &WriteOptions, key: Slice, value: Slice) -> Result<()> {
        let _guard = self.write_lock.lock();
        let sequence = self.latest_sequence() + 1;
        if let Some(stats) = &self.statistics {
            stats.record_write((key.size() + value.size()) as u64);
        }
        self.mem.add(sequence, key, value);
        self.last_sequence.store(sequence, Ordering::Release);
        Ok(())
    }

    pub fn delete(&self, _options: &WriteOptions, key: Slice) -> Result<()> {
        let _guard = self.write_lock.lock();
        let sequence = self.latest_sequence() + 1;
        if let Some(stats) = &self.statistics {
            stats.record_delete();
        }
        self.mem.delete(sequence, key);
        self.last_sequence.store(sequence, Ordering::Release);
        Ok(())
    }

    /// Apply a write batch atomically
    ///
    /// Operations get consecutive sequence numbers and are published with a
    /// single store of the last one, so readers see all of them or none.
    pub fn write(&self, _options: &WriteOptions, batch: &WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock();
        let mut sequence = self.latest_sequence();
        for op in batch.ops() {
            sequence += 1;
            match op {
                WriteOp::Put { key, value } => {
                    if let Some(stats) = &self.statistics {
                        stats.record_write((key.size() + value.size()) as u64);
                    }
                    self.mem.add(sequence, key.clone(), value.clone());
                },
                WriteOp::Delete { key } => {
                    if let Some(stats) = &self.statistics {
                        stats.record_delete();
                    }
                    self.mem.delete(sequence, key.clone());
                },
            }
        }
        self.last_sequence.store(sequence, Ordering::Release);
        log_debug!(
            component = "db",
            event = "batch_applied",
            count = batch.count(),
            last_sequence = sequence,
        );
        Ok(())
    }

    pub fn get(&self, options: &ReadOptions, key: &Slice) -> Result<Option<Slice>> {
        let sequence = self.read_sequence(options)?;
        let value = self.mem.get(key, sequence, self.verify(options))?;
        if let (Some(stats), Some(v)) = (&self.statistics, &value) {
            stats.record_read(v.size() as u64);
        }
        Ok(value)
    }

    /// Open a cursor at the read sequence implied by `options`.
    ///
    /// The cursor pins its read sequence until dropped: the attached
    /// snapshot, or an implicit pin on the latest sequence, so compaction
    /// never removes a version the cursor can still reach.
    pub fn new_cursor(&self, options: &ReadOptions) -> Result<MemTableCursor> {
        let pin = match &options.snapshot {
            Some(snapshot) => {
                self.read_sequence(options)?;
                snapshot.clone()
            },
            None => self.pin_latest(SnapshotList::pin_cursor),
        };
        let sequence = pin.sequence();
        if let Some(stats) = &self.statistics {
            stats.record_cursor_open(options.fill_cache);
        }
        log_debug!(
            component = "cursor",
            event = "cursor_opened",
            db_id = self.id,
            sequence = sequence,
            explicit_snapshot = options.snapshot.is_some(),
            fill_cache = options.fill_cache,
        );
        Ok(self
            .mem
            .cursor(sequence, self.verify(options), self.statistics.clone())
            .pinned(pin))
    }

    /// Create a snapshot at the current sequence number
    pub fn create_snapshot(&self) -> Snapshot {
        self.pin_latest(SnapshotList::acquire)
    }

    /// Register a pin on the latest sequence. Holding the write lock keeps
    /// a compaction from running between reading the sequence and pinning.
    fn pin_latest(&self, pin: impl FnOnce(&Arc<SnapshotList>, u64) -> Snapshot) -> Snapshot {
        let _guard = self.write_lock.lock();
        pin(&self.snapshots, self.latest_sequence())
    }

    /// Compact the key range `[from, to]`; `None` is unbounded.
    ///
    /// Versions that no live snapshot, open cursor or the latest view can
    /// observe are discarded.
    pub fn compact_range(&self, from: Option<&Slice>, to: Option<&Slice>) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut readers = self.snapshots.sequences();
        readers.push(self.latest_sequence());
        let dropped = self.mem.compact(from, to, &readers);
        if let Some(stats) = &self.statistics {
            stats.record_compaction(dropped as u64);
        }
        log_info!(
            component = "db",
            event = "compaction_finished",
            versions_dropped = dropped,
            pinned_readers = readers.len() - 1,
        );
        Ok(())
    }

    /// Compacts the entire store.
    pub fn compact(&self) -> Result<()> {
        self.compact_range(None, None)
    }

    /// Store properties by name.
    ///
    /// - `"rucksjoin.num-entries"`: stored versions, deletion markers included
    /// - `"rucksjoin.num-snapshots"`: distinct sequence numbers pinned by snapshots
    /// - `"rucksjoin.sequence"`: latest published sequence
    /// - `"rucksjoin.approximate-memory-usage"`: bytes held by stored versions
    /// - `"rucksjoin.stats"`: statistics report
    pub fn property(&self, name: &str) -> Option<String> {
        match name {
            "rucksjoin.num-entries" => Some(self.mem.len().to_string()),
            "rucksjoin.num-snapshots" => Some(self.snapshots.len().to_string()),
            "rucksjoin.sequence" => Some(self.latest_sequence().to_string()),
            "rucksjoin.approximate-memory-usage" => {
                Some(self.mem.approximate_memory_usage().to_string())
            },
            "rucksjoin.stats" => self.statistics.as_ref().map(|stats| stats.report()),
            _ => None,
        }
    }

    pub fn statistics(&self) -> Option<&Arc<Statistics>> {
        self.statistics.as_ref()
    }

    /// Live `(key, value)` pairs of the latest view, ascending.
    pub fn live_entries(&self) -> Result<Vec<(Slice, Slice)>> {
        self.mem.live_entries(self.latest_sequence())
    }

    /// Dump the latest view to `path` as JSON.
    pub fn export_to<P: AsRef<Path>>(&self, path: P) -> Result<ExportFileInfo> {
        import_export::export_to(self, path)
    }

    /// Load a dump written by [`export_to`](DB::export_to) as one batch.
    pub fn import_from<P: AsRef<Path>>(&self, path: P) -> Result<ExportFileInfo> {
        import_export::import_from(self, path)
    }

    /// Full traversal of this store with default read options.
    pub fn iterable(self: &Arc<Self>) -> Iterable {
        self.iterable_with(ReadOptions::default())
    }

    pub fn iterable_with(self: &Arc<Self>, options: ReadOptions) -> Iterable {
        Iterable::new(self.clone(), options)
    }

    /// Typed view marshalling keys as `K` and values as `V`.
    pub fn cast<K: Marshal, V: Marshal>(self: &Arc<Self>) -> TypedDB<K, V> {
        TypedDB::new(self.clone())
    }

    fn read_sequence(&self, options: &ReadOptions) -> Result<u64> {
        match &options.snapshot {
            Some(snapshot) if snapshot.db_id() != self.id => Err(Status::invalid_argument(
                format!(
                    "snapshot belongs to store {}, not store {}",
                    snapshot.db_id(),
                    self.id
                ),
            )),
            Some(snapshot) => Ok(snapshot.sequence()),
            None => Ok(self.latest_sequence()),
        }
    }

    fn verify(&self, options: &ReadOptions) -> bool {
        options.verify_checksums || self.options.paranoid_checks
    }
}

impl Store for DB {
    fn id(&self) -> u64 {
        self.id
    }

    fn get(&self, options: &ReadOptions, key: &Slice) -> Result<Option<Slice>> {
        DB::get(self, options, key)
    }

    fn put(&self, options: &WriteOptions, key: Slice, value: Slice) -> Result<()> {
        DB::put(self, options, key, value)
    }

    fn delete(&self, options: &WriteOptions, key: Slice) -> Result<()> {
        DB::delete(self, options, key)
    }

    fn open_cursor(&self, options: &ReadOptions) -> Result<Box<dyn Cursor>> {
        Ok(Box::new(self.new_cursor(options)?))
    }

    fn create_snapshot(&self) -> Snapshot {
        DB::create_snapshot(self)
    }

    fn compact_range(&self, from: Option<&Slice>, to: Option<&Slice>) -> Result<()> {
        DB::compact_range(self, from, to)
    }
}
