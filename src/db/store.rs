use crate::{
    db::{Cursor, ReadOptions, WriteOptions},
    transaction::Snapshot,
    util::{Result, Slice},
};

/// The ordered key-value store the iteration algebra runs against.
///
/// Keys are ordered by unsigned lexicographic byte comparison. The algebra
/// only ever talks to a store through this trait: point reads and writes,
/// cursors, snapshots and a pass-through compaction hook.
pub trait Store: Send + Sync {
    /// Identity used to check that a snapshot belongs to this store.
    fn id(&self) -> u64;

    fn get(&self, options: &ReadOptions, key: &Slice) -> Result<Option<Slice>>;

    fn put(&self, options: &WriteOptions, key: Slice, value: Slice) -> Result<()>;

    fn delete(&self, options: &WriteOptions, key: Slice) -> Result<()>;

    /// Open a cursor honoring `options` (snapshot, checksums, cache hint).
    fn open_cursor(&self, options: &ReadOptions) -> Result<Box<dyn Cursor>>;

    fn create_snapshot(&self) -> Snapshot;

    /// Compact `[from, to]`; `None` is unbounded on that side.
    fn compact_range(&self, from: Option<&Slice>, to: Option<&Slice>) -> Result<()>;
}
