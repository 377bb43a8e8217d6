mod cursor;
#[allow(clippy::module_inception)]
pub mod memtable;

pub use cursor::MemTableCursor;
pub use memtable::{InternalKey, MemEntry, MemTable, ValueType};
