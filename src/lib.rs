//! Sorted-iterator algebra and merge joins over an ordered key-value store.
//!
//! ```ignore
//! let db = DB::open(DBOptions::default());
//! let parents = db.iterable().prefix("p")?;
//! let children = db.iterable().prefix("c")?;
//! for row in parents.join(&children, JoinComparator::Segments { left: 1..5, right: 1..5 })
//!     .get_iterator()?
//! {
//!     let (keys, values) = row?;
//! }
//! ```

pub mod db;
pub mod import_export;
pub mod iterable;
pub mod iterator;
pub mod join;
pub mod marshal;
pub mod memtable;
mod observability;
pub mod statistics;
pub mod transaction;
pub mod util;

pub use db::{DB, DBOptions, ReadOptions, Store, TypedDB, WriteOptions};
pub use iterable::{Iterable, MergeJoinIterable, TypedIterable, TypedMergeJoinIterable};
pub use iterator::{Entries, Iterator, MergeJoinIterator};
pub use join::{JoinComparator, JoinEntry};
pub use marshal::Marshal;
pub use statistics::Statistics;
pub use transaction::{Snapshot, WriteBatch};
pub use util::{Result, Slice, Status};
