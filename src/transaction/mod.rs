mod snapshot;
mod write_batch;

pub use snapshot::{Snapshot, SnapshotList};
pub use write_batch::{WriteBatch, WriteOp};
