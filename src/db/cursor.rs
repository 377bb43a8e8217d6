use crate::util::{Result, Slice};

/// Primitive, stateful, bidirectional scan position provided by a store.
///
/// A cursor starts unpositioned (`valid() == false`). Every positioning
/// call returns whether the cursor is valid afterwards. `key()` and
/// `value()` are meaningful only while `valid()`; otherwise they return an
/// empty slice.
///
/// Cursors are not shared between threads; they are `Send` so a traversal
/// can be handed to a worker.
pub trait Cursor: Send {
    fn valid(&self) -> bool;

    fn key(&self) -> Slice;

    fn value(&self) -> Slice;

    /// Position at the first key in the source
    fn seek_to_first(&mut self) -> Result<bool>;

    /// Position at the last key in the source
    fn seek_to_last(&mut self) -> Result<bool>;

    /// Position at the first key >= target
    fn seek(&mut self, target: &Slice) -> Result<bool>;

    /// Position at the last key <= target
    fn seek_for_prev(&mut self, target: &Slice) -> Result<bool>;

    /// Move to the next entry; a no-op returning `false` when not valid.
    fn next(&mut self) -> Result<bool>;

    /// Move to the previous entry; a no-op returning `false` when not valid.
    fn prev(&mut self) -> Result<bool>;
}
