//! Composable, bidirectional iteration over an ordered store.
//!
//! Every traversal starts from a [`DBIterator`] over a store and is shaped
//! by decorators that each own the iterator they wrap:
//!
//! ```text
//! Iterable::get_iterator()
//!     ↓
//! RangeIterator (bounds, prefix)
//!     ↓
//! ReverseIterator (flipped direction, negated comparator)
//!     ↓
//! DBIterator (lazy cursor, captured read options)
//! ```
//!
//! "Forward" always means the direction of the current comparator, so a
//! decorator never needs to know how many reversals sit beneath it.
//!
//! The combinators consume the boxed iterator they are called on and return
//! the shaped one, which keeps the algebra closed:
//!
//! - `a.reverse().reverse()` yields `a` again
//! - `a.range(x, y)?.reverse()` equals `a.reverse().range(y, x)?`
//! - `a.prefix(p)?` keeps the same key set after `reverse()`

use std::cmp::Ordering;

use crate::util::{Result, Slice};

mod db_iterator;
mod merge_join_iterator;
mod range_iterator;
mod reverse_iterator;

pub use db_iterator::DBIterator;
pub use merge_join_iterator::MergeJoinIterator;
pub use range_iterator::{RangeIterator, prefix_upper_bound};
pub use reverse_iterator::ReverseIterator;

/// Stateful, bidirectional position over an ordered key-value sequence.
///
/// # Lifecycle
///
/// An iterator starts unpositioned. Either call a seek method, or call
/// [`move_next`](Iterator::move_next) / [`move_prev`](Iterator::move_prev),
/// which position at the first / last entry on their first call:
///
/// ```ignore
/// let mut iter = iterable.get_iterator()?;
/// while iter.move_next()? {
///     println!("{:?}: {:?}", iter.key(), iter.value());
/// }
/// ```
///
/// After [`dispose`](Iterator::dispose) every positioning call fails with
/// a `Disposed` status and `valid()` is `false`. Dropping an iterator
/// releases its cursor as well.
pub trait Iterator: Send {
    fn valid(&self) -> bool;

    /// Key at the current position; empty when not valid.
    fn key(&self) -> Slice;

    /// Value at the current position; empty when not valid.
    fn value(&self) -> Slice;

    /// Position at the first key in iteration order
    fn seek_to_first(&mut self) -> Result<bool>;

    /// Position at the last key in iteration order
    fn seek_to_last(&mut self) -> Result<bool>;

    /// Position at the first key at or after `target` in iteration order
    fn seek(&mut self, target: &Slice) -> Result<bool>;

    /// Position at the last key at or before `target` in iteration order
    fn seek_for_prev(&mut self, target: &Slice) -> Result<bool>;

    fn next(&mut self) -> Result<bool>;

    fn prev(&mut self) -> Result<bool>;

    /// Orders two keys the way this iterator visits them.
    fn compare_keys(&self, a: &[u8], b: &[u8]) -> Ordering;

    /// Advance; the first call after creation or `reset` seeks to the first
    /// entry instead.
    fn move_next(&mut self) -> Result<bool>;

    /// Step back; the first call after creation or `reset` seeks to the last
    /// entry instead.
    fn move_prev(&mut self) -> Result<bool>;

    /// Forget the position so the next `move_next`/`move_prev` starts over.
    fn reset(&mut self);

    /// Release the underlying cursor. Idempotent.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;

    /// Same entries, opposite order.
    fn reverse(self: Box<Self>) -> Box<dyn Iterator>;

    /// Restrict to `[from, to)` in iteration order; `None` is unbounded.
    ///
    /// Fails with `InvalidRange` when `from` sorts after `to`, and with
    /// `OutOfRange` when narrowing an existing range outside its bounds.
    fn range(self: Box<Self>, from: Option<Slice>, to: Option<Slice>)
    -> Result<Box<dyn Iterator>>;

    /// Restrict to keys starting with `prefix`, in either direction.
    fn prefix(self: Box<Self>, prefix: Slice) -> Result<Box<dyn Iterator>>;
}

/// Adapts an [`Iterator`] to `std::iter::Iterator` over owned entries.
///
/// Iteration stops after the first error.
pub struct Entries {
    iter: Box<dyn Iterator>,
    done: bool,
}

impl Entries {
    pub fn new(iter: Box<dyn Iterator>) -> Self {
        Entries { iter, done: false }
    }

    pub fn into_inner(self) -> Box<dyn Iterator> {
        self.iter
    }
}

impl std::iter::Iterator for Entries {
    type Item = Result<(Slice, Slice)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.iter.move_next() {
            Ok(true) => Some(Ok((self.iter.key(), self.iter.value()))),
            Ok(false) => {
                self.done = true;
                None
            },
            Err(e) => {
                self.done = true;
                Some(Err(e))
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;

    #[test]
    fn test_entries_adapter() {
        let db = db_with(&["b", "a"]);
        let entries: Vec<(Slice, Slice)> = Entries::new(base(&db))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            entries,
            vec![
                (Slice::from("a"), Slice::from("A")),
                (Slice::from("b"), Slice::from("B"))
            ]
        );
    }

    #[test]
    fn test_entries_stops_after_error() {
        let db = db_with(&["a"]);
        let mut iter = base(&db);
        iter.dispose();
        let mut entries = Entries::new(iter);
        assert!(entries.next().unwrap().unwrap_err().is_disposed());
        assert!(entries.next().is_none());
    }
}
