use std::cmp::Ordering;

use crate::{
    iterator::{Iterator, RangeIterator},
    util::{Result, Slice},
};

/// Visits the entries of the wrapped iterator in the opposite order.
///
/// Seeks map to their mirror image and the comparator is negated, so
/// decorators stacked on top see an ordinary forward iterator.
pub struct ReverseIterator {
    inner: Box<dyn Iterator>,
}

impl ReverseIterator {
    pub fn new(inner: Box<dyn Iterator>) -> Self {
        ReverseIterator { inner }
    }

    pub fn into_inner(self) -> Box<dyn Iterator> {
        self.inner
    }
}

impl Iterator for ReverseIterator {
    fn valid(&self) -> bool {
        self.inner.valid()
    }

    fn key(&self) -> Slice {
        self.inner.key()
    }

    fn value(&self) -> Slice {
        self.inner.value()
    }

    fn seek_to_first(&mut self) -> Result<bool> {
        self.inner.seek_to_last()
    }

    fn seek_to_last(&mut self) -> Result<bool> {
        self.inner.seek_to_first()
    }

    fn seek(&mut self, target: &Slice) -> Result<bool> {
        self.inner.seek_for_prev(target)
    }

    fn seek_for_prev(&mut self, target: &Slice) -> Result<bool> {
        self.inner.seek(target)
    }

    fn next(&mut self) -> Result<bool> {
        self.inner.prev()
    }

    fn prev(&mut self) -> Result<bool> {
        self.inner.next()
    }

    fn compare_keys(&self, a: &[u8], b: &[u8]) -> Ordering {
        self.inner.compare_keys(a, b).reverse()
    }

    fn move_next(&mut self) -> Result<bool> {
        self.inner.move_prev()
    }

    fn move_prev(&mut self) -> Result<bool> {
        self.inner.move_next()
    }

    fn reset(&mut self) {
        self.inner.reset()
    }

    fn dispose(&mut self) {
        self.inner.dispose()
    }

    fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    fn reverse(self: Box<Self>) -> Box<dyn Iterator> {
        self.inner
    }

    fn range(
        self: Box<Self>,
        from: Option<Slice>,
        to: Option<Slice>,
    ) -> Result<Box<dyn Iterator>> {
        Ok(Box::new(RangeIterator::new(self, from, to)?))
    }

    fn prefix(self: Box<Self>, prefix: Slice) -> Result<Box<dyn Iterator>> {
        Ok(Box::new(RangeIterator::prefix(self, prefix)?))
    }
}
