use std::{
    cmp::Ordering,
    ops::Bound::{self, Excluded, Included, Unbounded},
};

use crate::{
    iterator::Iterator,
    observability::log_debug,
    util::{Result, Slice, Status},
};

/// Smallest key greater than every key starting with `prefix`.
///
/// Trailing `0xFF` bytes are dropped and the last remaining byte is
/// incremented. Returns `None` when no such key exists, which is the case
/// for the empty prefix and for prefixes made only of `0xFF`.
pub fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let last = prefix.iter().rposition(|&b| b != 0xFF)?;
    let mut bound = prefix[..=last].to_vec();
    bound[last] += 1;
    Some(bound)
}

/// What `reverse()` does to the bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reversal {
    /// `range(a, b).reverse()` is `reverse().range(b, a)`.
    SwapBounds,
    /// The key set is kept; only the visiting order flips.
    KeepKeys,
}

/// Restricts the wrapped iterator to the keys between two bounds.
///
/// Bounds are interpreted with the wrapped iterator's comparator: `start`
/// is where iteration begins, `end` where it stops. A plain range includes
/// its start and excludes its end. A prefix range covers exactly the keys
/// with that prefix whichever way it is traversed.
pub struct RangeIterator {
    inner: Box<dyn Iterator>,
    start: Bound<Slice>,
    end: Bound<Slice>,
    reversal: Reversal,
    started: bool,
}

impl RangeIterator {
    /// Restrict `inner` to `[from, to)` in its iteration order.
    pub fn new(inner: Box<dyn Iterator>, from: Option<Slice>, to: Option<Slice>) -> Result<Self> {
        ensure_live(inner.as_ref())?;
        check_order(inner.as_ref(), from.as_ref(), to.as_ref())?;
        Ok(RangeIterator::with_bounds(
            inner,
            from.map_or(Unbounded, Included),
            to.map_or(Unbounded, Excluded),
            Reversal::SwapBounds,
        ))
    }

    /// Restrict `inner` to the keys starting with `prefix`.
    pub fn prefix(inner: Box<dyn Iterator>, prefix: Slice) -> Result<Self> {
        ensure_live(inner.as_ref())?;
        let (start, end) = prefix_bounds(inner.as_ref(), &prefix);
        Ok(RangeIterator::with_bounds(
            inner,
            start,
            end,
            Reversal::KeepKeys,
        ))
    }

    pub fn start_bound(&self) -> Bound<&Slice> {
        self.start.as_ref()
    }

    pub fn end_bound(&self) -> Bound<&Slice> {
        self.end.as_ref()
    }

    fn with_bounds(
        inner: Box<dyn Iterator>,
        start: Bound<Slice>,
        end: Bound<Slice>,
        reversal: Reversal,
    ) -> Self {
        RangeIterator {
            inner,
            start,
            end,
            reversal,
            started: false,
        }
    }

    fn cmp(&self, a: &[u8], b: &[u8]) -> Ordering {
        self.inner.compare_keys(a, b)
    }

    fn after_start(&self, key: &[u8]) -> bool {
        match &self.start {
            Included(s) => self.cmp(s.data(), key) != Ordering::Greater,
            Excluded(s) => self.cmp(s.data(), key) == Ordering::Less,
            Unbounded => true,
        }
    }

    fn before_end(&self, key: &[u8]) -> bool {
        match &self.end {
            Included(e) => self.cmp(key, e.data()) != Ordering::Greater,
            Excluded(e) => self.cmp(key, e.data()) == Ordering::Less,
            Unbounded => true,
        }
    }

    fn contains(&self, key: &[u8]) -> bool {
        self.after_start(key) && self.before_end(key)
    }

    /// Whether starting at `start` stays within the current start bound.
    fn covers_start(&self, start: &Bound<Slice>) -> bool {
        match (&self.start, start) {
            (Unbounded, _) => true,
            (_, Unbounded) => false,
            (Included(s), Included(x) | Excluded(x)) | (Excluded(s), Excluded(x)) => {
                self.cmp(s.data(), x.data()) != Ordering::Greater
            },
            (Excluded(s), Included(x)) => self.cmp(s.data(), x.data()) == Ordering::Less,
        }
    }

    /// Whether stopping at `end` stays within the current end bound.
    fn covers_end(&self, end: &Bound<Slice>) -> bool {
        match (&self.end, end) {
            (Unbounded, _) => true,
            (_, Unbounded) => false,
            (Included(e), Included(x) | Excluded(x)) | (Excluded(e), Excluded(x)) => {
                self.cmp(x.data(), e.data()) != Ordering::Greater
            },
            (Excluded(e), Included(x)) => self.cmp(x.data(), e.data()) == Ordering::Less,
        }
    }

    /// Replace the bounds with narrower ones over the same inner iterator.
    fn narrow(
        self: Box<Self>,
        start: Bound<Slice>,
        end: Bound<Slice>,
        reversal: Reversal,
    ) -> Result<Box<dyn Iterator>> {
        if !self.covers_start(&start) || !self.covers_end(&end) {
            log_debug!(
                component = "range",
                event = "range_rejected",
                current = ?(&self.start, &self.end),
                requested = ?(&start, &end),
            );
            return Err(Status::out_of_range(format!(
                "bounds {:?}..{:?} are outside {:?}..{:?}",
                start, end, self.start, self.end
            )));
        }
        let RangeIterator { inner, .. } = *self;
        Ok(Box::new(RangeIterator::with_bounds(
            inner, start, end, reversal,
        )))
    }

    fn at(&self, key: &Slice) -> bool {
        self.inner.valid() && self.cmp(self.inner.key().data(), key.data()) == Ordering::Equal
    }

    fn check_target(&self, target: &Slice) -> Result<()> {
        if self.contains(target.data()) {
            Ok(())
        } else {
            Err(Status::out_of_range(format!(
                "seek target {:?} is outside {:?}..{:?}",
                target, self.start, self.end
            )))
        }
    }
}

fn ensure_live(iter: &dyn Iterator) -> Result<()> {
    if iter.is_disposed() {
        Err(Status::disposed())
    } else {
        Ok(())
    }
}

fn check_order(iter: &dyn Iterator, from: Option<&Slice>, to: Option<&Slice>) -> Result<()> {
    if let (Some(from), Some(to)) = (from, to)
        && iter.compare_keys(from.data(), to.data()) == Ordering::Greater
    {
        return Err(Status::invalid_range(format!(
            "range start {from:?} sorts after end {to:?}"
        )));
    }
    Ok(())
}

/// Bounds covering the keys that start with `prefix`, oriented to the
/// direction of `iter`.
fn prefix_bounds(iter: &dyn Iterator, prefix: &Slice) -> (Bound<Slice>, Bound<Slice>) {
    let upper = prefix_upper_bound(prefix.data()).map(Slice::from);
    let ascending = match &upper {
        Some(upper) => iter.compare_keys(prefix.data(), upper.data()) == Ordering::Less,
        None => {
            let mut probe = prefix.to_vec();
            probe.push(0);
            iter.compare_keys(prefix.data(), &probe) == Ordering::Less
        },
    };
    let upper = upper.map_or(Unbounded, Excluded);
    if ascending {
        (Included(prefix.clone()), upper)
    } else {
        (upper, Included(prefix.clone()))
    }
}

fn bound_key(bound: Bound<Slice>) -> Option<Slice> {
    match bound {
        Included(key) | Excluded(key) => Some(key),
        Unbounded => None,
    }
}

impl Iterator for RangeIterator {
    fn valid(&self) -> bool {
        self.inner.valid() && self.contains(self.inner.key().data())
    }

    fn key(&self) -> Slice {
        if self.valid() {
            self.inner.key()
        } else {
            Slice::empty()
        }
    }

    fn value(&self) -> Slice {
        if self.valid() {
            self.inner.value()
        } else {
            Slice::empty()
        }
    }

    fn seek_to_first(&mut self) -> Result<bool> {
        self.started = true;
        match self.start.clone() {
            Unbounded => {
                self.inner.seek_to_first()?;
            },
            Included(start) => {
                self.inner.seek(&start)?;
            },
            Excluded(start) => {
                if self.inner.seek(&start)? && self.at(&start) {
                    self.inner.next()?;
                }
            },
        }
        Ok(self.valid())
    }

    fn seek_to_last(&mut self) -> Result<bool> {
        self.started = true;
        match self.end.clone() {
            Unbounded => {
                self.inner.seek_to_last()?;
            },
            Included(end) => {
                self.inner.seek_for_prev(&end)?;
            },
            Excluded(end) => {
                if self.inner.seek_for_prev(&end)? && self.at(&end) {
                    self.inner.prev()?;
                }
            },
        }
        Ok(self.valid())
    }

    fn seek(&mut self, target: &Slice) -> Result<bool> {
        ensure_live(self.inner.as_ref())?;
        self.check_target(target)?;
        self.started = true;
        self.inner.seek(target)?;
        Ok(self.valid())
    }

    fn seek_for_prev(&mut self, target: &Slice) -> Result<bool> {
        ensure_live(self.inner.as_ref())?;
        self.check_target(target)?;
        self.started = true;
        self.inner.seek_for_prev(target)?;
        Ok(self.valid())
    }

    fn next(&mut self) -> Result<bool> {
        ensure_live(self.inner.as_ref())?;
        if !self.valid() {
            return Ok(false);
        }
        self.inner.next()?;
        Ok(self.valid())
    }

    fn prev(&mut self) -> Result<bool> {
        ensure_live(self.inner.as_ref())?;
        if !self.valid() {
            return Ok(false);
        }
        self.inner.prev()?;
        Ok(self.valid())
    }

    fn compare_keys(&self, a: &[u8], b: &[u8]) -> Ordering {
        self.inner.compare_keys(a, b)
    }

    fn move_next(&mut self) -> Result<bool> {
        if self.started {
            self.next()
        } else {
            self.seek_to_first()
        }
    }

    fn move_prev(&mut self) -> Result<bool> {
        if self.started {
            self.prev()
        } else {
            self.seek_to_last()
        }
    }

    fn reset(&mut self) {
        self.started = false;
        self.inner.reset();
    }

    fn dispose(&mut self) {
        self.inner.dispose()
    }

    fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    fn reverse(self: Box<Self>) -> Box<dyn Iterator> {
        let RangeIterator {
            inner,
            start,
            end,
            reversal,
            ..
        } = *self;
        let (start, end) = match reversal {
            Reversal::SwapBounds => (
                bound_key(end).map_or(Unbounded, Included),
                bound_key(start).map_or(Unbounded, Excluded),
            ),
            Reversal::KeepKeys => (end, start),
        };
        Box::new(RangeIterator::with_bounds(
            inner.reverse(),
            start,
            end,
            reversal,
        ))
    }

    fn range(
        self: Box<Self>,
        from: Option<Slice>,
        to: Option<Slice>,
    ) -> Result<Box<dyn Iterator>> {
        ensure_live(self.inner.as_ref())?;
        check_order(self.inner.as_ref(), from.as_ref(), to.as_ref())?;
        self.narrow(
            from.map_or(Unbounded, Included),
            to.map_or(Unbounded, Excluded),
            Reversal::SwapBounds,
        )
    }

    fn prefix(self: Box<Self>, prefix: Slice) -> Result<Box<dyn Iterator>> {
        ensure_live(self.inner.as_ref())?;
        let (start, end) = prefix_bounds(self.inner.as_ref(), &prefix);
        self.narrow(start, end, Reversal::KeepKeys)
    }
}
