use std::cmp::Ordering;

use crate::{
    iterator::Iterator,
    join::{JoinComparator, JoinEntry},
    observability::log_debug,
    util::{Result, Slice, Status},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JoinState {
    Unstarted,
    /// Both sides sit on a matching pair.
    Matched,
    Exhausted,
}

/// Inner join of two sorted iterators.
///
/// Each step advances whichever side is behind until the comparator
/// reports a match. After a match only the right side advances, so every
/// right entry matching the current left entry is emitted in turn; a left
/// key that appears once and matches several right keys (a parent and its
/// children) yields one pair per right key.
///
/// The join runs in the order of its sides: two reversed sides give a
/// descending join. `reverse()` flips both sides and with them the join.
pub struct MergeJoinIterator {
    left: Box<dyn Iterator>,
    right: Box<dyn Iterator>,
    comparator: JoinComparator,
    descending: bool,
    state: JoinState,
}

/// Whether `iter` visits keys in descending byte order.
fn runs_descending(iter: &dyn Iterator) -> bool {
    iter.compare_keys(&[0x00], &[0x01]) == Ordering::Greater
}

impl MergeJoinIterator {
    /// Join `left` with `right`; both must iterate in the same direction.
    pub fn new(
        left: Box<dyn Iterator>,
        right: Box<dyn Iterator>,
        comparator: JoinComparator,
    ) -> Result<Self> {
        let descending = runs_descending(left.as_ref());
        if descending != runs_descending(right.as_ref()) {
            return Err(Status::invalid_argument(format!(
                "join sides iterate in opposite directions (left descending: {descending})"
            )));
        }
        Ok(MergeJoinIterator::with_sides(left, right, comparator, descending))
    }

    fn with_sides(
        left: Box<dyn Iterator>,
        right: Box<dyn Iterator>,
        comparator: JoinComparator,
        descending: bool,
    ) -> Self {
        MergeJoinIterator {
            left,
            right,
            comparator,
            descending,
            state: JoinState::Unstarted,
        }
    }

    pub fn valid(&self) -> bool {
        self.state == JoinState::Matched && self.left.valid() && self.right.valid()
    }

    pub fn key(&self) -> JoinEntry<Slice, Slice> {
        JoinEntry::of(self.left.key(), self.right.key())
    }

    pub fn value(&self) -> JoinEntry<Slice, Slice> {
        JoinEntry::of(self.left.value(), self.right.value())
    }

    /// Advance to the next matching pair.
    pub fn move_next(&mut self) -> Result<bool> {
        if self.left.is_disposed() || self.right.is_disposed() {
            return Err(Status::disposed());
        }
        match self.state {
            JoinState::Exhausted => return Ok(false),
            JoinState::Unstarted => {
                if !self.left.move_next()? || !self.right.move_next()? {
                    return Ok(self.finish());
                }
            },
            JoinState::Matched => {
                if !self.right.move_next()? {
                    return Ok(self.finish());
                }
            },
        }

        loop {
            match self.compare()? {
                Ordering::Equal => {
                    self.state = JoinState::Matched;
                    return Ok(true);
                },
                Ordering::Less => {
                    if !self.left.move_next()? {
                        return Ok(self.finish());
                    }
                },
                Ordering::Greater => {
                    if !self.right.move_next()? {
                        return Ok(self.finish());
                    }
                },
            }
        }
    }

    /// Start over from the first pair.
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.state = JoinState::Unstarted;
    }

    /// Release both sides. Idempotent.
    pub fn dispose(&mut self) {
        self.left.dispose();
        self.right.dispose();
        self.state = JoinState::Exhausted;
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    pub fn reverse(self) -> Self {
        MergeJoinIterator::with_sides(
            self.left.reverse(),
            self.right.reverse(),
            self.comparator,
            !self.descending,
        )
    }

    /// Restrict each side to `[from, to)` in its iteration order.
    pub fn range(
        self,
        from: JoinEntry<Option<Slice>, Option<Slice>>,
        to: JoinEntry<Option<Slice>, Option<Slice>>,
    ) -> Result<Self> {
        Ok(MergeJoinIterator::with_sides(
            self.left.range(from.left, to.left)?,
            self.right.range(from.right, to.right)?,
            self.comparator,
            self.descending,
        ))
    }

    /// Restrict each side to keys with the given prefix.
    pub fn prefix(self, left: Slice, right: Slice) -> Result<Self> {
        Ok(MergeJoinIterator::with_sides(
            self.left.prefix(left)?,
            self.right.prefix(right)?,
            self.comparator,
            self.descending,
        ))
    }

    pub fn into_parts(self) -> JoinEntry<Box<dyn Iterator>, Box<dyn Iterator>> {
        JoinEntry::of(self.left, self.right)
    }

    fn compare(&self) -> Result<Ordering> {
        let ordering = self
            .comparator
            .compare(self.left.key().data(), self.right.key().data())?;
        Ok(if self.descending {
            ordering.reverse()
        } else {
            ordering
        })
    }

    fn finish(&mut self) -> bool {
        self.state = JoinState::Exhausted;
        log_debug!(
            component = "merge_join",
            event = "join_exhausted",
            descending = self.descending,
        );
        false
    }
}

impl std::iter::Iterator for MergeJoinIterator {
    type Item = Result<(JoinEntry<Slice, Slice>, JoinEntry<Slice, Slice>)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.move_next() {
            Ok(true) => Some(Ok((self.key(), self.value()))),
            Ok(false) => None,
            Err(e) => {
                self.state = JoinState::Exhausted;
                Some(Err(e))
            },
        }
    }
}
