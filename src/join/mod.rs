//! Types shared by merge joins: paired entries and key comparators.

mod comparator;

pub use comparator::{CompareFn, JoinComparator};

/// A pair of items, one from each side of a join.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JoinEntry<L, R> {
    pub left: L,
    pub right: R,
}

impl<L, R> JoinEntry<L, R> {
    pub fn of(left: L, right: R) -> Self {
        JoinEntry { left, right }
    }

    pub fn into_parts(self) -> (L, R) {
        (self.left, self.right)
    }

    pub fn map<L2, R2>(
        self,
        left: impl FnOnce(L) -> L2,
        right: impl FnOnce(R) -> R2,
    ) -> JoinEntry<L2, R2> {
        JoinEntry::of(left(self.left), right(self.right))
    }
}

impl<L, R> From<(L, R)> for JoinEntry<L, R> {
    fn from((left, right): (L, R)) -> Self {
        JoinEntry::of(left, right)
    }
}
