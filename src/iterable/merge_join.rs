use crate::{
    iterable::{Iterable, TypedMergeJoinIterable},
    iterator::MergeJoinIterator,
    join::{JoinComparator, JoinEntry},
    marshal::Marshal,
    observability::log_info,
    transaction::Snapshot,
    util::{Result, Slice, Status},
};

/// Reusable description of an inner join of two iterables.
///
/// Options calls apply to both sides. When both sides read the same store,
/// `snapshot()` pins them to one shared snapshot so the join observes a
/// single consistent state.
#[derive(Clone, Debug)]
pub struct MergeJoinIterable {
    left: Iterable,
    right: Iterable,
    comparator: JoinComparator,
}

impl MergeJoinIterable {
    pub fn new(left: Iterable, right: Iterable, comparator: JoinComparator) -> Self {
        MergeJoinIterable {
            left,
            right,
            comparator,
        }
    }

    pub fn left(&self) -> &Iterable {
        &self.left
    }

    pub fn right(&self) -> &Iterable {
        &self.right
    }

    pub fn comparator(&self) -> &JoinComparator {
        &self.comparator
    }

    /// Build a fresh join iterator. The join runs in the direction of its
    /// sides; sides iterating in opposite directions are `InvalidArgument`.
    pub fn get_iterator(&self) -> Result<MergeJoinIterator> {
        MergeJoinIterator::new(
            self.left.get_iterator()?,
            self.right.get_iterator()?,
            self.comparator.clone(),
        )
    }

    pub fn reverse(&self) -> Self {
        MergeJoinIterable {
            left: self.left.reverse(),
            right: self.right.reverse(),
            comparator: self.comparator.clone(),
        }
    }

    /// Restrict each side to `[from, to)` of its own order.
    pub fn range(
        &self,
        from: JoinEntry<Option<Slice>, Option<Slice>>,
        to: JoinEntry<Option<Slice>, Option<Slice>>,
    ) -> Result<Self> {
        Ok(self.with_sides(
            self.left.range_opt(from.left, to.left)?,
            self.right.range_opt(from.right, to.right)?,
        ))
    }

    pub fn prefix(&self, left: impl Into<Slice>, right: impl Into<Slice>) -> Result<Self> {
        Ok(self.with_sides(self.left.prefix(left)?, self.right.prefix(right)?))
    }

    /// Pin both sides to the current state of their stores.
    pub fn snapshot(&self) -> &Self {
        if self.same_store() {
            let snapshot = self.left.store().create_snapshot();
            log_info!(
                component = "snapshot",
                event = "join_snapshot_refreshed",
                db_id = snapshot.db_id(),
                sequence = snapshot.sequence(),
            );
            self.attach(snapshot);
        } else {
            self.left.snapshot();
            self.right.snapshot();
        }
        self
    }

    /// Pin both sides to `snapshot`; both must read the snapshot's store.
    pub fn with_snapshot(&self, snapshot: Snapshot) -> Result<&Self> {
        if !self.same_store() {
            return Err(Status::invalid_argument(
                "join sides read different stores and cannot share a snapshot",
            ));
        }
        self.left.with_snapshot(snapshot.clone())?;
        self.right.with_snapshot(snapshot)?;
        Ok(self)
    }

    pub fn release_snapshot(&self) -> &Self {
        self.left.release_snapshot();
        self.right.release_snapshot();
        self
    }

    pub fn fill_cache(&self, fill_cache: bool) -> Self {
        self.with_sides(
            self.left.fill_cache(fill_cache),
            self.right.fill_cache(fill_cache),
        )
    }

    pub fn verify_checksums(&self, verify_checksums: bool) -> Self {
        self.with_sides(
            self.left.verify_checksums(verify_checksums),
            self.right.verify_checksums(verify_checksums),
        )
    }

    /// Typed view: keys as `K1`/`K2`, values as `V1`/`V2`.
    pub fn cast<K1, K2, V1, V2>(&self) -> TypedMergeJoinIterable<K1, K2, V1, V2>
    where
        K1: Marshal,
        K2: Marshal,
        V1: Marshal,
        V2: Marshal,
    {
        TypedMergeJoinIterable::new(self.clone())
    }

    fn same_store(&self) -> bool {
        self.left.store().id() == self.right.store().id()
    }

    fn attach(&self, snapshot: Snapshot) {
        if !self.left.shares_options_with(&self.right) {
            self.right.set_snapshot(snapshot.clone());
        }
        self.left.set_snapshot(snapshot);
    }

    fn with_sides(&self, left: Iterable, right: Iterable) -> Self {
        MergeJoinIterable {
            left,
            right,
            comparator: self.comparator.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::WriteOptions, iterator::testutil::db_with};

    fn rows(join: &MergeJoinIterable) -> Vec<(String, String)> {
        join.get_iterator()
            .unwrap()
            .map(|row| {
                let (key, _) = row.unwrap();
                (
                    String::from_utf8(key.left.to_vec()).unwrap(),
                    String::from_utf8(key.right.to_vec()).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_join_across_stores() {
        let parents = db_with(&["p1", "p2"]);
        let children = db_with(&["p1c1", "p2c1", "p2c2"]);
        let join = parents
            .iterable()
            .join(&children.iterable(), JoinComparator::LeftPrefix);
        assert_eq!(rows(&join).len(), 3);
        assert_eq!(rows(&join.reverse())[0], ("p2".to_string(), "p2c2".to_string()));
        assert_eq!(rows(&join.reverse().reverse()), rows(&join));
    }

    #[test]
    fn test_join_prefix_and_range() {
        let db = db_with(&["pa", "pb", "qa1", "qb1", "qb2"]);
        let iterable = db.iterable();
        let join = iterable
            .join(
                &iterable,
                JoinComparator::Segments {
                    left: 1..2,
                    right: 1..2,
                },
            )
            .prefix("p", "q")
            .unwrap();
        assert_eq!(
            rows(&join),
            vec![
                ("pa".to_string(), "qa1".to_string()),
                ("pb".to_string(), "qb1".to_string()),
                ("pb".to_string(), "qb2".to_string()),
            ]
        );

        let err = join
            .range(
                JoinEntry::of(Some(Slice::from("pb")), Some(Slice::from("qb"))),
                JoinEntry::of(None, None),
            )
            .unwrap_err();
        assert!(err.is_out_of_range());
    }

    #[test]
    fn test_shared_snapshot_on_one_store() {
        let db = db_with(&["p1", "p1c1"]);
        let iterable = db.iterable();
        let join = iterable
            .prefix("p1c")
            .unwrap()
            .join(&iterable.range("p1", "p1c").unwrap(), JoinComparator::custom(|l, r| {
                Ok(l[..2].cmp(&r[..2]))
            }));
        join.snapshot();
        let left = join.left().current_snapshot().unwrap();
        let right = join.right().current_snapshot().unwrap();
        assert_eq!(left.sequence(), right.sequence());

        db.delete(&WriteOptions::default(), Slice::from("p1"))
            .unwrap();
        assert_eq!(rows(&join).len(), 1);

        join.snapshot();
        assert!(rows(&join).is_empty());
    }

    #[test]
    fn test_snapshot_across_stores_is_per_side() {
        let left = db_with(&["a"]);
        let right = db_with(&["a"]);
        let join = left.iterable().join(&right.iterable(), JoinComparator::Bytewise);
        join.snapshot();
        assert!(join.left().current_snapshot().is_some());
        assert!(join.right().current_snapshot().is_some());
        assert!(
            join.with_snapshot(left.create_snapshot())
                .unwrap_err()
                .is_invalid_argument()
        );
    }
}
