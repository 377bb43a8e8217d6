use std::{fmt, marker::PhantomData, sync::Arc};

use crate::{
    db::{DB, ReadOptions, WriteOptions},
    iterable::TypedIterable,
    marshal::Marshal,
    transaction::Snapshot,
    util::{Result, Slice},
};

/// A [`DB`] whose keys are marshalled as `K` and values as `V`.
///
/// Several typed views may share one store, for instance parents and
/// children of a relation stored under different key layouts.
pub struct TypedDB<K, V> {
    db: Arc<DB>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Clone for TypedDB<K, V> {
    fn clone(&self) -> Self {
        TypedDB {
            db: self.db.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V> fmt::Debug for TypedDB<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedDB").field("id", &self.db.id()).finish()
    }
}

impl<K: Marshal, V: Marshal> TypedDB<K, V> {
    pub fn new(db: Arc<DB>) -> Self {
        TypedDB {
            db,
            _marker: PhantomData,
        }
    }

    pub fn untyped(&self) -> &Arc<DB> {
        &self.db
    }

    pub fn put(&self, key: &K, value: &V) -> Result<()> {
        self.db.put(
            &WriteOptions::default(),
            Slice::from(key.to_bytes()),
            Slice::from(value.to_bytes()),
        )
    }

    pub fn delete(&self, key: &K) -> Result<()> {
        self.db
            .delete(&WriteOptions::default(), Slice::from(key.to_bytes()))
    }

    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.get_with(&ReadOptions::default(), key)
    }

    pub fn get_with(&self, options: &ReadOptions, key: &K) -> Result<Option<V>> {
        self.db
            .get(options, &Slice::from(key.to_bytes()))?
            .map(|value| V::from_bytes(value.data()))
            .transpose()
    }

    pub fn iterable(&self) -> TypedIterable<K, V> {
        self.db.iterable().cast()
    }

    pub fn iterable_with(&self, options: ReadOptions) -> TypedIterable<K, V> {
        self.db.iterable_with(options).cast()
    }

    pub fn create_snapshot(&self) -> Snapshot {
        self.db.create_snapshot()
    }

    pub fn compact_range(&self, from: Option<&K>, to: Option<&K>) -> Result<()> {
        let from = from.map(|k| Slice::from(k.to_bytes()));
        let to = to.map(|k| Slice::from(k.to_bytes()));
        self.db.compact_range(from.as_ref(), to.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DBOptions;

    #[test]
    fn test_typed_put_get_delete() {
        let db = DB::open(DBOptions::default()).cast::<u64, String>();
        db.put(&7, &"seven".to_string()).unwrap();
        assert_eq!(db.get(&7).unwrap(), Some("seven".to_string()));
        db.delete(&7).unwrap();
        assert_eq!(db.get(&7).unwrap(), None);
    }

    #[test]
    fn test_typed_snapshot_read() {
        let db = DB::open(DBOptions::default()).cast::<u64, u64>();
        db.put(&1, &100).unwrap();
        let snapshot = db.create_snapshot();
        db.put(&1, &200).unwrap();

        let pinned = ReadOptions::default().with_snapshot(snapshot);
        assert_eq!(db.get_with(&pinned, &1).unwrap(), Some(100));
        assert_eq!(db.get(&1).unwrap(), Some(200));

        db.compact_range(Some(&0), Some(&5)).unwrap();
        assert_eq!(db.get_with(&pinned, &1).unwrap(), Some(100));
    }

    #[test]
    fn test_value_decode_error() {
        let db = DB::open(DBOptions::default());
        db.cast::<u8, String>().put(&1, &"x".to_string()).unwrap();
        assert!(db.cast::<u8, u32>().get(&1).unwrap_err().is_corruption());
    }
}
