use std::{cmp::Ordering, fmt, marker::PhantomData};

use crate::{
    iterable::{Iterable, MergeJoinIterable},
    iterator::{Entries, MergeJoinIterator},
    join::{JoinComparator, JoinEntry},
    marshal::Marshal,
    transaction::Snapshot,
    util::{Result, Slice},
};

/// An [`Iterable`] whose keys and values are marshalled as `K` and `V`.
///
/// Bounds are given as typed keys and encoded before reaching the store,
/// so ordering follows the byte encoding of `K`.
pub struct TypedIterable<K, V> {
    inner: Iterable,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Clone for TypedIterable<K, V> {
    fn clone(&self) -> Self {
        TypedIterable {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V> fmt::Debug for TypedIterable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedIterable").field(&self.inner).finish()
    }
}

impl<K: Marshal, V: Marshal> TypedIterable<K, V> {
    pub fn new(inner: Iterable) -> Self {
        TypedIterable {
            inner,
            _marker: PhantomData,
        }
    }

    pub fn untyped(&self) -> &Iterable {
        &self.inner
    }

    pub fn iter(&self) -> Result<TypedEntries<K, V>> {
        Ok(TypedEntries {
            inner: self.inner.iter()?,
            done: false,
            _marker: PhantomData,
        })
    }

    pub fn reverse(&self) -> Self {
        TypedIterable::new(self.inner.reverse())
    }

    pub fn range(&self, from: &K, to: &K) -> Result<Self> {
        self.range_opt(Some(from), Some(to))
    }

    pub fn range_opt(&self, from: Option<&K>, to: Option<&K>) -> Result<Self> {
        Ok(TypedIterable::new(
            self.inner.range_opt(from.map(encode), to.map(encode))?,
        ))
    }

    /// Keys whose encoding starts with the encoding of `prefix`.
    ///
    /// `P` is usually a leading part of a composite `K`.
    pub fn prefix<P: Marshal>(&self, prefix: &P) -> Result<Self> {
        Ok(TypedIterable::new(self.inner.prefix(encode(prefix))?))
    }

    pub fn snapshot(&self) -> &Self {
        self.inner.snapshot();
        self
    }

    pub fn with_snapshot(&self, snapshot: Snapshot) -> Result<&Self> {
        self.inner.with_snapshot(snapshot)?;
        Ok(self)
    }

    pub fn release_snapshot(&self) -> &Self {
        self.inner.release_snapshot();
        self
    }

    pub fn fill_cache(&self, fill_cache: bool) -> Self {
        TypedIterable::new(self.inner.fill_cache(fill_cache))
    }

    pub fn verify_checksums(&self, verify_checksums: bool) -> Self {
        TypedIterable::new(self.inner.verify_checksums(verify_checksums))
    }

    /// Inner join with `other`, matching keys with a typed comparator.
    ///
    /// Keys that fail to decode abort the join with the decode error.
    pub fn join<K2, V2, F>(
        &self,
        other: &TypedIterable<K2, V2>,
        compare: F,
    ) -> TypedMergeJoinIterable<K, K2, V, V2>
    where
        K2: Marshal,
        V2: Marshal,
        F: Fn(&K, &K2) -> Ordering + Send + Sync + 'static,
    {
        let comparator = JoinComparator::custom(move |left, right| {
            Ok(compare(&K::from_bytes(left)?, &K2::from_bytes(right)?))
        });
        self.join_with(other, comparator)
    }

    /// Inner join with `other` using a byte-level comparator.
    pub fn join_with<K2: Marshal, V2: Marshal>(
        &self,
        other: &TypedIterable<K2, V2>,
        comparator: JoinComparator,
    ) -> TypedMergeJoinIterable<K, K2, V, V2> {
        TypedMergeJoinIterable::new(self.inner.join(&other.inner, comparator))
    }
}

fn encode<T: Marshal>(value: &T) -> Slice {
    Slice::from(value.to_bytes())
}

fn decode<T: Marshal>(bytes: &Slice) -> Result<T> {
    T::from_bytes(bytes.data())
}

/// Decoded entries of a [`TypedIterable`]; stops after the first error.
pub struct TypedEntries<K, V> {
    inner: Entries,
    done: bool,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K: Marshal, V: Marshal> Iterator for TypedEntries<K, V> {
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self
            .inner
            .next()?
            .and_then(|(key, value)| Ok((decode(&key)?, decode(&value)?)));
        self.done = item.is_err();
        Some(item)
    }
}

/// A [`MergeJoinIterable`] with typed keys and values on both sides.
pub struct TypedMergeJoinIterable<K1, K2, V1, V2> {
    inner: MergeJoinIterable,
    _marker: PhantomData<fn() -> (K1, K2, V1, V2)>,
}

impl<K1, K2, V1, V2> Clone for TypedMergeJoinIterable<K1, K2, V1, V2> {
    fn clone(&self) -> Self {
        TypedMergeJoinIterable {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K1, K2, V1, V2> fmt::Debug for TypedMergeJoinIterable<K1, K2, V1, V2> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedMergeJoinIterable")
            .field(&self.inner)
            .finish()
    }
}

impl<K1, K2, V1, V2> TypedMergeJoinIterable<K1, K2, V1, V2>
where
    K1: Marshal,
    K2: Marshal,
    V1: Marshal,
    V2: Marshal,
{
    pub fn new(inner: MergeJoinIterable) -> Self {
        TypedMergeJoinIterable {
            inner,
            _marker: PhantomData,
        }
    }

    pub fn untyped(&self) -> &MergeJoinIterable {
        &self.inner
    }

    pub fn iter(&self) -> Result<TypedJoinEntries<K1, K2, V1, V2>> {
        Ok(TypedJoinEntries {
            inner: self.inner.get_iterator()?,
            done: false,
            _marker: PhantomData,
        })
    }

    pub fn reverse(&self) -> Self {
        TypedMergeJoinIterable::new(self.inner.reverse())
    }

    pub fn range(
        &self,
        from: JoinEntry<Option<&K1>, Option<&K2>>,
        to: JoinEntry<Option<&K1>, Option<&K2>>,
    ) -> Result<Self> {
        let from = JoinEntry::of(from.left.map(encode), from.right.map(encode));
        let to = JoinEntry::of(to.left.map(encode), to.right.map(encode));
        Ok(TypedMergeJoinIterable::new(self.inner.range(from, to)?))
    }

    pub fn prefix<P1: Marshal, P2: Marshal>(&self, left: &P1, right: &P2) -> Result<Self> {
        Ok(TypedMergeJoinIterable::new(
            self.inner.prefix(encode(left), encode(right))?,
        ))
    }

    pub fn snapshot(&self) -> &Self {
        self.inner.snapshot();
        self
    }

    pub fn fill_cache(&self, fill_cache: bool) -> Self {
        TypedMergeJoinIterable::new(self.inner.fill_cache(fill_cache))
    }

    pub fn verify_checksums(&self, verify_checksums: bool) -> Self {
        TypedMergeJoinIterable::new(self.inner.verify_checksums(verify_checksums))
    }
}

/// Decoded rows of a [`TypedMergeJoinIterable`]; stops after the first
/// error.
pub struct TypedJoinEntries<K1, K2, V1, V2> {
    inner: MergeJoinIterator,
    done: bool,
    _marker: PhantomData<fn() -> (K1, K2, V1, V2)>,
}

impl<K1, K2, V1, V2> Iterator for TypedJoinEntries<K1, K2, V1, V2>
where
    K1: Marshal,
    K2: Marshal,
    V1: Marshal,
    V2: Marshal,
{
    type Item = Result<(JoinEntry<K1, K2>, JoinEntry<V1, V2>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.inner.next()?.and_then(|(key, value)| {
            Ok((
                JoinEntry::of(decode(&key.left)?, decode(&key.right)?),
                JoinEntry::of(decode(&value.left)?, decode(&value.right)?),
            ))
        });
        self.done = item.is_err();
        Some(item)
    }
}
