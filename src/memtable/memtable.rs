use std::{
    cmp::Ordering,
    ops::Bound,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
    },
};

use crossbeam_skiplist::SkipMap;

use crate::{
    db::Cursor,
    memtable::MemTableCursor,
    statistics::Statistics,
    util::{Result, Slice, Status},
};

/// Sequence number larger than any assigned by a store.
pub const MAX_SEQUENCE: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ValueType {
    Deletion = 0,
    Value = 1,
}

/// Key of one version of a user key.
///
/// Sorted by user key ascending, then by sequence descending, so the
/// newest version of a key comes first and a lookup key
/// `(user_key, read_sequence)` lands on the newest version visible at
/// `read_sequence`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InternalKey {
    user_key: Slice,
    sequence: u64,
}

impl InternalKey {
    pub fn new(user_key: Slice, sequence: u64) -> Self {
        InternalKey { user_key, sequence }
    }

    pub fn user_key(&self) -> &Slice {
        &self.user_key
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Ord for InternalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.user_key
            .cmp(&other.user_key)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for InternalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One stored version: a value or a deletion marker, plus a checksum over
/// key, type and value.
#[derive(Clone, Debug)]
pub struct MemEntry {
    value_type: ValueType,
    value: Slice,
    checksum: u32,
}

impl MemEntry {
    pub fn value(key: &Slice, value: Slice) -> Self {
        let checksum = Self::checksum(key, ValueType::Value, &value);
        MemEntry {
            value_type: ValueType::Value,
            value,
            checksum,
        }
    }

    pub fn deletion(key: &Slice) -> Self {
        let value = Slice::empty();
        let checksum = Self::checksum(key, ValueType::Deletion, &value);
        MemEntry {
            value_type: ValueType::Deletion,
            value,
            checksum,
        }
    }

    /// Entry whose stored checksum does not match its contents.
    #[cfg(test)]
    pub(crate) fn corrupted(key: &Slice, value: Slice) -> Self {
        let mut entry = MemEntry::value(key, value);
        entry.checksum ^= 0xDEAD_BEEF;
        entry
    }

    fn checksum(key: &Slice, value_type: ValueType, value: &Slice) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(key.data());
        hasher.update(&[value_type as u8]);
        hasher.update(value.data());
        hasher.finalize()
    }

    pub fn is_deletion(&self) -> bool {
        self.value_type == ValueType::Deletion
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn payload(&self) -> &Slice {
        &self.value
    }

    pub fn verify(&self, key: &Slice) -> Result<()> {
        let actual = Self::checksum(key, self.value_type, &self.value);
        if actual != self.checksum {
            return Err(Status::corruption(format!(
                "checksum mismatch for key {key:?}: expected {:#010x}, actual {actual:#010x}",
                self.checksum
            )));
        }
        Ok(())
    }
}

pub struct MemTable {
    table: Arc<SkipMap<InternalKey, MemEntry>>,
    approximate_memory: AtomicUsize,
}

impl MemTable {
    pub fn new() -> Self {
        MemTable {
            table: Arc::new(SkipMap::new()),
            approximate_memory: AtomicUsize::new(0),
        }
    }

    pub fn add(&self, sequence: u64, key: Slice, value: Slice) {
        let mem_usage = key.size() + value.size() + 8;
        self.approximate_memory
            .fetch_add(mem_usage, AtomicOrdering::Relaxed);

        let entry = MemEntry::value(&key, value);
        self.table.insert(InternalKey::new(key, sequence), entry);
    }

    pub fn delete(&self, sequence: u64, key: Slice) {
        let mem_usage = key.size() + 8;
        self.approximate_memory
            .fetch_add(mem_usage, AtomicOrdering::Relaxed);

        let entry = MemEntry::deletion(&key);
        self.table.insert(InternalKey::new(key, sequence), entry);
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&self, sequence: u64, key: Slice, entry: MemEntry) {
        self.table.insert(InternalKey::new(key, sequence), entry);
    }

    /// Newest version of `key` visible at `sequence`.
    ///
    /// Returns `Ok(None)` when the key was never written at or before
    /// `sequence`, or when the visible version is a deletion.
    pub fn get(&self, key: &Slice, sequence: u64, verify: bool) -> Result<Option<Slice>> {
        let lookup = InternalKey::new(key.clone(), sequence);
        if let Some(entry) = self.table.range(lookup..).next() {
            if entry.key().user_key() != key {
                return Ok(None);
            }
            let mem_entry = entry.value();
            if verify {
                mem_entry.verify(key)?;
            }
            if mem_entry.is_deletion() {
                return Ok(None);
            }
            return Ok(Some(mem_entry.payload().clone()));
        }
        Ok(None)
    }

    /// Open a cursor over the versions visible at `sequence`.
    pub fn cursor(
        &self,
        sequence: u64,
        verify: bool,
        statistics: Option<Arc<Statistics>>,
    ) -> MemTableCursor {
        MemTableCursor::new(self.table.clone(), sequence, verify, statistics)
    }

    /// Drop versions of keys in `[from, to]` that no reader can observe.
    ///
    /// `readers` holds every read sequence that must keep its view: the
    /// live snapshots plus the latest sequence. For each user key, only the
    /// newest version at or below each reader survives, and deletion
    /// markers with nothing older beneath them are removed.
    ///
    /// Returns the number of versions removed.
    pub fn compact(&self, from: Option<&Slice>, to: Option<&Slice>, readers: &[u64]) -> usize {
        let lower = match from {
            Some(key) => Bound::Included(InternalKey::new(key.clone(), MAX_SEQUENCE)),
            None => Bound::Unbounded,
        };
        let upper = match to {
            Some(key) => Bound::Included(InternalKey::new(key.clone(), 0)),
            None => Bound::Unbounded,
        };

        let mut doomed: Vec<InternalKey> = Vec::new();
        let mut versions: Vec<(InternalKey, bool)> = Vec::new();
        for entry in self.table.range((lower, upper)) {
            let ikey = entry.key();
            if let Some((last, _)) = versions.last()
                && last.user_key() != ikey.user_key()
            {
                Self::collect_obsolete(&versions, readers, &mut doomed);
                versions.clear();
            }
            versions.push((ikey.clone(), entry.value().is_deletion()));
        }
        Self::collect_obsolete(&versions, readers, &mut doomed);

        for ikey in &doomed {
            if let Some(entry) = self.table.remove(ikey) {
                let freed = ikey.user_key().size() + entry.value().payload().size() + 8;
                self.approximate_memory
                    .fetch_sub(freed, AtomicOrdering::Relaxed);
            }
        }
        doomed.len()
    }

    /// `versions` holds one user key's versions, newest first.
    fn collect_obsolete(
        versions: &[(InternalKey, bool)],
        readers: &[u64],
        doomed: &mut Vec<InternalKey>,
    ) {
        let mut keep = vec![false; versions.len()];
        for &reader in readers {
            if let Some(pos) = versions
                .iter()
                .position(|(ikey, _)| ikey.sequence() <= reader)
            {
                keep[pos] = true;
            }
        }

        // A deletion with nothing kept beneath it reads the same as absence.
        for idx in (0..versions.len()).rev() {
            if !keep[idx] {
                continue;
            }
            if versions[idx].1 {
                keep[idx] = false;
            } else {
                break;
            }
        }

        for (idx, (ikey, _)) in versions.iter().enumerate() {
            if !keep[idx] {
                doomed.push(ikey.clone());
            }
        }
    }

    /// Latest live `(key, value)` pairs visible at `sequence`, ascending.
    pub fn live_entries(&self, sequence: u64) -> Result<Vec<(Slice, Slice)>> {
        let mut cursor = self.cursor(sequence, false, None);
        let mut entries = Vec::new();
        let mut valid = cursor.seek_to_first()?;
        while valid {
            entries.push((cursor.key(), cursor.value()));
            valid = cursor.next()?;
        }
        Ok(entries)
    }

    /// Number of stored versions, including deletion markers.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn approximate_memory_usage(&self) -> usize {
        self.approximate_memory.load(AtomicOrdering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
