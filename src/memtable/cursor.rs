use std::{ops::Bound, sync::Arc};

use crossbeam_skiplist::SkipMap;

use crate::{
    db::Cursor,
    memtable::memtable::{InternalKey, MAX_SEQUENCE, MemEntry},
    observability::{log_debug, log_warn},
    statistics::Statistics,
    transaction::Snapshot,
    util::{Result, Slice},
};

/// Cursor over a MemTable at a fixed read sequence.
///
/// Exposes, for every user key, the newest version whose sequence is at or
/// below the read sequence, and hides keys whose visible version is a
/// deletion marker. Versions written after the cursor was opened are
/// invisible to it.
///
/// # Implementation Notes
///
/// The skiplist is ordered by `(user_key asc, sequence desc)`. Forward
/// motion scans from a lookup key and skips versions of a key already
/// resolved. Backward motion uses the double-ended range iterator to find
/// the previous user key, then resolves its visible version with a forward
/// lookup.
pub struct MemTableCursor {
    map: Arc<SkipMap<InternalKey, MemEntry>>,
    sequence: u64,
    verify_checksums: bool,
    statistics: Option<Arc<Statistics>>,
    current: Option<(Slice, Slice)>,
    /// Keeps the read sequence registered with the store while open.
    pin: Option<Snapshot>,
}

impl MemTableCursor {
    pub fn new(
        map: Arc<SkipMap<InternalKey, MemEntry>>,
        sequence: u64,
        verify_checksums: bool,
        statistics: Option<Arc<Statistics>>,
    ) -> Self {
        MemTableCursor {
            map,
            sequence,
            verify_checksums,
            statistics,
            current: None,
            pin: None,
        }
    }

    /// Hold `pin` for as long as the cursor is open.
    pub fn pinned(mut self, pin: Snapshot) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Read sequence this cursor is bound to.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    fn resolve(&self, key: &Slice, entry: &MemEntry) -> Result<Option<Slice>> {
        if let Some(stats) = &self.statistics {
            stats.record_scan();
        }
        if self.verify_checksums
            && let Err(status) = entry.verify(key)
        {
            if let Some(stats) = &self.statistics {
                stats.record_checksum_failure();
            }
            log_warn!(
                component = "cursor",
                event = "checksum_mismatch",
                key = ?key,
            );
            return Err(status);
        }
        if entry.is_deletion() {
            Ok(None)
        } else {
            Ok(Some(entry.payload().clone()))
        }
    }

    /// Newest version of `user_key` visible at the read sequence.
    fn visible(&self, user_key: &Slice) -> Result<Option<Slice>> {
        let lookup = InternalKey::new(user_key.clone(), self.sequence);
        if let Some(entry) = self.map.range(lookup..).next()
            && entry.key().user_key() == user_key
        {
            return self.resolve(user_key, entry.value());
        }
        Ok(None)
    }

    /// Position at the first live key at or after `start`.
    fn scan_forward(&mut self, start: Bound<InternalKey>) -> Result<bool> {
        let map = self.map.clone();
        let mut resolved: Option<Slice> = None;
        for entry in map.range((start, Bound::Unbounded)) {
            let ikey = entry.key();
            if resolved.as_ref() == Some(ikey.user_key()) {
                continue;
            }
            if ikey.sequence() > self.sequence {
                continue;
            }
            // First version at or below the read sequence is the visible one.
            resolved = Some(ikey.user_key().clone());
            if let Some(value) = self.resolve(ikey.user_key(), entry.value())? {
                self.current = Some((ikey.user_key().clone(), value));
                return Ok(true);
            }
        }
        self.current = None;
        Ok(false)
    }

    /// Position at the last live key strictly before `end`.
    fn scan_backward(&mut self, mut end: Bound<InternalKey>) -> Result<bool> {
        loop {
            let user_key = match self.map.range((Bound::Unbounded, end)).next_back() {
                Some(entry) => entry.key().user_key().clone(),
                None => {
                    self.current = None;
                    return Ok(false);
                },
            };
            if let Some(value) = self.visible(&user_key)? {
                self.current = Some((user_key, value));
                return Ok(true);
            }
            end = Bound::Excluded(InternalKey::new(user_key, MAX_SEQUENCE));
        }
    }
}

impl Cursor for MemTableCursor {
    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> Slice {
        self.current
            .as_ref()
            .map(|(key, _)| key.clone())
            .unwrap_or_else(Slice::empty)
    }

    fn value(&self) -> Slice {
        self.current
            .as_ref()
            .map(|(_, value)| value.clone())
            .unwrap_or_else(Slice::empty)
    }

    fn seek_to_first(&mut self) -> Result<bool> {
        self.scan_forward(Bound::Unbounded)
    }

    fn seek_to_last(&mut self) -> Result<bool> {
        self.scan_backward(Bound::Unbounded)
    }

    fn seek(&mut self, target: &Slice) -> Result<bool> {
        self.scan_forward(Bound::Included(InternalKey::new(
            target.clone(),
            self.sequence,
        )))
    }

    fn seek_for_prev(&mut self, target: &Slice) -> Result<bool> {
        // (target, 0) sorts after every version of target.
        self.scan_backward(Bound::Included(InternalKey::new(target.clone(), 0)))
    }

    fn next(&mut self) -> Result<bool> {
        let Some((key, _)) = self.current.take() else {
            return Ok(false);
        };
        self.scan_forward(Bound::Excluded(InternalKey::new(key, 0)))
    }

    fn prev(&mut self) -> Result<bool> {
        let Some((key, _)) = self.current.take() else {
            return Ok(false);
        };
        self.scan_backward(Bound::Excluded(InternalKey::new(key, MAX_SEQUENCE)))
    }
}

impl Drop for MemTableCursor {
    fn drop(&mut self) {
        if let Some(stats) = &self.statistics {
            stats.record_cursor_release();
        }
        log_debug!(
            component = "cursor",
            event = "cursor_released",
            sequence = self.sequence,
            pinned = self.pin.is_some(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memtable::MemTable;

    fn keys(cursor: &mut MemTableCursor) -> Vec<String> {
        let mut out = Vec::new();
        let mut valid = cursor.seek_to_first().unwrap();
        while valid {
            out.push(cursor.key().to_string());
            valid = cursor.next().unwrap();
        }
        out
    }

    #[test]
    fn test_memtable_cursor_basic() {
        let mem = MemTable::new();
        mem.add(1, Slice::from("key1"), Slice::from("value1"));
        mem.add(2, Slice::from("key2"), Slice::from("value2"));
        mem.add(3, Slice::from("key3"), Slice::from("value3"));

        let mut cursor = mem.cursor(3, true, None);
        assert!(cursor.seek_to_first().unwrap());
        assert_eq!(cursor.key(), Slice::from("key1"));
        assert_eq!(cursor.value(), Slice::from("value1"));

        assert!(cursor.next().unwrap());
        assert_eq!(cursor.key(), Slice::from("key2"));

        assert!(cursor.next().unwrap());
        assert_eq!(cursor.key(), Slice::from("key3"));

        assert!(!cursor.next().unwrap());
        assert!(!cursor.valid());
    }

    #[test]
    fn test_memtable_cursor_seek() {
        let mem = MemTable::new();
        mem.add(1, Slice::from("key1"), Slice::from("value1"));
        mem.add(2, Slice::from("key3"), Slice::from("value3"));
        mem.add(3, Slice::from("key5"), Slice::from("value5"));

        let mut cursor = mem.cursor(3, false, None);

        assert!(cursor.seek(&Slice::from("key3")).unwrap());
        assert_eq!(cursor.key(), Slice::from("key3"));

        assert!(cursor.seek(&Slice::from("key2")).unwrap());
        assert_eq!(cursor.key(), Slice::from("key3"));

        assert!(!cursor.seek(&Slice::from("key9")).unwrap());
        assert!(!cursor.valid());
    }

    #[test]
    fn test_memtable_cursor_seek_for_prev() {
        let mem = MemTable::new();
        mem.add(1, Slice::from("b"), Slice::from("1"));
        mem.add(2, Slice::from("d"), Slice::from("2"));

        let mut cursor = mem.cursor(2, false, None);
        assert!(cursor.seek_for_prev(&Slice::from("d")).unwrap());
        assert_eq!(cursor.key(), Slice::from("d"));
        assert!(cursor.seek_for_prev(&Slice::from("c")).unwrap());
        assert_eq!(cursor.key(), Slice::from("b"));
        assert!(!cursor.seek_for_prev(&Slice::from("a")).unwrap());
    }

    #[test]
    fn test_memtable_cursor_backward() {
        let mem = MemTable::new();
        mem.add(1, Slice::from("a"), Slice::from("1"));
        mem.add(2, Slice::from("b"), Slice::from("2"));
        mem.add(3, Slice::from("c"), Slice::from("3"));

        let mut cursor = mem.cursor(3, false, None);
        assert!(cursor.seek_to_last().unwrap());
        assert_eq!(cursor.key(), Slice::from("c"));
        assert!(cursor.prev().unwrap());
        assert_eq!(cursor.key(), Slice::from("b"));
        assert!(cursor.prev().unwrap());
        assert_eq!(cursor.key(), Slice::from("a"));
        assert!(!cursor.prev().unwrap());
    }

    #[test]
    fn test_memtable_cursor_with_deletions() {
        let mem = MemTable::new();
        mem.add(1, Slice::from("key1"), Slice::from("value1"));
        mem.add(2, Slice::from("key2"), Slice::from("value2"));
        mem.delete(3, Slice::from("key2"));
        mem.add(4, Slice::from("key3"), Slice::from("value3"));

        let mut cursor = mem.cursor(4, false, None);
        assert_eq!(keys(&mut cursor), vec!["key1", "key3"]);

        assert!(cursor.seek_to_last().unwrap());
        assert!(cursor.prev().unwrap());
        assert_eq!(cursor.key(), Slice::from("key1"));
    }

    #[test]
    fn test_memtable_cursor_is_bound_to_sequence() {
        let mem = MemTable::new();
        mem.add(1, Slice::from("a"), Slice::from("old"));
        mem.add(2, Slice::from("b"), Slice::from("1"));
        mem.delete(3, Slice::from("b"));
        mem.add(4, Slice::from("a"), Slice::from("new"));
        mem.add(5, Slice::from("c"), Slice::from("1"));

        let mut old = mem.cursor(2, false, None);
        assert_eq!(keys(&mut old), vec!["a", "b"]);
        assert!(old.seek(&Slice::from("a")).unwrap());
        assert_eq!(old.value(), Slice::from("old"));

        let mut latest = mem.cursor(5, false, None);
        assert_eq!(keys(&mut latest), vec!["a", "c"]);
        assert!(latest.seek_to_first().unwrap());
        assert_eq!(latest.value(), Slice::from("new"));
    }

    #[test]
    fn test_memtable_cursor_checksum_failure() {
        let mem = MemTable::new();
        let key = Slice::from("bad");
        mem.insert_raw(1, key.clone(), MemEntry::corrupted(&key, Slice::from("v")));

        let stats = Arc::new(Statistics::new());
        let mut cursor = mem.cursor(1, true, Some(stats.clone()));
        assert!(cursor.seek_to_first().unwrap_err().is_corruption());
        assert_eq!(stats.num_checksum_failures(), 1);

        let mut lenient = mem.cursor(1, false, None);
        assert!(lenient.seek_to_first().unwrap());
    }
}
