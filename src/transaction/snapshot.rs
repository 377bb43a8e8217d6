use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;

use crate::{observability::log_debug, statistics::Statistics};

/// Registry of live snapshots of one store.
///
/// Maps a sequence number to the number of independent handles pinning it.
/// Open cursors without a snapshot pin their read sequence in a separate
/// table, so they are not counted as snapshots. Compaction consults both
/// to decide which versions are still observable.
#[derive(Debug)]
pub struct SnapshotList {
    db_id: u64,
    live: Mutex<BTreeMap<u64, usize>>,
    cursors: Mutex<BTreeMap<u64, usize>>,
    statistics: Option<Arc<Statistics>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PinKind {
    Snapshot,
    Cursor,
}

impl SnapshotList {
    pub fn new(db_id: u64, statistics: Option<Arc<Statistics>>) -> Arc<Self> {
        Arc::new(SnapshotList {
            db_id,
            live: Mutex::new(BTreeMap::new()),
            cursors: Mutex::new(BTreeMap::new()),
            statistics,
        })
    }

    /// Pin `sequence` and return a handle that unpins it on last drop.
    pub fn acquire(self: &Arc<Self>, sequence: u64) -> Snapshot {
        *self.live.lock().entry(sequence).or_insert(0) += 1;
        if let Some(stats) = &self.statistics {
            stats.record_snapshot_created();
        }
        log_debug!(
            component = "snapshot",
            event = "snapshot_acquired",
            db_id = self.db_id,
            sequence = sequence,
        );
        self.handle(sequence, PinKind::Snapshot)
    }

    /// Pin the read sequence of an open cursor.
    ///
    /// Keeps compaction from dropping versions the cursor can still reach.
    /// Not counted as a snapshot.
    pub(crate) fn pin_cursor(self: &Arc<Self>, sequence: u64) -> Snapshot {
        *self.cursors.lock().entry(sequence).or_insert(0) += 1;
        self.handle(sequence, PinKind::Cursor)
    }

    fn handle(self: &Arc<Self>, sequence: u64, kind: PinKind) -> Snapshot {
        Snapshot {
            sequence,
            db_id: self.db_id,
            marker: Arc::new(SnapshotMarker {
                sequence,
                kind,
                list: Arc::downgrade(self),
            }),
        }
    }

    fn release(&self, sequence: u64, kind: PinKind) {
        let table = match kind {
            PinKind::Snapshot => &self.live,
            PinKind::Cursor => &self.cursors,
        };
        let mut pins = table.lock();
        if let Some(count) = pins.get_mut(&sequence) {
            *count -= 1;
            if *count == 0 {
                pins.remove(&sequence);
            }
        }
        drop(pins);
        if kind == PinKind::Cursor {
            return;
        }
        if let Some(stats) = &self.statistics {
            stats.record_snapshot_released();
        }
        log_debug!(
            component = "snapshot",
            event = "snapshot_released",
            db_id = self.db_id,
            sequence = sequence,
        );
    }

    /// Sequence numbers pinned by a snapshot or an open cursor, ascending
    /// and deduplicated.
    pub fn sequences(&self) -> Vec<u64> {
        let mut sequences: Vec<u64> = self.live.lock().keys().copied().collect();
        sequences.extend(self.cursors.lock().keys().copied());
        sequences.sort_unstable();
        sequences.dedup();
        sequences
    }

    /// Number of distinct sequence numbers pinned by snapshots.
    pub fn len(&self) -> usize {
        self.live.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.lock().is_empty()
    }
}

/// Snapshot provides a consistent point-in-time view of a store.
///
/// Cloning shares the same pin: the store keeps the view alive until the
/// last clone is dropped.
#[derive(Clone)]
pub struct Snapshot {
    /// Sequence number at snapshot creation
    sequence: u64,
    /// Identity of the owning store
    db_id: u64,
    /// Shared pin; unregisters the sequence when the last clone drops
    marker: Arc<SnapshotMarker>,
}

/// Marker to track snapshot lifetime
struct SnapshotMarker {
    sequence: u64,
    kind: PinKind,
    list: Weak<SnapshotList>,
}

impl Snapshot {
    /// Get the snapshot's sequence number
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Identity of the store that issued this snapshot.
    #[inline]
    pub fn db_id(&self) -> u64 {
        self.db_id
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("sequence", &self.sequence)
            .field("db_id", &self.db_id)
            .finish()
    }
}

impl Drop for SnapshotMarker {
    fn drop(&mut self) {
        // The store may already be gone; nothing left to unpin then.
        if let Some(list) = self.list.upgrade() {
            list.release(self.sequence, self.kind);
        }
    }
}
