use std::sync::atomic::{AtomicU64, Ordering};

/// Store-wide statistics
///
/// Thread-safe counters for reads, writes, cursor traffic and snapshot
/// lifetimes. Uses atomic counters for lock-free updates.
#[derive(Debug, Default)]
pub struct Statistics {
    // Point operations
    pub num_keys_written: AtomicU64,
    pub num_keys_read: AtomicU64,
    pub num_keys_deleted: AtomicU64,
    pub bytes_written: AtomicU64,
    pub bytes_read: AtomicU64,

    // Cursor traffic
    pub num_cursors_opened: AtomicU64,
    pub num_cursors_released: AtomicU64,
    pub num_entries_scanned: AtomicU64,
    pub num_fill_cache_bypass: AtomicU64,

    // Snapshots
    pub num_snapshots_created: AtomicU64,
    pub num_snapshots_released: AtomicU64,

    // Compaction
    pub num_compactions: AtomicU64,
    pub num_versions_dropped: AtomicU64,

    // Integrity
    pub num_checksum_failures: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    #[inline]
    pub fn record_write(&self, bytes: u64) {
        self.num_keys_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_read(&self, bytes: u64) {
        self.num_keys_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_delete(&self) {
        self.num_keys_deleted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cursor_open(&self, fill_cache: bool) {
        self.num_cursors_opened.fetch_add(1, Ordering::Relaxed);
        if !fill_cache {
            self.num_fill_cache_bypass.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_cursor_release(&self) {
        self.num_cursors_released.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_scan(&self) {
        self.num_entries_scanned.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_snapshot_created(&self) {
        self.num_snapshots_created.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_snapshot_released(&self) {
        self.num_snapshots_released.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_compaction(&self, versions_dropped: u64) {
        self.num_compactions.fetch_add(1, Ordering::Relaxed);
        self.num_versions_dropped
            .fetch_add(versions_dropped, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_checksum_failure(&self) {
        self.num_checksum_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn num_keys_written(&self) -> u64 {
        self.num_keys_written.load(Ordering::Relaxed)
    }

    pub fn num_keys_read(&self) -> u64 {
        self.num_keys_read.load(Ordering::Relaxed)
    }

    pub fn num_keys_deleted(&self) -> u64 {
        self.num_keys_deleted.load(Ordering::Relaxed)
    }

    pub fn num_cursors_opened(&self) -> u64 {
        self.num_cursors_opened.load(Ordering::Relaxed)
    }

    pub fn num_cursors_released(&self) -> u64 {
        self.num_cursors_released.load(Ordering::Relaxed)
    }

    /// Cursors opened and not yet dropped.
    pub fn num_live_cursors(&self) -> u64 {
        self.num_cursors_opened()
            .saturating_sub(self.num_cursors_released())
    }

    pub fn num_entries_scanned(&self) -> u64 {
        self.num_entries_scanned.load(Ordering::Relaxed)
    }

    pub fn num_fill_cache_bypass(&self) -> u64 {
        self.num_fill_cache_bypass.load(Ordering::Relaxed)
    }

    pub fn num_snapshots_created(&self) -> u64 {
        self.num_snapshots_created.load(Ordering::Relaxed)
    }

    pub fn num_snapshots_released(&self) -> u64 {
        self.num_snapshots_released.load(Ordering::Relaxed)
    }

    pub fn num_compactions(&self) -> u64 {
        self.num_compactions.load(Ordering::Relaxed)
    }

    pub fn num_versions_dropped(&self) -> u64 {
        self.num_versions_dropped.load(Ordering::Relaxed)
    }

    pub fn num_checksum_failures(&self) -> u64 {
        self.num_checksum_failures.load(Ordering::Relaxed)
    }

    /// Reset all statistics to zero
    pub fn reset(&self) {
        self.num_keys_written.store(0, Ordering::Relaxed);
        self.num_keys_read.store(0, Ordering::Relaxed);
        self.num_keys_deleted.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.bytes_read.store(0, Ordering::Relaxed);
        self.num_cursors_opened.store(0, Ordering::Relaxed);
        self.num_cursors_released.store(0, Ordering::Relaxed);
        self.num_entries_scanned.store(0, Ordering::Relaxed);
        self.num_fill_cache_bypass.store(0, Ordering::Relaxed);
        self.num_snapshots_created.store(0, Ordering::Relaxed);
        self.num_snapshots_released.store(0, Ordering::Relaxed);
        self.num_compactions.store(0, Ordering::Relaxed);
        self.num_versions_dropped.store(0, Ordering::Relaxed);
        self.num_checksum_failures.store(0, Ordering::Relaxed);
    }

    /// Get a formatted statistics report
    pub fn report(&self) -> String {
        format!(
            "Store Statistics:\n\
            \n\
            Operations:\n\
            - Keys written:  {}\n\
            - Keys read:     {}\n\
            - Keys deleted:  {}\n\
            - Bytes written: {} ({:.2} MB)\n\
            - Bytes read:    {} ({:.2} MB)\n\
            \n\
            Cursors:\n\
            - Opened:        {}\n\
            - Released:      {}\n\
            - Entries:       {}\n\
            - Cache bypass:  {}\n\
            \n\
            Snapshots:\n\
            - Created:       {}\n\
            - Released:      {}\n\
            \n\
            Compaction:\n\
            - Runs:          {}\n\
            - Dropped:       {}\n\
            \n\
            Checksum failures: {}",
            self.num_keys_written(),
            self.num_keys_read(),
            self.num_keys_deleted(),
            self.bytes_written.load(Ordering::Relaxed),
            self.bytes_written.load(Ordering::Relaxed) as f64 / 1024.0 / 1024.0,
            self.bytes_read.load(Ordering::Relaxed),
            self.bytes_read.load(Ordering::Relaxed) as f64 / 1024.0 / 1024.0,
            self.num_cursors_opened(),
            self.num_cursors_released(),
            self.num_entries_scanned(),
            self.num_fill_cache_bypass(),
            self.num_snapshots_created(),
            self.num_snapshots_released(),
            self.num_compactions(),
            self.num_versions_dropped(),
            self.num_checksum_failures(),
        )
    }
}
