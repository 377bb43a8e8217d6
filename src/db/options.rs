use serde::{Deserialize, Serialize};

use crate::{transaction::Snapshot, util::Result};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Accepted for interface parity; the in-memory store has nothing to sync.
    pub sync: bool,
}

/// Options consumed when a read or a cursor is opened.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Verify the checksum of every entry visited on behalf of this read.
    pub verify_checksums: bool,
    /// When false, the read is a bulk scan that should not displace cached
    /// data; the store records it as a cache bypass.
    pub fill_cache: bool,
    /// Read at this point-in-time view instead of the latest state.
    #[serde(skip)]
    pub snapshot: Option<Snapshot>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            verify_checksums: false,
            fill_cache: true,
            snapshot: None,
        }
    }
}

impl ReadOptions {
    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DBOptions {
    /// Verify entry checksums on every read, whatever the read options say.
    pub paranoid_checks: bool,
    /// Maintain `Statistics` counters.
    pub statistics: bool,
}

impl Default for DBOptions {
    fn default() -> Self {
        DBOptions {
            paranoid_checks: false,
            statistics: true,
        }
    }
}

impl DBOptions {
    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
