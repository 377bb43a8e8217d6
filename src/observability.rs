//! Structured logging for rucksjoin.
//!
//! All events go through `tracing` with target `"rucksjoin"`, an `event`
//! field (snake_case) and a `component` field naming the subsystem
//! (`"db"`, `"cursor"`, `"snapshot"`, `"range"`, `"merge_join"`).
//!
//! The library never installs a subscriber; applications pick one.

pub(crate) const RUCKSJOIN_TARGET: &str = "rucksjoin";

/// Macro for info-level log events.
///
/// # Example
/// ```ignore
/// log_info!(
///     component = "snapshot",
///     event = "snapshot_refreshed",
///     sequence = snapshot.sequence(),
/// );
/// ```
macro_rules! log_info {
    ($($field:tt)*) => {
        ::tracing::info!(target: $crate::observability::RUCKSJOIN_TARGET, $($field)*)
    };
}

/// Macro for debug-level log events.
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::RUCKSJOIN_TARGET, $($field)*)
    };
}

/// Macro for warn-level log events.
macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::RUCKSJOIN_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_info;
pub(crate) use log_warn;
