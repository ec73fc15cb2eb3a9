//! Sync engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default full config resync interval (ms).
pub const DEFAULT_CONFIG_SYNC_INTERVAL_MS: u64 = 10_000;
/// Default ID list catalog resync interval (ms).
pub const DEFAULT_ID_LIST_SYNC_INTERVAL_MS: u64 = 60_000;
/// Default cap on concurrent ID list range fetches per reconcile.
pub const DEFAULT_MAX_CONCURRENT_LIST_FETCHES: usize = 16;

/// Configuration for the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Interval between full config resyncs (ms). 0 selects the default.
    pub config_sync_interval_ms: u64,
    /// Interval between ID list catalog resyncs (ms). 0 selects the default.
    pub id_list_sync_interval_ms: u64,
    /// Maximum range fetches in flight during one reconcile. 0 selects the default.
    pub max_concurrent_list_fetches: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            config_sync_interval_ms: DEFAULT_CONFIG_SYNC_INTERVAL_MS,
            id_list_sync_interval_ms: DEFAULT_ID_LIST_SYNC_INTERVAL_MS,
            max_concurrent_list_fetches: DEFAULT_MAX_CONCURRENT_LIST_FETCHES,
        }
    }
}

impl SyncConfig {
    /// Effective config resync interval.
    pub fn config_sync_interval(&self) -> Duration {
        Duration::from_millis(non_zero_or(
            self.config_sync_interval_ms,
            DEFAULT_CONFIG_SYNC_INTERVAL_MS,
        ))
    }

    /// Effective ID list resync interval.
    pub fn id_list_sync_interval(&self) -> Duration {
        Duration::from_millis(non_zero_or(
            self.id_list_sync_interval_ms,
            DEFAULT_ID_LIST_SYNC_INTERVAL_MS,
        ))
    }

    /// Effective fan-out bound.
    pub fn fetch_concurrency(&self) -> usize {
        if self.max_concurrent_list_fetches == 0 {
            DEFAULT_MAX_CONCURRENT_LIST_FETCHES
        } else {
            self.max_concurrent_list_fetches
        }
    }
}

fn non_zero_or(value: u64, default: u64) -> u64 {
    if value == 0 { default } else { value }
}
