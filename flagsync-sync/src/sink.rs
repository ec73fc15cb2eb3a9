//! Error reporting seam.
//!
//! Sync failures never propagate to readers. They are handed to an
//! [`ErrorSink`] so the host can forward them to its own telemetry.

use crate::error::SyncError;
use parking_lot::Mutex;
use tracing::warn;

/// Where the sync phase was when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    /// Full config snapshot fetch.
    ConfigSync,
    /// ID list catalog fetch.
    IdListCatalog,
    /// Content fetch for a single ID list.
    IdListContent,
}

impl SyncPhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigSync => "config_sync",
            Self::IdListCatalog => "id_list_catalog",
            Self::IdListContent => "id_list_content",
        }
    }
}

/// Receives errors swallowed by the sync engine.
pub trait ErrorSink: Send + Sync {
    fn report(&self, phase: SyncPhase, error: &SyncError);
}

/// Default sink: logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, phase: SyncPhase, error: &SyncError) {
        warn!(phase = phase.as_str(), error = %error, "Sync error");
    }
}

/// Sink that keeps every report in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct CollectingErrorSink {
    reports: Mutex<Vec<(SyncPhase, String)>>,
}

impl CollectingErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reported `(phase, message)` pairs, oldest first.
    pub fn reports(&self) -> Vec<(SyncPhase, String)> {
        self.reports.lock().clone()
    }

    /// Number of reports for `phase`.
    pub fn count(&self, phase: SyncPhase) -> usize {
        self.reports.lock().iter().filter(|(p, _)| *p == phase).count()
    }
}

impl ErrorSink for CollectingErrorSink {
    fn report(&self, phase: SyncPhase, error: &SyncError) {
        self.reports.lock().push((phase, error.to_string()));
    }
}
