//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// None of these reach readers; they are routed to an
/// [`ErrorSink`](crate::ErrorSink) and the last-known-good state keeps serving.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Serialization error (malformed snapshot or catalog payload).
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A range response reported no content.
    #[error("invalid content length {length} for id list {list}")]
    InvalidContentLength { list: String, length: i64 },

    /// A range response did not start with a `+`/`-` record or was not UTF-8.
    #[error("corrupt content for id list {list}")]
    CorruptListContent { list: String },
}

impl SyncError {
    /// Returns true for failures of the transport itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SyncError::Network(_) | SyncError::Http(_) | SyncError::Status { .. }
        )
    }

    /// Returns true when the affected ID list was discarded.
    pub fn discards_list(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidContentLength { .. } | SyncError::CorruptListContent { .. }
        )
    }
}
