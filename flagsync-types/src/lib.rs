//! Core type definitions for flagsync.
//!
//! This crate defines the wire-level data model exchanged with the remote
//! configuration service:
//! - Configuration units (gates, dynamic configs, layers) and their rules
//! - Full sync snapshots and the ID list catalog
//! - Request envelopes and SDK metadata
//!
//! Nothing here interprets rule semantics; the evaluation engine that
//! consumes these types lives elsewhere.

mod metadata;
mod serde_util;
mod snapshot;
mod spec;

pub use metadata::{InitReason, SdkMetadata};
pub use snapshot::{DownloadConfigRequest, IdListCatalogRequest, IdListMetadata, SyncSnapshot};
pub use spec::{ConfigCondition, ConfigKind, ConfigRule, ConfigSpec};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("empty payload")]
    EmptyPayload,
}
