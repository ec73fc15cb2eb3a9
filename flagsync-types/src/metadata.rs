//! SDK identification and initialization state.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies this client to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkMetadata {
    pub sdk_type: String,
    pub sdk_version: String,
    /// Random per-process identifier.
    #[serde(rename = "sessionID")]
    pub session_id: String,
}

impl SdkMetadata {
    /// Creates metadata with a fresh session id.
    pub fn new(sdk_type: impl Into<String>, sdk_version: impl Into<String>) -> Self {
        Self {
            sdk_type: sdk_type.into(),
            sdk_version: sdk_version.into(),
            session_id: Uuid::new_v4().to_string(),
        }
    }
}

impl Default for SdkMetadata {
    fn default() -> Self {
        Self::new("rust-server", env!("CARGO_PKG_VERSION"))
    }
}

/// Where the currently served configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InitReason {
    /// No configuration has been loaded yet.
    #[default]
    Uninitialized,
    /// Seeded from a caller-supplied snapshot, not verified against the network.
    Bootstrap,
    /// Committed from a network sync.
    Network,
}

impl fmt::Display for InitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "Uninitialized",
            Self::Bootstrap => "Bootstrap",
            Self::Network => "Network",
        };
        f.write_str(s)
    }
}
