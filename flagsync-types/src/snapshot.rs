//! Sync snapshots, the ID list catalog, and request envelopes.

use crate::metadata::SdkMetadata;
use crate::serde_util::null_default;
use crate::spec::{ConfigKind, ConfigSpec};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The atomic unit returned by a full config sync.
///
/// When `has_updates` is false the snapshot is a no-op probe and carries no
/// state worth applying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    #[serde(default)]
    pub has_updates: bool,
    /// Server time (ms) of this snapshot, used as the next `sinceTime`.
    #[serde(default)]
    pub time: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub feature_gates: Vec<ConfigSpec>,
    #[serde(default, deserialize_with = "null_default")]
    pub dynamic_configs: Vec<ConfigSpec>,
    #[serde(default, deserialize_with = "null_default")]
    pub layer_configs: Vec<ConfigSpec>,
    /// Names of ID lists the server currently knows about.
    #[serde(default, deserialize_with = "null_default")]
    pub id_lists: HashMap<String, bool>,
}

impl SyncSnapshot {
    /// Creates an updating snapshot at `time` with no configs.
    pub fn updated(time: i64) -> Self {
        Self {
            has_updates: true,
            time,
            ..Default::default()
        }
    }

    /// Creates a "nothing changed" probe response.
    pub fn unchanged(time: i64) -> Self {
        Self {
            has_updates: false,
            time,
            ..Default::default()
        }
    }

    /// Adds a gate.
    #[must_use]
    pub fn with_gate(mut self, spec: ConfigSpec) -> Self {
        self.feature_gates.push(spec);
        self
    }

    /// Adds a dynamic config.
    #[must_use]
    pub fn with_dynamic_config(mut self, spec: ConfigSpec) -> Self {
        self.dynamic_configs.push(spec);
        self
    }

    /// Adds a layer config.
    #[must_use]
    pub fn with_layer(mut self, spec: ConfigSpec) -> Self {
        self.layer_configs.push(spec);
        self
    }

    /// Returns the collection holding specs of `kind`.
    pub fn specs(&self, kind: ConfigKind) -> &[ConfigSpec] {
        match kind {
            ConfigKind::Gate => &self.feature_gates,
            ConfigKind::DynamicConfig => &self.dynamic_configs,
            ConfigKind::Layer => &self.layer_configs,
        }
    }

    /// Parses a snapshot from its JSON serialization (e.g. a bootstrap blob).
    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(Error::EmptyPayload);
        }
        Ok(serde_json::from_str(raw)?)
    }

    /// Serializes the snapshot back to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// One entry of the server's ID list catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdListMetadata {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    /// Total bytes of the backing object on the server.
    #[serde(default)]
    pub size: u64,
    /// Set once per generation; a newer value signals a full reset.
    #[serde(default)]
    pub creation_time: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub url: String,
    /// Content-version of the backing object.
    #[serde(rename = "fileID", default, deserialize_with = "null_default")]
    pub file_id: String,
}

impl IdListMetadata {
    /// Returns true when the entry is unusable regardless of local state.
    pub fn is_malformed(&self) -> bool {
        self.url.is_empty() || self.file_id.is_empty()
    }
}

/// Body of a full config sync request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadConfigRequest {
    /// Cursor: server time of the last committed snapshot, 0 when none.
    pub since_time: i64,
    pub statsig_metadata: SdkMetadata,
}

/// Body of an ID list catalog request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdListCatalogRequest {
    pub statsig_metadata: SdkMetadata,
}
