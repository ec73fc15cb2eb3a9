//! Snapshot store for gates, dynamic configs, and layers.
//!
//! The three maps, the last sync time, and the init reason form one unit.
//! Incoming snapshots are indexed outside the lock and swapped in under a
//! single write; readers never see a mix of two snapshots.

use flagsync_types::{ConfigKind, ConfigSpec, InitReason, SyncSnapshot};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

type SpecMap = HashMap<String, ConfigSpec>;

#[derive(Debug, Default)]
struct Committed {
    gates: SpecMap,
    dynamic_configs: SpecMap,
    layers: SpecMap,
    last_sync_time: i64,
    init_reason: InitReason,
}

impl Committed {
    fn map(&self, kind: ConfigKind) -> &SpecMap {
        match kind {
            ConfigKind::Gate => &self.gates,
            ConfigKind::DynamicConfig => &self.dynamic_configs,
            ConfigKind::Layer => &self.layers,
        }
    }
}

/// Number of specs of each kind currently served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecCounts {
    pub gates: usize,
    pub dynamic_configs: usize,
    pub layers: usize,
}

/// In-memory mirror of the latest committed config snapshot.
#[derive(Debug, Default)]
pub struct ConfigStore {
    inner: RwLock<Committed>,
}

impl ConfigStore {
    /// Creates an empty, uninitialized store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a spec by kind and name.
    pub fn get(&self, kind: ConfigKind, name: &str) -> Option<ConfigSpec> {
        self.inner.read().map(kind).get(name).cloned()
    }

    pub fn gate(&self, name: &str) -> Option<ConfigSpec> {
        self.get(ConfigKind::Gate, name)
    }

    pub fn dynamic_config(&self, name: &str) -> Option<ConfigSpec> {
        self.get(ConfigKind::DynamicConfig, name)
    }

    pub fn layer(&self, name: &str) -> Option<ConfigSpec> {
        self.get(ConfigKind::Layer, name)
    }

    /// Server time of the last committed snapshot, 0 if none.
    pub fn last_sync_time(&self) -> i64 {
        self.inner.read().last_sync_time
    }

    pub fn init_reason(&self) -> InitReason {
        self.inner.read().init_reason
    }

    pub fn counts(&self) -> SpecCounts {
        let inner = self.inner.read();
        SpecCounts {
            gates: inner.gates.len(),
            dynamic_configs: inner.dynamic_configs.len(),
            layers: inner.layers.len(),
        }
    }

    /// Commits `snapshot` as a network sync.
    ///
    /// Returns false and leaves the store untouched when the snapshot has no
    /// updates.
    pub fn apply_snapshot(&self, snapshot: &SyncSnapshot) -> bool {
        self.commit(snapshot, InitReason::Network)
    }

    /// Commits `snapshot` as bootstrap data not yet verified by the network.
    pub fn seed_bootstrap(&self, snapshot: &SyncSnapshot) -> bool {
        self.commit(snapshot, InitReason::Bootstrap)
    }

    fn commit(&self, snapshot: &SyncSnapshot, reason: InitReason) -> bool {
        if !snapshot.has_updates {
            return false;
        }

        let next = Committed {
            gates: index(snapshot.specs(ConfigKind::Gate)),
            dynamic_configs: index(snapshot.specs(ConfigKind::DynamicConfig)),
            layers: index(snapshot.specs(ConfigKind::Layer)),
            last_sync_time: snapshot.time,
            init_reason: reason,
        };

        let previous = std::mem::replace(&mut *self.inner.write(), next);

        debug!(
            time = snapshot.time,
            gates = snapshot.feature_gates.len(),
            dynamic_configs = snapshot.dynamic_configs.len(),
            layers = snapshot.layer_configs.len(),
            %reason,
            "Committed config snapshot"
        );
        // Old maps are freed here, outside the lock.
        drop(previous);
        true
    }
}

/// Later duplicates win, matching a plain insert loop.
fn index(specs: &[ConfigSpec]) -> SpecMap {
    specs
        .iter()
        .map(|spec| (spec.name.clone(), spec.clone()))
        .collect()
}
