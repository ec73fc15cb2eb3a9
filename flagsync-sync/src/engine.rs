//! Sync engine lifecycle and read path.
//!
//! Startup runs in a fixed order: seed from bootstrap values (if any), one
//! synchronous config sync, record the initial sync time, one catalog
//! reconcile, then the two poll loops. Lookups never wait on the network.

use crate::config::SyncConfig;
use crate::config_store::ConfigStore;
use crate::error::SyncError;
use crate::id_list::IdList;
use crate::id_sync::{self, ReconcileReport};
use crate::poller::Poller;
use crate::registry::IdListRegistry;
use crate::sink::{ErrorSink, LogErrorSink, SyncPhase};
use crate::source::RemoteSource;
use flagsync_types::{
    ConfigSpec, DownloadConfigRequest, IdListCatalogRequest, InitReason, SdkMetadata,
    SyncSnapshot,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Observer invoked with the serialized snapshot and its time whenever a
/// full resync commits new data.
pub type RulesUpdatedCallback = Arc<dyn Fn(&str, i64) + Send + Sync>;

/// State shared between the engine handle and its poll loops.
struct Shared {
    configs: ConfigStore,
    id_lists: Arc<IdListRegistry>,
    source: Arc<dyn RemoteSource>,
    metadata: SdkMetadata,
    config: SyncConfig,
    sink: Arc<dyn ErrorSink>,
    on_rules_updated: Option<RulesUpdatedCallback>,
    /// Held across fetch and commit so config syncs apply in request order.
    config_lock: tokio::sync::Mutex<()>,
    /// Serializes reconciles so manual and polled passes never interleave.
    reconcile_lock: tokio::sync::Mutex<()>,
    initial_sync_time: AtomicI64,
}

impl Shared {
    async fn sync_config(&self) -> bool {
        let _guard = self.config_lock.lock().await;
        let request = DownloadConfigRequest {
            since_time: self.configs.last_sync_time(),
            statsig_metadata: self.metadata.clone(),
        };

        let snapshot = match self.source.fetch_config_snapshot(&request).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.sink.report(SyncPhase::ConfigSync, &e);
                return false;
            }
        };

        if snapshot.has_updates && snapshot.time < request.since_time {
            warn!(
                time = snapshot.time,
                last_sync_time = request.since_time,
                "Ignoring config snapshot older than the last commit"
            );
            return false;
        }

        if !self.configs.apply_snapshot(&snapshot) {
            debug!(since_time = request.since_time, "No config updates");
            return false;
        }

        info!(time = snapshot.time, "Config snapshot updated");
        if let Some(callback) = &self.on_rules_updated {
            match serde_json::to_string(&snapshot) {
                Ok(raw) => callback(&raw, snapshot.time),
                Err(e) => self.sink.report(SyncPhase::ConfigSync, &SyncError::from(e)),
            }
        }
        true
    }

    async fn sync_id_lists(&self) -> Option<ReconcileReport> {
        let _guard = self.reconcile_lock.lock().await;
        let request = IdListCatalogRequest {
            statsig_metadata: self.metadata.clone(),
        };

        let report = match id_sync::reconcile_catalog(
            &self.id_lists,
            &self.source,
            &request,
            self.config.fetch_concurrency(),
        )
        .await
        {
            Ok(report) => report,
            Err(e) => {
                self.sink.report(SyncPhase::IdListCatalog, &e);
                return None;
            }
        };

        for (_, error) in &report.errors {
            self.sink.report(SyncPhase::IdListContent, error);
        }
        debug!(
            updated = report.updated.len(),
            reset = report.reset.len(),
            discarded = report.discarded.len(),
            pruned = report.pruned.len(),
            "ID list reconcile finished"
        );
        Some(report)
    }
}

/// Builder for [`SyncEngine`].
pub struct SyncEngineBuilder {
    source: Arc<dyn RemoteSource>,
    config: SyncConfig,
    metadata: SdkMetadata,
    bootstrap_values: Option<String>,
    sink: Arc<dyn ErrorSink>,
    on_rules_updated: Option<RulesUpdatedCallback>,
}

impl SyncEngineBuilder {
    /// Creates a builder pulling from `source` with default settings.
    pub fn new(source: Arc<dyn RemoteSource>) -> Self {
        Self {
            source,
            config: SyncConfig::default(),
            metadata: SdkMetadata::default(),
            bootstrap_values: None,
            sink: Arc::new(LogErrorSink),
            on_rules_updated: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: SdkMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Seeds the store from a serialized [`SyncSnapshot`] before the first sync.
    #[must_use]
    pub fn bootstrap_values(mut self, raw: impl Into<String>) -> Self {
        self.bootstrap_values = Some(raw.into());
        self
    }

    #[must_use]
    pub fn error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn on_rules_updated<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, i64) + Send + Sync + 'static,
    {
        self.on_rules_updated = Some(Arc::new(callback));
        self
    }

    /// Builds the engine and applies bootstrap values, without any network
    /// call and without starting the poll loops.
    pub fn build(self) -> SyncEngine {
        let shared = Arc::new(Shared {
            configs: ConfigStore::new(),
            id_lists: Arc::new(IdListRegistry::new()),
            source: self.source,
            metadata: self.metadata,
            config: self.config,
            sink: self.sink,
            on_rules_updated: self.on_rules_updated,
            config_lock: tokio::sync::Mutex::new(()),
            reconcile_lock: tokio::sync::Mutex::new(()),
            initial_sync_time: AtomicI64::new(0),
        });

        if let Some(raw) = self.bootstrap_values.as_deref() {
            seed_bootstrap(&shared.configs, raw);
        }

        SyncEngine {
            shared,
            poller: Poller::new(),
        }
    }

    /// Builds the engine, performs the initial sync, and starts polling.
    pub async fn start(self) -> SyncEngine {
        let engine = self.build();
        engine.initialize().await;
        engine.start_polling();
        engine
    }
}

fn seed_bootstrap(configs: &ConfigStore, raw: &str) {
    match SyncSnapshot::from_json(raw) {
        Ok(snapshot) => {
            if configs.seed_bootstrap(&snapshot) {
                info!(time = snapshot.time, "Seeded config from bootstrap values");
            } else {
                debug!("Bootstrap values carry no updates");
            }
        }
        Err(e) => warn!(error = %e, "Ignoring malformed bootstrap values"),
    }
}

/// Local replica of server-side configuration and ID lists.
pub struct SyncEngine {
    shared: Arc<Shared>,
    poller: Poller,
}

impl SyncEngine {
    /// Starts building an engine pulling from `source`.
    pub fn builder(source: Arc<dyn RemoteSource>) -> SyncEngineBuilder {
        SyncEngineBuilder::new(source)
    }

    /// Runs the initial config sync and catalog reconcile.
    pub async fn initialize(&self) {
        self.shared.sync_config().await;
        self.shared
            .initial_sync_time
            .store(self.shared.configs.last_sync_time(), Ordering::Release);
        self.shared.sync_id_lists().await;
    }

    /// Spawns the config and ID list poll loops. Later calls are no-ops.
    pub fn start_polling(&self) {
        if !self.poller.try_start() {
            warn!("Poll loops already started");
            return;
        }
        let config = &self.shared.config;

        let shared = Arc::clone(&self.shared);
        self.poller
            .spawn("config", config.config_sync_interval(), move || {
                let shared = Arc::clone(&shared);
                async move {
                    shared.sync_config().await;
                }
            });

        let shared = Arc::clone(&self.shared);
        self.poller
            .spawn("id_lists", config.id_list_sync_interval(), move || {
                let shared = Arc::clone(&shared);
                async move {
                    shared.sync_id_lists().await;
                }
            });
    }

    /// Fetches and applies a config snapshot now. Returns true if it committed.
    pub async fn full_resync(&self) -> bool {
        self.shared.sync_config().await
    }

    /// Reconciles ID lists against the server catalog now.
    ///
    /// Returns `None` if the catalog could not be fetched.
    pub async fn reconcile_id_lists(&self) -> Option<ReconcileReport> {
        self.shared.sync_id_lists().await
    }

    // ── Read path ────────────────────────────────────────────────

    pub fn lookup_gate(&self, name: &str) -> Option<ConfigSpec> {
        self.shared.configs.gate(name)
    }

    pub fn lookup_dynamic_config(&self, name: &str) -> Option<ConfigSpec> {
        self.shared.configs.dynamic_config(name)
    }

    pub fn lookup_layer(&self, name: &str) -> Option<ConfigSpec> {
        self.shared.configs.layer(name)
    }

    pub fn lookup_id_list(&self, name: &str) -> Option<Arc<IdList>> {
        self.shared.id_lists.get(name)
    }

    /// The snapshot store backing the config lookups.
    pub fn config_store(&self) -> &ConfigStore {
        &self.shared.configs
    }

    /// The registry backing ID list lookups.
    pub fn id_lists(&self) -> &IdListRegistry {
        &self.shared.id_lists
    }

    pub fn last_sync_time(&self) -> i64 {
        self.shared.configs.last_sync_time()
    }

    /// `last_sync_time` as observed right after the initial sync.
    pub fn initial_sync_time(&self) -> i64 {
        self.shared.initial_sync_time.load(Ordering::Acquire)
    }

    pub fn init_reason(&self) -> InitReason {
        self.shared.configs.init_reason()
    }

    // ── Shutdown ─────────────────────────────────────────────────

    /// Requests cooperative shutdown; loops exit on their next wake.
    pub fn stop_polling(&self) {
        info!("Stopping sync polling");
        self.poller.stop();
    }

    /// Requests shutdown and waits for both loops to exit.
    pub async fn shutdown(&self) {
        self.stop_polling();
        self.poller.join().await;
    }

    pub fn is_stopped(&self) -> bool {
        self.poller.is_stopped()
    }
}
