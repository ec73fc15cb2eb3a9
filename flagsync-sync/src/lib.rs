//! Replica sync engine for flagsync.
//!
//! Keeps an in-process, eventually consistent mirror of server-side
//! configuration and of large targeting ID lists, refreshed on timers while
//! serving lookups that never wait on the network.
//!
//! # Architecture
//!
//! ## Components
//!
//! - **Source**: the remote side ([`RemoteSource`]), over HTTP or in memory
//! - **Config store**: gates, dynamic configs, and layers, swapped as a unit
//! - **ID list registry**: per-list generations with concurrent membership sets
//! - **ID list sync**: byte-range delta fetches with `+`/`-` records
//! - **Engine**: bootstrap, initial sync, poll loops, and shutdown
//!
//! ## Sync Process
//!
//! 1. **Seed**: optionally load a bootstrap snapshot
//! 2. **Config sync**: fetch changes since the last sync time, swap on update
//! 3. **Catalog**: fetch the ID list catalog and decide per list whether to
//!    reset, grow, or skip
//! 4. **Delta**: fetch unseen bytes for lists that are behind and apply them
//! 5. **Poll**: repeat 2 and 3–4 on independent intervals until shutdown
//!
//! # Example
//!
//! ```
//! use flagsync_sync::source::mock::MockRemoteSource;
//! use flagsync_sync::{SyncConfig, SyncEngine};
//! use std::sync::Arc;
//!
//! let source = Arc::new(MockRemoteSource::new());
//! let engine = SyncEngine::builder(source)
//!     .config(SyncConfig::default())
//!     .build();
//!
//! assert!(engine.lookup_gate("new_checkout").is_none());
//! ```

mod config;
mod config_store;
pub mod delta;
mod engine;
mod error;
pub mod http;
mod id_list;
pub mod id_sync;
mod poller;
mod registry;
pub mod sink;
pub mod source;

pub use config::{
    SyncConfig, DEFAULT_CONFIG_SYNC_INTERVAL_MS, DEFAULT_ID_LIST_SYNC_INTERVAL_MS,
    DEFAULT_MAX_CONCURRENT_LIST_FETCHES,
};
pub use config_store::{ConfigStore, SpecCounts};
pub use engine::{RulesUpdatedCallback, SyncEngine, SyncEngineBuilder};
pub use error::{SyncError, SyncResult};
pub use http::{HttpRemoteSource, HttpSourceConfig};
pub use id_list::IdList;
pub use id_sync::{reconcile_catalog, ReconcileReport};
pub use registry::IdListRegistry;
pub use sink::{CollectingErrorSink, ErrorSink, LogErrorSink, SyncPhase};
pub use source::{RangeResponse, RemoteSource};
