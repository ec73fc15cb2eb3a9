//! ID list catalog reconciliation.
//!
//! ## Reconcile Process
//!
//! 1. **Catalog**: fetch name → metadata from the remote source
//! 2. **Admit**: create placeholders for unseen names, skip stale or
//!    malformed entries, start a fresh generation on a content-version change
//! 3. **Fetch**: pull `[size, end)` for every list that is behind, one task
//!    per list, bounded by a semaphore and joined before returning
//! 4. **Apply**: validate the range and apply its `+`/`-` records
//! 5. **Prune**: drop lists the catalog no longer mentions

use crate::delta;
use crate::error::{SyncError, SyncResult};
use crate::id_list::IdList;
use crate::registry::IdListRegistry;
use crate::source::RemoteSource;
use flagsync_types::{IdListCatalogRequest, IdListMetadata};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome of one reconcile pass.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Lists whose range was fetched and applied.
    pub updated: Vec<String>,
    /// Lists that started a new generation.
    pub reset: Vec<String>,
    /// Catalog entries skipped as stale or malformed.
    pub skipped: Vec<String>,
    /// Lists discarded because their content was corrupt.
    pub discarded: Vec<String>,
    /// Lists dropped because the catalog no longer mentions them.
    pub pruned: Vec<String>,
    /// Per-list failures, including the ones that caused a discard.
    pub errors: Vec<(String, SyncError)>,
}

/// Result of applying one range to one list.
#[derive(Debug, Clone, Copy)]
struct Applied {
    records: usize,
    size: u64,
}

/// Reconciles the registry against the catalog returned by `source`.
///
/// Only a failed catalog fetch is returned as an error; per-list failures
/// are collected in the report.
pub async fn reconcile_catalog(
    registry: &Arc<IdListRegistry>,
    source: &Arc<dyn RemoteSource>,
    request: &IdListCatalogRequest,
    concurrency: usize,
) -> SyncResult<ReconcileReport> {
    let catalog = source.fetch_id_list_catalog(request).await?;
    let mut report = ReconcileReport::default();

    let pending = admit_catalog(registry, &catalog, &mut report);
    fetch_all(registry, source, pending, concurrency.max(1), &mut report).await;

    report.pruned = registry.prune(|name| catalog.contains_key(name));
    for name in &report.pruned {
        info!(list = %name, "Removed id list absent from catalog");
    }

    Ok(report)
}

/// Updates list generations from the catalog and returns the lists to fetch.
fn admit_catalog(
    registry: &IdListRegistry,
    catalog: &HashMap<String, IdListMetadata>,
    report: &mut ReconcileReport,
) -> Vec<Arc<IdList>> {
    let mut pending = Vec::new();

    for (name, server) in catalog {
        let mut local = registry.get_or_insert_placeholder(name);

        if server.is_malformed() || server.creation_time < local.creation_time() {
            debug!(
                list = %name,
                server_creation = server.creation_time,
                local_creation = local.creation_time(),
                "Skipping stale or malformed catalog entry"
            );
            report.skipped.push(name.clone());
            continue;
        }

        if local.is_superseded_by(server) {
            debug!(
                list = %name,
                from = local.file_id(),
                to = %server.file_id,
                "Starting new id list generation"
            );
            local = Arc::new(IdList::fresh_generation(name.clone(), server));
            registry.put(Arc::clone(&local));
            report.reset.push(name.clone());
        }

        if server.size <= local.size() {
            continue;
        }
        pending.push(local);
    }

    pending
}

async fn fetch_all(
    registry: &IdListRegistry,
    source: &Arc<dyn RemoteSource>,
    pending: Vec<Arc<IdList>>,
    concurrency: usize,
    report: &mut ReconcileReport,
) {
    if pending.is_empty() {
        return;
    }

    let limiter = Arc::new(Semaphore::new(concurrency));
    let mut join_set: JoinSet<(Arc<IdList>, SyncResult<Applied>)> = JoinSet::new();

    for list in pending {
        let source = Arc::clone(source);
        let limiter = Arc::clone(&limiter);
        join_set.spawn(async move {
            let result = match limiter.acquire_owned().await {
                Ok(_permit) => sync_list(source.as_ref(), &list).await,
                Err(_) => Err(SyncError::Network("fetch limiter closed".to_string())),
            };
            (list, result)
        });
    }

    while let Some(joined) = join_set.join_next().await {
        let (list, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                warn!(error = %e, "id list fetch task failed (JoinError)");
                continue;
            }
        };
        let name = list.name().to_string();

        match result {
            Ok(applied) => {
                debug!(
                    list = %name,
                    records = applied.records,
                    size = applied.size,
                    "Applied id list range"
                );
                report.updated.push(name);
            }
            Err(e) if e.discards_list() => {
                if registry.remove_if_current(&list) {
                    warn!(list = %name, error = %e, "Discarded id list");
                }
                report.discarded.push(name.clone());
                report.errors.push((name, e));
            }
            Err(e) => report.errors.push((name, e)),
        }
    }
}

/// Fetches the unseen suffix of `list` and applies it in place.
async fn sync_list(source: &dyn RemoteSource, list: &IdList) -> SyncResult<Applied> {
    let response = source.fetch_range(list.url(), list.size()).await?;

    if response.content_length <= 0 {
        return Err(SyncError::InvalidContentLength {
            list: list.name().to_string(),
            length: response.content_length,
        });
    }
    if !delta::is_well_formed(&response.body) {
        return Err(SyncError::CorruptListContent {
            list: list.name().to_string(),
        });
    }

    let content =
        std::str::from_utf8(&response.body).map_err(|_| SyncError::CorruptListContent {
            list: list.name().to_string(),
        })?;
    let records = delta::apply_records(list, content);
    let size = list.advance(response.content_length as u64);

    Ok(Applied { records, size })
}
