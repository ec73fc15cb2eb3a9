//! Remote source abstraction.
//!
//! Defines the trait the sync engine pulls from, allowing it to work with
//! the HTTP backend or an in-memory fake.

use crate::error::SyncResult;
use async_trait::async_trait;
use flagsync_types::{DownloadConfigRequest, IdListCatalogRequest, IdListMetadata, SyncSnapshot};
use std::collections::HashMap;

/// Body and declared length of a byte-range fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeResponse {
    /// Raw bytes from the requested offset to end-of-resource.
    pub body: Vec<u8>,
    /// Length the server declared for this range.
    pub content_length: i64,
}

impl RangeResponse {
    /// Builds a response whose declared length matches the body.
    pub fn from_body(body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        let content_length = body.len() as i64;
        Self {
            body,
            content_length,
        }
    }
}

/// The server side of synchronization.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetches everything changed since `request.since_time`.
    async fn fetch_config_snapshot(&self, request: &DownloadConfigRequest)
    -> SyncResult<SyncSnapshot>;

    /// Fetches the catalog of currently known ID lists, keyed by name.
    async fn fetch_id_list_catalog(
        &self,
        request: &IdListCatalogRequest,
    ) -> SyncResult<HashMap<String, IdListMetadata>>;

    /// Fetches `url` from byte `offset` to the end (`Range: bytes=<offset>-`).
    async fn fetch_range(&self, url: &str, offset: u64) -> SyncResult<RangeResponse>;
}

/// An in-memory remote source for testing.
pub mod mock {
    use super::*;
    use crate::error::SyncError;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct MockState {
        snapshots: VecDeque<Result<SyncSnapshot, String>>,
        last_time: i64,
        catalog: HashMap<String, IdListMetadata>,
        catalog_error: Option<String>,
        contents: HashMap<String, Vec<u8>>,
        range_overrides: HashMap<String, RangeResponse>,
        range_failures: HashMap<String, String>,
        snapshot_requests: Vec<DownloadConfigRequest>,
        catalog_requests: usize,
        range_requests: Vec<(String, u64)>,
    }

    /// Scripted remote source.
    ///
    /// Snapshot replies are consumed in order; once the queue is empty every
    /// poll answers "no updates". Range fetches serve the suffix of the
    /// content registered for a URL unless an override or failure is set.
    #[derive(Default)]
    pub struct MockRemoteSource {
        state: Mutex<MockState>,
    }

    impl MockRemoteSource {
        /// Creates an empty mock.
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues a snapshot reply.
        pub fn push_snapshot(&self, snapshot: SyncSnapshot) {
            self.state.lock().snapshots.push_back(Ok(snapshot));
        }

        /// Queues a transport failure for the next snapshot request.
        pub fn push_snapshot_error(&self, message: impl Into<String>) {
            self.state.lock().snapshots.push_back(Err(message.into()));
        }

        /// Replaces the catalog returned by every subsequent request.
        pub fn set_catalog(&self, entries: impl IntoIterator<Item = IdListMetadata>) {
            let mut state = self.state.lock();
            state.catalog = entries.into_iter().map(|e| (e.name.clone(), e)).collect();
            state.catalog_error = None;
        }

        /// Makes catalog requests fail until the catalog is set again.
        pub fn fail_catalog(&self, message: impl Into<String>) {
            self.state.lock().catalog_error = Some(message.into());
        }

        /// Sets the full content served for `url`.
        pub fn set_content(&self, url: impl Into<String>, content: impl Into<Vec<u8>>) {
            self.state.lock().contents.insert(url.into(), content.into());
        }

        /// Appends to the content served for `url`.
        pub fn append_content(&self, url: &str, content: impl AsRef<[u8]>) {
            self.state
                .lock()
                .contents
                .entry(url.to_string())
                .or_default()
                .extend_from_slice(content.as_ref());
        }

        /// Serves `response` verbatim for every fetch of `url`.
        pub fn set_range_response(&self, url: impl Into<String>, response: RangeResponse) {
            self.state.lock().range_overrides.insert(url.into(), response);
        }

        /// Makes fetches of `url` fail with a network error.
        pub fn fail_range(&self, url: impl Into<String>, message: impl Into<String>) {
            self.state
                .lock()
                .range_failures
                .insert(url.into(), message.into());
        }

        /// Snapshot requests received so far.
        pub fn snapshot_requests(&self) -> Vec<DownloadConfigRequest> {
            self.state.lock().snapshot_requests.clone()
        }

        /// Number of catalog requests received so far.
        pub fn catalog_requests(&self) -> usize {
            self.state.lock().catalog_requests
        }

        /// `(url, offset)` of every range request received so far.
        pub fn range_requests(&self) -> Vec<(String, u64)> {
            self.state.lock().range_requests.clone()
        }
    }

    #[async_trait]
    impl RemoteSource for MockRemoteSource {
        async fn fetch_config_snapshot(
            &self,
            request: &DownloadConfigRequest,
        ) -> SyncResult<SyncSnapshot> {
            let mut state = self.state.lock();
            state.snapshot_requests.push(request.clone());
            match state.snapshots.pop_front() {
                Some(Ok(snapshot)) => {
                    state.last_time = state.last_time.max(snapshot.time);
                    Ok(snapshot)
                }
                Some(Err(message)) => Err(SyncError::Network(message)),
                None => Ok(SyncSnapshot::unchanged(state.last_time)),
            }
        }

        async fn fetch_id_list_catalog(
            &self,
            _request: &IdListCatalogRequest,
        ) -> SyncResult<HashMap<String, IdListMetadata>> {
            let mut state = self.state.lock();
            state.catalog_requests += 1;
            if let Some(message) = &state.catalog_error {
                return Err(SyncError::Network(message.clone()));
            }
            Ok(state.catalog.clone())
        }

        async fn fetch_range(&self, url: &str, offset: u64) -> SyncResult<RangeResponse> {
            let mut state = self.state.lock();
            state.range_requests.push((url.to_string(), offset));
            if let Some(message) = state.range_failures.get(url) {
                return Err(SyncError::Network(message.clone()));
            }
            if let Some(response) = state.range_overrides.get(url) {
                return Ok(response.clone());
            }
            let content = state
                .contents
                .get(url)
                .ok_or_else(|| SyncError::Status {
                    status: 404,
                    body: format!("no content for {url}"),
                })?;
            let start = (offset as usize).min(content.len());
            Ok(RangeResponse::from_body(content[start..].to_vec()))
        }
    }
}
