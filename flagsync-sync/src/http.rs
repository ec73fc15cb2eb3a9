//! HTTP remote source.
//!
//! Talks to the configuration API over JSON POSTs and pulls ID list content
//! with open-ended byte-range GETs.

use crate::error::{SyncError, SyncResult};
use crate::source::{RangeResponse, RemoteSource};
use async_trait::async_trait;
use flagsync_types::{DownloadConfigRequest, IdListCatalogRequest, IdListMetadata, SyncSnapshot};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, RANGE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Header carrying the server secret key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Configuration for [`HttpRemoteSource`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSourceConfig {
    /// Base URL of the configuration API, without a trailing slash.
    pub api_base_url: String,
    /// Server secret key.
    pub server_key: String,
    /// Per-request timeout (ms).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl HttpSourceConfig {
    /// Creates a config with the default timeout.
    pub fn new(api_base_url: impl Into<String>, server_key: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            server_key: server_key.into(),
            timeout_ms: default_timeout_ms(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url.trim_end_matches('/'), path)
    }
}

/// [`RemoteSource`] backed by `reqwest`.
pub struct HttpRemoteSource {
    config: HttpSourceConfig,
    client: Client,
}

impl HttpRemoteSource {
    /// Creates a new HTTP source.
    pub fn new(config: HttpSourceConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { config, client })
    }

    /// Returns the source configuration.
    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> SyncResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.server_key)
            .json(body)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("{path} request failed: {e}")))?;

        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

async fn ensure_success(response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Reads the `Content-Length` of a range response.
///
/// A missing or unparsable header yields 0, which the reconciler rejects.
pub fn declared_content_length(headers: &HeaderMap) -> i64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

/// The catalog endpoint may answer `null` for an account with no lists.
#[derive(Deserialize)]
#[serde(transparent)]
struct CatalogBody(Option<HashMap<String, IdListMetadata>>);

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch_config_snapshot(
        &self,
        request: &DownloadConfigRequest,
    ) -> SyncResult<SyncSnapshot> {
        self.post_json("download_config_specs", request).await
    }

    async fn fetch_id_list_catalog(
        &self,
        request: &IdListCatalogRequest,
    ) -> SyncResult<HashMap<String, IdListMetadata>> {
        let CatalogBody(catalog) = self.post_json("get_id_lists", request).await?;
        Ok(catalog.unwrap_or_default())
    }

    async fn fetch_range(&self, url: &str, offset: u64) -> SyncResult<RangeResponse> {
        debug!(%url, offset, "GET range");

        let response = self
            .client
            .get(url)
            .header(RANGE, format!("bytes={offset}-"))
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("range fetch failed: {e}")))?;

        let response = ensure_success(response).await?;
        let content_length = declared_content_length(response.headers());
        let body = response.bytes().await?.to_vec();

        Ok(RangeResponse {
            body,
            content_length,
        })
    }
}
