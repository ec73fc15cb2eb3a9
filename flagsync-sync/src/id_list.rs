//! A single incrementally synchronized ID list.

use dashmap::DashSet;
use flagsync_types::IdListMetadata;
use std::sync::atomic::{AtomicU64, Ordering};

/// One generation of a named membership set.
///
/// Generation metadata (`creation_time`, `url`, `file_id`) is fixed at
/// construction; a new generation is a new `IdList`. Within a generation
/// only `size` and the membership set change, both without an outer lock.
#[derive(Debug)]
pub struct IdList {
    name: String,
    size: AtomicU64,
    creation_time: i64,
    url: String,
    file_id: String,
    ids: DashSet<String>,
}

impl IdList {
    /// Creates the placeholder for a name first seen in a catalog.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: AtomicU64::new(0),
            creation_time: 0,
            url: String::new(),
            file_id: String::new(),
            ids: DashSet::new(),
        }
    }

    /// Creates an empty generation adopting the server's metadata.
    pub fn fresh_generation(name: impl Into<String>, server: &IdListMetadata) -> Self {
        Self {
            name: name.into(),
            size: AtomicU64::new(0),
            creation_time: server.creation_time,
            url: server.url.clone(),
            file_id: server.file_id.clone(),
            ids: DashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes of backing content ingested so far in this generation.
    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    pub fn creation_time(&self) -> i64 {
        self.creation_time
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Content-version of this generation.
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    /// Returns true if `id` is a member.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Snapshot of the current members, unordered.
    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().map(|id| id.key().clone()).collect()
    }

    pub(crate) fn insert(&self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub(crate) fn remove(&self, id: &str) {
        self.ids.remove(id);
    }

    /// Records `bytes` more ingested content; returns the new size.
    pub(crate) fn advance(&self, bytes: u64) -> u64 {
        self.size.fetch_add(bytes, Ordering::AcqRel) + bytes
    }

    /// Returns true when `server` describes a newer generation of this list.
    pub fn is_superseded_by(&self, server: &IdListMetadata) -> bool {
        server.file_id != self.file_id && server.creation_time >= self.creation_time
    }
}
