//! Permission cache.
//!
//! Session-scoped holder of the last resolved policy document. The cache is
//! an explicit, injectable component: tests create a fresh instance per
//! test, the application shares one per session by `Arc`. Updates are a
//! single write-lock swap, so a reader sees either the previous document or
//! the new one, never an intermediate state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use muza_rbac::{PolicyDocument, FALLBACK_VERSION};

/// A policy document as held by the cache, with its provenance.
#[derive(Debug)]
pub struct CachedPolicy {
    /// The resolved document. Shared by `Arc` so in-flight readers keep a
    /// consistent snapshot across cache swaps.
    pub document: Arc<PolicyDocument>,

    /// Whether the document came from the built-in fallback rather than a
    /// successfully fetched and validated response.
    pub degraded: bool,

    /// Cache generation that produced this entry. Bumped on every store and
    /// clear.
    pub generation: u64,

    /// Wall-clock time the document was stored, for status reporting.
    pub fetched_at: DateTime<Utc>,

    /// Monotonic store time, used for freshness checks.
    stored: Instant,
}

impl CachedPolicy {
    /// Whether this entry can be served without a refetch.
    ///
    /// A degraded (fallback) document is never fresh: serving it is fine,
    /// but every resolution against it should re-attempt the real fetch.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        !self.degraded && self.stored.elapsed() < ttl
    }

    /// Time since this entry was stored.
    pub fn age(&self) -> Duration {
        self.stored.elapsed()
    }
}

/// Observable state of the cache, for degraded-mode indicators and logs.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PolicyStatus {
    /// Whether the active document is the fallback.
    pub degraded: bool,

    /// Cache generation of the active document.
    pub generation: u64,

    /// When the active document was stored.
    pub fetched_at: DateTime<Utc>,

    /// Number of roles the active document defines.
    pub role_count: usize,

    /// Version of the built-in safety policy in effect, when degraded.
    /// `None` for a live document.
    pub fallback_version: Option<u32>,
}

#[derive(Debug, Default)]
struct CacheSlot {
    current: Option<Arc<CachedPolicy>>,
    generation: u64,
}

/// Session-scoped cache of the last resolved policy document.
///
/// Only the resolver writes to it; everything else reads. Cleared on
/// logout/session end via [`PermissionCache::clear`].
#[derive(Debug, Default)]
pub struct PermissionCache {
    slot: RwLock<CacheSlot>,
}

impl PermissionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently cached entry, if any.
    pub async fn current(&self) -> Option<Arc<CachedPolicy>> {
        self.slot.read().await.current.clone()
    }

    /// The current cache generation.
    ///
    /// Advances on every store and clear; an entry whose generation differs
    /// from this value has been superseded.
    pub async fn generation(&self) -> u64 {
        self.slot.read().await.generation
    }

    /// Store a document, replacing any previous entry atomically, unless
    /// the cache has moved past the generation the caller started from.
    ///
    /// A refresh that began before a logout must not reinstate a document
    /// afterwards: `clear` advances the generation, so the late store
    /// no-ops instead of resurrecting the session.
    ///
    /// # Arguments
    ///
    /// * `expected_generation` - The generation observed when the refresh
    ///   producing `document` began
    /// * `document` - The validated (or fallback) document to install
    /// * `degraded` - Whether `document` is the fallback
    ///
    /// # Returns
    ///
    /// The entry as installed, or `None` if the generation had moved on and
    /// the document was discarded
    pub async fn store_if_current(
        &self,
        expected_generation: u64,
        document: PolicyDocument,
        degraded: bool,
    ) -> Option<Arc<CachedPolicy>> {
        let mut slot = self.slot.write().await;
        if slot.generation != expected_generation {
            debug!(
                expected = expected_generation,
                current = slot.generation,
                "Discarding fetched document; cache generation moved on"
            );
            return None;
        }
        slot.generation += 1;
        let entry = Arc::new(CachedPolicy {
            document: Arc::new(document),
            degraded,
            generation: slot.generation,
            fetched_at: Utc::now(),
            stored: Instant::now(),
        });
        slot.current = Some(entry.clone());
        debug!(
            generation = entry.generation,
            degraded = entry.degraded,
            roles = entry.document.len(),
            "Stored policy document"
        );
        Some(entry)
    }

    /// Drop the cached document (logout / session end) and advance the
    /// generation so superseded entries are never mistaken for current.
    pub async fn clear(&self) {
        let mut slot = self.slot.write().await;
        slot.generation += 1;
        slot.current = None;
        debug!(generation = slot.generation, "Cleared permission cache");
    }

    /// Observable status of the active document, if one is cached.
    pub async fn status(&self) -> Option<PolicyStatus> {
        self.current().await.map(|entry| PolicyStatus {
            degraded: entry.degraded,
            generation: entry.generation,
            fetched_at: entry.fetched_at,
            role_count: entry.document.len(),
            fallback_version: entry.degraded.then_some(FALLBACK_VERSION),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muza_rbac::fallback;

    /// Store against the cache's current generation.
    async fn prime(
        cache: &PermissionCache,
        document: PolicyDocument,
        degraded: bool,
    ) -> Arc<CachedPolicy> {
        let generation = cache.generation().await;
        cache
            .store_if_current(generation, document, degraded)
            .await
            .expect("generation unchanged")
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let cache = PermissionCache::new();
        assert!(cache.current().await.is_none());
        assert!(cache.status().await.is_none());
        assert_eq!(cache.generation().await, 0);
    }

    #[tokio::test]
    async fn test_store_replaces_and_bumps_generation() {
        let cache = PermissionCache::new();

        let first = prime(&cache, fallback::default_document(), true).await;
        assert_eq!(first.generation, 1);

        let second = prime(&cache, PolicyDocument::default(), false).await;
        assert_eq!(second.generation, 2);

        let current = cache.current().await.unwrap();
        assert_eq!(current.generation, 2);
        assert!(!current.degraded);
        assert!(current.document.is_empty());
    }

    #[tokio::test]
    async fn test_clear_empties_and_bumps_generation() {
        let cache = PermissionCache::new();
        prime(&cache, fallback::default_document(), false).await;
        assert_eq!(cache.generation().await, 1);

        cache.clear().await;
        assert!(cache.current().await.is_none());
        assert_eq!(cache.generation().await, 2);
    }

    #[tokio::test]
    async fn test_store_with_stale_generation_is_discarded() {
        let cache = PermissionCache::new();
        let generation = cache.generation().await;

        // Logout races the refresh: the generation moves on before the
        // fetched document lands.
        cache.clear().await;

        let stored = cache
            .store_if_current(generation, fallback::default_document(), false)
            .await;
        assert!(stored.is_none());
        assert!(cache.current().await.is_none());
    }

    #[tokio::test]
    async fn test_stale_store_does_not_displace_newer_document() {
        let cache = PermissionCache::new();
        let old_generation = cache.generation().await;
        prime(&cache, fallback::default_document(), false).await;

        let stored = cache
            .store_if_current(old_generation, PolicyDocument::default(), false)
            .await;
        assert!(stored.is_none());
        assert_eq!(cache.current().await.unwrap().document.len(), 4);
    }

    #[tokio::test]
    async fn test_degraded_entry_is_never_fresh() {
        let cache = PermissionCache::new();
        let entry = prime(&cache, fallback::default_document(), true).await;
        assert!(!entry.is_fresh(Duration::from_secs(3600)));
    }

    #[tokio::test]
    async fn test_live_entry_freshness_follows_ttl() {
        let cache = PermissionCache::new();
        let entry = prime(&cache, fallback::default_document(), false).await;
        assert!(entry.is_fresh(Duration::from_secs(3600)));
        assert!(!entry.is_fresh(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_status_reflects_entry() {
        let cache = PermissionCache::new();
        prime(&cache, fallback::default_document(), true).await;

        let status = cache.status().await.unwrap();
        assert!(status.degraded);
        assert_eq!(status.generation, 1);
        assert_eq!(status.role_count, 4);
        assert_eq!(status.fallback_version, Some(FALLBACK_VERSION));
    }

    #[tokio::test]
    async fn test_live_status_names_no_fallback_version() {
        let cache = PermissionCache::new();
        prime(&cache, fallback::default_document(), false).await;

        let status = cache.status().await.unwrap();
        assert!(!status.degraded);
        assert_eq!(status.fallback_version, None);
    }

    #[tokio::test]
    async fn test_old_snapshot_survives_swap() {
        let cache = PermissionCache::new();
        let snapshot = prime(&cache, fallback::default_document(), false).await;

        prime(&cache, PolicyDocument::default(), false).await;

        // The reader that grabbed the first entry still sees a complete,
        // consistent document.
        assert_eq!(snapshot.document.len(), 4);
        assert_eq!(cache.current().await.unwrap().document.len(), 0);
    }
}
