//! Policy resolver.
//!
//! Orchestrates fetch → validate → fallback substitution → role lookup.
//! `resolve` is infallible by design: transport and validation failures are
//! absorbed here, replaced by the conservative fallback document, and only
//! surface to callers as the degraded flag. The caller always receives a
//! usable (if restrictive) capability answer.
//!
//! Concurrency model:
//! - the cache swap is atomic (see [`PermissionCache`]), so readers never
//!   observe a half-updated document;
//! - refreshes are coalesced: at most one in-flight fetch per cache
//!   generation, with concurrent callers awaiting the same result;
//! - the refresh runs as a detached task, so a caller abandoning its
//!   `resolve` future does not cancel the fetch for other waiters;
//! - an expired document is served stale while a background refresh runs;
//!   only a cold cache (or [`PolicyResolver::resolve_fresh`]) blocks on the
//!   network.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, instrument, warn};

use muza_rbac::{
    fallback, validator, CapabilityView, PolicyDocument, ResolvedCapabilities, ValidationError,
    FALLBACK_VERSION,
};

use crate::cache::{CachedPolicy, PermissionCache, PolicyStatus};
use crate::config::PolicyClientConfig;
use crate::source::{HttpPolicySource, PolicySource};

/// Resolves role capabilities against the policy endpoint, with caching and
/// fallback.
///
/// The resolver is the only component that writes to the permission cache.
/// Share it by `Arc`; all methods take `&self`.
///
/// # Example
///
/// ```rust,no_run
/// use muza_policy_client::{PolicyClientConfig, PolicyResolver};
///
/// # async fn example() {
/// let resolver = PolicyResolver::from_config(PolicyClientConfig::from_env());
/// let caps = resolver.resolve("teacher").await;
/// if resolver.is_degraded().await {
///     // show the degraded-mode indicator
/// }
/// for section in &caps.visible_sections {
///     println!("{} -> {}", section.name, section.url);
/// }
/// # }
/// ```
pub struct PolicyResolver {
    /// Where raw documents come from.
    source: Arc<dyn PolicySource>,

    /// Session-scoped document cache.
    cache: Arc<PermissionCache>,

    /// Freshness window for cached documents.
    ttl: Duration,

    /// In-flight refresh slot. `Some` while a refresh task is running;
    /// waiters clone the receiver and await completion.
    inflight: Arc<Mutex<Option<InflightRefresh>>>,

    /// Per-role resolved answers, keyed by role and valid for one cache
    /// generation.
    memo: Mutex<HashMap<String, (u64, ResolvedCapabilities)>>,
}

/// A running refresh, tied to the cache generation it started from.
struct InflightRefresh {
    /// Generation observed when the refresh began. A refresh only stores
    /// into (and only clears the slot of) its own generation, so a logout
    /// that advances the generation orphans it harmlessly.
    generation: u64,

    /// Completion signal for waiters.
    rx: watch::Receiver<bool>,
}

impl PolicyResolver {
    /// Create a resolver over an explicit source and cache.
    ///
    /// Tests substitute a stub source and a fresh cache here; the
    /// application normally goes through [`PolicyResolver::from_config`].
    pub fn new(source: Arc<dyn PolicySource>, cache: Arc<PermissionCache>, ttl: Duration) -> Self {
        Self {
            source,
            cache,
            ttl,
            inflight: Arc::new(Mutex::new(None)),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Create a resolver with an HTTP source and a fresh cache from config.
    pub fn from_config(config: PolicyClientConfig) -> Self {
        let ttl = config.cache_ttl();
        Self::new(
            Arc::new(HttpPolicySource::new(config)),
            Arc::new(PermissionCache::new()),
            ttl,
        )
    }

    /// Resolve the capabilities for a role.
    ///
    /// Never fails and never blocks on the network when any document is
    /// cached: a fresh document answers directly, a stale or degraded one is
    /// served as-is while a background refresh runs. Only a cold cache waits
    /// for the fetch. A role absent from the document resolves fail-closed.
    #[instrument(skip(self))]
    pub async fn resolve(&self, role: &str) -> ResolvedCapabilities {
        match self.current_or_refresh().await {
            Some(cached) => self.answer(role, &cached).await,
            // Cleared concurrently between refresh and read; answer
            // conservatively rather than racing another refresh.
            None => ResolvedCapabilities::fail_closed(role),
        }
    }

    /// Resolve with a guaranteed-fresh read.
    ///
    /// Always awaits a refresh (coalesced with any already in flight)
    /// before answering. Callers that can tolerate a stale answer should
    /// prefer [`PolicyResolver::resolve`].
    #[instrument(skip(self))]
    pub async fn resolve_fresh(&self, role: &str) -> ResolvedCapabilities {
        self.await_refresh().await;
        match self.cache.current().await {
            Some(cached) => self.answer(role, &cached).await,
            None => ResolvedCapabilities::fail_closed(role),
        }
    }

    /// Whether the role may write to the section at `url`, per the current
    /// policy.
    ///
    /// Checks all of the role's sections, not just readable ones; an absent
    /// url or an unknown role is a normal `false`.
    pub async fn can_write(&self, role: &str, url: &str) -> bool {
        match self.view(role).await {
            Some(view) => view.can_write(url),
            None => false,
        }
    }

    /// A capability view over the current document for `role`.
    ///
    /// Resolves a document first if the cache is cold. Returns `None` for a
    /// role the document does not define.
    pub async fn view(&self, role: &str) -> Option<CapabilityView> {
        let cached = self.current_or_refresh().await?;
        cached
            .document
            .role(role)
            .map(|policy| CapabilityView::new(role, Arc::new(policy.clone())))
    }

    /// Whether the active document came from the built-in fallback.
    pub async fn is_degraded(&self) -> bool {
        match self.cache.current().await {
            Some(cached) => cached.degraded,
            None => false,
        }
    }

    /// Observable status of the active document, if any.
    pub async fn status(&self) -> Option<PolicyStatus> {
        self.cache.status().await
    }

    /// Drop the cached document and memoized answers (logout / session
    /// end). The next resolution fetches anew.
    ///
    /// A refresh in flight at this point is orphaned: clearing the cache
    /// advances the generation, so its eventual store is discarded instead
    /// of reinstating a document after logout.
    pub async fn invalidate(&self) {
        self.cache.clear().await;
        *self.inflight.lock().await = None;
        self.memo.lock().await.clear();
    }

    /// Get a cached entry, refreshing per the freshness policy.
    async fn current_or_refresh(&self) -> Option<Arc<CachedPolicy>> {
        match self.cache.current().await {
            Some(cached) if cached.is_fresh(self.ttl) => Some(cached),
            Some(cached) => {
                // Stale or degraded: kick a refresh, serve what we have.
                self.begin_refresh().await;
                Some(cached)
            }
            None => {
                self.await_refresh().await;
                self.cache.current().await
            }
        }
    }

    /// Start a refresh if none is in flight; return a completion receiver.
    async fn begin_refresh(&self) -> watch::Receiver<bool> {
        let mut slot = self.inflight.lock().await;
        if let Some(inflight) = slot.as_ref() {
            return inflight.rx.clone();
        }

        let generation = self.cache.generation().await;
        let (tx, rx) = watch::channel(false);
        *slot = Some(InflightRefresh {
            generation,
            rx: rx.clone(),
        });

        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        let inflight = Arc::clone(&self.inflight);
        // Detached on purpose: a caller abandoning its resolve future must
        // not cancel the fetch for other waiters.
        tokio::spawn(async move {
            let (document, degraded) = fetch_document(source.as_ref()).await;
            cache.store_if_current(generation, document, degraded).await;
            let mut slot = inflight.lock().await;
            // Only vacate our own slot; an invalidate may have replaced it
            // with a newer refresh already.
            if slot.as_ref().map_or(false, |r| r.generation == generation) {
                *slot = None;
            }
            drop(slot);
            let _ = tx.send(true);
        });

        rx
    }

    /// Start (or join) a refresh and wait for it to complete.
    async fn await_refresh(&self) {
        let mut rx = self.begin_refresh().await;
        // A closed channel means the refresh task is gone; the cache holds
        // whatever it managed to store.
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Answer for `role` from a cached entry, memoized per generation.
    async fn answer(&self, role: &str, cached: &CachedPolicy) -> ResolvedCapabilities {
        let mut memo = self.memo.lock().await;
        if let Some((generation, caps)) = memo.get(role) {
            if *generation == cached.generation {
                return caps.clone();
            }
        }

        let caps = ResolvedCapabilities::resolve(role, cached.document.role(role));
        memo.insert(role.to_string(), (cached.generation, caps.clone()));
        caps
    }
}

/// Fetch and validate one document, substituting the fallback on any
/// failure. Returns the winning document and whether it is degraded.
async fn fetch_document(source: &dyn PolicySource) -> (PolicyDocument, bool) {
    match source.fetch().await {
        Ok(body) => match parse_and_validate(&body) {
            Ok(document) => {
                debug!(roles = document.len(), "Policy document loaded");
                (document, false)
            }
            Err(error) => {
                // Distinct from transport failures: this is a policy-authoring
                // bug on the server side.
                error!(
                    %error,
                    fallback_version = FALLBACK_VERSION,
                    "Policy document failed validation; using fallback policy"
                );
                (fallback::default_document(), true)
            }
        },
        Err(error) => {
            warn!(
                %error,
                fallback_version = FALLBACK_VERSION,
                "Policy fetch failed; using fallback policy"
            );
            (fallback::default_document(), true)
        }
    }
}

/// Decode the raw body and validate it into a typed document.
///
/// A body that is not JSON at all fails the same way as a wrong-shaped
/// root: the document is not a mapping of roles.
fn parse_and_validate(body: &[u8]) -> Result<PolicyDocument, ValidationError> {
    let raw: Value =
        serde_json::from_slice(body).map_err(|_| ValidationError::MalformedRoot)?;
    validator::validate(&raw)
}
