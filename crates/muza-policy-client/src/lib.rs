//! # Muza Policy Client
//!
//! This crate keeps a client session's permissions in sync with the Muza
//! backend: it fetches the policy document from the permissions endpoint,
//! validates it through `muza-rbac`, substitutes the built-in fallback when
//! the endpoint is unreachable or the document is malformed, and caches the
//! winning document for the session.
//!
//! ## Overview
//!
//! The muza-policy-client crate handles:
//! - **Source**: one bounded HTTP GET per fetch, no internal retry
//! - **Cache**: session-scoped, atomically replaced, cleared on logout
//! - **Resolver**: fetch → validate → fallback orchestration, coalesced
//!   refreshes, stale-while-revalidate serving
//! - **Config**: endpoint, timeout, and TTL from the environment
//!
//! ## Failure model
//!
//! `PolicyResolver::resolve` is infallible. Transport errors (unreachable,
//! HTTP status, timeout) and validation errors both collapse into "use the
//! fallback policy, mark the session degraded". The degraded flag, exposed
//! through [`PolicyResolver::is_degraded`] and [`cache::PolicyStatus`], is
//! the only externally visible trace of the underlying failure; the
//! specific error kind is emitted as a structured tracing event for
//! operability.
//!
//! Enforcement note: this is a client-side resolver. It decides what the UI
//! shows and which routes it gates; the backend API remains the actual
//! enforcement boundary.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use muza_policy_client::{PolicyClientConfig, PolicyResolver};
//!
//! # async fn example() {
//! let resolver = PolicyResolver::from_config(PolicyClientConfig::from_env());
//!
//! let caps = resolver.resolve("student").await;
//! assert!(caps.own_records_only || !caps.visible_sections.is_empty());
//!
//! // Gate a write action.
//! if resolver.can_write("student", "/assessments").await {
//!     // enable the edit controls
//! }
//!
//! // On logout:
//! resolver.invalidate().await;
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod resolver;
pub mod source;

// Re-export main types for convenience
pub use cache::{PermissionCache, PolicyStatus};
pub use config::PolicyClientConfig;
pub use resolver::PolicyResolver;
pub use source::{FetchError, HttpPolicySource, PolicySource};

// The policy core this client resolves against.
pub use muza_rbac::{CapabilityView, PolicyDocument, ResolvedCapabilities, Section};
