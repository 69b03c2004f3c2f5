//! # Muza RBAC (Role-Based Access Control)
//!
//! This crate provides the policy core shared by the Muza school platform
//! clients: the typed policy document, its validation, the built-in safety
//! fallback, and the read-only capability derivations the UI consults.
//!
//! ## Overview
//!
//! The muza-rbac crate handles:
//! - **Policy model**: `PolicyDocument` → `RolePolicy` → `Section`
//! - **Validation**: all-or-nothing structural checks at the fetch boundary
//! - **Fallback**: a conservative, versioned default policy for degraded mode
//! - **Capabilities**: pure derivations (visible sections, write checks,
//!   own-records scoping) over a resolved role policy
//!
//! ## Architecture
//!
//! ```text
//! raw JSON ──validate──▶ PolicyDocument ──role lookup──▶ RolePolicy
//!                                                            │
//!                                    CapabilityView / ResolvedCapabilities
//! ```
//!
//! A role that is missing from the document never errors and never inherits
//! another role's policy: it resolves to the most restrictive interpretation
//! (no visible sections, own-records-only). Everything in this crate is pure
//! and I/O-free; fetching and caching live in `muza-policy-client`.
//!
//! ## Usage
//!
//! ```rust
//! use muza_rbac::{validator, ResolvedCapabilities};
//!
//! let raw = serde_json::json!({
//!     "roles": {
//!         "admin": {
//!             "own_records_only": false,
//!             "sections": [
//!                 { "name": "Оценки", "url": "/assessments",
//!                   "can_read": true, "can_write": true }
//!             ]
//!         }
//!     }
//! });
//!
//! let document = validator::validate(&raw).expect("well-formed policy");
//! let caps = ResolvedCapabilities::resolve("admin", document.role("admin"));
//! assert!(!caps.own_records_only);
//! assert_eq!(caps.visible_sections.len(), 1);
//!
//! // Unknown roles fail closed.
//! let caps = ResolvedCapabilities::resolve("intruder", document.role("intruder"));
//! assert!(caps.own_records_only);
//! assert!(caps.visible_sections.is_empty());
//! ```

pub mod capabilities;
pub mod fallback;
pub mod types;
pub mod validator;

// Re-export main types for convenience
pub use capabilities::{CapabilityView, ResolvedCapabilities};
pub use fallback::FALLBACK_VERSION;
pub use types::{PolicyDocument, RolePolicy, Section};
pub use validator::ValidationError;
