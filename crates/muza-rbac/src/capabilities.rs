//! # Capability derivation
//!
//! Read-only query answers derived from a resolved role policy: which
//! sections are visible, whether a given section url is writable, and
//! whether access is scoped to the caller's own records.
//!
//! All derivations are pure and deterministic. [`CapabilityView`] binds one
//! role to one policy instance and memoizes the visible-section computation;
//! a new view is built whenever the backing document changes identity.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use crate::types::{RolePolicy, Section};

/// Filter a policy's sections down to the readable ones.
///
/// Order is preserved and nothing else is transformed: a section with
/// `can_write` but not `can_read` is excluded here while remaining fully
/// visible to [`can_write`].
pub fn visible_sections(policy: &RolePolicy) -> Vec<Section> {
    policy
        .sections
        .iter()
        .filter(|s| s.can_read)
        .cloned()
        .collect()
}

/// Whether the policy grants write access to the section at `url`.
///
/// Looks among *all* sections, not just visible ones: a write check on a
/// non-readable section is well-defined and returns that section's
/// `can_write`. An absent url is a normal "not permitted" result, never an
/// error.
pub fn can_write(policy: &RolePolicy, url: &str) -> bool {
    policy.section(url).map(|s| s.can_write).unwrap_or(false)
}

/// Whether the policy scopes access to the caller's own records.
pub fn own_records_only(policy: &RolePolicy) -> bool {
    policy.own_records_only
}

/// The authoritative answer for one role against one policy document.
///
/// Created on demand per (document, role) pair and immutable once produced.
/// An unknown role resolves to the most restrictive interpretation: no
/// visible sections and own-records-only scoping. It never defaults to
/// another role's policy and never to full access.
///
/// # Example
///
/// ```
/// use muza_rbac::ResolvedCapabilities;
///
/// let caps = ResolvedCapabilities::resolve("ghost", None);
/// assert!(caps.own_records_only);
/// assert!(caps.visible_sections.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedCapabilities {
    /// The role these capabilities were resolved for.
    pub role: String,

    /// Readable sections, in the document's display order.
    pub visible_sections: Vec<Section>,

    /// Whether access is scoped to records the caller owns.
    pub own_records_only: bool,
}

impl ResolvedCapabilities {
    /// Resolve capabilities for a role from its (possibly absent) policy.
    ///
    /// # Arguments
    ///
    /// * `role` - The role name being resolved
    /// * `policy` - The role's policy, or `None` for an unknown role
    pub fn resolve(role: impl Into<String>, policy: Option<&RolePolicy>) -> Self {
        match policy {
            Some(policy) => Self {
                role: role.into(),
                visible_sections: visible_sections(policy),
                own_records_only: policy.own_records_only,
            },
            None => Self::fail_closed(role),
        }
    }

    /// The most restrictive capabilities: nothing visible, own records only.
    pub fn fail_closed(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            visible_sections: Vec::new(),
            own_records_only: true,
        }
    }

    /// Whether the section at `url` is among the visible sections.
    pub fn can_see(&self, url: &str) -> bool {
        self.visible_sections.iter().any(|s| s.url == url)
    }
}

/// A memoizing read handle over one role's policy.
///
/// The view shares the policy by `Arc` with the cache that produced it, so
/// it stays valid (and consistent) even if the cache swaps in a newer
/// document afterwards. The visible-section list is computed once per view;
/// the resolver builds a fresh view whenever the backing document changes.
#[derive(Debug, Clone)]
pub struct CapabilityView {
    role: String,
    policy: Arc<RolePolicy>,
    visible: Arc<OnceLock<Vec<Section>>>,
}

impl CapabilityView {
    /// Create a view binding `role` to `policy`.
    pub fn new(role: impl Into<String>, policy: Arc<RolePolicy>) -> Self {
        Self {
            role: role.into(),
            policy,
            visible: Arc::new(OnceLock::new()),
        }
    }

    /// The role this view answers for.
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Readable sections in display order, computed once per view.
    pub fn visible_sections(&self) -> &[Section] {
        self.visible.get_or_init(|| visible_sections(&self.policy))
    }

    /// Whether the role may write to the section at `url`.
    pub fn can_write(&self, url: &str) -> bool {
        can_write(&self.policy, url)
    }

    /// Whether access is scoped to the caller's own records.
    pub fn is_own_records_only(&self) -> bool {
        self.policy.own_records_only
    }

    /// Look up a section by url, visible or not.
    pub fn section(&self, url: &str) -> Option<&Section> {
        self.policy.section(url)
    }

    /// Produce the immutable resolved answer for this view.
    pub fn resolved(&self) -> ResolvedCapabilities {
        ResolvedCapabilities {
            role: self.role.clone(),
            visible_sections: self.visible_sections().to_vec(),
            own_records_only: self.policy.own_records_only,
        }
    }
}
