//! # Policy types
//!
//! The typed policy document as served by the backend permissions endpoint.
//! Wire field names are snake_case (`own_records_only`, `can_read`,
//! `can_write`) to match the endpoint response shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known role names used across the Muza platform.
///
/// The router and UI stores reference roles by string; these constants keep
/// the spellings in one place. The policy document may carry additional
/// roles beyond these.
pub mod roles {
    /// Full administrative access.
    pub const ADMIN: &str = "admin";
    /// Teaching staff, scoped to their own records.
    pub const TEACHER: &str = "teacher";
    /// Enrolled students, read-mostly and scoped to their own records.
    pub const STUDENT: &str = "student";
    /// Non-teaching staff (facilities, inventory).
    pub const EMPLOYEE: &str = "employee";
}

/// A named, URL-addressed resource area with independent read/write grants.
///
/// `can_write` without `can_read` is unusual but valid (e.g. a write-only
/// submission area) and is preserved exactly as the policy source states it;
/// this crate never normalizes one grant from the other.
///
/// # Example
///
/// ```
/// use muza_rbac::Section;
///
/// let section: Section = serde_json::from_value(serde_json::json!({
///     "name": "Оценки",
///     "url": "/assessments",
///     "can_read": true,
///     "can_write": false
/// })).unwrap();
/// assert!(section.can_read);
/// assert!(!section.can_write);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    /// Human-readable display label. Non-empty.
    pub name: String,

    /// Route the section is addressed by. Non-empty, unique within a role.
    pub url: String,

    /// Whether the role may view this section.
    pub can_read: bool,

    /// Whether the role may modify records in this section.
    pub can_write: bool,
}

impl Section {
    /// Create a section with the given grants.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        can_read: bool,
        can_write: bool,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            can_read,
            can_write,
        }
    }
}

/// The policy for a single role: its record scoping and its sections.
///
/// The order of `sections` is display order and is preserved end-to-end,
/// from the fetched document through every derived view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RolePolicy {
    /// Whether the role's access, even where granted, is scoped to records
    /// it owns.
    pub own_records_only: bool,

    /// Sections the role has grants for, in display order.
    pub sections: Vec<Section>,
}

impl RolePolicy {
    /// Look up a section by url, visible or not.
    ///
    /// # Returns
    ///
    /// `Some(&Section)` if the role has any entry for `url`, `None` otherwise
    pub fn section(&self, url: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.url == url)
    }
}

/// A full policy document: role name → role policy.
///
/// Every role name referenced anywhere resolves to exactly one `RolePolicy`
/// or to "unknown role" (a `None` from [`PolicyDocument::role`]); there is
/// no partial entry silently treated as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyDocument {
    /// Per-role policies keyed by role name.
    pub roles: HashMap<String, RolePolicy>,
}

impl PolicyDocument {
    /// Look up the policy for a role.
    ///
    /// # Arguments
    ///
    /// * `name` - Role name (exact match, case-sensitive)
    ///
    /// # Returns
    ///
    /// `Some(&RolePolicy)` if the document defines the role, `None` otherwise
    pub fn role(&self, name: &str) -> Option<&RolePolicy> {
        self.roles.get(name)
    }

    /// Whether the document defines the given role.
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    /// Number of roles in the document.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Check if the document defines no roles at all.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
