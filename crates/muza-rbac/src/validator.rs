//! # Policy validation
//!
//! Eager, all-or-nothing structural validation of the raw policy response.
//! Untyped data never flows past this boundary: a document either converts
//! fully into a [`PolicyDocument`] or is rejected with the first failure
//! encountered.
//!
//! A document with one malformed role fails entirely rather than silently
//! dropping that role; partial acceptance would let a privileged role vanish
//! from the document without anyone noticing.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::types::{PolicyDocument, RolePolicy, Section};

/// Structural validation failures.
///
/// These indicate a policy-authoring bug on the server side, as opposed to
/// the transport failures covered by the client crate's fetch errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Top-level shape is not `{ "roles": { <name>: <policy> } }`.
    #[error("Policy root is not a mapping of roles")]
    MalformedRoot,

    /// A role's value is not a policy object.
    #[error("Role `{0}` is not a policy object")]
    MalformedRole(String),

    /// A role declares the same section url twice.
    #[error("Role `{role}` declares section url `{url}` more than once")]
    DuplicateSectionUrl {
        /// Role containing the duplicate.
        role: String,
        /// The duplicated url.
        url: String,
    },

    /// A required field is missing, empty, or of the wrong type.
    #[error("Missing or invalid field at `{0}`")]
    MissingField(String),
}

/// Validate a raw policy response into a typed [`PolicyDocument`].
///
/// Checks run in order and short-circuit on the first failure:
/// 1. the top level is an object with a `roles` mapping (not an array, not
///    null);
/// 2. each role policy is an object with a boolean `own_records_only` and a
///    `sections` array (possibly empty);
/// 3. each section has a non-empty `name`, a non-empty `url` unique within
///    its role, and boolean `can_read`/`can_write`.
///
/// # Arguments
///
/// * `raw` - The decoded JSON body from the policy endpoint
///
/// # Returns
///
/// The fully typed document, or the first [`ValidationError`] encountered
///
/// # Example
///
/// ```
/// use muza_rbac::validator::{validate, ValidationError};
///
/// let err = validate(&serde_json::json!([])).unwrap_err();
/// assert_eq!(err, ValidationError::MalformedRoot);
/// ```
pub fn validate(raw: &Value) -> Result<PolicyDocument, ValidationError> {
    let root = raw.as_object().ok_or(ValidationError::MalformedRoot)?;
    let roles = root
        .get("roles")
        .and_then(Value::as_object)
        .ok_or(ValidationError::MalformedRoot)?;

    let mut out = HashMap::with_capacity(roles.len());
    for (role, value) in roles {
        let policy = validate_role(role, value)?;
        out.insert(role.clone(), policy);
    }

    Ok(PolicyDocument { roles: out })
}

/// Validate a single role's policy object.
fn validate_role(role: &str, value: &Value) -> Result<RolePolicy, ValidationError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ValidationError::MalformedRole(role.to_string()))?;

    let own_records_only = obj
        .get("own_records_only")
        .and_then(Value::as_bool)
        .ok_or_else(|| field(role, None, "own_records_only"))?;

    let raw_sections = obj
        .get("sections")
        .and_then(Value::as_array)
        .ok_or_else(|| field(role, None, "sections"))?;

    let mut sections = Vec::with_capacity(raw_sections.len());
    let mut seen_urls: HashSet<&str> = HashSet::with_capacity(raw_sections.len());
    for (idx, raw_section) in raw_sections.iter().enumerate() {
        let section = raw_section
            .as_object()
            .ok_or_else(|| ValidationError::MissingField(format!("roles.{role}.sections[{idx}]")))?;

        let name = section
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| field(role, Some(idx), "name"))?;

        let url = section
            .get("url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| field(role, Some(idx), "url"))?;

        let can_read = section
            .get("can_read")
            .and_then(Value::as_bool)
            .ok_or_else(|| field(role, Some(idx), "can_read"))?;

        let can_write = section
            .get("can_write")
            .and_then(Value::as_bool)
            .ok_or_else(|| field(role, Some(idx), "can_write"))?;

        if !seen_urls.insert(url) {
            return Err(ValidationError::DuplicateSectionUrl {
                role: role.to_string(),
                url: url.to_string(),
            });
        }

        sections.push(Section::new(name, url, can_read, can_write));
    }

    Ok(RolePolicy {
        own_records_only,
        sections,
    })
}

/// Build a `MissingField` error with a dotted JSON path.
fn field(role: &str, section_idx: Option<usize>, name: &str) -> ValidationError {
    let path = match section_idx {
        Some(idx) => format!("roles.{role}.sections[{idx}].{name}"),
        None => format!("roles.{role}.{name}"),
    };
    ValidationError::MissingField(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn well_formed() -> Value {
        json!({
            "roles": {
                "admin": {
                    "own_records_only": false,
                    "sections": [
                        { "name": "Grades", "url": "/assessments",
                          "can_read": true, "can_write": true }
                    ]
                },
                "student": {
                    "own_records_only": true,
                    "sections": []
                }
            }
        })
    }

    #[test]
    fn test_accepts_well_formed_document() {
        let doc = validate(&well_formed()).unwrap();
        assert_eq!(doc.len(), 2);
        assert!(!doc.role("admin").unwrap().own_records_only);
        assert!(doc.role("student").unwrap().sections.is_empty());
    }

    #[test]
    fn test_preserves_section_order() {
        let raw = json!({
            "roles": {
                "teacher": {
                    "own_records_only": true,
                    "sections": [
                        { "name": "B", "url": "/b", "can_read": true, "can_write": false },
                        { "name": "A", "url": "/a", "can_read": true, "can_write": false },
                        { "name": "C", "url": "/c", "can_read": false, "can_write": false }
                    ]
                }
            }
        });

        let doc = validate(&raw).unwrap();
        let urls: Vec<_> = doc.role("teacher").unwrap().sections.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["/b", "/a", "/c"]);
    }

    #[test]
    fn test_rejects_non_object_root() {
        assert_eq!(validate(&json!(null)).unwrap_err(), ValidationError::MalformedRoot);
        assert_eq!(validate(&json!([1, 2])).unwrap_err(), ValidationError::MalformedRoot);
        assert_eq!(validate(&json!({"no_roles": {}})).unwrap_err(), ValidationError::MalformedRoot);
        assert_eq!(
            validate(&json!({"roles": []})).unwrap_err(),
            ValidationError::MalformedRoot
        );
    }

    #[test]
    fn test_rejects_non_object_role() {
        let raw = json!({ "roles": { "admin": ["not", "a", "policy"] } });
        assert_eq!(
            validate(&raw).unwrap_err(),
            ValidationError::MalformedRole("admin".to_string())
        );
    }

    #[test]
    fn test_rejects_missing_own_records_only() {
        let raw = json!({ "roles": { "admin": { "sections": [] } } });
        assert_eq!(
            validate(&raw).unwrap_err(),
            ValidationError::MissingField("roles.admin.own_records_only".to_string())
        );
    }

    #[test]
    fn test_rejects_wrongly_typed_sections() {
        let raw = json!({
            "roles": { "admin": { "own_records_only": false, "sections": {} } }
        });
        assert_eq!(
            validate(&raw).unwrap_err(),
            ValidationError::MissingField("roles.admin.sections".to_string())
        );
    }

    #[test]
    fn test_rejects_empty_section_name_and_url() {
        let raw = json!({
            "roles": {
                "admin": {
                    "own_records_only": false,
                    "sections": [
                        { "name": "", "url": "/a", "can_read": true, "can_write": true }
                    ]
                }
            }
        });
        assert_eq!(
            validate(&raw).unwrap_err(),
            ValidationError::MissingField("roles.admin.sections[0].name".to_string())
        );

        let raw = json!({
            "roles": {
                "admin": {
                    "own_records_only": false,
                    "sections": [
                        { "name": "A", "url": "", "can_read": true, "can_write": true }
                    ]
                }
            }
        });
        assert_eq!(
            validate(&raw).unwrap_err(),
            ValidationError::MissingField("roles.admin.sections[0].url".to_string())
        );
    }

    #[test]
    fn test_rejects_non_boolean_grants() {
        let raw = json!({
            "roles": {
                "admin": {
                    "own_records_only": false,
                    "sections": [
                        { "name": "A", "url": "/a", "can_read": "yes", "can_write": true }
                    ]
                }
            }
        });
        assert_eq!(
            validate(&raw).unwrap_err(),
            ValidationError::MissingField("roles.admin.sections[0].can_read".to_string())
        );
    }

    #[test]
    fn test_rejects_duplicate_section_url() {
        let raw = json!({
            "roles": {
                "admin": {
                    "own_records_only": false,
                    "sections": [
                        { "name": "A", "url": "/a", "can_read": true, "can_write": true },
                        { "name": "A again", "url": "/a", "can_read": false, "can_write": false }
                    ]
                }
            }
        });
        assert_eq!(
            validate(&raw).unwrap_err(),
            ValidationError::DuplicateSectionUrl {
                role: "admin".to_string(),
                url: "/a".to_string()
            }
        );
    }

    #[test]
    fn test_one_bad_role_rejects_whole_document() {
        // "admin" is fine, "teacher" is not: the document must be rejected
        // entirely, never partially accepted.
        let raw = json!({
            "roles": {
                "admin": {
                    "own_records_only": false,
                    "sections": [
                        { "name": "A", "url": "/a", "can_read": true, "can_write": true }
                    ]
                },
                "teacher": { "own_records_only": "maybe", "sections": [] }
            }
        });
        assert!(validate(&raw).is_err());
    }

    #[test]
    fn test_preserves_write_without_read() {
        let raw = json!({
            "roles": {
                "auditor": {
                    "own_records_only": false,
                    "sections": [
                        { "name": "X", "url": "/x", "can_read": false, "can_write": true }
                    ]
                }
            }
        });

        let doc = validate(&raw).unwrap();
        let section = doc.role("auditor").unwrap().section("/x").unwrap();
        assert!(!section.can_read);
        assert!(section.can_write);
    }
}
