//! # Fallback policy
//!
//! The hard-coded safety policy used when the remote policy endpoint is
//! unreachable or serves a malformed document. It is intentionally
//! conservative: no role here is granted more than the weakest real-world
//! configuration it stands in for.
//!
//! The content mirrors the backend's shipped default config byte-for-byte,
//! including the display labels and the employee role's narrow
//! audiences/instruments grant. That asymmetry is owned by the policy
//! authors upstream; this module reproduces it rather than correcting it.

use crate::types::{roles, PolicyDocument, RolePolicy, Section};

/// Version of the built-in fallback document.
///
/// Bumped whenever the hard-coded policy below changes, so degraded-mode
/// reports can state exactly which safety policy was in effect.
pub const FALLBACK_VERSION: u32 = 1;

/// Build the default policy document.
///
/// Pure and I/O-free; returns a freshly built document on every call so the
/// caller owns it outright.
///
/// # Example
///
/// ```
/// use muza_rbac::fallback;
///
/// let doc = fallback::default_document();
/// assert!(doc.has_role("admin"));
/// assert!(doc.role("student").unwrap().own_records_only);
/// ```
pub fn default_document() -> PolicyDocument {
    let mut doc = PolicyDocument::default();

    doc.roles.insert(
        roles::ADMIN.to_string(),
        RolePolicy {
            own_records_only: false,
            sections: vec![
                Section::new("Расписание", "/schedules", true, true),
                Section::new("Занятия", "/lessons", true, true),
                Section::new("Сотрудники", "/employees", true, true),
                Section::new("Аудитория", "/audiences", true, true),
                Section::new("Инструмент", "/instruments", true, true),
                Section::new("Пользователь", "/users", true, true),
                Section::new("Ученики", "/students", true, true),
                Section::new("Группы", "/study-groups", true, true),
                Section::new("Оценки", "/assessments", true, true),
                Section::new("Посещение", "/attendances", true, true),
                Section::new("Программа", "/programms", true, true),
            ],
        },
    );

    doc.roles.insert(
        roles::TEACHER.to_string(),
        RolePolicy {
            own_records_only: true,
            sections: vec![
                Section::new("Оценки", "/assessments", true, true),
                Section::new("Посещение", "/attendances", true, true),
            ],
        },
    );

    doc.roles.insert(
        roles::STUDENT.to_string(),
        RolePolicy {
            own_records_only: true,
            sections: vec![
                Section::new("Оценки", "/assessments", true, false),
                Section::new("Посещение", "/attendances", true, false),
                Section::new("Инструмент", "/instruments", true, false),
            ],
        },
    );

    doc.roles.insert(
        roles::EMPLOYEE.to_string(),
        RolePolicy {
            own_records_only: false,
            sections: vec![
                Section::new("Аудитория", "/audiences", true, true),
                Section::new("Инструмент", "/instruments", true, true),
            ],
        },
    );

    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers_all_well_known_roles() {
        let doc = default_document();
        for role in [roles::ADMIN, roles::TEACHER, roles::STUDENT, roles::EMPLOYEE] {
            assert!(doc.has_role(role), "fallback missing role {role}");
        }
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn test_student_is_read_only_and_own_records() {
        let doc = default_document();
        let student = doc.role(roles::STUDENT).unwrap();

        assert!(student.own_records_only);
        assert!(student.sections.iter().all(|s| s.can_read && !s.can_write));
    }

    #[test]
    fn test_teacher_scoped_to_own_records() {
        let doc = default_document();
        let teacher = doc.role(roles::TEACHER).unwrap();

        assert!(teacher.own_records_only);
        assert_eq!(teacher.sections.len(), 2);
    }

    #[test]
    fn test_employee_asymmetry_preserved() {
        // The upstream config grants employee only audiences + instruments,
        // both writable. Reproduced as-is.
        let doc = default_document();
        let employee = doc.role(roles::EMPLOYEE).unwrap();

        let urls: Vec<_> = employee.sections.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["/audiences", "/instruments"]);
        assert!(employee.sections.iter().all(|s| s.can_write));
        assert!(!employee.own_records_only);
    }

    #[test]
    fn test_admin_section_order() {
        let doc = default_document();
        let admin = doc.role(roles::ADMIN).unwrap();

        assert_eq!(admin.sections.len(), 11);
        assert_eq!(admin.sections.first().unwrap().url, "/schedules");
        assert_eq!(admin.sections.last().unwrap().url, "/programms");
    }

    #[test]
    fn test_validates_against_own_schema() {
        // The fallback must satisfy the same structural rules as a fetched
        // document.
        let doc = default_document();
        let raw = serde_json::to_value(&doc).unwrap();
        assert!(crate::validator::validate(&raw).is_ok());
    }
}
