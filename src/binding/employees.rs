//! Team list grouped by role.

use super::{contains_ci, normalize_search};
use crate::resources::{Employee, EmployeeRole, RoleAccess};
use crate::store::ResourceSnapshot;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmployeeFilter {
    /// Matches full name or email.
    pub search: String,
    pub role: Option<EmployeeRole>,
    pub include_inactive: bool,
}

/// Matching employees sorted by full name.
pub fn filter_employees<'a>(
    snapshot: &'a ResourceSnapshot<Employee>,
    filter: &EmployeeFilter,
) -> Vec<&'a Employee> {
    let needle = normalize_search(&filter.search);
    let mut employees: Vec<&Employee> = snapshot
        .iter()
        .filter(|e| filter.include_inactive || e.is_active)
        .filter(|e| filter.role.map(|role| e.role == role).unwrap_or(true))
        .filter(|e| contains_ci(&e.full_name(), &needle) || contains_ci(&e.email, &needle))
        .collect();
    employees.sort_by_key(|e| e.full_name().to_lowercase());
    employees
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoleGroup {
    pub access: RoleAccess,
    pub members: Vec<Employee>,
}

/// Active employees per role, in role order. Empty roles are omitted.
pub fn group_by_role(snapshot: &ResourceSnapshot<Employee>) -> Vec<RoleGroup> {
    let active = filter_employees(snapshot, &EmployeeFilter::default());
    EmployeeRole::ALL
        .iter()
        .filter_map(|&role| {
            let members: Vec<Employee> = active
                .iter()
                .filter(|e| e.role == role)
                .map(|e| (*e).clone())
                .collect();
            (!members.is_empty()).then(|| RoleGroup {
                access: role.access(),
                members,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ResourceSnapshot<Employee> {
        let mut former = Employee::new("e-4", "Tim", "Alt", EmployeeRole::Bartender);
        former.is_active = false;
        ResourceSnapshot::new(
            vec![
                Employee::new("e-1", "Sara", "Yilmaz", EmployeeRole::Bartender),
                Employee::new("e-2", "Ben", "Koch", EmployeeRole::Owner),
                Employee::new("e-3", "Anja", "Roth", EmployeeRole::Bartender),
                former,
            ],
            1,
        )
    }

    #[test]
    fn test_inactive_hidden_by_default() {
        let snap = snapshot();
        assert_eq!(filter_employees(&snap, &EmployeeFilter::default()).len(), 3);
        let all = EmployeeFilter {
            include_inactive: true,
            ..Default::default()
        };
        assert_eq!(filter_employees(&snap, &all).len(), 4);
    }

    #[test]
    fn test_sorted_by_name_and_searchable() {
        let snap = snapshot();
        let names: Vec<_> = filter_employees(&snap, &EmployeeFilter::default())
            .iter()
            .map(|e| e.first_name.as_str())
            .collect();
        assert_eq!(names, vec!["Anja", "Ben", "Sara"]);

        let search = EmployeeFilter {
            search: "yilmaz".into(),
            ..Default::default()
        };
        assert_eq!(filter_employees(&snap, &search)[0].id.as_str(), "e-1");
    }

    #[test]
    fn test_groups_follow_role_order() {
        let groups = group_by_role(&snapshot());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].access.role, EmployeeRole::Owner);
        assert_eq!(groups[1].members.len(), 2);
    }
}
