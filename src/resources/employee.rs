//! Staff records and role-based page access.

use super::{patch_field, Resource};
use crate::error::ErrorInfo;
use crate::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Owner,
    Manager,
    Bartender,
    Inventory,
    Cleaning,
}

/// Which dashboard pages a role may open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Permissions {
    pub dashboard: bool,
    pub events: bool,
    pub bookings: bool,
    pub inventory: bool,
    pub employees: bool,
    pub tasks: bool,
    pub reports: bool,
    pub settings: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleAccess {
    pub role: EmployeeRole,
    pub label: &'static str,
    pub description: &'static str,
    pub permissions: Permissions,
}

impl EmployeeRole {
    pub const ALL: [EmployeeRole; 5] = [
        EmployeeRole::Owner,
        EmployeeRole::Manager,
        EmployeeRole::Bartender,
        EmployeeRole::Inventory,
        EmployeeRole::Cleaning,
    ];

    pub fn access(self) -> RoleAccess {
        let staff = Permissions {
            dashboard: true,
            tasks: true,
            ..Default::default()
        };
        let (label, description, permissions) = match self {
            EmployeeRole::Owner => (
                "Owner",
                "Full access to everything",
                Permissions {
                    dashboard: true,
                    events: true,
                    bookings: true,
                    inventory: true,
                    employees: true,
                    tasks: true,
                    reports: true,
                    settings: true,
                },
            ),
            EmployeeRole::Manager => (
                "Manager",
                "Manage shifts, tasks, and view reports",
                Permissions {
                    events: true,
                    bookings: true,
                    inventory: true,
                    reports: true,
                    ..staff
                },
            ),
            EmployeeRole::Bartender => ("Bartender", "View shifts, complete tasks", staff),
            EmployeeRole::Inventory => (
                "Inventory Manager",
                "Full inventory access, scanning, ordering",
                Permissions {
                    inventory: true,
                    reports: true,
                    ..staff
                },
            ),
            EmployeeRole::Cleaning => ("Cleaning Staff", "View and complete cleaning tasks", staff),
        };
        RoleAccess {
            role: self,
            label,
            description,
            permissions,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: RecordId,
    #[serde(default)]
    pub venue_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: EmployeeRole,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub last_login: Option<Timestamp>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

fn default_active() -> bool {
    true
}

impl Employee {
    pub fn new(
        id: impl Into<RecordId>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: EmployeeRole,
    ) -> Self {
        let first_name = first_name.into();
        let last_name = last_name.into();
        let email = format!(
            "{}.{}@venue.example",
            first_name.to_lowercase(),
            last_name.to_lowercase()
        );
        Self {
            id: id.into(),
            venue_id: String::new(),
            first_name,
            last_name,
            email,
            phone: None,
            role,
            is_active: true,
            last_login: None,
            created_at: Timestamp::default(),
            updated_at: Timestamp::default(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmployeePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub role: Option<EmployeeRole>,
    pub is_active: Option<bool>,
}

impl Resource for Employee {
    type Patch = EmployeePatch;
    const NAME: &'static str = "employees";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    fn touch(&mut self, at: Timestamp) {
        self.updated_at = at;
    }

    fn apply_patch(&mut self, patch: &EmployeePatch) {
        patch_field(&mut self.first_name, &patch.first_name);
        patch_field(&mut self.last_name, &patch.last_name);
        patch_field(&mut self.email, &patch.email);
        patch_field(&mut self.phone, &patch.phone);
        patch_field(&mut self.role, &patch.role);
        patch_field(&mut self.is_active, &patch.is_active);
    }

    fn validate(&self) -> Result<(), ErrorInfo> {
        if !self.email.contains('@') {
            return Err(ErrorInfo::validation("email", "invalid email address"));
        }
        Ok(())
    }
}
