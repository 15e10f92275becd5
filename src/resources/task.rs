//! Staff tasks with an approval workflow.

use super::{patch_field, Resource};
use crate::error::ErrorInfo;
use crate::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Approved,
    Rejected,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Approved,
        TaskStatus::Rejected,
    ];

    /// Still waiting on staff.
    pub fn is_open(self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

/// Declared low to high so `Ord` sorts by urgency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Cleaning,
    Inventory,
    Bar,
    Kitchen,
    General,
    Closing,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: RecordId,
    #[serde(default)]
    pub venue_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub assigned_by: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    #[serde(default)]
    pub approved_at: Option<Timestamp>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl Task {
    pub fn new(
        id: impl Into<RecordId>,
        title: impl Into<String>,
        category: TaskCategory,
        priority: TaskPriority,
    ) -> Self {
        Self {
            id: id.into(),
            venue_id: String::new(),
            title: title.into(),
            description: None,
            category,
            priority,
            status: TaskStatus::Pending,
            assigned_to: None,
            assigned_by: None,
            due_date: None,
            completed_at: None,
            approved_at: None,
            approved_by: None,
            rejection_reason: None,
            created_at: Timestamp::default(),
            updated_at: Timestamp::default(),
        }
    }

    pub fn assigned(mut self, employee_id: impl Into<String>) -> Self {
        self.assigned_to = Some(employee_id.into());
        self
    }

    pub fn created(mut self, at: Timestamp) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Option<String>>,
    pub completed_at: Option<Option<Timestamp>>,
    pub approved_at: Option<Option<Timestamp>>,
    pub approved_by: Option<Option<String>>,
    pub rejection_reason: Option<Option<String>>,
}

impl TaskPatch {
    /// Status change with the workflow stamps that go with it.
    pub fn transition(status: TaskStatus, at: Timestamp, actor: Option<&str>) -> Self {
        let mut patch = TaskPatch {
            status: Some(status),
            ..Default::default()
        };
        match status {
            TaskStatus::Completed => patch.completed_at = Some(Some(at)),
            TaskStatus::Approved => {
                patch.approved_at = Some(Some(at));
                patch.approved_by = Some(actor.map(str::to_string));
            }
            TaskStatus::Pending | TaskStatus::InProgress => {
                patch.completed_at = Some(None);
                patch.rejection_reason = Some(None);
            }
            TaskStatus::Rejected => {}
        }
        patch
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        TaskPatch {
            status: Some(TaskStatus::Rejected),
            rejection_reason: Some(Some(reason.into())),
            ..Default::default()
        }
    }

    pub fn assign(employee_id: Option<String>) -> Self {
        TaskPatch {
            assigned_to: Some(employee_id),
            ..Default::default()
        }
    }
}

impl Resource for Task {
    type Patch = TaskPatch;
    const NAME: &'static str = "tasks";

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

    fn apply_patch(&mut self, patch: &TaskPatch) {
        patch_field(&mut self.title, &patch.title);
        patch_field(&mut self.description, &patch.description);
        patch_field(&mut self.priority, &patch.priority);
        patch_field(&mut self.status, &patch.status);
        patch_field(&mut self.assigned_to, &patch.assigned_to);
        patch_field(&mut self.completed_at, &patch.completed_at);
        patch_field(&mut self.approved_at, &patch.approved_at);
        patch_field(&mut self.approved_by, &patch.approved_by);
        patch_field(&mut self.rejection_reason, &patch.rejection_reason);
    }

    fn validate(&self) -> Result<(), ErrorInfo> {
        if self.title.trim().is_empty() {
            return Err(ErrorInfo::validation("title", "title is required"));
        }
        if self.status == TaskStatus::Rejected && self.rejection_reason.is_none() {
            return Err(ErrorInfo::validation(
                "rejection_reason",
                "a rejected task needs a reason",
            ));
        }
        Ok(())
    }
}
