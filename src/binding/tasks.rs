//! Task list, board columns and counters.

use super::{contains_ci, normalize_search};
use crate::resources::{Task, TaskCategory, TaskPriority, TaskStatus};
use crate::store::ResourceSnapshot;
use std::cmp::Reverse;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub category: Option<TaskCategory>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<String>,
    /// Matches title or description.
    pub search: String,
}

impl TaskFilter {
    fn matches(&self, task: &Task, needle: &str) -> bool {
        self.status.map_or(true, |s| task.status == s)
            && self.category.map_or(true, |c| task.category == c)
            && self.priority.map_or(true, |p| task.priority == p)
            && self
                .assigned_to
                .as_ref()
                .map_or(true, |who| task.assigned_to.as_ref() == Some(who))
            && (contains_ci(&task.title, needle)
                || task
                    .description
                    .as_deref()
                    .map_or(false, |d| contains_ci(d, needle)))
    }
}

/// Matching tasks, most urgent first, newest first within a priority.
pub fn filter_tasks<'a>(snapshot: &'a ResourceSnapshot<Task>, filter: &TaskFilter) -> Vec<&'a Task> {
    let needle = normalize_search(&filter.search);
    let mut tasks: Vec<&Task> = snapshot
        .iter()
        .filter(|t| filter.matches(t, &needle))
        .collect();
    tasks.sort_by_key(|t| (Reverse(t.priority), Reverse(t.created_at)));
    tasks
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskColumn {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

/// One column per status, in workflow order, including empty ones.
pub fn task_board(snapshot: &ResourceSnapshot<Task>, filter: &TaskFilter) -> Vec<TaskColumn> {
    let matching = filter_tasks(snapshot, filter);
    TaskStatus::ALL
        .iter()
        .map(|&status| TaskColumn {
            status,
            tasks: matching
                .iter()
                .filter(|t| t.status == status)
                .map(|t| (*t).clone())
                .collect(),
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: usize,
    /// Pending or in progress.
    pub active: usize,
    /// Completed, waiting for a manager.
    pub awaiting_approval: usize,
    pub approved: usize,
    pub rejected: usize,
    pub urgent_open: usize,
}

pub fn task_counts(snapshot: &ResourceSnapshot<Task>) -> TaskCounts {
    snapshot.iter().fold(TaskCounts::default(), |mut counts, task| {
        counts.total += 1;
        match task.status {
            TaskStatus::Pending | TaskStatus::InProgress => {
                counts.active += 1;
                if task.priority == TaskPriority::Urgent {
                    counts.urgent_open += 1;
                }
            }
            TaskStatus::Completed => counts.awaiting_approval += 1,
            TaskStatus::Approved => counts.approved += 1,
            TaskStatus::Rejected => counts.rejected += 1,
        }
        counts
    })
}
