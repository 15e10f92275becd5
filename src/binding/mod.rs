//! Presentation bindings: pure functions from snapshots to view models.
//!
//! Bindings never touch a store. They take an immutable
//! [`ResourceSnapshot`](crate::store::ResourceSnapshot) plus the view's filter
//! state and return what the view renders, so the same snapshot always yields
//! the same output. Whether a row carries an unconfirmed change is answered by
//! [`StoreView::is_pending`](crate::store::StoreView::is_pending).

pub mod bookings;
pub mod dashboard;
pub mod employees;
pub mod inventory;
pub mod shifts;
pub mod tasks;

pub use bookings::{day_summary, filter_bookings, group_by_date, BookingFilter, BookingGroup, DaySummary};
pub use dashboard::{dashboard_summary, DashboardSources, DashboardSummary};
pub use employees::{filter_employees, group_by_role, EmployeeFilter, RoleGroup};
pub use inventory::{
    categories, filter_inventory, find_by_barcode, inventory_stats, transfer_history,
    InventoryFilter, InventoryStats, InventoryView,
};
pub use shifts::{active_shifts, shift_history, shift_summary, ShiftHistoryFilter, ShiftSummary};
pub use tasks::{filter_tasks, task_board, task_counts, TaskColumn, TaskCounts, TaskFilter};

/// Lowercased, trimmed search input. Empty means "match everything".
pub(crate) fn normalize_search(search: &str) -> String {
    search.trim().to_lowercase()
}

/// Case-insensitive substring match against an already normalized needle.
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(needle)
}
