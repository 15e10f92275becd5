//! Owner dashboard tiles.

use super::bookings::day_summary;
use super::inventory::inventory_stats;
use super::shifts::shift_summary;
use super::tasks::task_counts;
use crate::resources::{Booking, InventoryItem, Shift, Task};
use crate::store::ResourceSnapshot;
use crate::types::Timestamp;

/// Snapshots the dashboard reads from. Pass confirmed snapshots so tiles do
/// not count unsaved changes.
#[derive(Clone, Copy, Debug)]
pub struct DashboardSources<'a> {
    pub bookings: &'a ResourceSnapshot<Booking>,
    pub tasks: &'a ResourceSnapshot<Task>,
    pub shifts: &'a ResourceSnapshot<Shift>,
    pub inventory: &'a ResourceSnapshot<InventoryItem>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardSummary {
    pub todays_bookings: usize,
    pub todays_guests: u32,
    pub pending_bookings: usize,
    pub open_tasks: usize,
    pub tasks_awaiting_approval: usize,
    pub active_shifts: usize,
    pub employees_on_break: usize,
    pub hours_today: f64,
    pub low_stock_items: usize,
}

/// `today` is the `YYYY-MM-DD` date bookings are matched against;
/// `day_start` and `now` bound the shift totals.
pub fn dashboard_summary(
    sources: DashboardSources<'_>,
    today: &str,
    day_start: Timestamp,
    now: Timestamp,
) -> DashboardSummary {
    let day = day_summary(sources.bookings, today);
    let tasks = task_counts(sources.tasks);
    let shifts = shift_summary(sources.shifts, day_start, now);
    let stock = inventory_stats(sources.inventory);

    DashboardSummary {
        todays_bookings: day.total,
        todays_guests: day.guests,
        pending_bookings: day.pending,
        open_tasks: tasks.active,
        tasks_awaiting_approval: tasks.awaiting_approval,
        active_shifts: shifts.active_shifts,
        employees_on_break: shifts.employees_on_break,
        hours_today: shifts.total_hours_today,
        low_stock_items: stock.low_stock_items,
    }
}
