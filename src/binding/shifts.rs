//! Active shifts, history and the daily shift summary.

use crate::resources::{Shift, ShiftStatus};
use crate::store::ResourceSnapshot;
use crate::types::Timestamp;
use std::cmp::Reverse;

/// Shifts still clocked in, most recent clock-in first.
pub fn active_shifts(snapshot: &ResourceSnapshot<Shift>) -> Vec<&Shift> {
    let mut shifts: Vec<&Shift> = snapshot
        .iter()
        .filter(|s| s.status == ShiftStatus::Active)
        .collect();
    shifts.sort_by_key(|s| Reverse(s.clock_in));
    shifts
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShiftHistoryFilter {
    /// Inclusive clock-in window.
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub employee_id: Option<String>,
    pub limit: Option<usize>,
}

pub fn shift_history<'a>(
    snapshot: &'a ResourceSnapshot<Shift>,
    filter: &ShiftHistoryFilter,
) -> Vec<&'a Shift> {
    let mut shifts: Vec<&Shift> = snapshot
        .iter()
        .filter(|s| filter.from.map_or(true, |from| s.clock_in >= from))
        .filter(|s| filter.to.map_or(true, |to| s.clock_in <= to))
        .filter(|s| {
            filter
                .employee_id
                .as_ref()
                .map_or(true, |id| &s.employee_id == id)
        })
        .collect();
    shifts.sort_by_key(|s| Reverse(s.clock_in));
    shifts.truncate(filter.limit.unwrap_or(usize::MAX));
    shifts
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShiftSummary {
    pub active_shifts: usize,
    /// Hours worked today, rounded to one decimal.
    pub total_hours_today: f64,
    pub total_overtime_minutes: i64,
    pub employees_on_break: usize,
}

/// Today's totals: running shifts count up to `now`; shifts completed since
/// `day_start` contribute their recorded hours and overtime.
pub fn shift_summary(
    snapshot: &ResourceSnapshot<Shift>,
    day_start: Timestamp,
    now: Timestamp,
) -> ShiftSummary {
    let mut summary = ShiftSummary::default();
    let mut minutes_running = 0i64;
    let mut hours_completed = 0.0f64;

    for shift in snapshot.iter() {
        match shift.status {
            ShiftStatus::Active => {
                summary.active_shifts += 1;
                let working = shift.working_minutes(now);
                minutes_running += working;
                summary.total_overtime_minutes += (working - shift.expected_minutes()).max(0);
                if shift.is_on_break() {
                    summary.employees_on_break += 1;
                }
            }
            ShiftStatus::Completed if shift.clock_in >= day_start => {
                hours_completed += shift.actual_hours.unwrap_or(0.0);
                summary.total_overtime_minutes += shift.overtime_minutes;
            }
            ShiftStatus::Completed => {}
        }
    }

    let hours = minutes_running as f64 / 60.0 + hours_completed;
    summary.total_hours_today = (hours * 10.0).round() / 10.0;
    summary
}
