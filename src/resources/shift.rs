//! Clock-in/clock-out shifts with break and overtime accounting.

use super::{patch_field, Resource};
use crate::error::ErrorInfo;
use crate::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Active,
    Completed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub id: RecordId,
    #[serde(default)]
    pub venue_id: String,
    pub employee_id: String,
    pub clock_in: Timestamp,
    #[serde(default)]
    pub clock_out: Option<Timestamp>,
    #[serde(default)]
    pub break_start: Option<Timestamp>,
    #[serde(default)]
    pub break_minutes: i64,
    pub expected_hours: f64,
    #[serde(default)]
    pub actual_hours: Option<f64>,
    #[serde(default)]
    pub overtime_minutes: i64,
    pub status: ShiftStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl Shift {
    /// An active shift starting at `clock_in`.
    pub fn start(
        id: impl Into<RecordId>,
        employee_id: impl Into<String>,
        clock_in: Timestamp,
        expected_hours: f64,
    ) -> Self {
        Self {
            id: id.into(),
            venue_id: String::new(),
            employee_id: employee_id.into(),
            clock_in,
            clock_out: None,
            break_start: None,
            break_minutes: 0,
            expected_hours,
            actual_hours: None,
            overtime_minutes: 0,
            status: ShiftStatus::Active,
            notes: None,
            created_at: clock_in,
            updated_at: clock_in,
        }
    }

    pub fn is_on_break(&self) -> bool {
        self.break_start.is_some()
    }

    /// Minutes worked up to `now`, excluding recorded breaks.
    pub fn working_minutes(&self, now: Timestamp) -> i64 {
        let end = self.clock_out.unwrap_or(now);
        (end.minutes_since(self.clock_in) - self.break_minutes).max(0)
    }

    pub fn expected_minutes(&self) -> i64 {
        (self.expected_hours * 60.0).round() as i64
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShiftPatch {
    pub clock_out: Option<Option<Timestamp>>,
    pub break_start: Option<Option<Timestamp>>,
    pub break_minutes: Option<i64>,
    pub actual_hours: Option<Option<f64>>,
    pub overtime_minutes: Option<i64>,
    pub status: Option<ShiftStatus>,
    pub notes: Option<Option<String>>,
}

impl ShiftPatch {
    /// Close the shift at `at`, computing actual hours and overtime.
    pub fn clock_out(shift: &Shift, at: Timestamp, notes: Option<String>) -> Result<Self, ErrorInfo> {
        if shift.status == ShiftStatus::Completed {
            return Err(ErrorInfo::validation("status", "shift is already completed"));
        }
        let working = (at.minutes_since(shift.clock_in) - shift.break_minutes).max(0);
        let actual_hours = (working as f64 / 60.0 * 100.0).round() / 100.0;
        let overtime = (working - shift.expected_minutes()).max(0);
        Ok(Self {
            clock_out: Some(Some(at)),
            actual_hours: Some(Some(actual_hours)),
            overtime_minutes: Some(overtime),
            status: Some(ShiftStatus::Completed),
            notes: Some(notes),
            ..Default::default()
        })
    }

    pub fn start_break(shift: &Shift, at: Timestamp) -> Result<Self, ErrorInfo> {
        if shift.status != ShiftStatus::Active {
            return Err(ErrorInfo::validation("status", "shift is not active"));
        }
        if shift.is_on_break() {
            return Err(ErrorInfo::validation("break_start", "break already started"));
        }
        Ok(Self {
            break_start: Some(Some(at)),
            ..Default::default()
        })
    }

    /// Close the running break, adding its length to `break_minutes`.
    pub fn end_break(shift: &Shift, at: Timestamp) -> Result<Self, ErrorInfo> {
        let started = shift
            .break_start
            .ok_or_else(|| ErrorInfo::validation("break_start", "No active break found"))?;
        Ok(Self {
            break_start: Some(None),
            break_minutes: Some(shift.break_minutes + at.minutes_since(started)),
            ..Default::default()
        })
    }
}

impl Resource for Shift {
    type Patch = ShiftPatch;
    const NAME: &'static str = "shifts";

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

    fn apply_patch(&mut self, patch: &ShiftPatch) {
        patch_field(&mut self.clock_out, &patch.clock_out);
        patch_field(&mut self.break_start, &patch.break_start);
        patch_field(&mut self.break_minutes, &patch.break_minutes);
        patch_field(&mut self.actual_hours, &patch.actual_hours);
        patch_field(&mut self.overtime_minutes, &patch.overtime_minutes);
        patch_field(&mut self.status, &patch.status);
        patch_field(&mut self.notes, &patch.notes);
    }

    fn validate(&self) -> Result<(), ErrorInfo> {
        if self.employee_id.is_empty() {
            return Err(ErrorInfo::validation("employee_id", "employee is required"));
        }
        if self.expected_hours <= 0.0 {
            return Err(ErrorInfo::validation("expected_hours", "expected hours must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60;

    fn shift_at(secs: i64) -> Shift {
        Shift::start("s1", "e1", Timestamp::from_secs(secs), 8.0)
    }

    #[test]
    fn test_clock_out_computes_overtime() {
        let mut shift = shift_at(0);
        shift.break_minutes = 30;
        // 9h on the clock, 30min break -> 8.5h worked, 30min overtime
        let at = Timestamp::from_secs(9 * 60 * MIN);
        let patch = ShiftPatch::clock_out(&shift, at, Some("closing".into())).unwrap();
        assert_eq!(patch.actual_hours, Some(Some(8.5)));
        assert_eq!(patch.overtime_minutes, Some(30));
        assert_eq!(patch.status, Some(ShiftStatus::Completed));
    }

    #[test]
    fn test_clock_out_twice_is_rejected() {
        let mut shift = shift_at(0);
        shift.status = ShiftStatus::Completed;
        assert!(ShiftPatch::clock_out(&shift, Timestamp::from_secs(10), None).is_err());
    }

    #[test]
    fn test_break_accumulates() {
        let mut shift = shift_at(0);
        shift.break_minutes = 10;
        shift.apply_patch(&ShiftPatch::start_break(&shift, Timestamp::from_secs(60 * MIN)).unwrap());
        assert!(shift.is_on_break());

        let patch = ShiftPatch::end_break(&shift, Timestamp::from_secs(75 * MIN)).unwrap();
        shift.apply_patch(&patch);
        assert!(!shift.is_on_break());
        assert_eq!(shift.break_minutes, 25);
    }

    #[test]
    fn test_end_break_without_break() {
        let err = ShiftPatch::end_break(&shift_at(0), Timestamp::from_secs(10)).unwrap_err();
        assert_eq!(err.message, "No active break found");
    }

    #[test]
    fn test_working_minutes_excludes_breaks() {
        let mut shift = shift_at(0);
        shift.break_minutes = 15;
        assert_eq!(shift.working_minutes(Timestamp::from_secs(60 * MIN)), 45);
    }
}
