//! Domain actions on typed stores.
//!
//! Actions whose patch depends on the record's current values (stock
//! counts, break minutes) build it from the server-confirmed copy, so
//! workflow checks (insufficient stock, clocking out twice) fail locally
//! without a server round-trip and a rolled-back change never leaks into a
//! later write.

use super::ResourceStore;
use crate::error::{ErrorInfo, Result};
use crate::resources::{
    Booking, BookingPatch, BookingStatus, Employee, EmployeePatch, EmployeeRole, InventoryItem,
    InventoryItemPatch, InventoryLocation, InventoryTransfer, Shift, ShiftPatch, Task, TaskPatch,
    TaskStatus,
};
use crate::types::{RecordId, Timestamp};

impl ResourceStore<Booking> {
    pub async fn set_booking_status(&self, id: &RecordId, status: BookingStatus) -> Result<Booking> {
        self.update(id, BookingPatch::status(status)).await
    }
}

impl ResourceStore<Task> {
    /// Move a task through its workflow, stamping completion or approval.
    pub async fn set_task_status(
        &self,
        id: &RecordId,
        status: TaskStatus,
        actor: Option<&str>,
    ) -> Result<Task> {
        self.update(id, TaskPatch::transition(status, Timestamp::now(), actor))
            .await
    }

    pub async fn reject_task(&self, id: &RecordId, reason: &str) -> Result<Task> {
        if reason.trim().is_empty() {
            return Err(self.reject_locally(ErrorInfo::validation(
                "rejection_reason",
                "a rejected task needs a reason",
            )));
        }
        self.update(id, TaskPatch::reject(reason)).await
    }

    pub async fn assign_task(&self, id: &RecordId, employee_id: Option<String>) -> Result<Task> {
        self.update(id, TaskPatch::assign(employee_id)).await
    }
}

impl ResourceStore<InventoryItem> {
    /// Set both counts, e.g. after a stock take.
    pub async fn set_counts(&self, id: &RecordId, storage: i64, bar: i64) -> Result<InventoryItem> {
        if storage < 0 || bar < 0 {
            return Err(self.reject_locally(ErrorInfo::validation(
                "quantity",
                "counts cannot be negative",
            )));
        }
        self.update(id, InventoryItemPatch::counts(storage, bar)).await
    }

    /// Move stock between storage and bar.
    pub async fn transfer(
        &self,
        id: &RecordId,
        from: InventoryLocation,
        quantity: i64,
    ) -> Result<InventoryItem> {
        self.update_confirmed(id, |item| InventoryItemPatch::transfer(item, from, quantity))
            .await
    }
}

impl ResourceStore<InventoryTransfer> {
    /// Append a history row for a transfer already applied to the item.
    pub async fn log_transfer(
        &self,
        item: &InventoryItem,
        from: InventoryLocation,
        quantity: i64,
        transferred_by: Option<&str>,
    ) -> Result<InventoryTransfer> {
        let mut row = InventoryTransfer::new(item.id.clone(), from, quantity);
        row.venue_id = item.venue_id.clone();
        row.transferred_by = transferred_by.map(str::to_string);
        self.create(row).await
    }
}

impl ResourceStore<Shift> {
    /// Open a shift for `employee_id` starting at `at`.
    pub async fn clock_in(
        &self,
        employee_id: &str,
        expected_hours: f64,
        at: Timestamp,
    ) -> Result<Shift> {
        let already_active = self
            .snapshot()
            .iter()
            .any(|s| s.employee_id == employee_id && s.clock_out.is_none());
        if already_active {
            return Err(self.reject_locally(ErrorInfo::validation(
                "employee_id",
                "employee is already clocked in",
            )));
        }
        self.create(Shift::start(RecordId::new(""), employee_id, at, expected_hours))
            .await
    }

    pub async fn clock_out(&self, id: &RecordId, at: Timestamp, notes: Option<String>) -> Result<Shift> {
        self.update_confirmed(id, |shift| ShiftPatch::clock_out(shift, at, notes))
            .await
    }

    pub async fn start_break(&self, id: &RecordId, at: Timestamp) -> Result<Shift> {
        self.update_confirmed(id, |shift| ShiftPatch::start_break(shift, at))
            .await
    }

    pub async fn end_break(&self, id: &RecordId, at: Timestamp) -> Result<Shift> {
        self.update_confirmed(id, |shift| ShiftPatch::end_break(shift, at))
            .await
    }
}

impl ResourceStore<Employee> {
    pub async fn set_employee_role(&self, id: &RecordId, role: EmployeeRole) -> Result<Employee> {
        self.update(
            id,
            EmployeePatch {
                role: Some(role),
                ..Default::default()
            },
        )
        .await
    }

    /// Deactivate instead of deleting, so shift history keeps its employee.
    pub async fn set_employee_active(&self, id: &RecordId, active: bool) -> Result<Employee> {
        self.update(
            id,
            EmployeePatch {
                is_active: Some(active),
                ..Default::default()
            },
        )
        .await
    }
}
