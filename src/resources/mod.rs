//! Typed remote collections.
//!
//! Every collection the dashboard synchronizes implements [`Resource`]: it
//! knows its table name, its id, its `updated_at` stamp, and how to apply its
//! own partial update (`Patch`). Stores, clients and bindings are generic over
//! this trait.

mod booking;
mod employee;
mod inventory;
mod shift;
mod task;
mod transfer;

pub use booking::{Booking, BookingPatch, BookingStatus};
pub use employee::{Employee, EmployeePatch, EmployeeRole, Permissions, RoleAccess};
pub use inventory::{InventoryItem, InventoryItemPatch, InventoryLocation};
pub use shift::{Shift, ShiftPatch, ShiftStatus};
pub use task::{Task, TaskCategory, TaskPatch, TaskPriority, TaskStatus};
pub use transfer::{InventoryTransfer, InventoryTransferPatch};

use crate::error::ErrorInfo;
use crate::types::{RecordId, ResourceName, Timestamp};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// A record of a named remote collection.
pub trait Resource:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Partial update applied both optimistically and by the backend.
    type Patch: Clone + fmt::Debug + Send + Sync + 'static;

    /// Table name used by the backend and the push transport.
    const NAME: &'static str;

    fn resource_name() -> ResourceName {
        ResourceName::from_static(Self::NAME)
    }

    fn id(&self) -> &RecordId;

    fn set_id(&mut self, id: RecordId);

    fn updated_at(&self) -> Timestamp;

    /// Stamp the record as modified at `at`.
    fn touch(&mut self, at: Timestamp);

    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Server-side payload checks. The in-memory backend enforces these.
    fn validate(&self) -> Result<(), ErrorInfo> {
        Ok(())
    }
}

/// Set `target` when the patch carries a value.
pub(crate) fn patch_field<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}
