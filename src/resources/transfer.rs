//! Stock movement history. Rows are written once per transfer and never
//! change afterwards, except for their notes.

use super::{patch_field, InventoryLocation, Resource};
use crate::error::ErrorInfo;
use crate::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryTransfer {
    pub id: RecordId,
    #[serde(default)]
    pub venue_id: String,
    pub inventory_item_id: RecordId,
    pub from_location: InventoryLocation,
    pub to_location: InventoryLocation,
    pub quantity: i64,
    #[serde(default)]
    pub transferred_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl InventoryTransfer {
    /// An unsaved log row for moving `quantity` units out of `from`.
    pub fn new(item_id: impl Into<RecordId>, from: InventoryLocation, quantity: i64) -> Self {
        Self {
            id: RecordId::new(""),
            venue_id: String::new(),
            inventory_item_id: item_id.into(),
            from_location: from,
            to_location: from.other(),
            quantity,
            transferred_by: None,
            notes: None,
            created_at: Timestamp::default(),
            updated_at: Timestamp::default(),
        }
    }

    pub fn by(mut self, employee_id: impl Into<String>) -> Self {
        self.transferred_by = Some(employee_id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InventoryTransferPatch {
    pub notes: Option<Option<String>>,
}

impl Resource for InventoryTransfer {
    type Patch = InventoryTransferPatch;
    const NAME: &'static str = "inventory_transfers";

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
        if self.created_at == Timestamp::default() {
            self.created_at = at;
        }
        self.updated_at = at;
    }

    fn apply_patch(&mut self, patch: &InventoryTransferPatch) {
        patch_field(&mut self.notes, &patch.notes);
    }

    fn validate(&self) -> Result<(), ErrorInfo> {
        if self.inventory_item_id.as_str().is_empty() {
            return Err(ErrorInfo::validation("inventory_item_id", "item is required"));
        }
        if self.quantity <= 0 {
            return Err(ErrorInfo::validation("quantity", "quantity must be positive"));
        }
        if self.from_location == self.to_location {
            return Err(ErrorInfo::validation("to_location", "locations must differ"));
        }
        Ok(())
    }
}
