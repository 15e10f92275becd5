//! Stock items tracked in two locations: back storage and the bar.

use super::{patch_field, Resource};
use crate::error::ErrorInfo;
use crate::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryLocation {
    Storage,
    Bar,
}

impl InventoryLocation {
    pub fn other(self) -> Self {
        match self {
            InventoryLocation::Storage => InventoryLocation::Bar,
            InventoryLocation::Bar => InventoryLocation::Storage,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: RecordId,
    #[serde(default)]
    pub venue_id: String,
    pub name: String,
    #[serde(default)]
    pub barcode: String,
    pub category: String,
    #[serde(default)]
    pub unit: String,
    pub storage_count: i64,
    pub bar_count: i64,
    pub min_stock: i64,
    #[serde(default)]
    pub max_stock: Option<i64>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub cost_price: f64,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

fn default_active() -> bool {
    true
}

impl InventoryItem {
    pub fn new(
        id: impl Into<RecordId>,
        name: impl Into<String>,
        category: impl Into<String>,
        storage_count: i64,
        bar_count: i64,
        min_stock: i64,
    ) -> Self {
        Self {
            id: id.into(),
            venue_id: String::new(),
            name: name.into(),
            barcode: String::new(),
            category: category.into(),
            unit: "bottle".to_string(),
            storage_count,
            bar_count,
            min_stock,
            max_stock: None,
            price: 0.0,
            cost_price: 0.0,
            supplier: None,
            is_active: true,
            created_at: Timestamp::default(),
            updated_at: Timestamp::default(),
        }
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = barcode.into();
        self
    }

    pub fn with_prices(mut self, price: f64, cost_price: f64) -> Self {
        self.price = price;
        self.cost_price = cost_price;
        self
    }

    pub fn total_count(&self) -> i64 {
        self.storage_count + self.bar_count
    }

    pub fn is_low_stock(&self) -> bool {
        self.total_count() < self.min_stock
    }

    pub fn count_at(&self, location: InventoryLocation) -> i64 {
        match location {
            InventoryLocation::Storage => self.storage_count,
            InventoryLocation::Bar => self.bar_count,
        }
    }

    pub fn storage_value(&self) -> f64 {
        self.storage_count as f64 * self.cost_price
    }

    pub fn bar_value(&self) -> f64 {
        self.bar_count as f64 * self.cost_price
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InventoryItemPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub storage_count: Option<i64>,
    pub bar_count: Option<i64>,
    pub min_stock: Option<i64>,
    pub price: Option<f64>,
    pub cost_price: Option<f64>,
    pub is_active: Option<bool>,
}

impl InventoryItemPatch {
    pub fn counts(storage_count: i64, bar_count: i64) -> Self {
        Self {
            storage_count: Some(storage_count),
            bar_count: Some(bar_count),
            ..Default::default()
        }
    }

    /// Move `quantity` units out of `from` into the other location.
    ///
    /// Fails with a validation error when `from` holds fewer than `quantity`.
    pub fn transfer(
        item: &InventoryItem,
        from: InventoryLocation,
        quantity: i64,
    ) -> Result<Self, ErrorInfo> {
        if quantity <= 0 {
            return Err(ErrorInfo::validation("quantity", "quantity must be positive"));
        }
        let (storage, bar) = match from {
            InventoryLocation::Storage => (item.storage_count - quantity, item.bar_count + quantity),
            InventoryLocation::Bar => (item.storage_count + quantity, item.bar_count - quantity),
        };
        if storage < 0 || bar < 0 {
            return Err(ErrorInfo::validation("quantity", "Insufficient quantity"));
        }
        Ok(Self::counts(storage, bar))
    }
}

impl Resource for InventoryItem {
    type Patch = InventoryItemPatch;
    const NAME: &'static str = "inventory_items";

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

    fn apply_patch(&mut self, patch: &InventoryItemPatch) {
        patch_field(&mut self.name, &patch.name);
        patch_field(&mut self.category, &patch.category);
        patch_field(&mut self.storage_count, &patch.storage_count);
        patch_field(&mut self.bar_count, &patch.bar_count);
        patch_field(&mut self.min_stock, &patch.min_stock);
        patch_field(&mut self.price, &patch.price);
        patch_field(&mut self.cost_price, &patch.cost_price);
        patch_field(&mut self.is_active, &patch.is_active);
    }

    fn validate(&self) -> Result<(), ErrorInfo> {
        if self.name.trim().is_empty() {
            return Err(ErrorInfo::validation("name", "item name is required"));
        }
        if self.storage_count < 0 {
            return Err(ErrorInfo::validation("storage_count", "count cannot be negative"));
        }
        if self.bar_count < 0 {
            return Err(ErrorInfo::validation("bar_count", "count cannot be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gin() -> InventoryItem {
        InventoryItem::new("i1", "Hendricks Gin", "Spirits", 6, 2, 4).with_prices(12.0, 28.0)
    }

    #[test]
    fn test_low_stock_uses_both_locations() {
        let mut item = gin();
        assert!(!item.is_low_stock());
        item.storage_count = 1;
        item.bar_count = 2;
        assert!(item.is_low_stock());
    }

    #[test]
    fn test_transfer_moves_between_locations() {
        let patch = InventoryItemPatch::transfer(&gin(), InventoryLocation::Storage, 4).unwrap();
        assert_eq!(patch.storage_count, Some(2));
        assert_eq!(patch.bar_count, Some(6));

        let back = InventoryItemPatch::transfer(&gin(), InventoryLocation::Bar, 2).unwrap();
        assert_eq!(back.storage_count, Some(8));
        assert_eq!(back.bar_count, Some(0));
    }

    #[test]
    fn test_transfer_rejects_overdraw() {
        let err = InventoryItemPatch::transfer(&gin(), InventoryLocation::Bar, 3).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
        assert_eq!(err.field.as_deref(), Some("quantity"));
    }

    #[test]
    fn test_values_use_cost_price() {
        let item = gin();
        assert_eq!(item.storage_value(), 168.0);
        assert_eq!(item.bar_value(), 56.0);
    }
}
