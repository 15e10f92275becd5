//! Inventory list, stock views and valuation.

use super::{contains_ci, normalize_search};
use crate::resources::{InventoryItem, InventoryTransfer};
use crate::types::RecordId;
use crate::store::ResourceSnapshot;

/// Which slice of stock the list shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InventoryView {
    #[default]
    All,
    /// Items with stock in storage.
    Storage,
    /// Items with stock behind the bar.
    Bar,
    /// Items whose total count is below their minimum.
    LowStock,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InventoryFilter {
    /// Matches name case-insensitively, or a barcode substring.
    pub search: String,
    pub category: Option<String>,
    pub view: InventoryView,
}

pub fn filter_inventory<'a>(
    snapshot: &'a ResourceSnapshot<InventoryItem>,
    filter: &InventoryFilter,
) -> Vec<&'a InventoryItem> {
    let needle = normalize_search(&filter.search);
    snapshot
        .iter()
        .filter(|item| contains_ci(&item.name, &needle) || item.barcode.contains(&needle))
        .filter(|item| match &filter.category {
            Some(category) => &item.category == category,
            None => true,
        })
        .filter(|item| match filter.view {
            InventoryView::All => true,
            InventoryView::Storage => item.storage_count > 0,
            InventoryView::Bar => item.bar_count > 0,
            InventoryView::LowStock => item.is_low_stock(),
        })
        .collect()
}

/// Scanner lookup.
pub fn find_by_barcode<'a>(
    snapshot: &'a ResourceSnapshot<InventoryItem>,
    barcode: &str,
) -> Option<&'a InventoryItem> {
    let barcode = barcode.trim();
    if barcode.is_empty() {
        return None;
    }
    snapshot.iter().find(|item| item.barcode == barcode)
}

/// Header totals. Values are at cost price.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InventoryStats {
    pub total_items: usize,
    pub low_stock_items: usize,
    pub storage_value: f64,
    pub bar_value: f64,
}

impl InventoryStats {
    pub fn total_value(&self) -> f64 {
        self.storage_value + self.bar_value
    }
}

/// Compute over a confirmed snapshot so unsaved counts do not move totals.
pub fn inventory_stats(snapshot: &ResourceSnapshot<InventoryItem>) -> InventoryStats {
    snapshot
        .iter()
        .fold(InventoryStats::default(), |mut stats, item| {
            stats.total_items += 1;
            if item.is_low_stock() {
                stats.low_stock_items += 1;
            }
            stats.storage_value += item.storage_value();
            stats.bar_value += item.bar_value();
            stats
        })
}

/// Distinct categories, sorted, for the category picker.
pub fn categories(snapshot: &ResourceSnapshot<InventoryItem>) -> Vec<String> {
    let mut categories: Vec<String> = snapshot.iter().map(|i| i.category.clone()).collect();
    categories.sort();
    categories.dedup();
    categories
}

/// Transfers of one item, newest first.
pub fn transfer_history<'a>(
    snapshot: &'a ResourceSnapshot<InventoryTransfer>,
    item_id: &RecordId,
) -> Vec<&'a InventoryTransfer> {
    let mut rows: Vec<&InventoryTransfer> = snapshot
        .iter()
        .filter(|t| &t.inventory_item_id == item_id)
        .collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ResourceSnapshot<InventoryItem> {
        ResourceSnapshot::new(
            vec![
                InventoryItem::new("i-1", "Tanqueray Gin", "spirits", 6, 2, 4)
                    .with_barcode("5000291020706")
                    .with_prices(32.0, 18.5),
                InventoryItem::new("i-2", "Club Mate", "soft", 0, 3, 12)
                    .with_barcode("4029764001807")
                    .with_prices(3.5, 1.2),
                InventoryItem::new("i-3", "Lime", "garnish", 10, 0, 5),
            ],
            1,
        )
    }

    fn ids(items: Vec<&InventoryItem>) -> Vec<&str> {
        items.into_iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_search_by_name_or_barcode() {
        let snap = snapshot();
        let by_name = InventoryFilter {
            search: "GIN".into(),
            ..Default::default()
        };
        assert_eq!(ids(filter_inventory(&snap, &by_name)), vec!["i-1"]);

        let by_code = InventoryFilter {
            search: "4029".into(),
            ..Default::default()
        };
        assert_eq!(ids(filter_inventory(&snap, &by_code)), vec!["i-2"]);
    }

    #[test]
    fn test_views() {
        let snap = snapshot();
        let view = |view| InventoryFilter {
            view,
            ..Default::default()
        };
        assert_eq!(ids(filter_inventory(&snap, &view(InventoryView::Storage))), vec!["i-1", "i-3"]);
        assert_eq!(ids(filter_inventory(&snap, &view(InventoryView::Bar))), vec!["i-1", "i-2"]);
        assert_eq!(ids(filter_inventory(&snap, &view(InventoryView::LowStock))), vec!["i-2"]);
    }

    #[test]
    fn test_category_filter() {
        let snap = snapshot();
        let filter = InventoryFilter {
            category: Some("garnish".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter_inventory(&snap, &filter)), vec!["i-3"]);
        assert_eq!(categories(&snap), vec!["garnish", "soft", "spirits"]);
    }

    #[test]
    fn test_stats_at_cost_price() {
        let stats = inventory_stats(&snapshot());
        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.low_stock_items, 1);
        assert!((stats.storage_value - 111.0).abs() < 1e-9);
        assert!((stats.bar_value - (37.0 + 3.6)).abs() < 1e-9);
    }

    #[test]
    fn test_barcode_lookup() {
        let snap = snapshot();
        assert_eq!(find_by_barcode(&snap, " 5000291020706 ").map(|i| i.id.as_str()), Some("i-1"));
        assert!(find_by_barcode(&snap, "").is_none());
    }

    #[test]
    fn test_transfer_history_is_newest_first() {
        use crate::resources::{InventoryLocation, Resource};
        use crate::types::Timestamp;

        let row = |id: &str, item: &str, at: i64| {
            let mut row = InventoryTransfer::new(item, InventoryLocation::Storage, 1);
            row.id = id.into();
            row.touch(Timestamp(at));
            row
        };
        let snap = ResourceSnapshot::new(
            vec![row("t-1", "i-1", 10), row("t-2", "i-2", 20), row("t-3", "i-1", 30)],
            1,
        );
        let history: Vec<&str> = transfer_history(&snap, &"i-1".into())
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(history, vec!["t-3", "t-1"]);
    }
}
