//! Scaling tests with large collections and many subscribers.
//!
//! Measures the operations a busy venue dashboard hits most:
//! - Full refresh of a large collection
//! - Optimistic mutation on a large snapshot
//! - Change fan-out to many mounted stores
//! - Bindings over large snapshots

use resource_sync::binding::{filter_bookings, group_by_date, inventory_stats, BookingFilter};
use resource_sync::{
    Booking, BookingStatus, ChangeNotificationBus, InventoryItem, ListQuery, MemoryClient,
    MemoryTransport, ReconnectOptions, ResourceStore, SyncConfig,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

const RECORD_COUNT: usize = 10_000;

/// Timing helper
struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    fn report(&self) {
        println!("  {} took {:.2}ms", self.name, self.elapsed_ms());
    }
}

fn bookings(n: usize) -> Vec<Booking> {
    (0..n)
        .map(|i| {
            let status = match i % 4 {
                0 => BookingStatus::Pending,
                1 => BookingStatus::Confirmed,
                2 => BookingStatus::Completed,
                _ => BookingStatus::Cancelled,
            };
            Booking::new(
                format!("b-{}", i),
                format!("Guest {}", i),
                format!("2026-10-{:02}", 1 + i % 28),
                format!("{:02}:{:02}", 17 + i % 6, (i % 4) * 15),
                1 + (i % 8) as u32,
            )
            .with_status(status)
        })
        .collect()
}

#[tokio::test]
async fn test_scaling_large_refresh_and_mutation() {
    println!("\n=== Large collection: {} bookings ===", RECORD_COUNT);
    let client = Arc::new(MemoryClient::with_records(bookings(RECORD_COUNT)));
    let store = ResourceStore::new(client.clone(), SyncConfig::default());

    let timer = Timer::new("initial load");
    store.refresh().await.unwrap();
    timer.report();
    assert_eq!(store.snapshot().len(), RECORD_COUNT);

    let timer = Timer::new("identical refresh");
    let before = store.snapshot();
    store.refresh().await.unwrap();
    timer.report();
    assert!(Arc::ptr_eq(&before, &store.snapshot()));

    let timer = Timer::new("100 sequential mutations");
    for i in 0..100 {
        store
            .set_booking_status(&format!("b-{}", i * 4).into(), BookingStatus::Confirmed)
            .await
            .unwrap();
    }
    timer.report();

    let confirmed = store
        .snapshot()
        .iter()
        .filter(|b| b.status == BookingStatus::Confirmed)
        .count();
    assert_eq!(confirmed, RECORD_COUNT / 4 + 100);
    assert_eq!(store.snapshot().records(), client.records().as_slice());
}

#[tokio::test]
async fn test_scaling_bindings() {
    println!("\n=== Bindings over {} records ===", RECORD_COUNT);
    let client = Arc::new(MemoryClient::with_records(bookings(RECORD_COUNT)));
    let store = ResourceStore::new(client, SyncConfig::default());
    store.refresh().await.unwrap();
    let snapshot = store.snapshot();

    let timer = Timer::new("search");
    let filter = BookingFilter {
        search: "guest 99".into(),
        ..Default::default()
    };
    let found = filter_bookings(&snapshot, &filter);
    timer.report();
    assert_eq!(found.len(), 111); // 99, 990..=999, 9900..=9999

    let timer = Timer::new("group by date");
    let groups = group_by_date(&snapshot, &BookingFilter::default());
    timer.report();
    assert_eq!(groups.len(), 28);
    assert_eq!(
        groups.iter().map(|g| g.bookings.len()).sum::<usize>(),
        RECORD_COUNT
    );

    let items: Vec<InventoryItem> = (0..RECORD_COUNT)
        .map(|i| {
            InventoryItem::new(format!("i-{}", i), format!("Item {}", i), "misc", i as i64 % 7, 1, 3)
                .with_prices(2.0, 1.0)
        })
        .collect();
    let inventory = ResourceStore::new(Arc::new(MemoryClient::with_records(items)), SyncConfig::default());
    inventory.refresh().await.unwrap();

    let timer = Timer::new("inventory stats");
    let stats = inventory_stats(&inventory.snapshot());
    timer.report();
    assert_eq!(stats.total_items, RECORD_COUNT);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_scaling_subscriber_fanout() {
    const STORES: usize = 50;
    println!("\n=== Fan-out to {} stores ===", STORES);

    let transport = Arc::new(MemoryTransport::new());
    let client = Arc::new(
        MemoryClient::with_records(bookings(100)).with_transport(transport.clone()),
    );
    let bus = ChangeNotificationBus::new();
    bus.attach(transport.clone(), ReconnectOptions::default());
    tokio::time::sleep(Duration::from_millis(10)).await;

    let config = SyncConfig::default().with_debounce_ms(100);
    let mut stores = Vec::with_capacity(STORES);
    for _ in 0..STORES {
        stores.push(
            ResourceStore::mount(client.clone(), ListQuery::default(), config.clone(), Some(&bus))
                .await,
        );
    }
    assert_eq!(bus.subscription_count(), STORES);
    let calls = client.call_count();

    for i in 100..150 {
        client.upsert_remote(Booking::new(
            format!("b-{}", i),
            "Walk-in",
            "2026-10-16",
            "21:00",
            2,
        ));
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    // One refresh per store for the whole burst.
    assert_eq!(client.call_count(), calls + STORES as u64);
    assert!(stores.iter().all(|s| s.snapshot().len() == 150));

    for store in &stores {
        store.dispose();
    }
    assert_eq!(bus.subscription_count(), 0);
}
