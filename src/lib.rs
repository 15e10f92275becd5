//! # Resource Sync
//!
//! Keeps client-side caches of remote collections consistent with the
//! database while staying responsive to local edits and remote changes.
//!
//! ## Core Concepts
//!
//! - **Clients**: Typed CRUD returning `{ data, error }`, never throwing for
//!   expected failures
//! - **Change bus**: Pushed change notifications, filtered and debounced per
//!   subscriber
//! - **Stores**: Snapshot + load state per collection, with optimistic
//!   mutations and stale-response discard
//! - **Bindings**: Pure filters, groupings and stats over snapshots
//!
//! ## Example
//!
//! ```ignore
//! use resource_sync::{
//!     Booking, BookingStatus, ChangeNotificationBus, ListQuery, MemoryClient, ResourceStore,
//!     SyncConfig,
//! };
//!
//! let bus = ChangeNotificationBus::new();
//! bus.attach(transport, SyncConfig::default().reconnect);
//!
//! let store = ResourceStore::<Booking>::mount(
//!     client,
//!     ListQuery::bookings_between("2026-10-01", "2026-10-31"),
//!     SyncConfig::default(),
//!     Some(&bus),
//! )
//! .await;
//!
//! store.set_booking_status(&id, BookingStatus::Confirmed).await?;
//! let groups = binding::group_by_date(&store.snapshot(), &BookingFilter::default());
//!
//! // on unmount
//! store.dispose();
//! ```

pub mod binding;
pub mod client;
pub mod config;
pub mod error;
pub mod resources;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use client::{
    call_with_timeout, DataAccessClient, DataResult, FieldFilter, FilterOp, ListQuery,
    MemoryClient, OrderBy, ShiftHistoryQuery, TaskQuery,
};
pub use config::{ReconnectOptions, SyncConfig};
pub use error::{ErrorInfo, ErrorKind, Result, SyncError};
pub use resources::*;
pub use store::{
    LoadState, ObserverId, RefreshOutcome, ResourceSnapshot, ResourceStore, SnapshotDigest,
    StorePhase, StoreUpdate, StoreView, StoreWatcher,
};
pub use subscriptions::{
    ChangeEvent, ChangeNotificationBus, ConnectionStatus, EventFilter, EventType, MemoryTransport,
    PushTransport, SubscribeOptions, Subscription, SubscriptionGuard, SubscriptionId,
    TransportMessage,
};
pub use types::*;
