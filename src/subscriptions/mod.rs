//! Change notifications pushed by the database.
//!
//! The [`ChangeNotificationBus`] receives raw [`TransportMessage`]s from a
//! [`PushTransport`] (or from [`ChangeNotificationBus::publish`]) and routes
//! them to subscribers:
//! - Filtering by table, event type and an optional row filter
//! - Trailing-edge debounce per subscriber, so a burst yields one callback
//! - Guards that unsubscribe on drop
//!
//! Events carry no row data; subscribers refetch.
//!
//! # Example
//!
//! ```ignore
//! let bus = ChangeNotificationBus::new();
//! bus.attach(transport, ReconnectOptions::default());
//!
//! let guard = bus.subscribe(
//!     vec![Subscription::table("bookings").with_filter(FieldFilter::eq("venue_id", "v1"))],
//!     |events| println!("{} bookings changed", events.len()),
//!     SubscribeOptions::default(),
//! );
//! // ...
//! drop(guard);
//! ```

mod bus;
mod transport;
mod types;

pub use bus::{ChangeNotificationBus, OnChange, SubscriptionGuard};
pub use transport::{MemoryTransport, PushTransport};
pub use types::{
    ChangeEvent, ConnectionStatus, EventFilter, EventType, SubscribeOptions, Subscription,
    SubscriptionId, TransportMessage,
};
