//! Change notification types.

use crate::client::FieldFilter;
use crate::config::SyncConfig;
use crate::resources::Resource;
use crate::types::{ResourceName, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Kind of row change pushed by the database.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Insert,
    Update,
    Delete,
}

/// Which event types a subscription wants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EventFilter {
    #[default]
    All,
    Only(EventType),
}

impl EventFilter {
    pub fn matches(self, event: EventType) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Only(wanted) => wanted == event,
        }
    }
}

/// Interest in changes to one table.
#[derive(Clone, Debug, PartialEq)]
pub struct Subscription {
    pub table: ResourceName,
    pub event: EventFilter,
    /// Row filter, e.g. `venue_id = "v1"`.
    pub filter: Option<FieldFilter>,
}

impl Subscription {
    /// Every change to `table`.
    pub fn table(table: impl Into<ResourceName>) -> Self {
        Self {
            table: table.into(),
            event: EventFilter::All,
            filter: None,
        }
    }

    pub fn for_resource<R: Resource>() -> Self {
        Self::table(R::resource_name())
    }

    pub fn on(mut self, event: EventType) -> Self {
        self.event = EventFilter::Only(event);
        self
    }

    pub fn with_filter(mut self, filter: FieldFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// A delete carries only the old row, so the row filter is checked
    /// against whichever image the message has.
    pub fn matches(&self, message: &TransportMessage) -> bool {
        if message.table != self.table || !self.event.matches(message.event_type) {
            return false;
        }
        match &self.filter {
            None => true,
            Some(filter) => [&message.record, &message.old_record]
                .into_iter()
                .flatten()
                .any(|row| filter.matches(row)),
        }
    }
}

/// Raw change message as delivered by a push transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransportMessage {
    pub table: ResourceName,
    pub event_type: EventType,
    #[serde(default)]
    pub record: Option<Value>,
    #[serde(default)]
    pub old_record: Option<Value>,
    pub commit_timestamp: Timestamp,
}

impl TransportMessage {
    pub fn insert<R: Resource>(record: &R) -> Self {
        Self {
            table: R::resource_name(),
            event_type: EventType::Insert,
            record: serde_json::to_value(record).ok(),
            old_record: None,
            commit_timestamp: Timestamp::now(),
        }
    }

    pub fn update<R: Resource>(record: &R, old: &R) -> Self {
        Self {
            table: R::resource_name(),
            event_type: EventType::Update,
            record: serde_json::to_value(record).ok(),
            old_record: serde_json::to_value(old).ok(),
            commit_timestamp: Timestamp::now(),
        }
    }

    pub fn delete<R: Resource>(old: &R) -> Self {
        Self {
            table: R::resource_name(),
            event_type: EventType::Delete,
            record: None,
            old_record: serde_json::to_value(old).ok(),
            commit_timestamp: Timestamp::now(),
        }
    }

    pub fn to_event(&self) -> ChangeEvent {
        ChangeEvent {
            table: self.table.clone(),
            event_type: self.event_type,
            timestamp: self.commit_timestamp,
        }
    }
}

/// Notification delivered to subscribers. Carries no row data: consumers
/// refetch rather than patch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: ResourceName,
    pub event_type: EventType,
    pub timestamp: Timestamp,
}

/// Per-subscriber delivery settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Quiet period after the last event before the callback fires.
    pub debounce: Duration,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
        }
    }
}

impl From<&SyncConfig> for SubscribeOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            debounce: config.debounce(),
        }
    }
}

/// Unique identifier for a bus subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Liveness of the push channel, for the "live" indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}
