//! Store observers: bounded channels notified on every published change.

use super::state::{LoadState, StorePhase};
use crate::types::ResourceName;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Unique identifier for a store observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Published whenever the snapshot or load state of a store changes.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreUpdate {
    pub resource: ResourceName,
    /// Version of the displayed snapshot after the change.
    pub version: u64,
    pub phase: StorePhase,
    pub load: LoadState,
}

/// Receiving end of a store observer.
pub struct StoreWatcher {
    pub id: ObserverId,
    receiver: Receiver<StoreUpdate>,
}

impl StoreWatcher {
    /// Blocks until the next update. Errors once the store is disposed.
    pub fn recv(&self) -> Result<StoreUpdate, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    pub fn try_recv(&self) -> Result<StoreUpdate, TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<StoreUpdate, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain buffered updates and return the newest one.
    pub fn latest(&self) -> Option<StoreUpdate> {
        self.receiver.try_iter().last()
    }
}

/// Observer registry. Observers that fall behind are dropped rather than
/// blocking the store.
pub(crate) struct ObserverSet {
    observers: RwLock<HashMap<ObserverId, Sender<StoreUpdate>>>,
    next_id: AtomicU64,
    buffer_size: usize,
}

impl ObserverSet {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer_size: buffer_size.max(1),
        }
    }

    pub fn watch(&self) -> StoreWatcher {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(self.buffer_size);
        self.observers.write().insert(id, sender);
        StoreWatcher { id, receiver }
    }

    pub fn unwatch(&self, id: ObserverId) {
        self.observers.write().remove(&id);
    }

    pub fn count(&self) -> usize {
        self.observers.read().len()
    }

    pub fn broadcast(&self, update: &StoreUpdate) {
        let mut to_remove = Vec::new();

        {
            let observers = self.observers.read();
            for (id, sender) in observers.iter() {
                if sender.try_send(update.clone()).is_err() {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut observers = self.observers.write();
            for id in to_remove {
                debug!(observer = id.0, "dropping slow or closed store observer");
                observers.remove(&id);
            }
        }
    }

    /// Disconnect every observer.
    pub fn close_all(&self) {
        self.observers.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(version: u64) -> StoreUpdate {
        StoreUpdate {
            resource: ResourceName::from_static("bookings"),
            version,
            phase: StorePhase::Ready,
            load: LoadState::default(),
        }
    }

    #[test]
    fn test_watch_unwatch() {
        let set = ObserverSet::new(4);
        let watcher = set.watch();
        assert_eq!(set.count(), 1);
        set.unwatch(watcher.id);
        assert_eq!(set.count(), 0);
    }

    #[test]
    fn test_latest_drains_buffer() {
        let set = ObserverSet::new(4);
        let watcher = set.watch();
        set.broadcast(&update(1));
        set.broadcast(&update(2));
        assert_eq!(watcher.latest().map(|u| u.version), Some(2));
        assert!(watcher.try_recv().is_err());
    }

    #[test]
    fn test_drop_slow_observer() {
        let set = ObserverSet::new(2);
        let _watcher = set.watch();
        for v in 0..10 {
            set.broadcast(&update(v));
        }
        assert_eq!(set.count(), 0);
    }

    #[test]
    fn test_close_disconnects_receivers() {
        let set = ObserverSet::new(2);
        let watcher = set.watch();
        set.close_all();
        assert!(matches!(watcher.try_recv(), Err(TryRecvError::Disconnected)));
    }
}
