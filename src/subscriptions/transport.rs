//! Push transports feeding the change bus.

use super::types::TransportMessage;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Capacity of one memory connection before messages are dropped.
const MEMORY_CHANNEL_CAPACITY: usize = 1024;

/// A source of database change messages.
///
/// `connect` yields a stream of messages; the stream ending means the
/// connection dropped. Messages emitted while disconnected are lost and the
/// bus does not try to recover them.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn connect(&self) -> Result<mpsc::Receiver<TransportMessage>>;
}

/// In-process transport. Each `connect` opens a new channel and `emit`
/// fans out to every open one.
pub struct MemoryTransport {
    senders: Mutex<Vec<mpsc::Sender<TransportMessage>>>,
    refuse: AtomicBool,
    connects: AtomicU64,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
            refuse: AtomicBool::new(false),
            connects: AtomicU64::new(0),
        }
    }

    /// Deliver to every open connection. Returns how many received it.
    pub fn emit(&self, message: TransportMessage) -> usize {
        let mut senders = self.senders.lock();
        senders.retain(|tx| !tx.is_closed());
        senders
            .iter()
            .filter(|tx| tx.try_send(message.clone()).is_ok())
            .count()
    }

    /// Close every open connection.
    pub fn disconnect_all(&self) {
        self.senders.lock().clear();
    }

    /// Make subsequent `connect` calls fail.
    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Number of `connect` calls so far, refused ones included.
    pub fn connect_count(&self) -> u64 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.senders.lock().iter().any(|tx| !tx.is_closed())
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushTransport for MemoryTransport {
    async fn connect(&self) -> Result<mpsc::Receiver<TransportMessage>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SyncError::Network("connection refused".to_string()));
        }
        let (tx, rx) = mpsc::channel(MEMORY_CHANNEL_CAPACITY);
        self.senders.lock().push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Booking, Resource};
    use crate::subscriptions::EventType;

    #[tokio::test]
    async fn test_emit_reaches_open_connections() {
        let transport = MemoryTransport::new();
        let mut a = transport.connect().await.unwrap();
        let mut b = transport.connect().await.unwrap();

        let booking = Booking::new("b-1", "Ana", "2026-10-16", "19:00", 2);
        assert_eq!(transport.emit(TransportMessage::insert(&booking)), 2);

        assert_eq!(a.recv().await.unwrap().event_type, EventType::Insert);
        assert_eq!(b.recv().await.unwrap().table, Booking::resource_name());
    }

    #[tokio::test]
    async fn test_disconnect_ends_streams() {
        let transport = MemoryTransport::new();
        let mut rx = transport.connect().await.unwrap();
        transport.disconnect_all();
        assert!(rx.recv().await.is_none());
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let transport = MemoryTransport::new();
        transport.refuse_connections(true);
        assert!(matches!(transport.connect().await, Err(SyncError::Network(_))));
        assert_eq!(transport.connect_count(), 1);
    }
}
