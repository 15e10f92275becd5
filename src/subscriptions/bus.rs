//! Change notification bus: routes pushed change messages to debounced
//! subscriber callbacks.

use super::transport::PushTransport;
use super::types::{
    ChangeEvent, ConnectionStatus, SubscribeOptions, Subscription, SubscriptionId,
    TransportMessage,
};
use crate::config::ReconnectOptions;
use crate::types::Timestamp;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Callback invoked with the events of one debounced burst.
pub type OnChange = Arc<dyn Fn(Vec<ChangeEvent>) + Send + Sync>;

/// Internal subscriber state.
struct Subscriber {
    subscriptions: Vec<Subscription>,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

impl Subscriber {
    fn matches(&self, message: &TransportMessage) -> bool {
        self.subscriptions.iter().any(|s| s.matches(message))
    }
}

pub(crate) struct BusInner {
    subscribers: RwLock<HashMap<SubscriptionId, Subscriber>>,
    next_id: AtomicU64,
    status: watch::Sender<ConnectionStatus>,
    last_event_at: RwLock<Option<Timestamp>>,
    shutdown: CancellationToken,
}

impl BusInner {
    fn remove(&self, id: SubscriptionId) -> bool {
        self.subscribers.write().remove(&id).is_some()
    }
}

/// Shared fan-out point for database change notifications.
///
/// Cloning is cheap; clones share subscribers and connection state. Each
/// subscriber gets its own debounce timer, so a burst of events produces one
/// callback per subscriber after the burst goes quiet.
#[derive(Clone)]
pub struct ChangeNotificationBus {
    inner: Arc<BusInner>,
}

impl ChangeNotificationBus {
    pub fn new() -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            inner: Arc::new(BusInner {
                subscribers: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                status,
                last_event_at: RwLock::new(None),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Register interest in `subscriptions`.
    ///
    /// `on_change` runs on the bus task once events stop arriving for
    /// `options.debounce`. It never runs after the returned guard is disposed.
    /// Must be called from within a tokio runtime.
    pub fn subscribe<F>(
        &self,
        subscriptions: Vec<Subscription>,
        on_change: F,
        options: SubscribeOptions,
    ) -> SubscriptionGuard
    where
        F: Fn(Vec<ChangeEvent>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = self.inner.shutdown.child_token();

        if subscriptions.is_empty() {
            debug!(subscription = id.0, "subscribed with no tables");
        }
        self.inner.subscribers.write().insert(
            id,
            Subscriber {
                subscriptions,
                sender,
            },
        );

        let task = tokio::spawn(debounce_loop(
            receiver,
            Arc::new(on_change),
            options.debounce,
            cancel.clone(),
        ));

        SubscriptionGuard {
            id,
            bus: Arc::downgrade(&self.inner),
            cancel,
            task: Some(task),
        }
    }

    /// Remove a subscriber. Prefer dropping its guard.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.remove(id);
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Route one change message to every matching subscriber.
    ///
    /// Returns the number of subscribers it was queued for. Subscribers whose
    /// task has ended are dropped.
    pub fn publish(&self, message: &TransportMessage) -> usize {
        *self.inner.last_event_at.write() = Some(Timestamp::now());
        let event = message.to_event();

        let mut delivered = 0;
        let mut closed = Vec::new();
        {
            let subs = self.inner.subscribers.read();
            for (id, sub) in subs.iter() {
                if !sub.matches(message) {
                    continue;
                }
                if sub.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(*id);
                }
            }
        }

        if !closed.is_empty() {
            let mut subs = self.inner.subscribers.write();
            for id in closed {
                subs.remove(&id);
            }
        }

        debug!(
            table = %message.table,
            event = ?message.event_type,
            delivered,
            "change published"
        );
        delivered
    }

    // --- Connection ---

    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.borrow()
    }

    pub fn is_live(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Receiver notified on every connection status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status.subscribe()
    }

    pub fn last_event_at(&self) -> Option<Timestamp> {
        *self.inner.last_event_at.read()
    }

    /// Pump messages from `transport` into the bus, reconnecting with
    /// exponential backoff when the connection drops.
    ///
    /// Missed events are not replayed after a reconnect.
    pub fn attach(
        &self,
        transport: Arc<dyn PushTransport>,
        options: ReconnectOptions,
    ) -> JoinHandle<()> {
        let bus = self.clone();
        tokio::spawn(async move { bus.run_connection(transport, options).await })
    }

    async fn run_connection(&self, transport: Arc<dyn PushTransport>, options: ReconnectOptions) {
        let shutdown = self.inner.shutdown.clone();
        let mut attempt: u32 = 0;

        loop {
            self.set_status(ConnectionStatus::Connecting);
            let connected = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                result = transport.connect() => result,
            };

            match connected {
                Ok(mut messages) => {
                    if attempt > 0 {
                        info!(attempt, "push transport reconnected");
                    } else {
                        info!("push transport connected");
                    }
                    attempt = 0;
                    self.set_status(ConnectionStatus::Connected);

                    loop {
                        tokio::select! {
                            biased;
                            _ = shutdown.cancelled() => {
                                self.set_status(ConnectionStatus::Disconnected);
                                return;
                            }
                            message = messages.recv() => match message {
                                Some(message) => {
                                    self.publish(&message);
                                }
                                None => break,
                            },
                        }
                    }
                    warn!("push transport disconnected");
                    self.set_status(ConnectionStatus::Disconnected);
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "push transport connect failed");
                    self.set_status(ConnectionStatus::Error);
                }
            }

            if !options.auto_reconnect {
                debug!("auto reconnect disabled, connection task exiting");
                break;
            }
            if let Some(max) = options.max_reconnect_attempts {
                if attempt >= max {
                    warn!(max, "max reconnection attempts reached");
                    self.set_status(ConnectionStatus::Error);
                    return;
                }
            }

            let delay = options.backoff(attempt);
            attempt = attempt.saturating_add(1);
            info!(delay_ms = delay.as_millis() as u64, attempt, "reconnecting push transport");

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if self.status() != ConnectionStatus::Error {
            self.set_status(ConnectionStatus::Disconnected);
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.inner.status.send_replace(status);
        if previous != status {
            debug!(from = ?previous, to = ?status, "connection status changed");
        }
    }

    /// Stop the connection task and every subscriber task.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.subscribers.write().clear();
    }
}

impl Default for ChangeNotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Trailing-edge debounce: every event restarts the quiet timer; the callback
/// gets the whole burst once the timer expires.
async fn debounce_loop(
    mut events: mpsc::UnboundedReceiver<ChangeEvent>,
    on_change: OnChange,
    debounce: Duration,
    cancel: CancellationToken,
) {
    let mut batch: Vec<ChangeEvent> = Vec::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            event = events.recv() => match event {
                Some(event) => batch.push(event),
                None => return,
            },
        }

        let timer = tokio::time::sleep_until(Instant::now() + debounce);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                event = events.recv() => match event {
                    Some(event) => {
                        batch.push(event);
                        timer.as_mut().reset(Instant::now() + debounce);
                    }
                    None => return,
                },
                _ = &mut timer => break,
            }
        }

        if cancel.is_cancelled() {
            return;
        }
        on_change(std::mem::take(&mut batch));
    }
}

/// Keeps a bus subscription alive. Dropping or disposing it unsubscribes and
/// cancels any pending debounced callback.
pub struct SubscriptionGuard {
    id: SubscriptionId,
    bus: Weak<BusInner>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionGuard {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && self.bus.strong_count() > 0
    }

    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(bus) = self.bus.upgrade() {
            if bus.remove(self.id) {
                debug!(subscription = self.id.0, "unsubscribed");
            }
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
