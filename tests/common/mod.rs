//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use resource_sync::{
    Booking, BookingStatus, DataAccessClient, DataResult, ErrorInfo, ListQuery, RecordId,
    Resource, Timestamp,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// A call captured by [`ScriptedClient`], answered whenever the test decides.
pub enum Call<R: Resource> {
    List(oneshot::Sender<DataResult<Vec<R>>>),
    Get(RecordId, oneshot::Sender<DataResult<R>>),
    Create(R, oneshot::Sender<DataResult<R>>),
    Update(RecordId, R::Patch, oneshot::Sender<DataResult<R>>),
    Delete(RecordId, oneshot::Sender<DataResult<()>>),
}

impl<R: Resource> Call<R> {
    pub fn kind(&self) -> &'static str {
        match self {
            Call::List(_) => "list",
            Call::Get(..) => "get",
            Call::Create(..) => "create",
            Call::Update(..) => "update",
            Call::Delete(..) => "delete",
        }
    }

    pub fn into_list(self) -> oneshot::Sender<DataResult<Vec<R>>> {
        match self {
            Call::List(tx) => tx,
            other => panic!("expected list, got {}", other.kind()),
        }
    }

    pub fn into_update(self) -> (RecordId, R::Patch, oneshot::Sender<DataResult<R>>) {
        match self {
            Call::Update(id, patch, tx) => (id, patch, tx),
            other => panic!("expected update, got {}", other.kind()),
        }
    }

    pub fn into_create(self) -> (R, oneshot::Sender<DataResult<R>>) {
        match self {
            Call::Create(record, tx) => (record, tx),
            other => panic!("expected create, got {}", other.kind()),
        }
    }

    pub fn into_delete(self) -> (RecordId, oneshot::Sender<DataResult<()>>) {
        match self {
            Call::Delete(id, tx) => (id, tx),
            other => panic!("expected delete, got {}", other.kind()),
        }
    }
}

/// Client whose calls are handed to the test, so responses can be delayed,
/// reordered or dropped.
pub struct ScriptedClient<R: Resource> {
    calls: mpsc::UnboundedSender<Call<R>>,
}

impl<R: Resource> ScriptedClient<R> {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Call<R>>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { calls }), rx)
    }

    async fn roundtrip<T>(&self, call: Call<R>, rx: oneshot::Receiver<DataResult<T>>) -> DataResult<T> {
        if self.calls.send(call).is_err() {
            return DataResult::err(ErrorInfo::network("script closed"));
        }
        rx.await
            .unwrap_or_else(|_| DataResult::err(ErrorInfo::network("response dropped")))
    }
}

#[async_trait]
impl<R: Resource> DataAccessClient<R> for ScriptedClient<R> {
    async fn list(&self, _query: &ListQuery) -> DataResult<Vec<R>> {
        let (tx, rx) = oneshot::channel();
        self.roundtrip(Call::List(tx), rx).await
    }

    async fn get(&self, id: &RecordId) -> DataResult<R> {
        let (tx, rx) = oneshot::channel();
        self.roundtrip(Call::Get(id.clone(), tx), rx).await
    }

    async fn create(&self, record: R) -> DataResult<R> {
        let (tx, rx) = oneshot::channel();
        self.roundtrip(Call::Create(record, tx), rx).await
    }

    async fn update(&self, id: &RecordId, patch: &R::Patch) -> DataResult<R> {
        let (tx, rx) = oneshot::channel();
        self.roundtrip(Call::Update(id.clone(), patch.clone(), tx), rx).await
    }

    async fn delete(&self, id: &RecordId) -> DataResult<()> {
        let (tx, rx) = oneshot::channel();
        self.roundtrip(Call::Delete(id.clone(), tx), rx).await
    }
}

/// Booking with a fixed `updated_at`, so server versions can be ordered.
pub fn booking(id: &str, status: BookingStatus, updated: i64) -> Booking {
    let mut booking = Booking::new(id, format!("Guest {}", id), "2026-10-16", "20:00", 2)
        .with_status(status);
    booking.updated_at = Timestamp(updated);
    booking
}

/// Statuses of a snapshot as `(id, status)` pairs.
pub fn statuses(records: &[Booking]) -> Vec<(String, BookingStatus)> {
    records
        .iter()
        .map(|b| (b.id.as_str().to_string(), b.status))
        .collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
