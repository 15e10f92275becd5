//! In-process backend used by tests, benches and local development.

use super::{DataAccessClient, DataResult, ListQuery};
use crate::error::ErrorInfo;
use crate::resources::Resource;
use crate::subscriptions::{MemoryTransport, TransportMessage};
use crate::types::{RecordId, Timestamp};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A [`DataAccessClient`] over an in-memory table.
///
/// Behaves like the remote store: assigns ids to provisional records, stamps
/// `updated_at`, enforces [`Resource::validate`] and reports missing records
/// as `NotFound`. When built with a [`MemoryTransport`] every successful write
/// is pushed as a change message, the way the database would.
pub struct MemoryClient<R: Resource> {
    records: RwLock<Vec<R>>,
    next_id: AtomicU64,
    failures: Mutex<VecDeque<ErrorInfo>>,
    latency: Mutex<Option<Duration>>,
    transport: Option<Arc<MemoryTransport>>,
    calls: AtomicU64,
}

impl<R: Resource> MemoryClient<R> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            failures: Mutex::new(VecDeque::new()),
            latency: Mutex::new(None),
            transport: None,
            calls: AtomicU64::new(0),
        }
    }

    pub fn with_records(records: Vec<R>) -> Self {
        let client = Self::new();
        *client.records.write() = records;
        client
    }

    /// Push a change message for every successful write.
    pub fn with_transport(mut self, transport: Arc<MemoryTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Fail the next call with `error`. Queued failures are consumed in order.
    pub fn fail_next(&self, error: ErrorInfo) {
        self.failures.lock().push_back(error);
    }

    /// Current server-side contents.
    pub fn records(&self) -> Vec<R> {
        self.records.read().clone()
    }

    /// Number of calls served, failed ones included.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Write a record as another session would, bypassing validation.
    pub fn upsert_remote(&self, mut record: R) {
        record.touch(Timestamp::now());
        let old = {
            let mut records = self.records.write();
            match records.iter_mut().find(|r| r.id() == record.id()) {
                Some(existing) => Some(std::mem::replace(existing, record.clone())),
                None => {
                    records.push(record.clone());
                    None
                }
            }
        };
        match old {
            Some(old) => self.emit(TransportMessage::update::<R>(&record, &old)),
            None => self.emit(TransportMessage::insert::<R>(&record)),
        }
    }

    /// Delete a record as another session would.
    pub fn remove_remote(&self, id: &RecordId) -> bool {
        let removed = {
            let mut records = self.records.write();
            let pos = records.iter().position(|r| r.id() == id);
            pos.map(|i| records.remove(i))
        };
        match removed {
            Some(old) => {
                self.emit(TransportMessage::delete::<R>(&old));
                true
            }
            None => false,
        }
    }

    async fn begin_call(&self) -> Option<ErrorInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.failures.lock().pop_front()
    }

    fn emit(&self, message: TransportMessage) {
        if let Some(transport) = &self.transport {
            transport.emit(message);
        }
    }

    fn not_found(id: &RecordId) -> ErrorInfo {
        ErrorInfo::not_found(format!("{} {} not found", R::NAME, id))
    }
}

impl<R: Resource> Default for MemoryClient<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Resource> DataAccessClient<R> for MemoryClient<R> {
    async fn list(&self, query: &ListQuery) -> DataResult<Vec<R>> {
        if let Some(error) = self.begin_call().await {
            return DataResult::err(error);
        }
        let rows = self
            .records
            .read()
            .iter()
            .map(|r| {
                let value = serde_json::to_value(r).unwrap_or_default();
                (r.clone(), value)
            })
            .collect();
        DataResult::ok(query.apply(rows))
    }

    async fn get(&self, id: &RecordId) -> DataResult<R> {
        if let Some(error) = self.begin_call().await {
            return DataResult::err(error);
        }
        let found = self.records.read().iter().find(|r| r.id() == id).cloned();
        match found {
            Some(record) => DataResult::ok(record),
            None => DataResult::err(Self::not_found(id)),
        }
    }

    async fn create(&self, mut record: R) -> DataResult<R> {
        if let Some(error) = self.begin_call().await {
            return DataResult::err(error);
        }
        if let Err(error) = record.validate() {
            return DataResult::err(error);
        }
        if record.id().is_provisional() || record.id().as_str().is_empty() {
            let seq = self.next_id.fetch_add(1, Ordering::SeqCst);
            record.set_id(RecordId(format!("{}-{}", R::NAME, seq)));
        }
        record.touch(Timestamp::now());
        {
            let mut records = self.records.write();
            if records.iter().any(|r| r.id() == record.id()) {
                return DataResult::err(ErrorInfo::validation("id", "duplicate id"));
            }
            records.push(record.clone());
        }
        debug!(resource = R::NAME, id = %record.id(), "created");
        self.emit(TransportMessage::insert::<R>(&record));
        DataResult::ok(record)
    }

    async fn update(&self, id: &RecordId, patch: &R::Patch) -> DataResult<R> {
        if let Some(error) = self.begin_call().await {
            return DataResult::err(error);
        }
        let (updated, old) = {
            let mut records = self.records.write();
            let Some(existing) = records.iter_mut().find(|r| r.id() == id) else {
                return DataResult::err(Self::not_found(id));
            };
            let mut updated = existing.clone();
            updated.apply_patch(patch);
            if let Err(error) = updated.validate() {
                return DataResult::err(error);
            }
            updated.touch(Timestamp::now());
            let old = std::mem::replace(existing, updated.clone());
            (updated, old)
        };
        self.emit(TransportMessage::update::<R>(&updated, &old));
        DataResult::ok(updated)
    }

    async fn delete(&self, id: &RecordId) -> DataResult<()> {
        if let Some(error) = self.begin_call().await {
            return DataResult::err(error);
        }
        let removed = {
            let mut records = self.records.write();
            let pos = records.iter().position(|r| r.id() == id);
            pos.map(|i| records.remove(i))
        };
        match removed {
            Some(old) => {
                self.emit(TransportMessage::delete::<R>(&old));
                DataResult::ok(())
            }
            None => DataResult::err(Self::not_found(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resources::{Booking, BookingPatch, BookingStatus};

    fn booking(id: &str, name: &str) -> Booking {
        Booking::new(id, name, "2026-10-16", "19:00", 2)
    }

    #[tokio::test]
    async fn test_create_assigns_server_id() {
        let client = MemoryClient::<Booking>::new();
        let created = client
            .create(booking("pending-1", "Ana"))
            .await
            .into_result()
            .unwrap();
        assert_eq!(created.id.as_str(), "bookings-1");
        assert!(created.updated_at > Timestamp::default());
        assert_eq!(client.records().len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let client = MemoryClient::<Booking>::new();
        let err = client
            .update(&RecordId::from("b-9"), &BookingPatch::status(BookingStatus::Confirmed))
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_payload() {
        let client = MemoryClient::with_records(vec![booking("b-1", "Ana")]);
        let patch = BookingPatch {
            party_size: Some(0),
            ..Default::default()
        };
        let err = client
            .update(&RecordId::from("b-1"), &patch)
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(client.records()[0].party_size, 2);
    }

    #[tokio::test]
    async fn test_queued_failures_are_consumed_in_order() {
        let client = MemoryClient::with_records(vec![booking("b-1", "Ana")]);
        client.fail_next(ErrorInfo::network("offline"));
        let first = client.list(&ListQuery::new()).await;
        assert_eq!(first.error.map(|e| e.kind), Some(ErrorKind::Network));
        let second = client.list(&ListQuery::new()).await.into_result().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_writes_are_pushed_to_transport() {
        let transport = Arc::new(MemoryTransport::new());
        let mut rx = crate::subscriptions::PushTransport::connect(transport.as_ref())
            .await
            .unwrap();
        let client = MemoryClient::<Booking>::new().with_transport(transport.clone());

        let created = client.create(booking("", "Ana")).await.into_result().unwrap();
        client.delete(&created.id).await.into_result().unwrap();

        let insert = rx.recv().await.unwrap();
        let delete = rx.recv().await.unwrap();
        assert_eq!(insert.table.as_str(), "bookings");
        assert_eq!(insert.event_type, crate::subscriptions::EventType::Insert);
        assert_eq!(delete.event_type, crate::subscriptions::EventType::Delete);
        assert!(delete.record.is_none());
        assert!(delete.old_record.is_some());
    }
}
