//! Typed access to the remote store.
//!
//! A [`DataAccessClient`] never fails out-of-band for expected failures: a
//! network error, a rejected payload or a missing record comes back inside the
//! [`DataResult`]. A result carrying neither data nor error is malformed and
//! is reported as an unknown error by [`DataResult::into_result`].
//!
//! Clients do no caching and no retries; timeouts are applied by the caller
//! through [`call_with_timeout`].

mod memory;
mod query;

pub use memory::MemoryClient;
pub use query::{FieldFilter, FilterOp, ListQuery, OrderBy, ShiftHistoryQuery, TaskQuery};

use crate::error::ErrorInfo;
use crate::resources::Resource;
use crate::types::RecordId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Uniform `{ data, error }` response of every data-access call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataResult<T> {
    pub data: Option<T>,
    pub error: Option<ErrorInfo>,
}

impl<T> DataResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ErrorInfo) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.data.is_some()
    }

    /// An error wins over data; a response with neither is malformed.
    pub fn into_result(self) -> Result<T, ErrorInfo> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err(ErrorInfo::unknown(
                "malformed response: neither data nor error",
            )),
        }
    }
}

impl<T> From<Result<T, ErrorInfo>> for DataResult<T> {
    fn from(result: Result<T, ErrorInfo>) -> Self {
        match result {
            Ok(data) => DataResult::ok(data),
            Err(error) => DataResult::err(error),
        }
    }
}

/// CRUD over one remote collection.
#[async_trait]
pub trait DataAccessClient<R: Resource>: Send + Sync {
    async fn list(&self, query: &ListQuery) -> DataResult<Vec<R>>;

    async fn get(&self, id: &RecordId) -> DataResult<R>;

    /// Insert `record`; the server assigns the id when it is provisional.
    async fn create(&self, record: R) -> DataResult<R>;

    async fn update(&self, id: &RecordId, patch: &R::Patch) -> DataResult<R>;

    async fn delete(&self, id: &RecordId) -> DataResult<()>;
}

/// Await `call`, turning an elapsed `timeout` into a network error.
pub async fn call_with_timeout<T, F>(timeout: Option<Duration>, call: F) -> DataResult<T>
where
    F: Future<Output = DataResult<T>>,
{
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => DataResult::err(ErrorInfo::network(format!(
                "request timed out after {:?}",
                limit
            ))),
        },
        None => call.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_error_wins_over_data() {
        let result = DataResult {
            data: Some(1),
            error: Some(ErrorInfo::network("offline")),
        };
        assert_eq!(result.into_result().unwrap_err().kind, ErrorKind::Network);
    }

    #[test]
    fn test_empty_response_is_malformed() {
        let result: DataResult<u32> = DataResult {
            data: None,
            error: None,
        };
        assert_eq!(result.into_result().unwrap_err().kind, ErrorKind::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_network_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            DataResult::ok(42)
        };
        let result = call_with_timeout(Some(Duration::from_secs(1)), slow).await;
        let err = result.into_result().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Network);
        assert!(err.message.contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_timeout_waits() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            DataResult::ok(42)
        };
        assert_eq!(call_with_timeout(None, slow).await.into_result(), Ok(42));
    }
}
