//! Error types for resource synchronization.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a failed remote operation, as surfaced to the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport failure or timeout. Transient.
    Network,
    /// The server rejected the payload. Needs user correction.
    Validation,
    /// The record vanished between read and mutate.
    NotFound,
    /// Anything else, including malformed responses.
    Unknown,
}

impl ErrorKind {
    /// Whether retrying the same request can succeed without user input.
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::Validation)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network error",
            ErrorKind::Validation => "validation error",
            ErrorKind::NotFound => "not found",
            ErrorKind::Unknown => "unknown error",
        };
        f.write_str(name)
    }
}

/// Error payload carried by a [`DataResult`](crate::client::DataResult) and by
/// [`LoadState`](crate::store::LoadState).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    /// Offending input field, for validation errors rendered next to the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{} ({}): {}", self.kind, field, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Main error type for synchronization operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Store has been disposed")]
    Disposed,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SyncError {
    /// The UI-facing error kind, if this error came from a remote operation.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SyncError::Network(_) => Some(ErrorKind::Network),
            SyncError::Validation { .. } => Some(ErrorKind::Validation),
            SyncError::NotFound(_) => Some(ErrorKind::NotFound),
            SyncError::Unknown(_) => Some(ErrorKind::Unknown),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().map(ErrorKind::is_retryable).unwrap_or(false)
    }

    /// Convert into the payload stored in `LoadState`.
    pub fn to_info(&self) -> ErrorInfo {
        match self {
            SyncError::Network(msg) => ErrorInfo::network(msg.clone()),
            SyncError::Validation { message, field } => ErrorInfo {
                kind: ErrorKind::Validation,
                message: message.clone(),
                field: field.clone(),
            },
            SyncError::NotFound(msg) => ErrorInfo::not_found(msg.clone()),
            other => ErrorInfo::unknown(other.to_string()),
        }
    }
}

impl From<ErrorInfo> for SyncError {
    fn from(info: ErrorInfo) -> Self {
        match info.kind {
            ErrorKind::Network => SyncError::Network(info.message),
            ErrorKind::Validation => SyncError::Validation {
                message: info.message,
                field: info.field,
            },
            ErrorKind::NotFound => SyncError::NotFound(info.message),
            ErrorKind::Unknown => SyncError::Unknown(info.message),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Serialization(e.to_string())
    }
}

/// Result type for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;
