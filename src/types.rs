//! Core identifier and time types.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Prefix for ids assigned locally to records awaiting server confirmation.
const PROVISIONAL_PREFIX: &str = "pending-";

/// Server-assigned identifier of a record.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }

    /// Placeholder id for an optimistically created record.
    pub fn provisional(seq: u64) -> Self {
        RecordId(format!("{}{}", PROVISIONAL_PREFIX, seq))
    }

    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

/// Name of a remote collection (a table, e.g. `bookings`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(Cow<'static, str>);

impl ResourceName {
    pub const fn from_static(name: &'static str) -> Self {
        ResourceName(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        ResourceName(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceName({})", self.0)
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ResourceName {
    fn from(s: &'static str) -> Self {
        ResourceName::from_static(s)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current wall-clock time.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or_default();
        Timestamp(micros)
    }

    pub fn from_millis(ms: i64) -> Self {
        Timestamp(ms * 1_000)
    }

    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs * 1_000_000)
    }

    pub fn as_millis(self) -> i64 {
        self.0 / 1_000
    }

    pub fn add(self, d: Duration) -> Self {
        Timestamp(self.0.saturating_add(d.as_micros() as i64))
    }

    /// Whole minutes elapsed from `earlier` to `self`, floored, never negative.
    pub fn minutes_since(self, earlier: Timestamp) -> i64 {
        ((self.0 - earlier.0) / 60_000_000).max(0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Identifier of one optimistic mutation within a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MutationId(pub u64);

/// Monotonic number of a refresh request within a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RefreshToken(pub u64);

impl RefreshToken {
    pub fn next(self) -> Self {
        RefreshToken(self.0 + 1)
    }
}
