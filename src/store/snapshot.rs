//! Immutable record snapshots.

use crate::resources::Resource;
use crate::types::RecordId;
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 of a snapshot's serialized records.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotDigest(pub [u8; 32]);

impl SnapshotDigest {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SnapshotDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotDigest({})", &self.to_hex()[..16])
    }
}

/// The records a view renders. Replaced wholesale, never edited in place, so
/// holders of an `Arc<ResourceSnapshot>` always see a consistent list.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceSnapshot<R> {
    records: Vec<R>,
    version: u64,
}

impl<R: Resource> ResourceSnapshot<R> {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            version: 0,
        }
    }

    pub(crate) fn new(records: Vec<R>, version: u64) -> Self {
        Self { records, version }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Store version this snapshot was published at. Bumped on every change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Serialized records, for byte-level comparison.
    pub fn to_json(&self) -> crate::error::Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.records)?)
    }

    pub fn digest(&self) -> SnapshotDigest {
        let bytes = serde_json::to_vec(&self.records).unwrap_or_default();
        SnapshotDigest(Sha256::digest(&bytes).into())
    }
}

impl<R: Resource> Default for ResourceSnapshot<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, R: Resource> IntoIterator for &'a ResourceSnapshot<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
