//! Overlay operations layered on top of the last server list.

use crate::resources::Resource;
use crate::types::{RecordId, RefreshToken};

/// One local change to a record list.
#[derive(Clone, Debug)]
pub(crate) enum Overlay<R: Resource> {
    /// Insert, or replace a record that is not newer than this one.
    Upsert(R),
    /// Partial update; a no-op if the record is gone.
    Patch { id: RecordId, patch: R::Patch },
    Remove(RecordId),
}

impl<R: Resource> Overlay<R> {
    pub fn target(&self) -> &RecordId {
        match self {
            Overlay::Upsert(record) => record.id(),
            Overlay::Patch { id, .. } => id,
            Overlay::Remove(id) => id,
        }
    }

    pub fn apply(&self, records: &mut Vec<R>) {
        match self {
            Overlay::Upsert(record) => {
                match records.iter_mut().find(|r| r.id() == record.id()) {
                    // keep a newer server copy
                    Some(existing) if existing.updated_at() > record.updated_at() => {}
                    Some(existing) => *existing = record.clone(),
                    None => records.push(record.clone()),
                }
            }
            Overlay::Patch { id, patch } => {
                if let Some(existing) = records.iter_mut().find(|r| r.id() == id) {
                    existing.apply_patch(patch);
                }
            }
            Overlay::Remove(id) => records.retain(|r| r.id() != id),
        }
    }
}

/// A server-confirmed change that a list fetched before the confirmation may
/// not include yet.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmedOverlay<R: Resource> {
    pub overlay: Overlay<R>,
    /// Latest refresh token issued when the change was confirmed.
    pub issued_at: RefreshToken,
}

impl<R: Resource> ConfirmedOverlay<R> {
    /// Whether a list fetched by refresh `token` already reflects this change.
    pub fn covered_by(&self, token: RefreshToken) -> bool {
        token > self.issued_at
    }
}

pub(crate) fn apply_all<'a, R, I>(records: &mut Vec<R>, overlays: I)
where
    R: Resource,
    I: IntoIterator<Item = &'a Overlay<R>>,
{
    for overlay in overlays {
        overlay.apply(records);
    }
}
