//! Resource stores: the client-side cache of one remote collection.
//!
//! A [`ResourceStore`] owns the records a view renders and keeps them
//! consistent with the server:
//! - Full refetch on mount, on explicit refresh and on debounced change events
//! - Optimistic mutations, confirmed or rolled back by the server response
//! - Stale refresh responses discarded by token
//! - Nothing applied after [`ResourceStore::dispose`]
//!
//! The displayed snapshot is computed, never edited in place:
//!
//! ```text
//! displayed = last server list + confirmed overlays + pending overlays
//! ```
//!
//! Confirmed overlays cover server changes that an in-flight list may predate.
//! They are pruned once a refresh issued after their confirmation is applied,
//! and folded into the server list directly when no refresh is in flight.

mod actions;
mod observers;
mod overlay;
mod snapshot;
mod state;

pub use observers::{ObserverId, StoreUpdate, StoreWatcher};
pub use snapshot::{ResourceSnapshot, SnapshotDigest};
pub use state::{LoadState, StorePhase};

use crate::client::{call_with_timeout, DataAccessClient, ListQuery};
use crate::config::SyncConfig;
use crate::error::{ErrorInfo, ErrorKind, Result, SyncError};
use crate::resources::Resource;
use crate::subscriptions::{
    ChangeEvent, ChangeNotificationBus, SubscribeOptions, Subscription, SubscriptionGuard,
};
use crate::types::{MutationId, RecordId, RefreshToken};
use overlay::{apply_all, ConfirmedOverlay, Overlay};
use parking_lot::Mutex;
use state::PhaseMachine;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of a refresh that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response was applied; `changed` is false when the records were
    /// identical and the snapshot was kept.
    Applied { changed: bool },
    /// A newer refresh was issued before this one completed.
    Superseded,
    /// The store was disposed before the response arrived.
    Discarded,
}

/// Everything a view needs to render, captured at one instant.
#[derive(Clone, Debug)]
pub struct StoreView<R: Resource> {
    pub snapshot: Arc<ResourceSnapshot<R>>,
    /// Server-confirmed records only, for totals that must not count
    /// unconfirmed changes.
    pub confirmed: Arc<ResourceSnapshot<R>>,
    /// Records carrying an unconfirmed local change.
    pub pending: HashSet<RecordId>,
    pub load: LoadState,
    pub phase: StorePhase,
}

impl<R: Resource> StoreView<R> {
    pub fn is_pending(&self, id: &RecordId) -> bool {
        self.pending.contains(id)
    }
}

/// How a mutation ended.
enum Settle<R: Resource> {
    Confirmed(Overlay<R>),
    Failed(ErrorInfo),
    /// The record no longer exists on the server.
    Vanished(RecordId, ErrorInfo),
}

struct StoreState<R: Resource> {
    base: Vec<R>,
    confirmed: Vec<ConfirmedOverlay<R>>,
    pending: BTreeMap<MutationId, Overlay<R>>,
    snapshot: Arc<ResourceSnapshot<R>>,
    confirmed_snapshot: Arc<ResourceSnapshot<R>>,
    machine: PhaseMachine,
    error: Option<ErrorInfo>,
    /// Latest refresh token handed out.
    issued: RefreshToken,
    next_mutation: u64,
    version: u64,
}

impl<R: Resource> StoreState<R> {
    fn new() -> Self {
        Self {
            base: Vec::new(),
            confirmed: Vec::new(),
            pending: BTreeMap::new(),
            snapshot: Arc::new(ResourceSnapshot::empty()),
            confirmed_snapshot: Arc::new(ResourceSnapshot::empty()),
            machine: PhaseMachine::default(),
            error: None,
            issued: RefreshToken::default(),
            next_mutation: 1,
            version: 0,
        }
    }

    fn next_mutation(&mut self) -> MutationId {
        let id = MutationId(self.next_mutation);
        self.next_mutation += 1;
        id
    }

    /// Recompute both snapshots. A snapshot is only replaced when its records
    /// differ, so an identical refresh keeps the same `Arc`.
    fn rebuild(&mut self) -> bool {
        let mut confirmed = self.base.clone();
        apply_all(&mut confirmed, self.confirmed.iter().map(|c| &c.overlay));

        let mut displayed = confirmed.clone();
        apply_all(&mut displayed, self.pending.values());

        let confirmed_changed = confirmed.as_slice() != self.confirmed_snapshot.records();
        let displayed_changed = displayed.as_slice() != self.snapshot.records();
        if confirmed_changed || displayed_changed {
            self.version += 1;
        }
        if confirmed_changed {
            self.confirmed_snapshot = Arc::new(ResourceSnapshot::new(confirmed, self.version));
        }
        if displayed_changed {
            self.snapshot = Arc::new(ResourceSnapshot::new(displayed, self.version));
        }
        displayed_changed
    }

    /// Record a server-confirmed change. With no refresh in flight no older
    /// list can arrive, so overlays fold straight into the server list.
    fn confirm(&mut self, overlay: Overlay<R>) {
        if self.machine.is_refreshing() {
            self.confirmed.push(ConfirmedOverlay {
                overlay,
                issued_at: self.issued,
            });
            return;
        }
        self.fold_confirmed();
        apply_all(&mut self.base, std::iter::once(&overlay));
    }

    fn fold_confirmed(&mut self) {
        let confirmed = std::mem::take(&mut self.confirmed);
        apply_all(&mut self.base, confirmed.iter().map(|c| &c.overlay));
    }

    fn load_state(&self) -> LoadState {
        self.machine.load_state(self.error.clone())
    }

    fn update(&self) -> StoreUpdate {
        StoreUpdate {
            resource: R::resource_name(),
            version: self.snapshot.version(),
            phase: self.machine.phase(),
            load: self.load_state(),
        }
    }

    fn pending_ids(&self) -> HashSet<RecordId> {
        self.pending.values().map(|o| o.target().clone()).collect()
    }
}

/// Clears the in-flight marker if a refresh future is dropped mid-call.
struct InFlightRefresh<'a, R: Resource> {
    store: &'a ResourceStore<R>,
    token: RefreshToken,
    armed: bool,
}

impl<R: Resource> InFlightRefresh<'_, R> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<R: Resource> Drop for InFlightRefresh<'_, R> {
    fn drop(&mut self) {
        if self.armed {
            self.store.abandon_refresh(self.token);
        }
    }
}

struct StoreInner<R: Resource> {
    client: Arc<dyn DataAccessClient<R>>,
    query: ListQuery,
    config: SyncConfig,
    state: Mutex<StoreState<R>>,
    observers: observers::ObserverSet,
    subscription: Mutex<Option<SubscriptionGuard>>,
    background: Mutex<Option<JoinHandle<()>>>,
}

/// Client-side cache of one remote collection, bound to a view's lifetime.
///
/// Cloning is cheap and clones share state. The store stays alive while any
/// clone or in-flight background refresh holds it; bus callbacks only hold a
/// weak reference.
pub struct ResourceStore<R: Resource> {
    inner: Arc<StoreInner<R>>,
}

impl<R: Resource> Clone for ResourceStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Resource> ResourceStore<R> {
    /// Create an idle store listing the whole collection.
    pub fn new(client: Arc<dyn DataAccessClient<R>>, config: SyncConfig) -> Self {
        Self::with_query(client, ListQuery::default(), config)
    }

    pub fn with_query(
        client: Arc<dyn DataAccessClient<R>>,
        query: ListQuery,
        config: SyncConfig,
    ) -> Self {
        let observers = observers::ObserverSet::new(config.observer_buffer);
        Self {
            inner: Arc::new(StoreInner {
                client,
                query,
                config,
                state: Mutex::new(StoreState::new()),
                observers,
                subscription: Mutex::new(None),
                background: Mutex::new(None),
            }),
        }
    }

    /// Create a store, subscribe it to its table on `bus`, and run the
    /// initial load. A failed load is reported through [`LoadState`].
    pub async fn mount(
        client: Arc<dyn DataAccessClient<R>>,
        query: ListQuery,
        config: SyncConfig,
        bus: Option<&ChangeNotificationBus>,
    ) -> Self {
        let store = Self::with_query(client, query, config);
        if let Some(bus) = bus {
            store.connect(bus, vec![Subscription::for_resource::<R>()]);
        }
        if let Err(e) = store.refresh().await {
            warn!(resource = R::NAME, error = %e, "initial load failed");
        }
        store
    }

    /// Refresh in the background after every debounced burst of matching
    /// change events. Replaces any previous bus subscription.
    pub fn connect(&self, bus: &ChangeNotificationBus, subscriptions: Vec<Subscription>) {
        if self.is_disposed() {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        let guard = bus.subscribe(
            subscriptions,
            move |events: Vec<ChangeEvent>| {
                if let Some(inner) = weak.upgrade() {
                    debug!(resource = R::NAME, events = events.len(), "change burst, refreshing");
                    ResourceStore { inner }.spawn_refresh();
                }
            },
            SubscribeOptions::from(&self.inner.config),
        );
        *self.inner.subscription.lock() = Some(guard);
    }

    /// Start a background refresh, aborting the previous one.
    fn spawn_refresh(&self) {
        if self.is_disposed() {
            return;
        }
        let store = self.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = store.refresh().await {
                debug!(resource = R::NAME, error = %e, "background refresh failed");
            }
        });
        if let Some(previous) = self.inner.background.lock().replace(handle) {
            previous.abort();
        }
    }

    // --- Reads ---

    pub fn snapshot(&self) -> Arc<ResourceSnapshot<R>> {
        self.inner.state.lock().snapshot.clone()
    }

    pub fn confirmed_snapshot(&self) -> Arc<ResourceSnapshot<R>> {
        self.inner.state.lock().confirmed_snapshot.clone()
    }

    pub fn load_state(&self) -> LoadState {
        self.inner.state.lock().load_state()
    }

    pub fn phase(&self) -> StorePhase {
        self.inner.state.lock().machine.phase()
    }

    pub fn view(&self) -> StoreView<R> {
        let st = self.inner.state.lock();
        StoreView {
            snapshot: st.snapshot.clone(),
            confirmed: st.confirmed_snapshot.clone(),
            pending: st.pending_ids(),
            load: st.load_state(),
            phase: st.machine.phase(),
        }
    }

    pub fn is_pending(&self, id: &RecordId) -> bool {
        self.inner
            .state
            .lock()
            .pending
            .values()
            .any(|o| o.target() == id)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().machine.is_disposed()
    }

    /// Observe snapshot and load state changes.
    pub fn watch(&self) -> StoreWatcher {
        self.inner.observers.watch()
    }

    pub fn query(&self) -> &ListQuery {
        &self.inner.query
    }

    /// Lock, mutate, then notify observers outside the lock.
    fn commit<T>(&self, f: impl FnOnce(&mut StoreState<R>) -> T) -> T {
        let (out, update) = {
            let mut st = self.inner.state.lock();
            let out = f(&mut st);
            (out, st.update())
        };
        self.inner.observers.broadcast(&update);
        out
    }

    // --- Refresh ---

    /// Refetch the collection and replace the server list.
    ///
    /// Only the most recently issued refresh is applied; an older response
    /// arriving later returns [`RefreshOutcome::Superseded`]. A failure keeps
    /// the previous snapshot and is recorded in [`LoadState::error`].
    /// Dropping the future before the response arrives abandons the refresh
    /// and returns the store to its previous phase.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let token = self.commit(|st| {
            if st.machine.is_disposed() {
                return Err(SyncError::Disposed);
            }
            st.issued = st.issued.next();
            st.machine.begin_refresh(st.issued);
            Ok(st.issued)
        })?;
        debug!(resource = R::NAME, token = token.0, "refresh started");
        let in_flight = InFlightRefresh {
            store: self,
            token,
            armed: true,
        };

        let result = call_with_timeout(
            self.inner.config.request_timeout(),
            self.inner.client.list(&self.inner.query),
        )
        .await
        .into_result();

        in_flight.disarm();
        self.finish_refresh(token, result)
    }

    /// The caller dropped the refresh before its response arrived.
    fn abandon_refresh(&self, token: RefreshToken) {
        self.commit(|st| {
            if st.machine.abandon_refresh(token) {
                debug!(resource = R::NAME, token = token.0, "refresh cancelled");
                st.fold_confirmed();
                st.rebuild();
            }
        });
    }

    fn finish_refresh(
        &self,
        token: RefreshToken,
        result: std::result::Result<Vec<R>, ErrorInfo>,
    ) -> Result<RefreshOutcome> {
        let (outcome, update) = {
            let mut st = self.inner.state.lock();
            if st.machine.is_disposed() {
                debug!(resource = R::NAME, token = token.0, "refresh response after dispose dropped");
                return Ok(RefreshOutcome::Discarded);
            }
            if !st.machine.finish_refresh(token, result.is_ok()) {
                debug!(
                    resource = R::NAME,
                    token = token.0,
                    latest = st.issued.0,
                    "stale refresh response discarded"
                );
                return Ok(RefreshOutcome::Superseded);
            }

            let outcome = match result {
                Ok(records) => {
                    st.base = records;
                    st.confirmed.retain(|c| !c.covered_by(token));
                    if st.error.as_ref().map(|e| e.kind) != Some(ErrorKind::Validation) {
                        st.error = None;
                    }
                    let changed = st.rebuild();
                    Ok(RefreshOutcome::Applied { changed })
                }
                Err(error) => {
                    warn!(resource = R::NAME, error = %error, "refresh failed");
                    st.error = Some(error.clone());
                    Err(SyncError::from(error))
                }
            };
            (outcome, st.update())
        };
        self.inner.observers.broadcast(&update);
        outcome
    }

    /// Re-run the last load after a retryable error.
    ///
    /// A validation error needs user correction and is returned as is.
    pub async fn retry(&self) -> Result<RefreshOutcome> {
        if let Some(error) = self.load_state().error {
            if !error.is_retryable() {
                return Err(error.into());
            }
        }
        self.clear_error();
        self.refresh().await
    }

    /// Dismiss the error banner.
    pub fn clear_error(&self) {
        self.commit(|st| st.error = None);
    }

    /// Refetch one record and merge it into the snapshot.
    pub async fn reload(&self, id: &RecordId) -> Result<R> {
        if self.is_disposed() {
            return Err(SyncError::Disposed);
        }
        let result = call_with_timeout(self.inner.config.request_timeout(), self.inner.client.get(id))
            .await
            .into_result();
        self.commit(|st| {
            if st.machine.is_disposed() {
                return;
            }
            match &result {
                Ok(record) => st.confirm(Overlay::Upsert(record.clone())),
                Err(error) if error.kind == ErrorKind::NotFound => {
                    st.confirm(Overlay::Remove(id.clone()))
                }
                Err(_) => {}
            }
            st.rebuild();
        });
        result.map_err(SyncError::from)
    }

    // --- Mutations ---

    /// Stage an optimistic overlay. `stage` receives the new mutation id.
    fn begin_mutation<T>(
        &self,
        stage: impl FnOnce(MutationId) -> (Overlay<R>, T),
    ) -> Result<(MutationId, T)> {
        self.commit(|st| {
            if st.machine.is_disposed() {
                return Err(SyncError::Disposed);
            }
            let mutation = st.next_mutation();
            let (overlay, out) = stage(mutation);
            st.pending.insert(mutation, overlay);
            st.machine.begin_mutation();
            st.rebuild();
            Ok((mutation, out))
        })
    }

    fn settle(&self, mutation: MutationId, settle: Settle<R>) {
        self.commit(|st| {
            if st.machine.is_disposed() {
                debug!(resource = R::NAME, mutation = mutation.0, "mutation settled after dispose");
                return;
            }
            st.pending.remove(&mutation);
            st.machine.finish_mutation();

            match settle {
                Settle::Confirmed(overlay) => {
                    st.confirm(overlay);
                    if st.machine.phase() != StorePhase::Error {
                        st.error = None;
                    }
                }
                Settle::Failed(error) => {
                    warn!(resource = R::NAME, error = %error, "mutation failed, rolled back");
                    st.error = Some(error);
                }
                Settle::Vanished(id, error) => {
                    info!(resource = R::NAME, id = %id, "record vanished on server");
                    st.confirm(Overlay::Remove(id));
                    st.error = Some(error);
                }
            }
            st.rebuild();
        });
    }

    /// Validation failure caught before contacting the server.
    fn reject_locally(&self, error: ErrorInfo) -> SyncError {
        self.commit(|st| {
            if !st.machine.is_disposed() {
                st.error = Some(error.clone());
            }
        });
        error.into()
    }

    /// Insert `record`. It is shown at once under a provisional id, replaced
    /// by the server's copy on success and removed on failure.
    pub async fn create(&self, record: R) -> Result<R> {
        let (mutation, provisional) = self.begin_mutation(|mutation| {
            let mut provisional = record;
            provisional.set_id(RecordId::provisional(mutation.0));
            (Overlay::Upsert(provisional.clone()), provisional)
        })?;

        let result = call_with_timeout(
            self.inner.config.request_timeout(),
            self.inner.client.create(provisional),
        )
        .await
        .into_result();

        match result {
            Ok(created) => {
                self.settle(mutation, Settle::Confirmed(Overlay::Upsert(created.clone())));
                Ok(created)
            }
            Err(error) => {
                self.settle(mutation, Settle::Failed(error.clone()));
                Err(error.into())
            }
        }
    }

    /// Apply `patch` to record `id`, optimistically.
    ///
    /// On `NotFound` the record is dropped from the snapshot.
    pub async fn update(&self, id: &RecordId, patch: R::Patch) -> Result<R> {
        if id.is_provisional() {
            return Err(self.reject_locally(ErrorInfo::validation("id", "record is not saved yet")));
        }
        let (mutation, ()) = self.begin_mutation(|_| {
            (
                Overlay::Patch {
                    id: id.clone(),
                    patch: patch.clone(),
                },
                (),
            )
        })?;
        self.send_update(mutation, id, patch).await
    }

    /// Update with a patch computed from the server-confirmed copy of `id`.
    ///
    /// Patches that carry absolute values (counts, accumulated minutes) must
    /// not be built on top of another unconfirmed change, since that change
    /// may still roll back. The record is therefore refused with a
    /// validation error while it has a mutation in flight.
    pub(crate) async fn update_confirmed(
        &self,
        id: &RecordId,
        derive: impl FnOnce(&R) -> std::result::Result<R::Patch, ErrorInfo>,
    ) -> Result<R> {
        let (mutation, patch) = self.commit(|st| {
            if st.machine.is_disposed() {
                return Err(SyncError::Disposed);
            }
            if st.pending.values().any(|o| o.target() == id) {
                let error = ErrorInfo::validation("id", "record has an unconfirmed change");
                st.error = Some(error.clone());
                return Err(error.into());
            }
            let confirmed = st.confirmed_snapshot.clone();
            let Some(record) = confirmed.get(id) else {
                return Err(SyncError::NotFound(format!("{} {} not found", R::NAME, id)));
            };
            let patch = match derive(record) {
                Ok(patch) => patch,
                Err(error) => {
                    st.error = Some(error.clone());
                    return Err(error.into());
                }
            };
            let mutation = st.next_mutation();
            st.pending.insert(
                mutation,
                Overlay::Patch {
                    id: id.clone(),
                    patch: patch.clone(),
                },
            );
            st.machine.begin_mutation();
            st.rebuild();
            Ok((mutation, patch))
        })?;
        self.send_update(mutation, id, patch).await
    }

    async fn send_update(&self, mutation: MutationId, id: &RecordId, patch: R::Patch) -> Result<R> {
        let result = call_with_timeout(
            self.inner.config.request_timeout(),
            self.inner.client.update(id, &patch),
        )
        .await
        .into_result();

        match result {
            Ok(updated) => {
                self.settle(mutation, Settle::Confirmed(Overlay::Upsert(updated.clone())));
                Ok(updated)
            }
            Err(error) if error.kind == ErrorKind::NotFound => {
                self.settle(mutation, Settle::Vanished(id.clone(), error.clone()));
                Err(error.into())
            }
            Err(error) => {
                self.settle(mutation, Settle::Failed(error.clone()));
                Err(error.into())
            }
        }
    }

    /// Remove record `id`, optimistically. Deleting a record that is already
    /// gone succeeds.
    pub async fn delete(&self, id: &RecordId) -> Result<()> {
        if id.is_provisional() {
            return Err(self.reject_locally(ErrorInfo::validation("id", "record is not saved yet")));
        }
        let (mutation, ()) = self.begin_mutation(|_| (Overlay::Remove(id.clone()), ()))?;

        let result = call_with_timeout(
            self.inner.config.request_timeout(),
            self.inner.client.delete(id),
        )
        .await
        .into_result();

        match result {
            Ok(()) => {
                self.settle(mutation, Settle::Confirmed(Overlay::Remove(id.clone())));
                Ok(())
            }
            Err(error) if error.kind == ErrorKind::NotFound => {
                debug!(resource = R::NAME, id = %id, "delete of missing record");
                self.settle(mutation, Settle::Confirmed(Overlay::Remove(id.clone())));
                Ok(())
            }
            Err(error) => {
                self.settle(mutation, Settle::Failed(error.clone()));
                Err(error.into())
            }
        }
    }

    // --- Lifecycle ---

    /// Tear down: unsubscribe, abort background work, and stop applying
    /// responses. The last snapshot stays readable. Idempotent.
    pub fn dispose(&self) {
        let update = {
            let mut st = self.inner.state.lock();
            if st.machine.is_disposed() {
                return;
            }
            st.machine.dispose();
            st.update()
        };
        if let Some(guard) = self.inner.subscription.lock().take() {
            guard.dispose();
        }
        if let Some(task) = self.inner.background.lock().take() {
            task.abort();
        }
        self.inner.observers.broadcast(&update);
        self.inner.observers.close_all();
        info!(resource = R::NAME, "store disposed");
    }
}
