//! Store lifecycle phases and the load state rendered by views.

use crate::error::ErrorInfo;
use crate::types::RefreshToken;
use serde::Serialize;

/// Lifecycle phase of a store.
///
/// ```text
/// Idle -> Loading -> Ready | Error
/// Ready -> Loading (change event or explicit refresh)
/// Ready -> Saving -> Ready (success, or failure with rollback)
/// Error -> Loading (retry or change event)
/// any -> Disposed
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorePhase {
    Idle,
    Loading,
    Ready,
    Saving,
    Error,
    Disposed,
}

/// What a view shows besides the records: spinners and the error banner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadState {
    /// First load, nothing to show yet.
    pub loading: bool,
    /// Background refresh while a snapshot is on screen.
    pub refreshing: bool,
    /// At least one mutation awaiting the server.
    pub saving: bool,
    pub error: Option<ErrorInfo>,
}

impl LoadState {
    pub fn is_busy(&self) -> bool {
        self.loading || self.refreshing || self.saving
    }

    /// Whether a retry control should be offered.
    pub fn can_retry(&self) -> bool {
        self.error.as_ref().map(ErrorInfo::is_retryable).unwrap_or(false)
    }
}

/// Tracks in-flight work and derives the phase from it.
#[derive(Debug, Default)]
pub(crate) struct PhaseMachine {
    disposed: bool,
    /// A refresh has been applied at least once.
    loaded: bool,
    /// The last completed refresh failed.
    failed: bool,
    in_flight: Option<RefreshToken>,
    background: bool,
    mutations: usize,
}

impl PhaseMachine {
    pub fn phase(&self) -> StorePhase {
        if self.disposed {
            StorePhase::Disposed
        } else if self.mutations > 0 {
            StorePhase::Saving
        } else if self.in_flight.is_some() {
            StorePhase::Loading
        } else if self.failed {
            StorePhase::Error
        } else if self.loaded {
            StorePhase::Ready
        } else {
            StorePhase::Idle
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// A refresh whose result may still be applied is outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Track `token` as the only refresh whose result will be applied.
    pub fn begin_refresh(&mut self, token: RefreshToken) {
        self.background = self.loaded || self.failed;
        self.in_flight = Some(token);
    }

    /// Returns false, changing nothing, when `token` has been superseded.
    pub fn finish_refresh(&mut self, token: RefreshToken, ok: bool) -> bool {
        if self.in_flight != Some(token) {
            return false;
        }
        self.in_flight = None;
        if ok {
            self.loaded = true;
            self.failed = false;
        } else {
            self.failed = true;
        }
        true
    }

    /// Forget `token` without a result. Returns false when it was superseded.
    pub fn abandon_refresh(&mut self, token: RefreshToken) -> bool {
        if self.in_flight != Some(token) {
            return false;
        }
        self.in_flight = None;
        true
    }

    pub fn begin_mutation(&mut self) {
        self.mutations += 1;
    }

    pub fn finish_mutation(&mut self) {
        self.mutations = self.mutations.saturating_sub(1);
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
        self.in_flight = None;
        self.mutations = 0;
    }

    pub fn load_state(&self, error: Option<ErrorInfo>) -> LoadState {
        let refreshing = self.in_flight.is_some() && !self.disposed;
        LoadState {
            loading: refreshing && !self.background,
            refreshing: refreshing && self.background,
            saving: self.mutations > 0,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_load_then_background_refresh() {
        let mut machine = PhaseMachine::default();
        assert_eq!(machine.phase(), StorePhase::Idle);

        machine.begin_refresh(RefreshToken(1));
        assert_eq!(machine.phase(), StorePhase::Loading);
        assert!(machine.load_state(None).loading);

        assert!(machine.finish_refresh(RefreshToken(1), true));
        assert_eq!(machine.phase(), StorePhase::Ready);

        machine.begin_refresh(RefreshToken(2));
        let load = machine.load_state(None);
        assert!(load.refreshing);
        assert!(!load.loading);
    }

    #[test]
    fn test_superseded_refresh_is_ignored() {
        let mut machine = PhaseMachine::default();
        machine.begin_refresh(RefreshToken(1));
        machine.begin_refresh(RefreshToken(2));
        assert!(!machine.finish_refresh(RefreshToken(1), true));
        assert_eq!(machine.phase(), StorePhase::Loading);
        assert!(machine.finish_refresh(RefreshToken(2), false));
        assert_eq!(machine.phase(), StorePhase::Error);
    }

    #[test]
    fn test_abandoned_refresh_restores_phase() {
        let mut machine = PhaseMachine::default();
        machine.begin_refresh(RefreshToken(1));
        machine.finish_refresh(RefreshToken(1), true);

        machine.begin_refresh(RefreshToken(2));
        assert!(machine.abandon_refresh(RefreshToken(2)));
        assert_eq!(machine.phase(), StorePhase::Ready);
        assert!(!machine.load_state(None).is_busy());

        // Abandoning a superseded token leaves the newer refresh alone.
        machine.begin_refresh(RefreshToken(3));
        machine.begin_refresh(RefreshToken(4));
        assert!(!machine.abandon_refresh(RefreshToken(3)));
        assert!(machine.is_refreshing());
    }

    #[test]
    fn test_saving_returns_to_ready() {
        let mut machine = PhaseMachine::default();
        machine.begin_refresh(RefreshToken(1));
        machine.finish_refresh(RefreshToken(1), true);
        machine.begin_mutation();
        machine.begin_mutation();
        assert_eq!(machine.phase(), StorePhase::Saving);
        machine.finish_mutation();
        assert_eq!(machine.phase(), StorePhase::Saving);
        machine.finish_mutation();
        assert_eq!(machine.phase(), StorePhase::Ready);
    }

    #[test]
    fn test_disposed_is_terminal() {
        let mut machine = PhaseMachine::default();
        machine.begin_refresh(RefreshToken(1));
        machine.dispose();
        assert_eq!(machine.phase(), StorePhase::Disposed);
        assert!(!machine.finish_refresh(RefreshToken(1), true));
        assert!(!machine.load_state(None).is_busy());
    }

    #[test]
    fn test_only_retryable_errors_offer_retry() {
        let network = LoadState {
            error: Some(ErrorInfo::network("offline")),
            ..Default::default()
        };
        let validation = LoadState {
            error: Some(ErrorInfo::validation("party_size", "too small")),
            ..Default::default()
        };
        assert!(network.can_retry());
        assert!(!validation.can_retry());
    }
}
