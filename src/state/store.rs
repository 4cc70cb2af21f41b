//! Observable store for `AppState`.
//!
//! The store is an explicit object handed to the coordinator by reference, so that
//! several independent stores (and coordinators) can coexist in one process.
//! Observers subscribe to a `watch` channel and see every committed state.

use super::app_state::{AppAction, AppState};
use crate::error::CoordinatorError;

use tokio::sync::watch;
use tracing::debug;

pub struct StateStore {
    sender: watch::Sender<AppState>,
}

impl StateStore {
    /// Create a store holding the default state.
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    pub fn with_state(state: AppState) -> Self {
        let (sender, _) = watch::channel(state);
        Self { sender }
    }

    /// The state a freshly started process begins with.
    pub fn initial_state() -> AppState {
        AppState::default()
    }

    /// Validate and apply an action, notifying subscribers.
    pub fn dispatch(&self, action: AppAction) -> Result<(), CoordinatorError> {
        action.validate()?;
        debug!("Applying app state transition {}", action.name());
        self.sender.send_modify(|state| *state = state.reduce(&action));
        Ok(())
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> AppState {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.sender.subscribe()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppStatePatch;

    #[tokio::test]
    async fn subscribers_observe_dispatched_state() {
        let store = StateStore::new();
        let mut receiver = store.subscribe();

        store
            .dispatch(AppAction::SetLoadingText(Some("Syncing".to_string())))
            .unwrap();

        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow().loading_text.as_deref(), Some("Syncing"));
    }

    #[test]
    fn rejected_action_leaves_state_untouched() {
        let store = StateStore::new();
        let result = store.dispatch(AppAction::Patch(AppStatePatch::new()));

        assert!(matches!(result, Err(CoordinatorError::EmptyPatch)));
        assert_eq!(store.snapshot(), StateStore::initial_state());
    }

    #[test]
    fn stores_are_independent() {
        let first = StateStore::new();
        let second = StateStore::new();

        first.dispatch(AppAction::MarkManagerInitialized).unwrap();

        assert!(first.snapshot().manager_has_initialized);
        assert!(!second.snapshot().manager_has_initialized);
    }
}
