//! Event system for the sync coordinator.
//!
//! The coordinator reports every step of an orchestrated call as a `CoordinatorEvent`.
//! Registered handlers observe them independently of the coordinator's control flow,
//! which keeps logging and UI bookkeeping out of the orchestration code.

use super::recovery::{RecoveryRequest, RecoveryToken};
use crate::error::CoordinatorError;
use crate::remote::SyncError;

use tracing::{debug, info, warn};

/// Events emitted during orchestrated calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    /// No local identity, the sync exchange was not issued
    SyncSkipped,
    SyncStarted,
    /// The exchange succeeded and preferences were reloaded
    SyncSucceeded,
    SyncFailed { error: SyncError },
    /// The account importer finished
    ImportCompleted {
        account_id: Option<String>,
        has_downloaded: bool,
    },
    ResetFailed { error: SyncError },
    RecoveryRequested { request: RecoveryRequest },
    RecoveryCompleted { token: RecoveryToken },
    RecoveryCancelled { token: RecoveryToken },
    /// A blocking alert was shown to the user
    Alerted { message: String },
    /// A pending application update was applied
    AppUpdated,
}

/// Trait for handling coordinator events.
#[async_trait::async_trait]
pub trait CoordinatorEventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: &CoordinatorEvent) -> Result<(), CoordinatorError>;

    /// Get the name of this handler for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Event dispatcher that manages multiple event handlers.
///
/// Handlers are called in registration order.
pub struct EventDispatcher {
    handlers: Vec<Box<dyn CoordinatorEventHandler>>,
}

impl EventDispatcher {
    /// Create a new, empty event dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Dispatcher with a [`TracingEventHandler`] already registered.
    pub fn with_tracing() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register_handler(Box::new(TracingEventHandler));
        dispatcher
    }

    pub fn register_handler(&mut self, handler: Box<dyn CoordinatorEventHandler>) {
        self.handlers.push(handler);
    }

    /// Dispatch an event to all registered handlers.
    ///
    /// Errors from handlers are logged, but do not stop other handlers from running.
    pub async fn dispatch(&self, event: &CoordinatorEvent) -> Result<(), CoordinatorError> {
        for handler in &self.handlers {
            if let Err(e) = handler.handle(event).await {
                tracing::error!("Handler {} failed to process event: {}", handler.name(), e);
            }
        }
        Ok(())
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs every event through `tracing`
pub struct TracingEventHandler;

#[async_trait::async_trait]
impl CoordinatorEventHandler for TracingEventHandler {
    async fn handle(&self, event: &CoordinatorEvent) -> Result<(), CoordinatorError> {
        match event {
            CoordinatorEvent::SyncSkipped => debug!("Sync skipped: no local identity"),
            CoordinatorEvent::SyncStarted => debug!("Sync exchange started"),
            CoordinatorEvent::SyncSucceeded => info!("Sync exchange succeeded"),
            CoordinatorEvent::SyncFailed { error } => warn!("Sync exchange failed: {}", error),
            CoordinatorEvent::ImportCompleted {
                account_id,
                has_downloaded,
            } => info!(
                "Account import for {} finished (new transactions: {})",
                account_id.as_deref().unwrap_or("all accounts"),
                has_downloaded
            ),
            CoordinatorEvent::ResetFailed { error } => warn!("Sync reset failed: {}", error),
            CoordinatorEvent::RecoveryRequested { request } => {
                info!("Presenting {} recovery flow", request.flow_name())
            }
            CoordinatorEvent::RecoveryCompleted { token } => {
                info!("Recovery {} completed, retrying reset", token)
            }
            CoordinatorEvent::RecoveryCancelled { token } => info!("Recovery {} cancelled", token),
            CoordinatorEvent::Alerted { message } => warn!("Alert shown: {}", message),
            CoordinatorEvent::AppUpdated => info!("Application update applied"),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "TracingEventHandler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<CoordinatorEvent>>>);

    #[async_trait::async_trait]
    impl CoordinatorEventHandler for Recorder {
        async fn handle(&self, event: &CoordinatorEvent) -> Result<(), CoordinatorError> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Recorder"
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl CoordinatorEventHandler for Failing {
        async fn handle(&self, _event: &CoordinatorEvent) -> Result<(), CoordinatorError> {
            Err(CoordinatorError::Preferences("handler broke".to_string()))
        }

        fn name(&self) -> &'static str {
            "Failing"
        }
    }

    #[tokio::test]
    async fn failing_handler_does_not_block_others() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::with_tracing();
        dispatcher.register_handler(Box::new(Failing));
        dispatcher.register_handler(Box::new(Recorder(seen.clone())));

        dispatcher
            .dispatch(&CoordinatorEvent::SyncStarted)
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![CoordinatorEvent::SyncStarted]);
    }
}
