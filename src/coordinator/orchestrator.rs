//! Sync coordinator and integration point for all collaborators.
//!
//! This module defines the `SyncCoordinator`, which sequences the three operations that make
//! up a sync session for a budget file: the push/pull sync exchange, the bank account import,
//! and encryption-key recovery after a session reset.
//!
//! The coordinator is responsible for:
//! - Skipping the sync exchange when the local profile has no remote-linked identity
//! - Reloading local preferences after every successful exchange
//! - Ordering sync, import and re-sync so imported transactions can be reconciled
//! - Routing each failed reset to exactly one recovery path
//!
//! Classified remote failures are returned as data in the operation outcomes. Only import,
//! update and preference failures propagate as `CoordinatorError`.

use crate::coordinator::{
    collaborators::{AccountImporter, AppShell, RecoveryPresenter, UserNotifier},
    events::{CoordinatorEvent, EventDispatcher},
    recovery::{RecoveryMachine, RecoveryRequest, RecoveryRoute, RecoveryState, RecoveryToken},
    session::{SessionStats, SyncSession},
};
use crate::config::RecoveryConfig;
use crate::error::CoordinatorError;
use crate::prefs::PreferencesStore;
use crate::remote::{RemoteSyncClient, SyncError};
use crate::state::{AppAction, StateStore};

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Result of a single sync exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No local identity; nothing was sent.
    Skipped,
    Synced,
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn error(&self) -> Option<&SyncError> {
        match self {
            SyncOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Result of `sync_and_download`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A sync exchange failed. If it was the second one, the import has already happened.
    Error(SyncError),
    /// New transactions were imported and synced.
    Updated,
    /// The import found nothing new.
    NotUpdated,
}

/// Result of `reset_sync` and `complete_recovery`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The reset succeeded and the follow-up sync produced this outcome.
    Synced(SyncOutcome),
    /// A recovery flow was presented.
    RecoveryRequested(RecoveryRequest),
    /// The failure was shown to the user as an alert. Only the shown text is kept;
    /// the failure has already been surfaced.
    Alerted { message: String },
}

/// External collaborators the coordinator drives
pub struct Collaborators {
    pub remote: Arc<dyn RemoteSyncClient>,
    pub prefs: Arc<dyn PreferencesStore>,
    pub importer: Arc<dyn AccountImporter>,
    pub presenter: Arc<dyn RecoveryPresenter>,
    pub notifier: Arc<dyn UserNotifier>,
    pub shell: Arc<dyn AppShell>,
}

/// Main coordinator for sync sessions.
///
/// Callers must not run two orchestrated calls for the same local identity at once;
/// the coordinator performs no locking around remote calls.
pub struct SyncCoordinator {
    remote: Arc<dyn RemoteSyncClient>,
    prefs: Arc<dyn PreferencesStore>,
    importer: Arc<dyn AccountImporter>,
    presenter: Arc<dyn RecoveryPresenter>,
    notifier: Arc<dyn UserNotifier>,
    shell: Arc<dyn AppShell>,
    store: Arc<StateStore>,

    events: EventDispatcher,
    recovery: Mutex<RecoveryMachine>,
    last_session: Mutex<Option<SessionStats>>,
}

impl SyncCoordinator {
    /// Create a coordinator that logs its events through `tracing`.
    pub fn new(collaborators: Collaborators, store: Arc<StateStore>, config: &RecoveryConfig) -> Self {
        Self::with_events(collaborators, store, config, EventDispatcher::with_tracing())
    }

    /// Create a coordinator with a custom event dispatcher.
    pub fn with_events(
        collaborators: Collaborators,
        store: Arc<StateStore>,
        config: &RecoveryConfig,
        events: EventDispatcher,
    ) -> Self {
        Self {
            remote: collaborators.remote,
            prefs: collaborators.prefs,
            importer: collaborators.importer,
            presenter: collaborators.presenter,
            notifier: collaborators.notifier,
            shell: collaborators.shell,
            store,
            events,
            recovery: Mutex::new(RecoveryMachine::new(config.max_attempts)),
            last_session: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Statistics of the most recently finished orchestrated call.
    pub async fn last_session(&self) -> Option<SessionStats> {
        self.last_session.lock().await.clone()
    }

    pub async fn recovery_state(&self) -> RecoveryState {
        self.recovery.lock().await.state()
    }

    /// Run one sync exchange if the local profile is linked to a remote file.
    ///
    /// Does not touch the loading indicator; that is the caller's job.
    pub async fn sync(&self) -> Result<SyncOutcome, CoordinatorError> {
        let mut session = SyncSession::new();
        let result = self.sync_in(&mut session).await;
        self.finish(session).await;
        result
    }

    /// Sync, import bank transactions, and sync again if anything was imported.
    ///
    /// `account_id` limits the import to one account; `None` imports all linked accounts.
    pub async fn sync_and_download(
        &self,
        account_id: Option<&str>,
    ) -> Result<DownloadOutcome, CoordinatorError> {
        let mut session = SyncSession::new();
        let result = self.sync_and_download_in(&mut session, account_id).await;
        self.finish(session).await;
        result
    }

    /// Reset the remote sync session and sync again, or start recovery on failure.
    ///
    /// Any recovery flow still pending from an earlier reset is superseded.
    pub async fn reset_sync(&self) -> Result<ResetOutcome, CoordinatorError> {
        self.recovery.lock().await.supersede();
        self.run_reset(1).await
    }

    /// Report that the user finished the fix-encryption-key flow identified by `token`.
    ///
    /// Runs exactly one new reset attempt. Fails with `StaleRecoveryToken` if the token
    /// is not the one currently awaited.
    pub async fn complete_recovery(
        &self,
        token: RecoveryToken,
    ) -> Result<ResetOutcome, CoordinatorError> {
        let attempt = self.recovery.lock().await.resume(token)?;
        self.events
            .dispatch(&CoordinatorEvent::RecoveryCompleted { token })
            .await?;
        self.run_reset(attempt).await
    }

    /// Report that the user abandoned the recovery flow identified by `token`.
    pub async fn cancel_recovery(&self, token: RecoveryToken) -> Result<(), CoordinatorError> {
        self.recovery.lock().await.cancel(token)?;
        self.events
            .dispatch(&CoordinatorEvent::RecoveryCancelled { token })
            .await
    }

    /// Apply a pending application update and forget its announcement.
    pub async fn update_app(&self) -> Result<(), CoordinatorError> {
        self.shell.apply_app_update().await?;
        self.store.dispatch(AppAction::SetUpdateInfo(None))?;
        self.events.dispatch(&CoordinatorEvent::AppUpdated).await
    }

    async fn sync_in(&self, session: &mut SyncSession) -> Result<SyncOutcome, CoordinatorError> {
        let prefs = self.prefs.local().await;
        session.begin_attempt(prefs.has_identity());

        if !session.has_local_identity() {
            self.events.dispatch(&CoordinatorEvent::SyncSkipped).await?;
            return Ok(SyncOutcome::Skipped);
        }

        self.events.dispatch(&CoordinatorEvent::SyncStarted).await?;
        session.record_sync_issued();

        match self.remote.sync().await {
            Ok(()) => {
                // Callers rely on seeing the refreshed identity once sync returns.
                self.prefs.refresh().await?;
                session.record_sync_succeeded();
                self.events.dispatch(&CoordinatorEvent::SyncSucceeded).await?;
                Ok(SyncOutcome::Synced)
            }
            Err(error) => {
                session.record_failure(error.clone());
                self.events
                    .dispatch(&CoordinatorEvent::SyncFailed {
                        error: error.clone(),
                    })
                    .await?;
                Ok(SyncOutcome::Failed(error))
            }
        }
    }

    async fn sync_and_download_in(
        &self,
        session: &mut SyncSession,
        account_id: Option<&str>,
    ) -> Result<DownloadOutcome, CoordinatorError> {
        // Pull what other clients pushed before importing. Imported transactions are
        // reconciled against existing ones; importing first makes every client add
        // the same bank transactions and duplicates them.
        if let SyncOutcome::Failed(error) = self.sync_in(session).await? {
            return Ok(DownloadOutcome::Error(error));
        }

        let has_downloaded = self.importer.import_accounts(account_id).await?;
        session.record_import(has_downloaded);
        self.events
            .dispatch(&CoordinatorEvent::ImportCompleted {
                account_id: account_id.map(str::to_string),
                has_downloaded,
            })
            .await?;

        if !has_downloaded {
            return Ok(DownloadOutcome::NotUpdated);
        }

        match self.sync_in(session).await? {
            SyncOutcome::Failed(error) => {
                warn!("Sync after import failed, imported transactions are kept locally");
                Ok(DownloadOutcome::Error(error))
            }
            SyncOutcome::Synced | SyncOutcome::Skipped => Ok(DownloadOutcome::Updated),
        }
    }

    async fn run_reset(&self, attempt: u32) -> Result<ResetOutcome, CoordinatorError> {
        let mut session = SyncSession::new();
        let result = self.reset_in(&mut session, attempt).await;
        self.finish(session).await;
        result
    }

    async fn reset_in(
        &self,
        session: &mut SyncSession,
        attempt: u32,
    ) -> Result<ResetOutcome, CoordinatorError> {
        info!("Resetting sync session (attempt {})", attempt);

        let error = match self.remote.reset().await {
            Ok(()) => {
                self.recovery.lock().await.settle();
                let outcome = self.sync_in(session).await?;
                return Ok(ResetOutcome::Synced(outcome));
            }
            Err(error) => error,
        };

        session.record_failure(error.clone());
        self.events
            .dispatch(&CoordinatorEvent::ResetFailed {
                error: error.clone(),
            })
            .await?;

        match RecoveryRoute::for_error(&error) {
            RecoveryRoute::FixEncryptionKey => {
                let token = self.recovery.lock().await.await_recovery(attempt);
                match token {
                    Some(token) => {
                        self.request_recovery(RecoveryRequest::FixEncryptionKey { token })
                            .await
                    }
                    None => self.alert(error.recovery_exhausted_message()).await,
                }
            }
            RecoveryRoute::CreateEncryptionKey => {
                self.recovery.lock().await.settle();
                self.request_recovery(RecoveryRequest::CreateEncryptionKey { recreate: true })
                    .await
            }
            RecoveryRoute::Alert => {
                self.recovery.lock().await.settle();
                self.alert(error.user_message()).await
            }
        }
    }

    async fn request_recovery(
        &self,
        request: RecoveryRequest,
    ) -> Result<ResetOutcome, CoordinatorError> {
        self.presenter.present(request.clone()).await;
        self.events
            .dispatch(&CoordinatorEvent::RecoveryRequested {
                request: request.clone(),
            })
            .await?;
        Ok(ResetOutcome::RecoveryRequested(request))
    }

    async fn alert(&self, message: String) -> Result<ResetOutcome, CoordinatorError> {
        self.notifier.alert(&message).await;
        self.events
            .dispatch(&CoordinatorEvent::Alerted {
                message: message.clone(),
            })
            .await?;
        Ok(ResetOutcome::Alerted { message })
    }

    async fn finish(&self, session: SyncSession) {
        let stats = session.stats();
        debug!("Session finished: {}", stats.summary());
        *self.last_session.lock().await = Some(stats);
    }
}
