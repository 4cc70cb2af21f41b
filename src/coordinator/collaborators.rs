use super::recovery::RecoveryRequest;
use crate::error::CoordinatorError;

use tokio::sync::mpsc;
use tracing::warn;

/// Pulls new transactions from linked bank accounts
#[async_trait::async_trait]
pub trait AccountImporter: Send + Sync {
	/// Import one account (`Some(id)`) or all linked accounts (`None`).
	///
	/// Returns true iff new transactions were created.
	async fn import_accounts(&self, account_id: Option<&str>) -> Result<bool, CoordinatorError>;
}

/// Shows encryption-key recovery flows to the user
#[async_trait::async_trait]
pub trait RecoveryPresenter: Send + Sync {
	/// Fire-and-forget. A `FixEncryptionKey` request is completed later by redeeming its
	/// token with `SyncCoordinator::complete_recovery`.
	async fn present(&self, request: RecoveryRequest);
}

/// Shows blocking alerts
#[async_trait::async_trait]
pub trait UserNotifier: Send + Sync {
	async fn alert(&self, message: &str);
}

/// Host application shell
#[async_trait::async_trait]
pub trait AppShell: Send + Sync {
	/// Apply a downloaded application update.
	async fn apply_app_update(&self) -> Result<(), CoordinatorError>;
}

/// Presenter that forwards recovery requests over a channel
///
/// The receiving side (usually the UI loop) owns the flows and reports back to the
/// coordinator with the request's token.
#[derive(Clone)]
pub struct ChannelRecoveryPresenter {
	sender: mpsc::UnboundedSender<RecoveryRequest>,
}

impl ChannelRecoveryPresenter {
	pub fn new() -> (Self, mpsc::UnboundedReceiver<RecoveryRequest>) {
		let (sender, receiver) = mpsc::unbounded_channel();
		(Self { sender }, receiver)
	}
}

#[async_trait::async_trait]
impl RecoveryPresenter for ChannelRecoveryPresenter {
	async fn present(&self, request: RecoveryRequest) {
		if let Err(e) = self.sender.send(request) {
			warn!("Recovery request {} dropped, no receiver", e.0.flow_name());
		}
	}
}
