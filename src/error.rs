use crate::remote::SyncError;

/// Process-level failures of the coordinator.
///
/// Classified remote failures are not errors at this level; they are returned as
/// data inside the operation outcomes. Everything here propagates with `?`.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
	#[error("Account import failed: {0}")]
	Import(String),

	#[error("Applying the application update failed: {0}")]
	UpdateApply(String),

	#[error("Preferences error: {0}")]
	Preferences(String),

	#[error("Recovery token {0} is not awaiting completion")]
	StaleRecoveryToken(u64),

	#[error("State patch must set at least one field")]
	EmptyPatch,

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Remote error: {0}")]
	Remote(#[from] SyncError),
}
