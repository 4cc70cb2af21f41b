use budget_sync::coordinator::{
	AccountImporter, AppShell, ChannelRecoveryPresenter, Collaborators, RecoveryRequest,
	SyncCoordinator, UserNotifier,
};
use budget_sync::prefs::FilePreferencesStore;
use budget_sync::remote::HttpRemoteSyncClient;
use budget_sync::state::StateStore;
use budget_sync::{CoordinatorConfig, CoordinatorError, DownloadOutcome, ResetOutcome, SyncOutcome};

use std::sync::Arc;
use tracing::{error, info, warn};

const USAGE: &str = "usage: budget-sync [sync | reset | download [ACCOUNT_ID]]";

/// Importer used when no bank sync provider is configured
struct NoLinkedAccounts;

#[async_trait::async_trait]
impl AccountImporter for NoLinkedAccounts {
	async fn import_accounts(&self, account_id: Option<&str>) -> Result<bool, CoordinatorError> {
		info!(
			"No bank sync provider configured, skipping import for {}",
			account_id.unwrap_or("all accounts")
		);
		Ok(false)
	}
}

struct LogNotifier;

#[async_trait::async_trait]
impl UserNotifier for LogNotifier {
	async fn alert(&self, message: &str) {
		error!("{}", message);
	}
}

struct HeadlessShell;

#[async_trait::async_trait]
impl AppShell for HeadlessShell {
	async fn apply_app_update(&self) -> Result<(), CoordinatorError> {
		Err(CoordinatorError::UpdateApply(
			"updates are not supported in headless mode".to_string(),
		))
	}
}

enum Command {
	Sync,
	Reset,
	Download(Option<String>),
}

fn parse_command(args: &[String]) -> Option<Command> {
	match args.first().map(String::as_str) {
		None | Some("sync") => Some(Command::Sync),
		Some("reset") => Some(Command::Reset),
		Some("download") => Some(Command::Download(args.get(1).cloned())),
		_ => None,
	}
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.init();

	let args: Vec<String> = std::env::args().skip(1).collect();
	let Some(command) = parse_command(&args) else {
		eprintln!("{}", USAGE);
		std::process::exit(2);
	};

	if let Err(e) = run(command).await {
		error!("budget-sync failed: {}", e);
		std::process::exit(1);
	}
}

async fn run(command: Command) -> Result<(), CoordinatorError> {
	let config = CoordinatorConfig::from_env()?;
	info!("Using sync server {}", config.remote.base_url);

	let remote = HttpRemoteSyncClient::new(&config.remote)?;
	let prefs = FilePreferencesStore::open(config.prefs_path.clone()).await?;
	let (presenter, mut recovery_requests) = ChannelRecoveryPresenter::new();

	let coordinator = SyncCoordinator::new(
		Collaborators {
			remote: Arc::new(remote),
			prefs: Arc::new(prefs),
			importer: Arc::new(NoLinkedAccounts),
			presenter: Arc::new(presenter),
			notifier: Arc::new(LogNotifier),
			shell: Arc::new(HeadlessShell),
		},
		Arc::new(StateStore::new()),
		&config.recovery,
	);

	match command {
		Command::Sync => match coordinator.sync().await? {
			SyncOutcome::Skipped => info!("No budget linked to a sync server, nothing to do"),
			SyncOutcome::Synced => info!("Budget is in sync"),
			SyncOutcome::Failed(error) => return Err(error.into()),
		},
		Command::Download(account_id) => {
			match coordinator.sync_and_download(account_id.as_deref()).await? {
				DownloadOutcome::Updated => info!("New transactions imported and synced"),
				DownloadOutcome::NotUpdated => info!("No new transactions"),
				DownloadOutcome::Error(error) => return Err(error.into()),
			}
		}
		Command::Reset => match coordinator.reset_sync().await? {
			ResetOutcome::Synced(outcome) => info!("Sync reset complete ({:?})", outcome),
			ResetOutcome::Alerted { .. } => warn!("Sync reset stopped, the user was alerted"),
			ResetOutcome::RecoveryRequested(_) => {
				while let Ok(request) = recovery_requests.try_recv() {
					match request {
						RecoveryRequest::FixEncryptionKey { token } => warn!(
							"Encryption key must be re-entered in the app before syncing (recovery {})",
							token
						),
						RecoveryRequest::CreateEncryptionKey { .. } => {
							warn!("A new encryption key must be created in the app before syncing")
						}
					}
				}
			}
		},
	}

	if let Some(stats) = coordinator.last_session().await {
		info!("{}", stats.summary());
	}
	Ok(())
}
