//! Local preferences
//!
//! The coordinator only cares whether the local profile is linked to a remote budget
//! file (`LocalPrefs::id`). It reads the cached value through `PreferencesStore::local`
//! and asks for a re-read with `PreferencesStore::refresh` after every successful sync.

/// File-backed preferences store
mod file;

pub use file::FilePreferencesStore;

use crate::error::CoordinatorError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Locally stored preferences for the open budget
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPrefs {
	/// Identifier of the remote budget file this client is linked to.
	pub id: Option<String>,
	pub budget_name: Option<String>,
	pub encrypt_key_id: Option<String>,
	pub last_synced_at: Option<DateTime<Utc>>,
}

impl LocalPrefs {
	/// Whether a remote-linked identity is present.
	pub fn has_identity(&self) -> bool {
		self.id.as_deref().is_some_and(|id| !id.is_empty())
	}
}

/// Source of local preferences
#[async_trait::async_trait]
pub trait PreferencesStore: Send + Sync {
	/// Last loaded preferences.
	async fn local(&self) -> LocalPrefs;

	/// Re-read preferences from their backing storage.
	async fn refresh(&self) -> Result<LocalPrefs, CoordinatorError>;
}
