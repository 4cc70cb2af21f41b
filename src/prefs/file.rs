use super::{LocalPrefs, PreferencesStore};
use crate::error::CoordinatorError;

use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Preferences stored as a JSON document on disk
pub struct FilePreferencesStore {
	path: PathBuf,
	cached: RwLock<LocalPrefs>,
}

impl FilePreferencesStore {
	/// Create a store for `path` without reading it yet.
	pub fn new(path: PathBuf) -> Self {
		Self {
			path,
			cached: RwLock::new(LocalPrefs::default()),
		}
	}

	/// Create a store and load the current contents of `path`.
	pub async fn open(path: PathBuf) -> Result<Self, CoordinatorError> {
		let store = Self::new(path);
		store.refresh().await?;
		Ok(store)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Write preferences to disk and update the cache.
	pub async fn save(&self, prefs: &LocalPrefs) -> Result<(), CoordinatorError> {
		let content = serde_json::to_string_pretty(prefs)?;
		tokio::fs::write(&self.path, content).await.map_err(|e| {
			CoordinatorError::Preferences(format!(
				"Failed to write preferences to {:?}: {}",
				self.path, e
			))
		})?;

		*self.cached.write().await = prefs.clone();
		info!("Saved preferences to {:?}", self.path);
		Ok(())
	}

	async fn read_from_disk(&self) -> Result<LocalPrefs, CoordinatorError> {
		if !self.path.exists() {
			debug!("No preferences file at {:?}, using defaults", self.path);
			return Ok(LocalPrefs::default());
		}

		let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
			CoordinatorError::Preferences(format!(
				"Failed to read preferences from {:?}: {}",
				self.path, e
			))
		})?;

		serde_json::from_str(&content).map_err(|e| {
			CoordinatorError::Preferences(format!(
				"Failed to parse preferences in {:?}: {}",
				self.path, e
			))
		})
	}
}

#[async_trait::async_trait]
impl PreferencesStore for FilePreferencesStore {
	async fn local(&self) -> LocalPrefs {
		self.cached.read().await.clone()
	}

	async fn refresh(&self) -> Result<LocalPrefs, CoordinatorError> {
		let prefs = self.read_from_disk().await?;
		*self.cached.write().await = prefs.clone();
		debug!("Reloaded preferences (identity present: {})", prefs.has_identity());
		Ok(prefs)
	}
}
