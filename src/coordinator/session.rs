//! Session tracking for orchestrated sync calls.
//!
//! A `SyncSession` lives for exactly one call to `sync`, `reset_sync` or `sync_and_download`.
//! It records whether the local profile had an identity, the last classified failure, and
//! counters used for the end-of-call summary.

use crate::remote::SyncError;

use std::time::{Duration, Instant};

/// State of one orchestrated call
#[derive(Debug, Clone)]
pub struct SyncSession {
    /// Whether the local profile is linked to a remote budget file
    has_local_identity: bool,
    /// Last classified failure, cleared when a new attempt starts
    last_error: Option<SyncError>,
    /// Sync exchanges issued against the remote
    sync_attempts: usize,
    /// Sync exchanges that succeeded
    syncs_succeeded: usize,
    /// Whether an account import ran, and if so whether it created data
    import_result: Option<bool>,
    started_at: Instant,
}

impl SyncSession {
    pub fn new() -> Self {
        Self {
            has_local_identity: false,
            last_error: None,
            sync_attempts: 0,
            syncs_succeeded: 0,
            import_result: None,
            started_at: Instant::now(),
        }
    }

    /// Start a new attempt, clearing the previous failure.
    pub fn begin_attempt(&mut self, has_local_identity: bool) {
        self.has_local_identity = has_local_identity;
        self.last_error = None;
    }

    pub fn record_sync_issued(&mut self) {
        self.sync_attempts += 1;
    }

    pub fn record_sync_succeeded(&mut self) {
        self.syncs_succeeded += 1;
    }

    pub fn record_failure(&mut self, error: SyncError) {
        self.last_error = Some(error);
    }

    pub fn record_import(&mut self, has_downloaded: bool) {
        self.import_result = Some(has_downloaded);
    }

    pub fn has_local_identity(&self) -> bool {
        self.has_local_identity
    }

    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            has_local_identity: self.has_local_identity,
            sync_attempts: self.sync_attempts,
            syncs_succeeded: self.syncs_succeeded,
            import_result: self.import_result,
            last_error: self.last_error.clone(),
            elapsed: self.started_at.elapsed(),
        }
    }
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of a finished session
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub has_local_identity: bool,
    pub sync_attempts: usize,
    pub syncs_succeeded: usize,
    pub import_result: Option<bool>,
    pub last_error: Option<SyncError>,
    pub elapsed: Duration,
}

impl SessionStats {
    /// Get a human-readable summary of the session
    pub fn summary(&self) -> String {
        let import = match self.import_result {
            Some(true) => "import created transactions",
            Some(false) => "import found nothing new",
            None => "no import",
        };
        format!(
            "{}/{} sync exchanges succeeded, {} in {} ms{}",
            self.syncs_succeeded,
            self.sync_attempts,
            import,
            self.elapsed.as_millis(),
            match &self.last_error {
                Some(error) => format!(" (last error: {})", error),
                None => String::new(),
            }
        )
    }
}
