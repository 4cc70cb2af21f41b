//! Types for the remote sync service and classification of its failures

use serde::{Deserialize, Serialize};

/// Raw failure reported by the remote sync service.
///
/// The service identifies a failure by a short `reason` string and may attach
/// arbitrary metadata. This is the unclassified form; the coordinator only ever
/// sees the classified [`SyncError`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteFailure {
    /// Machine-readable failure reason, e.g. `encrypt-failure`.
    pub reason: String,
    /// Optional metadata attached by the service.
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

impl RemoteFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Whether the metadata flags the encryption key as missing locally.
    fn is_missing_key(&self) -> bool {
        self.meta
            .as_ref()
            .and_then(|meta| meta.get("isMissingKey"))
            .and_then(|flag| flag.as_bool())
            .unwrap_or(false)
    }
}

/// Response envelope returned by the sync and reset endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RemoteResponse {
    /// The exchange completed.
    Ok,
    /// The exchange was rejected.
    Error {
        #[serde(flatten)]
        failure: RemoteFailure,
    },
}

/// Classified failure of a sync exchange or session reset.
///
/// Every remote failure maps to exactly one variant; anything that is not an
/// encryption problem is treated as `Network`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Encryption failure (missing key: {missing_key})")]
    EncryptFailure { missing_key: bool },

    #[error("Remote file was re-keyed by another client")]
    FileHasNewKey,
}

impl SyncError {
    /// Classify a raw remote failure.
    pub fn classify(failure: &RemoteFailure) -> Self {
        match failure.reason.as_str() {
            "encrypt-failure" => SyncError::EncryptFailure {
                missing_key: failure.is_missing_key(),
            },
            "file-has-new-key" => SyncError::FileHasNewKey,
            other => SyncError::Network(other.to_string()),
        }
    }

    /// Human-readable message shown to the user in a blocking alert.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::EncryptFailure { missing_key: true } => {
                "Encrypting your file failed because the encryption key is missing on this device. \
                 Enter your password to recreate the key."
                    .to_string()
            }
            SyncError::EncryptFailure { missing_key: false } => {
                "Encrypting your file failed. Create a new encryption key and try again.".to_string()
            }
            SyncError::FileHasNewKey => {
                "Unable to encrypt your data because this device has an outdated key. \
                 Enter your password to load the new key."
                    .to_string()
            }
            SyncError::Network(reason) => match reason.as_str() {
                "unauthorized" => "You are not logged in to the sync server.".to_string(),
                "network" => "Unable to reach the sync server. Check your connection.".to_string(),
                "timeout" => "The sync server took too long to respond.".to_string(),
                "file-not-found" => "The budget file could not be found on the server.".to_string(),
                "file-has-reset" => {
                    "The budget file was reset on another device. Reload it to continue.".to_string()
                }
                "file-needs-upload" => {
                    "The budget file has not been uploaded to the server yet.".to_string()
                }
                other => format!("An internal error occurred while syncing (ref: {})", other),
            },
        }
    }

    /// Alert text once the encryption key recovery flow will no longer be offered.
    pub fn recovery_exhausted_message(&self) -> String {
        match self {
            SyncError::Network(_) => self.user_message(),
            _ => "Syncing is paused because the encryption key could not be recovered. \
                  Fix the key from the encryption settings, then reset sync."
                .to_string(),
        }
    }
}

impl From<RemoteFailure> for SyncError {
    fn from(failure: RemoteFailure) -> Self {
        SyncError::classify(&failure)
    }
}
