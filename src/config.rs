//! Coordinator configuration.
//!
//! Defaults are usable for a local sync server; `from_env` overlays environment
//! variables and `load` reads a JSON file with the same shape.

use crate::error::CoordinatorError;

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_URL: &str = "BUDGET_SYNC_URL";
pub const ENV_TOKEN: &str = "BUDGET_SYNC_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "BUDGET_SYNC_TIMEOUT_SECS";
pub const ENV_MAX_RECOVERY_ATTEMPTS: &str = "BUDGET_SYNC_MAX_RECOVERY_ATTEMPTS";
pub const ENV_PREFS: &str = "BUDGET_SYNC_PREFS";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub remote: RemoteConfig,
    pub recovery: RecoveryConfig,
    /// Location of the local preferences file.
    pub prefs_path: PathBuf,
}

/// Settings for the remote sync service
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub request_timeout_secs: u64,
    /// Time budget for retrying transient transport errors within one call.
    pub max_retry_elapsed_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5006/".to_string(),
            token: None,
            request_timeout_secs: 30,
            max_retry_elapsed_secs: 10,
        }
    }
}

/// Settings for the encryption-key recovery loop
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Maximum number of fix-encryption-key flows presented for one reset.
    pub max_attempts: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

impl CoordinatorConfig {
    /// Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, CoordinatorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoordinatorError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: CoordinatorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `BUDGET_SYNC_*` environment variables.
    pub fn from_env() -> Result<Self, CoordinatorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, CoordinatorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CoordinatorConfig {
            prefs_path: PathBuf::from("prefs.json"),
            ..CoordinatorConfig::default()
        };

        if let Some(url) = lookup(ENV_URL) {
            config.remote.base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            config.remote.token = Some(token);
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            config.remote.request_timeout_secs = parse_number(ENV_TIMEOUT_SECS, &timeout)?;
        }
        if let Some(attempts) = lookup(ENV_MAX_RECOVERY_ATTEMPTS) {
            config.recovery.max_attempts = parse_number(ENV_MAX_RECOVERY_ATTEMPTS, &attempts)?;
        }
        if let Some(path) = lookup(ENV_PREFS) {
            config.prefs_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CoordinatorError> {
        if self.recovery.max_attempts == 0 {
            return Err(CoordinatorError::Config(
                "recovery.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.remote.request_timeout_secs == 0 {
            return Err(CoordinatorError::Config(
                "remote.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, CoordinatorError> {
    value
        .trim()
        .parse()
        .map_err(|_| CoordinatorError::Config(format!("{} is not a valid number: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_defaults() {
        let config = CoordinatorConfig::from_lookup(lookup_from(&[
            (ENV_URL, "https://sync.example.org/"),
            (ENV_MAX_RECOVERY_ATTEMPTS, "2"),
            (ENV_PREFS, "/tmp/prefs.json"),
        ]))
        .unwrap();

        assert_eq!(config.remote.base_url, "https://sync.example.org/");
        assert_eq!(config.recovery.max_attempts, 2);
        assert_eq!(config.prefs_path, PathBuf::from("/tmp/prefs.json"));
        assert_eq!(config.remote.request_timeout_secs, 30);
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let result = CoordinatorConfig::from_lookup(lookup_from(&[(ENV_TIMEOUT_SECS, "soon")]));
        assert!(matches!(result, Err(CoordinatorError::Config(_))));
    }

    #[test]
    fn rejects_zero_recovery_attempts() {
        let result =
            CoordinatorConfig::from_lookup(lookup_from(&[(ENV_MAX_RECOVERY_ATTEMPTS, "0")]));
        assert!(matches!(result, Err(CoordinatorError::Config(_))));
    }

    #[test]
    fn loads_partial_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"recovery":{"max_attempts":3}}"#).unwrap();

        let config = CoordinatorConfig::load(&path).unwrap();
        assert_eq!(config.recovery.max_attempts, 3);
        assert_eq!(config.remote.base_url, RemoteConfig::default().base_url);
    }
}
