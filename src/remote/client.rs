//!
//! HTTP client for the remote sync service.
//!
//! This module defines the `RemoteSyncClient` seam used by the coordinator and an HTTP
//! implementation of it. Each call performs exactly one logical round-trip (a sync exchange
//! or a session reset); transient transport failures are retried with exponential backoff
//! inside the client, and every failure that remains is classified into a `SyncError`.

use super::types::{RemoteFailure, RemoteResponse, SyncError};
use crate::config::RemoteConfig;
use crate::error::CoordinatorError;

use async_trait::async_trait;
use backoff::{ExponentialBackoff, future::retry};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, warn};

/// A single round-trip against the remote mutation store.
#[async_trait]
pub trait RemoteSyncClient: Send + Sync {
	/// Push local mutations and pull remote ones.
	async fn sync(&self) -> Result<(), SyncError>;

	/// Reset the remote sync session for the local budget file.
	async fn reset(&self) -> Result<(), SyncError>;
}

/// Remote sync client talking JSON over HTTP
#[derive(Clone)]
pub struct HttpRemoteSyncClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// Base URL of the sync service.
	base_url: Url,
	/// Optional session token sent with every request.
	token: Option<String>,
	/// Upper bound on time spent retrying transient transport errors.
	max_retry_elapsed: Duration,
}

impl HttpRemoteSyncClient {
	/// Create a new client from the remote section of the configuration.
	///
	/// # Errors
	/// Returns `CoordinatorError::Config` if the base URL is invalid or the HTTP client
	/// cannot be constructed.
	pub fn new(config: &RemoteConfig) -> Result<Self, CoordinatorError> {
		let mut base_url = Url::parse(&config.base_url).map_err(|e| {
			CoordinatorError::Config(format!("Invalid sync server URL {}: {}", config.base_url, e))
		})?;
		// `Url::join` replaces the last segment unless the path ends in a slash
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());
			base_url.set_path(&path);
		}

		let http_client = Client::builder()
			.timeout(Duration::from_secs(config.request_timeout_secs))
			.build()
			.map_err(|e| CoordinatorError::Config(format!("Failed to create HTTP client: {}", e)))?;

		Ok(Self {
			http_client,
			base_url,
			token: config.token.clone(),
			max_retry_elapsed: Duration::from_secs(config.max_retry_elapsed_secs),
		})
	}

	fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
		self.base_url
			.join(path)
			.map_err(|e| SyncError::Network(format!("invalid-endpoint: {}", e)))
	}

	/// POST to `path` and interpret the response envelope.
	async fn exchange(&self, path: &str) -> Result<(), SyncError> {
		let url = self.endpoint(path)?;
		debug!("Sending request to {}", url);

		let backoff = ExponentialBackoff {
			max_elapsed_time: Some(self.max_retry_elapsed),
			..ExponentialBackoff::default()
		};

		let client = &self.http_client;
		let token = self.token.as_deref();
		let url_ref = &url;

		let response = retry(backoff, || async move {
			let mut request = client.post(url_ref.clone());
			if let Some(token) = token {
				request = request.bearer_auth(token);
			}
			request.send().await.map_err(|e| {
				if e.is_connect() || e.is_timeout() {
					warn!("Transient error contacting sync server: {}", e);
					backoff::Error::transient(e)
				} else {
					backoff::Error::permanent(e)
				}
			})
		})
		.await
		.map_err(|e| transport_failure(&e))?;

		let status = response.status();
		let body = response
			.bytes()
			.await
			.map_err(|e| transport_failure(&e))?;

		interpret_response(status, &body)
	}
}

#[async_trait]
impl RemoteSyncClient for HttpRemoteSyncClient {
	async fn sync(&self) -> Result<(), SyncError> {
		self.exchange("sync/sync").await
	}

	async fn reset(&self) -> Result<(), SyncError> {
		self.exchange("sync/reset").await
	}
}

fn transport_failure(e: &reqwest::Error) -> SyncError {
	if e.is_timeout() {
		SyncError::Network("timeout".to_string())
	} else {
		SyncError::Network("network".to_string())
	}
}

/// Map an HTTP status and body onto the classified result.
///
/// A parseable error envelope always wins over the status code so that
/// encryption failures reported with a 4xx status are still recognised.
fn interpret_response(status: StatusCode, body: &[u8]) -> Result<(), SyncError> {
	match serde_json::from_slice::<RemoteResponse>(body) {
		Ok(RemoteResponse::Error { failure }) => Err(SyncError::from(failure)),
		Ok(RemoteResponse::Ok) if status.is_success() => Ok(()),
		_ => {
			let reason = match status {
				StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "unauthorized".to_string(),
				StatusCode::NOT_FOUND => "file-not-found".to_string(),
				s if s.is_success() => "invalid-response".to_string(),
				s => format!("http-{}", s.as_u16()),
			};
			Err(SyncError::classify(&RemoteFailure::new(reason)))
		}
	}
}
