//! Remote sync service integration
//!
//! This module provides the client seam for the remote mutation store and the taxonomy
//! used to classify its failures. The coordinator depends only on the `RemoteSyncClient`
//! trait; `HttpRemoteSyncClient` is the production implementation.

/// HTTP client for sync exchanges and session resets
mod client;
/// Wire envelope and failure classification
mod types;

pub use client::{HttpRemoteSyncClient, RemoteSyncClient};
pub use types::*;
