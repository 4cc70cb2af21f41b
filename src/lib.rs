//! Client-side sync coordination for a budgeting application.
//!
//! The `SyncCoordinator` keeps the local mutation log in sync with a remote store,
//! imports bank transactions in an order that avoids duplicates, and routes
//! encryption-key failures to the right recovery flow.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod prefs;
pub mod remote;
pub mod state;

pub use config::CoordinatorConfig;
pub use coordinator::{
    Collaborators, DownloadOutcome, ResetOutcome, SyncCoordinator, SyncOutcome,
};
pub use error::CoordinatorError;
pub use remote::SyncError;
