//! Sync Coordination Module
//!
//! This module provides the client-side control flow that keeps the local mutation log in
//! sync with the remote store while importing bank transactions. It is composed of several
//! submodules:
//!
//! - `orchestrator`: The `SyncCoordinator` and the outcomes of its operations.
//! - `collaborators`: Traits for the importer, recovery presenter, notifier and app shell.
//! - `events`: Event types and the dispatcher used to observe orchestrated calls.
//! - `recovery`: Routing of failed resets and the encryption-key recovery state machine.
//! - `session`: Per-call session state and statistics.

/// Seams to external collaborators
pub mod collaborators;
/// Event system for observing orchestrated calls
pub mod events;
/// Main coordinator for sync sessions
pub mod orchestrator;
/// Recovery routing and retry state machine
pub mod recovery;
/// Per-call session tracking
pub mod session;

pub use collaborators::*;
pub use events::{CoordinatorEvent, CoordinatorEventHandler, EventDispatcher, TracingEventHandler};
pub use orchestrator::*;
pub use recovery::{RecoveryRequest, RecoveryRoute, RecoveryState, RecoveryToken};
pub use session::{SessionStats, SyncSession};
