//! Encryption-key recovery routing and the retry state machine.
//!
//! A failed session reset is routed to exactly one of three recovery paths. The
//! fix-encryption-key path is the only one that retries: the presenter is handed a
//! continuation token, and the reset runs again only when that token is redeemed
//! through `SyncCoordinator::complete_recovery`.
//!
//! ```text
//! Idle --fix route--> AwaitingRecovery{token} --complete(token)--> Retrying --> Idle | AwaitingRecovery
//!                            |
//!                            +--cancel(token)--> Idle
//! ```

use crate::error::CoordinatorError;
use crate::remote::SyncError;

use rand::Rng;
use std::fmt;
use tracing::{debug, info, warn};

/// Opaque token identifying one pending recovery flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoveryToken(u64);

impl RecoveryToken {
    fn generate() -> Self {
        Self(rand::rng().random())
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecoveryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Request for the presenter to show a recovery flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryRequest {
    /// Re-enter the password to recreate or load the key. Completing it retries the reset.
    FixEncryptionKey { token: RecoveryToken },
    /// Create a brand new key. Nothing is retried afterwards.
    CreateEncryptionKey { recreate: bool },
}

impl RecoveryRequest {
    /// Name of the flow as known to the UI.
    pub fn flow_name(&self) -> &'static str {
        match self {
            RecoveryRequest::FixEncryptionKey { .. } => "fix-encryption-key",
            RecoveryRequest::CreateEncryptionKey { .. } => "create-encryption-key",
        }
    }

    pub fn token(&self) -> Option<RecoveryToken> {
        match self {
            RecoveryRequest::FixEncryptionKey { token } => Some(*token),
            RecoveryRequest::CreateEncryptionKey { .. } => None,
        }
    }
}

/// Where a failed reset is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryRoute {
    FixEncryptionKey,
    CreateEncryptionKey,
    Alert,
}

impl RecoveryRoute {
    pub fn for_error(error: &SyncError) -> Self {
        match error {
            SyncError::EncryptFailure { missing_key: true } | SyncError::FileHasNewKey => {
                RecoveryRoute::FixEncryptionKey
            }
            SyncError::EncryptFailure { missing_key: false } => RecoveryRoute::CreateEncryptionKey,
            SyncError::Network(_) => RecoveryRoute::Alert,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    Idle,
    AwaitingRecovery { token: RecoveryToken, attempt: u32 },
    Retrying { attempt: u32 },
}

/// Tracks the pending fix-encryption-key flow, if any
#[derive(Debug)]
pub struct RecoveryMachine {
    state: RecoveryState,
    /// Maximum number of fix flows presented in one chain of resets
    max_attempts: u32,
}

impl RecoveryMachine {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: RecoveryState::Idle,
            max_attempts,
        }
    }

    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// Drop any pending flow because a fresh reset was requested.
    pub fn supersede(&mut self) -> Option<RecoveryToken> {
        let pending = match self.state {
            RecoveryState::AwaitingRecovery { token, .. } => Some(token),
            _ => None,
        };
        if let Some(token) = pending {
            debug!("Superseding pending recovery {}", token);
        }
        self.state = RecoveryState::Idle;
        pending
    }

    /// Wait for the user to finish a fix flow after reset attempt `attempt` failed.
    ///
    /// Returns `None` once `max_attempts` flows have been presented; the machine
    /// then returns to `Idle` and the caller alerts instead.
    pub fn await_recovery(&mut self, attempt: u32) -> Option<RecoveryToken> {
        if attempt > self.max_attempts {
            warn!(
                "Giving up on encryption key recovery after {} attempts",
                self.max_attempts
            );
            self.state = RecoveryState::Idle;
            return None;
        }

        let token = RecoveryToken::generate();
        self.state = RecoveryState::AwaitingRecovery { token, attempt };
        info!("Awaiting encryption key recovery {} (attempt {})", token, attempt);
        Some(token)
    }

    /// Redeem a token, returning the number of the reset attempt to run next.
    pub fn resume(&mut self, token: RecoveryToken) -> Result<u32, CoordinatorError> {
        match self.state {
            RecoveryState::AwaitingRecovery {
                token: pending,
                attempt,
            } if pending == token => {
                let next = attempt + 1;
                self.state = RecoveryState::Retrying { attempt: next };
                Ok(next)
            }
            _ => Err(CoordinatorError::StaleRecoveryToken(token.value())),
        }
    }

    /// The user abandoned the flow.
    pub fn cancel(&mut self, token: RecoveryToken) -> Result<(), CoordinatorError> {
        match self.state {
            RecoveryState::AwaitingRecovery { token: pending, .. } if pending == token => {
                info!("Encryption key recovery {} cancelled", token);
                self.state = RecoveryState::Idle;
                Ok(())
            }
            _ => Err(CoordinatorError::StaleRecoveryToken(token.value())),
        }
    }

    /// The reset chain ended without a pending fix flow.
    pub fn settle(&mut self) {
        self.state = RecoveryState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_has_exactly_one_route() {
        let cases = [
            (
                SyncError::EncryptFailure { missing_key: true },
                RecoveryRoute::FixEncryptionKey,
            ),
            (SyncError::FileHasNewKey, RecoveryRoute::FixEncryptionKey),
            (
                SyncError::EncryptFailure { missing_key: false },
                RecoveryRoute::CreateEncryptionKey,
            ),
            (SyncError::Network("network".to_string()), RecoveryRoute::Alert),
            (SyncError::Network("unauthorized".to_string()), RecoveryRoute::Alert),
        ];

        for (error, route) in cases {
            assert_eq!(RecoveryRoute::for_error(&error), route, "{:?}", error);
        }
    }

    #[test]
    fn resume_moves_to_retrying_with_next_attempt() {
        let mut machine = RecoveryMachine::new(3);
        let token = machine.await_recovery(1).unwrap();

        assert_eq!(machine.resume(token).unwrap(), 2);
        assert_eq!(machine.state(), RecoveryState::Retrying { attempt: 2 });
    }

    #[test]
    fn token_can_only_be_redeemed_once() {
        let mut machine = RecoveryMachine::new(3);
        let token = machine.await_recovery(1).unwrap();

        machine.resume(token).unwrap();
        assert!(matches!(
            machine.resume(token),
            Err(CoordinatorError::StaleRecoveryToken(_))
        ));
    }

    #[test]
    fn superseded_token_is_stale() {
        let mut machine = RecoveryMachine::new(3);
        let token = machine.await_recovery(1).unwrap();

        assert_eq!(machine.supersede(), Some(token));
        assert_eq!(machine.state(), RecoveryState::Idle);
        assert!(machine.cancel(token).is_err());
    }

    #[test]
    fn attempts_beyond_limit_are_refused() {
        let mut machine = RecoveryMachine::new(2);
        assert!(machine.await_recovery(2).is_some());
        assert!(machine.await_recovery(3).is_none());
        assert_eq!(machine.state(), RecoveryState::Idle);
    }

    #[test]
    fn flow_names_match_ui() {
        let fix = RecoveryRequest::FixEncryptionKey {
            token: RecoveryToken(7),
        };
        let create = RecoveryRequest::CreateEncryptionKey { recreate: true };

        assert_eq!(fix.flow_name(), "fix-encryption-key");
        assert_eq!(fix.token(), Some(RecoveryToken(7)));
        assert_eq!(create.flow_name(), "create-encryption-key");
        assert_eq!(create.token(), None);
    }
}
