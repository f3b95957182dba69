// crates/veilcraft-core/src/error.rs

use thiserror::Error;

use crate::call::ActionKind;
use crate::cipher::StateHash;
use crate::identity::{BatchId, RequestId};

/// Protocol-wide error types for the Veilcraft coordinator.
///
/// Every error aborts the operation that raised it with no partial state
/// change. Each variant maps to a stable [`CraftError::code`] so callers can
/// show a specific message instead of a generic failure.
#[derive(Debug, Error)]
pub enum CraftError {
    /// Caller is not the current owner.
    #[error("Caller is not the owner")]
    NotOwner,

    /// Caller is not an active provider.
    #[error("Caller is not an authorized provider")]
    NotProvider,

    /// The coordinator is paused (also raised when pausing twice).
    #[error("Coordinator is paused")]
    Paused,

    /// Unpause was called while the coordinator is running.
    #[error("Coordinator is not paused")]
    NotPaused,

    /// The zero address cannot hold a role.
    #[error("Invalid address: the zero address cannot hold a role")]
    InvalidAddress,

    /// The same action was repeated inside the cooldown window.
    #[error("Cooldown active for {action}: retry at {retry_at}")]
    CooldownActive { action: ActionKind, retry_at: u64 },

    /// A cooldown of zero seconds was configured.
    #[error("Invalid cooldown: must be greater than zero")]
    InvalidCooldown,

    /// Submission target is closed or was never opened.
    #[error("Batch {0} is closed or does not exist")]
    BatchClosedOrNonExistent(BatchId),

    /// Attempted to close a batch that is not open.
    #[error("Batch {0} is not open")]
    InvalidBatchState(BatchId),

    /// Callback for a request id the coordinator never issued.
    #[error("Unknown decryption request {0}")]
    UnknownRequest(RequestId),

    /// Callback for a request that was already completed.
    #[error("Decryption request {0} was already processed")]
    ReplayDetected(RequestId),

    /// Batch data changed between the craft request and the callback.
    #[error("State mismatch for request {request_id}: committed {committed}, current {current}")]
    StateMismatch {
        request_id: RequestId,
        committed: StateHash,
        current: StateHash,
    },

    /// The oracle's cleartext/proof pair failed verification.
    #[error("Invalid decryption proof for request {0}")]
    InvalidProof(RequestId),

    /// The oracle returned a cleartext of unexpected width.
    #[error("Malformed cleartext: expected 8 bytes, got {0}")]
    MalformedCleartext(usize),

    /// Encrypted arithmetic backend failure.
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    /// Decryption oracle failure.
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// Cryptographic error (key handling, signing, verification).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse grouping of errors, mirroring how a UI would route them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authorization,
    Availability,
    Admission,
    BatchState,
    ProtocolIntegrity,
    Collaborator,
}

impl CraftError {
    /// Stable machine-readable identifier for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            CraftError::NotOwner => "not_owner",
            CraftError::NotProvider => "not_provider",
            CraftError::Paused => "paused",
            CraftError::NotPaused => "not_paused",
            CraftError::InvalidAddress => "invalid_address",
            CraftError::CooldownActive { .. } => "cooldown_active",
            CraftError::InvalidCooldown => "invalid_cooldown",
            CraftError::BatchClosedOrNonExistent(_) => "batch_closed_or_nonexistent",
            CraftError::InvalidBatchState(_) => "invalid_batch_state",
            CraftError::UnknownRequest(_) => "unknown_request",
            CraftError::ReplayDetected(_) => "replay_detected",
            CraftError::StateMismatch { .. } => "state_mismatch",
            CraftError::InvalidProof(_) => "invalid_proof",
            CraftError::MalformedCleartext(_) => "malformed_cleartext",
            CraftError::Arithmetic(_) => "arithmetic",
            CraftError::Oracle(_) => "oracle",
            CraftError::Crypto(_) => "crypto",
            CraftError::Serialization(_) => "serialization",
        }
    }

    /// Which family of failures this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CraftError::NotOwner | CraftError::NotProvider | CraftError::InvalidAddress => {
                ErrorCategory::Authorization
            }
            CraftError::Paused | CraftError::NotPaused => ErrorCategory::Availability,
            CraftError::CooldownActive { .. } | CraftError::InvalidCooldown => {
                ErrorCategory::Admission
            }
            CraftError::BatchClosedOrNonExistent(_) | CraftError::InvalidBatchState(_) => {
                ErrorCategory::BatchState
            }
            CraftError::UnknownRequest(_)
            | CraftError::ReplayDetected(_)
            | CraftError::StateMismatch { .. }
            | CraftError::InvalidProof(_)
            | CraftError::MalformedCleartext(_) => ErrorCategory::ProtocolIntegrity,
            CraftError::Arithmetic(_)
            | CraftError::Oracle(_)
            | CraftError::Crypto(_)
            | CraftError::Serialization(_) => ErrorCategory::Collaborator,
        }
    }
}

impl From<serde_json::Error> for CraftError {
    fn from(e: serde_json::Error) -> Self {
        CraftError::Serialization(e.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for CraftError {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        CraftError::Crypto(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_per_kind() {
        let id = RequestId::new_v7();
        let errors = vec![
            CraftError::NotOwner,
            CraftError::NotProvider,
            CraftError::Paused,
            CraftError::CooldownActive {
                action: ActionKind::Submission,
                retry_at: 10,
            },
            CraftError::InvalidCooldown,
            CraftError::BatchClosedOrNonExistent(3),
            CraftError::InvalidBatchState(3),
            CraftError::UnknownRequest(id),
            CraftError::ReplayDetected(id),
            CraftError::InvalidProof(id),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_categories() {
        assert_eq!(CraftError::NotOwner.category(), ErrorCategory::Authorization);
        assert_eq!(CraftError::Paused.category(), ErrorCategory::Availability);
        assert_eq!(CraftError::InvalidCooldown.category(), ErrorCategory::Admission);
        assert_eq!(
            CraftError::InvalidBatchState(1).category(),
            ErrorCategory::BatchState
        );
        assert_eq!(
            CraftError::ReplayDetected(RequestId::new_v7()).category(),
            ErrorCategory::ProtocolIntegrity
        );
        assert_eq!(
            CraftError::Oracle("down".to_string()).category(),
            ErrorCategory::Collaborator
        );
    }

    #[test]
    fn test_cooldown_message_names_action() {
        let err = CraftError::CooldownActive {
            action: ActionKind::CraftRequest,
            retry_at: 160,
        };
        assert_eq!(err.to_string(), "Cooldown active for craft request: retry at 160");
    }
}
