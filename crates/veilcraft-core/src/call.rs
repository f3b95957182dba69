// crates/veilcraft-core/src/call.rs
//
// The context every caller-facing operation runs in: who is calling and
// at what time, as reported by the ordering substrate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::Address;

/// Sender and clock of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The account invoking the operation.
    pub caller: Address,
    /// Substrate time of the call, in unix seconds.
    pub timestamp: u64,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }
}

/// The two rate-limited actions. Each has its own per-address timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Submitting an encrypted trait into a batch.
    Submission,
    /// Asking for a batch to be crafted and decrypted.
    CraftRequest,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Submission => write!(f, "submission"),
            ActionKind::CraftRequest => write!(f, "craft request"),
        }
    }
}
