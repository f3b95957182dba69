// crates/veilcraft-core/src/event.rs
//
// Notifications published for every coordinator state transition.
//
// External indexers replay this stream in order to rebuild coordinator
// state without reading storage directly.

use serde::{Deserialize, Serialize};

use crate::cipher::StateHash;
use crate::identity::{Address, BatchId, RequestId};

/// A single state transition on the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    /// Ownership moved. `previous` is `None` for the initial owner.
    OwnershipTransferred {
        previous: Option<Address>,
        new_owner: Address,
    },
    ProviderAdded {
        provider: Address,
    },
    ProviderRemoved {
        provider: Address,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },
    CooldownUpdated {
        previous: u64,
        current: u64,
    },
    BatchOpened {
        batch_id: BatchId,
    },
    BatchClosed {
        batch_id: BatchId,
    },
    /// A provider stored (or overwrote) its trait in a batch.
    TraitSubmitted {
        batch_id: BatchId,
        provider: Address,
        submission_count: u64,
    },
    /// A crafted ciphertext was committed and handed to the oracle.
    DecryptionRequested {
        request_id: RequestId,
        batch_id: BatchId,
        state_hash: StateHash,
    },
    /// The oracle's answer passed every check.
    DecryptionCompleted {
        request_id: RequestId,
        batch_id: BatchId,
        result: u64,
    },
}

impl CoordinatorEvent {
    /// Short event name, used as the log target field.
    pub fn name(&self) -> &'static str {
        match self {
            CoordinatorEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
            CoordinatorEvent::ProviderAdded { .. } => "ProviderAdded",
            CoordinatorEvent::ProviderRemoved { .. } => "ProviderRemoved",
            CoordinatorEvent::Paused { .. } => "Paused",
            CoordinatorEvent::Unpaused { .. } => "Unpaused",
            CoordinatorEvent::CooldownUpdated { .. } => "CooldownUpdated",
            CoordinatorEvent::BatchOpened { .. } => "BatchOpened",
            CoordinatorEvent::BatchClosed { .. } => "BatchClosed",
            CoordinatorEvent::TraitSubmitted { .. } => "TraitSubmitted",
            CoordinatorEvent::DecryptionRequested { .. } => "DecryptionRequested",
            CoordinatorEvent::DecryptionCompleted { .. } => "DecryptionCompleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let event = CoordinatorEvent::BatchOpened { batch_id: 2 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "batch_opened");
        assert_eq!(json["batch_id"], 2);
        assert_eq!(event.name(), "BatchOpened");
    }
}
