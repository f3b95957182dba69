// crates/veilcraft-daemon/src/calls.rs
//
// JSON-lines call log: one coordinator call per line, replayed in order.
//
//   {"op":"open_batch","caller":"owner"}
//   {"op":"submit_trait","caller":"alice","batch_id":2,"value":5,"weight":1,"at":1700000100}
//
// `caller` and address fields accept a 0x-prefixed hex address or a label.
// `at` is the substrate clock for the call; when omitted the previous call's
// clock is reused. Cleartext trait values are encrypted before submission.

use serde::Deserialize;

use veilcraft_coordinator::Coordinator;
use veilcraft_core::call::CallContext;
use veilcraft_core::error::CraftError;
use veilcraft_core::identity::{Address, BatchId, RequestId};
use veilcraft_oracle::LocalArithmetic;

/// One line of the call log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallLine {
    pub caller: String,
    #[serde(default)]
    pub at: Option<u64>,
    #[serde(flatten)]
    pub op: Op,
}

/// The coordinator operation a call invokes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    TransferOwnership { new_owner: String },
    AddProvider { provider: String },
    RemoveProvider { provider: String },
    Pause,
    Unpause,
    SetCooldown { seconds: u64 },
    OpenBatch,
    CloseBatch { batch_id: BatchId },
    SubmitTrait { batch_id: BatchId, value: u64, weight: u64 },
    RequestCraft { batch_id: BatchId },
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::TransferOwnership { .. } => "transfer_ownership",
            Op::AddProvider { .. } => "add_provider",
            Op::RemoveProvider { .. } => "remove_provider",
            Op::Pause => "pause",
            Op::Unpause => "unpause",
            Op::SetCooldown { .. } => "set_cooldown",
            Op::OpenBatch => "open_batch",
            Op::CloseBatch { .. } => "close_batch",
            Op::SubmitTrait { .. } => "submit_trait",
            Op::RequestCraft { .. } => "request_craft",
        }
    }
}

/// What a successful call produced, beyond its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    BatchOpened(BatchId),
    CraftRequested(RequestId),
}

/// Parse a call log. Blank lines and lines starting with `#` are skipped.
///
/// # Errors
///
/// Returns `CraftError::Serialization` naming the first line that does not parse.
pub fn parse_calls(contents: &str) -> Result<Vec<CallLine>, CraftError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|e| CraftError::Serialization(format!("line {}: {}", index + 1, e)))
        })
        .collect()
}

/// Apply one call to the coordinator at substrate time `now`.
///
/// # Errors
///
/// Returns whatever the coordinator rejected the call with, or
/// `CraftError::Serialization` for an unparseable address.
pub fn apply(
    coordinator: &mut Coordinator,
    arithmetic: &LocalArithmetic,
    call: &CallLine,
    now: u64,
) -> Result<Outcome, CraftError> {
    let ctx = CallContext::new(Address::parse_or_derive(&call.caller)?, now);

    match &call.op {
        Op::TransferOwnership { new_owner } => {
            coordinator.transfer_ownership(&ctx, Address::parse_or_derive(new_owner)?)?;
        }
        Op::AddProvider { provider } => {
            coordinator.add_provider(&ctx, Address::parse_or_derive(provider)?)?;
        }
        Op::RemoveProvider { provider } => {
            coordinator.remove_provider(&ctx, Address::parse_or_derive(provider)?)?;
        }
        Op::Pause => coordinator.pause(&ctx)?,
        Op::Unpause => coordinator.unpause(&ctx)?,
        Op::SetCooldown { seconds } => coordinator.set_cooldown_seconds(&ctx, *seconds)?,
        Op::OpenBatch => return Ok(Outcome::BatchOpened(coordinator.open_batch(&ctx)?)),
        Op::CloseBatch { batch_id } => coordinator.close_batch(&ctx, *batch_id)?,
        Op::SubmitTrait {
            batch_id,
            value,
            weight,
        } => {
            let value = arithmetic.encrypt(*value);
            let weight = arithmetic.encrypt(*weight);
            coordinator.submit_parent_trait(&ctx, *batch_id, value, weight)?;
        }
        Op::RequestCraft { batch_id } => {
            return Ok(Outcome::CraftRequested(
                coordinator.request_craft(&ctx, *batch_id)?,
            ));
        }
    }
    Ok(Outcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use veilcraft_coordinator::{Collaborators, CoordinatorConfig};
    use veilcraft_core::crypto::Keypair;
    use veilcraft_oracle::{LocalDecryptionOracle, SignatureProofVerifier};

    fn setup() -> (Coordinator, Arc<LocalArithmetic>, Arc<LocalDecryptionOracle>) {
        let fhe = Arc::new(LocalArithmetic::new());
        let oracle = Arc::new(LocalDecryptionOracle::new(Keypair::generate(), fhe.clone()));
        let verifier = Arc::new(SignatureProofVerifier::new(oracle.public_key_bytes()));
        let coordinator = Coordinator::new(
            &CoordinatorConfig::default(),
            Address::derive("owner"),
            Collaborators {
                arithmetic: fhe.clone(),
                oracle: oracle.clone(),
                verifier,
            },
            0,
        )
        .unwrap();
        (coordinator, fhe, oracle)
    }

    #[test]
    fn test_parse_all_ops() {
        let log = r#"
# admin
{"op":"add_provider","caller":"owner","provider":"alice"}
{"op":"remove_provider","caller":"owner","provider":"alice"}
{"op":"transfer_ownership","caller":"owner","new_owner":"studio"}
{"op":"pause","caller":"studio"}
{"op":"unpause","caller":"studio","at":10}
{"op":"set_cooldown","caller":"studio","seconds":30}
{"op":"open_batch","caller":"studio"}
{"op":"close_batch","caller":"studio","batch_id":1}
{"op":"submit_trait","caller":"alice","batch_id":2,"value":5,"weight":1}
{"op":"request_craft","caller":"alice","batch_id":2,"at":99}
"#;
        let calls = parse_calls(log).unwrap();
        assert_eq!(calls.len(), 10);
        assert_eq!(calls[0].op, Op::AddProvider { provider: "alice".to_string() });
        assert_eq!(calls[3].op, Op::Pause);
        assert_eq!(calls[4].at, Some(10));
        assert_eq!(
            calls[8].op,
            Op::SubmitTrait {
                batch_id: 2,
                value: 5,
                weight: 1
            }
        );
        assert_eq!(calls[9].op.name(), "request_craft");
        assert_eq!(calls[9].at, Some(99));
    }

    #[test]
    fn test_parse_reports_line_number() {
        let log = "{\"op\":\"pause\",\"caller\":\"owner\"}\n{\"op\":\"explode\",\"caller\":\"owner\"}\n";
        match parse_calls(log) {
            Err(CraftError::Serialization(msg)) => assert!(msg.starts_with("line 2:")),
            other => panic!("expected serialization error, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_round_of_calls() {
        let (mut coordinator, fhe, oracle) = setup();
        let calls = parse_calls(
            r#"{"op":"add_provider","caller":"owner","provider":"alice"}
{"op":"open_batch","caller":"owner"}
{"op":"submit_trait","caller":"alice","batch_id":2,"value":5,"weight":1}
{"op":"request_craft","caller":"alice","batch_id":2}"#,
        )
        .unwrap();

        let outcomes: Vec<Outcome> = calls
            .iter()
            .enumerate()
            .map(|(i, call)| apply(&mut coordinator, &fhe, call, 100 + i as u64).unwrap())
            .collect();

        assert_eq!(outcomes[0], Outcome::Done);
        assert_eq!(outcomes[1], Outcome::BatchOpened(2));
        assert_eq!(coordinator.submission_count(2), 1);
        let request_id = match outcomes[3] {
            Outcome::CraftRequested(id) => id,
            other => panic!("unexpected outcome {:?}", other),
        };
        let pending = oracle.take_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].request_id, request_id);
    }

    #[test]
    fn test_apply_surfaces_rejections() {
        let (mut coordinator, fhe, _oracle) = setup();
        let call: CallLine =
            serde_json::from_str(r#"{"op":"pause","caller":"mallory"}"#).unwrap();
        assert!(matches!(
            apply(&mut coordinator, &fhe, &call, 1),
            Err(CraftError::NotOwner)
        ));

        let bad_address: CallLine =
            serde_json::from_str(r#"{"op":"pause","caller":"0xnothex"}"#).unwrap();
        assert!(matches!(
            apply(&mut coordinator, &fhe, &bad_address, 1),
            Err(CraftError::Serialization(_))
        ));
    }
}
