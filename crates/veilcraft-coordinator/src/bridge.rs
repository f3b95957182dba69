// crates/veilcraft-coordinator/src/bridge.rs
//
// DecryptionOracleBridge: the two-phase commit/verify protocol.
//
// Phase 1 (request): hash the crafted ciphertext together with this
// coordinator's identity, hand the ciphertext to the oracle, and store the
// hash under the oracle's request id.
//
// Phase 2 (callback): re-craft the batch, recompute the hash, and accept the
// oracle's cleartext only if the hash is unchanged, the proof verifies, and
// the request was not already completed.
//
// Contexts are never removed; completion only flips `processed`.
//   Requested(processed = false) --> Completed(processed = true)

use std::collections::HashMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use veilcraft_core::call::CallContext;
use veilcraft_core::cipher::{decode_cleartext, CipherHandle, StateHash};
use veilcraft_core::error::CraftError;
use veilcraft_core::identity::{Address, BatchId, RequestId};
use veilcraft_core::traits::{DecryptionOracle, ProofVerifier};

/// Domain tag for state hashes.
pub const STATE_HASH_DOMAIN: &[u8] = b"veilcraft/state-hash/v1";

/// Everything the bridge remembers about one decryption request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecryptionContext {
    pub batch_id: BatchId,
    /// Commitment over the ciphertext sent for decryption.
    pub state_hash: StateHash,
    /// Set once, when the callback is accepted.
    pub processed: bool,
    pub requested_by: Address,
    pub requested_at: u64,
    /// Decrypted crafted value, present once processed.
    pub result: Option<u64>,
}

/// Canonical ordered ciphertext sequence for a crafted value.
pub fn canonical_handles(crafted: &CipherHandle) -> Vec<CipherHandle> {
    vec![*crafted]
}

/// Commit/verify state for all decryption requests of one coordinator.
#[derive(Debug, Clone)]
pub struct DecryptionOracleBridge {
    identity: Address,
    contexts: HashMap<RequestId, DecryptionContext>,
}

impl DecryptionOracleBridge {
    /// Create a bridge whose hashes are bound to `identity`.
    pub fn new(identity: Address) -> Self {
        Self {
            identity,
            contexts: HashMap::new(),
        }
    }

    pub fn identity(&self) -> Address {
        self.identity
    }

    /// SHA-256(domain || u32be(n) || handles || identity).
    pub fn state_hash(&self, handles: &[CipherHandle]) -> StateHash {
        let mut hasher = Sha256::new();
        hasher.update(STATE_HASH_DOMAIN);
        hasher.update((handles.len() as u32).to_be_bytes());
        for handle in handles {
            hasher.update(handle.as_bytes());
        }
        hasher.update(self.identity.as_bytes());
        let result = hasher.finalize();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        StateHash::from_bytes(output)
    }

    /// Phase 1: commit to `crafted` and submit it to the oracle.
    ///
    /// Nothing is stored if the oracle rejects the request.
    ///
    /// # Errors
    /// Propagates oracle failures; `CraftError::Oracle` if the oracle hands
    /// out a request id that is already in use.
    pub fn request(
        &mut self,
        oracle: &dyn DecryptionOracle,
        ctx: &CallContext,
        batch_id: BatchId,
        crafted: &CipherHandle,
    ) -> Result<(RequestId, StateHash), CraftError> {
        let handles = canonical_handles(crafted);
        let state_hash = self.state_hash(&handles);

        let request_id = oracle.request_decryption(&handles, &self.identity)?;
        if self.contexts.contains_key(&request_id) {
            return Err(CraftError::Oracle(format!(
                "Oracle reused request id {}",
                request_id
            )));
        }

        self.contexts.insert(
            request_id,
            DecryptionContext {
                batch_id,
                state_hash,
                processed: false,
                requested_by: ctx.caller,
                requested_at: ctx.timestamp,
                result: None,
            },
        );
        Ok((request_id, state_hash))
    }

    /// Look up a request that may still be completed.
    ///
    /// # Errors
    /// `UnknownRequest` if never issued, `ReplayDetected` if already processed.
    pub fn open_context(&self, request_id: &RequestId) -> Result<&DecryptionContext, CraftError> {
        let context = self
            .contexts
            .get(request_id)
            .ok_or(CraftError::UnknownRequest(*request_id))?;
        if context.processed {
            return Err(CraftError::ReplayDetected(*request_id));
        }
        Ok(context)
    }

    /// Phase 2: verify the oracle's answer against the re-crafted value and
    /// mark the request processed. Returns the decoded result.
    ///
    /// `recrafted` must come from running the craft engine on the context's
    /// batch right now. On any error the context is left untouched.
    pub fn complete(
        &mut self,
        verifier: &dyn ProofVerifier,
        request_id: &RequestId,
        recrafted: &CipherHandle,
        cleartext: &[u8],
        proof: &[u8],
    ) -> Result<u64, CraftError> {
        let committed = self.open_context(request_id)?.state_hash;

        let handles = canonical_handles(recrafted);
        let current = self.state_hash(&handles);
        if current != committed {
            return Err(CraftError::StateMismatch {
                request_id: *request_id,
                committed,
                current,
            });
        }

        match verifier.verify_decryption(request_id, &handles, cleartext, proof) {
            Ok(true) => {}
            Ok(false) => return Err(CraftError::InvalidProof(*request_id)),
            Err(e) => {
                tracing::warn!("Proof verification error for request {}: {}", request_id, e);
                return Err(CraftError::InvalidProof(*request_id));
            }
        }

        let result = decode_cleartext(cleartext)?;

        let context = self
            .contexts
            .get_mut(request_id)
            .ok_or(CraftError::UnknownRequest(*request_id))?;
        context.processed = true;
        context.result = Some(result);
        Ok(result)
    }

    pub fn context(&self, request_id: &RequestId) -> Option<&DecryptionContext> {
        self.contexts.get(request_id)
    }

    /// Requests still waiting for a callback, oldest first.
    pub fn pending(&self) -> Vec<(RequestId, &DecryptionContext)> {
        let mut pending: Vec<(RequestId, &DecryptionContext)> = self
            .contexts
            .iter()
            .filter(|(_, c)| !c.processed)
            .map(|(id, c)| (*id, c))
            .collect();
        pending.sort_by(|a, b| {
            a.1.requested_at
                .cmp(&b.1.requested_at)
                .then_with(|| a.0.cmp(&b.0))
        });
        pending
    }

    /// Total number of requests ever issued.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
