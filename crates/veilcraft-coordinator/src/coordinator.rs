// crates/veilcraft-coordinator/src/coordinator.rs
//
// Coordinator: the single owner of all batch-crafting state.
//
// Every caller-facing operation takes a `CallContext` (sender + substrate
// time), performs all of its checks before its first write, and emits one
// event on success. A failed call therefore leaves no trace in state or in
// the event log.

use std::sync::Arc;

use veilcraft_core::call::{ActionKind, CallContext};
use veilcraft_core::cipher::{CipherHandle, EncryptedTrait};
use veilcraft_core::error::CraftError;
use veilcraft_core::event::CoordinatorEvent;
use veilcraft_core::identity::{Address, BatchId, RequestId};
use veilcraft_core::traits::{DecryptionOracle, EncryptedArithmetic, ProofVerifier};

use crate::access::AccessControl;
use crate::batch::{BatchInfo, BatchRegistry};
use crate::bridge::{DecryptionContext, DecryptionOracleBridge};
use crate::config::CoordinatorConfig;
use crate::craft::{CraftEngine, CraftPolicy};
use crate::events::{EventLog, EventRecord};
use crate::rate_limit::RateLimiter;
use crate::store::EncryptedTraitStore;

/// External services the coordinator calls into.
#[derive(Clone)]
pub struct Collaborators {
    pub arithmetic: Arc<dyn EncryptedArithmetic>,
    pub oracle: Arc<dyn DecryptionOracle>,
    pub verifier: Arc<dyn ProofVerifier>,
}

/// The Confidential Batch Crafting Coordinator.
pub struct Coordinator {
    identity: Address,
    access: AccessControl,
    limiter: RateLimiter,
    batches: BatchRegistry,
    store: EncryptedTraitStore,
    engine: CraftEngine,
    bridge: DecryptionOracleBridge,
    events: EventLog,
    collaborators: Collaborators,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("identity", &self.identity)
            .field("owner", &self.access.owner())
            .field("paused", &self.access.is_paused())
            .field("current_batch", &self.batches.current_batch_id())
            .field("policy", &self.engine.policy_name())
            .field("events", &self.events.len())
            .finish()
    }
}

impl Coordinator {
    /// Initialise a coordinator owned by `owner`.
    ///
    /// Batch 1 starts open. The genesis events (initial ownership and the
    /// opening of batch 1) are stamped with `genesis_time`.
    ///
    /// # Errors
    /// `InvalidCooldown` for a zero cooldown, `InvalidAddress` for a zero owner.
    pub fn new(
        config: &CoordinatorConfig,
        owner: Address,
        collaborators: Collaborators,
        genesis_time: u64,
    ) -> Result<Self, CraftError> {
        config.validate()?;
        if owner.is_zero() {
            return Err(CraftError::InvalidAddress);
        }

        let identity = config.identity();
        let mut coordinator = Self {
            identity,
            access: AccessControl::new(owner),
            limiter: RateLimiter::new(config.cooldown_seconds)?,
            batches: BatchRegistry::new(),
            store: EncryptedTraitStore::new(),
            engine: CraftEngine::from_kind(config.craft_policy),
            bridge: DecryptionOracleBridge::new(identity),
            events: EventLog::new(),
            collaborators,
        };

        tracing::info!(
            "Coordinator {} initialised (owner={}, cooldown={}s, policy={})",
            identity,
            owner,
            config.cooldown_seconds,
            coordinator.engine.policy_name()
        );

        coordinator.events.emit(
            genesis_time,
            CoordinatorEvent::OwnershipTransferred {
                previous: None,
                new_owner: owner,
            },
        );
        coordinator
            .events
            .emit(genesis_time, CoordinatorEvent::BatchOpened { batch_id: 1 });
        Ok(coordinator)
    }

    /// Replace the craft policy with a custom one.
    pub fn with_policy(mut self, policy: Box<dyn CraftPolicy>) -> Self {
        self.engine = CraftEngine::new(policy);
        self
    }

    // -----------------------------------------------------------------------
    // Administration (owner only)
    // -----------------------------------------------------------------------

    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
    ) -> Result<(), CraftError> {
        let previous = self.access.transfer_ownership(&ctx.caller, new_owner)?;
        self.events.emit(
            ctx.timestamp,
            CoordinatorEvent::OwnershipTransferred {
                previous: Some(previous),
                new_owner,
            },
        );
        Ok(())
    }

    pub fn add_provider(&mut self, ctx: &CallContext, provider: Address) -> Result<(), CraftError> {
        self.access.add_provider(&ctx.caller, provider)?;
        self.events
            .emit(ctx.timestamp, CoordinatorEvent::ProviderAdded { provider });
        Ok(())
    }

    /// Revoke a provider. Its past submissions stay in the trait store.
    pub fn remove_provider(
        &mut self,
        ctx: &CallContext,
        provider: Address,
    ) -> Result<(), CraftError> {
        self.access.remove_provider(&ctx.caller, provider)?;
        self.events
            .emit(ctx.timestamp, CoordinatorEvent::ProviderRemoved { provider });
        Ok(())
    }

    pub fn pause(&mut self, ctx: &CallContext) -> Result<(), CraftError> {
        self.access.pause(&ctx.caller)?;
        self.events
            .emit(ctx.timestamp, CoordinatorEvent::Paused { by: ctx.caller });
        Ok(())
    }

    pub fn unpause(&mut self, ctx: &CallContext) -> Result<(), CraftError> {
        self.access.unpause(&ctx.caller)?;
        self.events
            .emit(ctx.timestamp, CoordinatorEvent::Unpaused { by: ctx.caller });
        Ok(())
    }

    /// # Errors
    /// `NotOwner`, or `InvalidCooldown` for zero.
    pub fn set_cooldown_seconds(
        &mut self,
        ctx: &CallContext,
        cooldown_seconds: u64,
    ) -> Result<(), CraftError> {
        self.access.ensure_owner(&ctx.caller)?;
        let previous = self.limiter.set_cooldown(cooldown_seconds)?;
        self.events.emit(
            ctx.timestamp,
            CoordinatorEvent::CooldownUpdated {
                previous,
                current: cooldown_seconds,
            },
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Batch lifecycle (owner only, not while paused)
    // -----------------------------------------------------------------------

    /// Open the next batch. Returns its id.
    pub fn open_batch(&mut self, ctx: &CallContext) -> Result<BatchId, CraftError> {
        self.access.ensure_owner(&ctx.caller)?;
        self.access.ensure_not_paused()?;
        let batch_id = self.batches.open_batch();
        self.events
            .emit(ctx.timestamp, CoordinatorEvent::BatchOpened { batch_id });
        Ok(batch_id)
    }

    /// # Errors
    /// `NotOwner`, `Paused`, or `InvalidBatchState` if the batch is not open.
    pub fn close_batch(&mut self, ctx: &CallContext, batch_id: BatchId) -> Result<(), CraftError> {
        self.access.ensure_owner(&ctx.caller)?;
        self.access.ensure_not_paused()?;
        self.batches.close_batch(batch_id)?;
        self.events
            .emit(ctx.timestamp, CoordinatorEvent::BatchClosed { batch_id });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Provider actions
    // -----------------------------------------------------------------------

    /// Store the caller's encrypted trait in an open batch.
    ///
    /// Checks run in this order: batch open, not paused, caller is a
    /// provider, submission cooldown elapsed.
    pub fn submit_parent_trait(
        &mut self,
        ctx: &CallContext,
        batch_id: BatchId,
        value: CipherHandle,
        weight: CipherHandle,
    ) -> Result<(), CraftError> {
        self.batches.ensure_open(batch_id)?;
        self.access.ensure_not_paused()?;
        self.access.ensure_provider(&ctx.caller)?;
        self.limiter
            .check(&ctx.caller, ActionKind::Submission, ctx.timestamp)?;

        let submission_count = self.store.record_submission(
            &mut self.batches,
            self.collaborators.arithmetic.as_ref(),
            batch_id,
            ctx.caller,
            value,
            weight,
        )?;
        self.limiter
            .record(ctx.caller, ActionKind::Submission, ctx.timestamp);

        self.events.emit(
            ctx.timestamp,
            CoordinatorEvent::TraitSubmitted {
                batch_id,
                provider: ctx.caller,
                submission_count,
            },
        );
        Ok(())
    }

    /// Phase 1 of the decryption protocol: craft `batch_id`, commit to the
    /// result, and send it to the oracle. Returns the oracle's request id.
    ///
    /// Closed batches may be crafted; ids that were never allocated may not.
    pub fn request_craft(
        &mut self,
        ctx: &CallContext,
        batch_id: BatchId,
    ) -> Result<RequestId, CraftError> {
        self.access.ensure_not_paused()?;
        self.access.ensure_provider(&ctx.caller)?;
        if !self.batches.exists(batch_id) {
            return Err(CraftError::BatchClosedOrNonExistent(batch_id));
        }
        self.limiter
            .check(&ctx.caller, ActionKind::CraftRequest, ctx.timestamp)?;

        let crafted = self.engine.craft(
            batch_id,
            &self.store,
            self.collaborators.arithmetic.as_ref(),
        )?;
        let (request_id, state_hash) = self.bridge.request(
            self.collaborators.oracle.as_ref(),
            ctx,
            batch_id,
            &crafted,
        )?;
        self.limiter
            .record(ctx.caller, ActionKind::CraftRequest, ctx.timestamp);

        self.events.emit(
            ctx.timestamp,
            CoordinatorEvent::DecryptionRequested {
                request_id,
                batch_id,
                state_hash,
            },
        );
        Ok(request_id)
    }

    /// Phase 2 of the decryption protocol: the oracle's callback.
    ///
    /// Any caller is accepted; trust comes from the state hash and the proof.
    /// Returns the decrypted crafted value.
    pub fn on_decryption_result(
        &mut self,
        ctx: &CallContext,
        request_id: RequestId,
        cleartext: &[u8],
        proof: &[u8],
    ) -> Result<u64, CraftError> {
        let batch_id = self.bridge.open_context(&request_id)?.batch_id;
        let recrafted = self.engine.craft(
            batch_id,
            &self.store,
            self.collaborators.arithmetic.as_ref(),
        )?;

        let result = self
            .bridge
            .complete(
                self.collaborators.verifier.as_ref(),
                &request_id,
                &recrafted,
                cleartext,
                proof,
            )
            .map_err(|e| {
                tracing::warn!(
                    "Rejected decryption callback {} for batch {}: {}",
                    request_id,
                    batch_id,
                    e
                );
                e
            })?;

        self.events.emit(
            ctx.timestamp,
            CoordinatorEvent::DecryptionCompleted {
                request_id,
                batch_id,
                result,
            },
        );
        Ok(result)
    }

    /// Craft `batch_id` from current state without committing to anything.
    pub fn craft(&self, batch_id: BatchId) -> Result<CipherHandle, CraftError> {
        self.engine.craft(
            batch_id,
            &self.store,
            self.collaborators.arithmetic.as_ref(),
        )
    }

    // -----------------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------------

    /// This instance's identity, salted into every state hash.
    pub fn identity(&self) -> Address {
        self.identity
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn is_provider(&self, addr: &Address) -> bool {
        self.access.is_provider(addr)
    }

    pub fn active_providers(&self) -> Vec<Address> {
        self.access.active_providers()
    }

    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    pub fn cooldown_seconds(&self) -> u64 {
        self.limiter.cooldown_seconds()
    }

    pub fn last_action(&self, addr: &Address, kind: ActionKind) -> Option<u64> {
        self.limiter.last_action(addr, kind)
    }

    pub fn current_batch_id(&self) -> BatchId {
        self.batches.current_batch_id()
    }

    pub fn is_batch_open(&self, batch_id: BatchId) -> bool {
        self.batches.is_open(batch_id)
    }

    pub fn submission_count(&self, batch_id: BatchId) -> u64 {
        self.batches.submission_count(batch_id)
    }

    pub fn batch(&self, batch_id: BatchId) -> Option<&BatchInfo> {
        self.batches.get(batch_id)
    }

    pub fn open_batches(&self) -> Vec<BatchId> {
        self.batches.open_batches()
    }

    pub fn trait_record(&self, batch_id: BatchId, provider: &Address) -> Option<&EncryptedTrait> {
        self.store.get(batch_id, provider)
    }

    /// Providers that contributed to `batch_id`, in crafting order.
    pub fn contributors(&self, batch_id: BatchId) -> &[Address] {
        self.store.contributors(batch_id)
    }

    pub fn decryption_context(&self, request_id: &RequestId) -> Option<&DecryptionContext> {
        self.bridge.context(request_id)
    }

    /// Requests the oracle has not answered yet, oldest first.
    pub fn pending_requests(&self) -> Vec<(RequestId, &DecryptionContext)> {
        self.bridge.pending()
    }

    pub fn craft_policy(&self) -> &'static str {
        self.engine.policy_name()
    }

    pub fn events(&self) -> &[EventRecord] {
        self.events.events()
    }

    pub fn events_since(&self, sequence: u64) -> &[EventRecord] {
        self.events.since(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veilcraft_core::crypto::Keypair;
    use veilcraft_oracle::{LocalArithmetic, LocalDecryptionOracle, SignatureProofVerifier};

    fn owner() -> Address {
        Address::derive("owner")
    }

    fn make_coordinator() -> Coordinator {
        let fhe = Arc::new(LocalArithmetic::new());
        let oracle = LocalDecryptionOracle::new(Keypair::generate(), fhe.clone());
        let verifier = SignatureProofVerifier::new(oracle.public_key_bytes());
        Coordinator::new(
            &CoordinatorConfig::default(),
            owner(),
            Collaborators {
                arithmetic: fhe,
                oracle: Arc::new(oracle),
                verifier: Arc::new(verifier),
            },
            0,
        )
        .unwrap()
    }

    fn as_owner(t: u64) -> CallContext {
        CallContext::new(owner(), t)
    }

    #[test]
    fn test_genesis_state_and_events() {
        let c = make_coordinator();
        assert_eq!(c.owner(), owner());
        assert_eq!(c.current_batch_id(), 1);
        assert!(c.is_batch_open(1));
        assert!(!c.is_paused());
        assert_eq!(c.cooldown_seconds(), 60);
        assert_eq!(c.craft_policy(), "weighted_sum");

        let events: Vec<&CoordinatorEvent> = c.events().iter().map(|r| &r.event).collect();
        assert_eq!(
            events,
            vec![
                &CoordinatorEvent::OwnershipTransferred {
                    previous: None,
                    new_owner: owner()
                },
                &CoordinatorEvent::BatchOpened { batch_id: 1 },
            ]
        );
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let fhe = Arc::new(LocalArithmetic::new());
        let oracle = Arc::new(LocalDecryptionOracle::new(Keypair::generate(), fhe.clone()));
        let verifier = Arc::new(SignatureProofVerifier::new(oracle.public_key_bytes()));
        let collaborators = Collaborators {
            arithmetic: fhe,
            oracle,
            verifier,
        };

        let zero_cooldown = CoordinatorConfig {
            cooldown_seconds: 0,
            ..CoordinatorConfig::default()
        };
        assert!(matches!(
            Coordinator::new(&zero_cooldown, owner(), collaborators.clone(), 0),
            Err(CraftError::InvalidCooldown)
        ));
        assert!(matches!(
            Coordinator::new(&CoordinatorConfig::default(), Address::ZERO, collaborators, 0),
            Err(CraftError::InvalidAddress)
        ));
    }

    #[test]
    fn test_admin_operations_emit_events() {
        let mut c = make_coordinator();
        let alice = Address::derive("alice");
        let new_owner = Address::derive("new-owner");

        c.add_provider(&as_owner(1), alice).unwrap();
        c.set_cooldown_seconds(&as_owner(2), 30).unwrap();
        c.pause(&as_owner(3)).unwrap();
        c.unpause(&as_owner(4)).unwrap();
        c.remove_provider(&as_owner(5), alice).unwrap();
        c.transfer_ownership(&as_owner(6), new_owner).unwrap();

        let tail: Vec<CoordinatorEvent> = c.events_since(2).iter().map(|r| r.event.clone()).collect();
        assert_eq!(
            tail,
            vec![
                CoordinatorEvent::ProviderAdded { provider: alice },
                CoordinatorEvent::CooldownUpdated {
                    previous: 60,
                    current: 30
                },
                CoordinatorEvent::Paused { by: owner() },
                CoordinatorEvent::Unpaused { by: owner() },
                CoordinatorEvent::ProviderRemoved { provider: alice },
                CoordinatorEvent::OwnershipTransferred {
                    previous: Some(owner()),
                    new_owner
                },
            ]
        );
        assert_eq!(c.cooldown_seconds(), 30);
        assert_eq!(c.owner(), new_owner);
        assert!(!c.is_provider(&alice));
    }

    #[test]
    fn test_failed_operations_emit_nothing() {
        let mut c = make_coordinator();
        let stranger = CallContext::new(Address::derive("stranger"), 1);
        let before = c.events().len();

        assert!(matches!(c.open_batch(&stranger), Err(CraftError::NotOwner)));
        assert!(matches!(
            c.set_cooldown_seconds(&stranger, 10),
            Err(CraftError::NotOwner)
        ));
        assert!(matches!(
            c.set_cooldown_seconds(&as_owner(1), 0),
            Err(CraftError::InvalidCooldown)
        ));
        assert!(matches!(c.close_batch(&as_owner(1), 9), Err(CraftError::InvalidBatchState(9))));
        assert!(matches!(c.unpause(&as_owner(1)), Err(CraftError::NotPaused)));

        assert_eq!(c.events().len(), before);
        assert_eq!(c.cooldown_seconds(), 60);
        assert_eq!(c.current_batch_id(), 1);
    }

    #[test]
    fn test_batch_lifecycle_blocked_while_paused() {
        let mut c = make_coordinator();
        c.pause(&as_owner(1)).unwrap();
        assert!(matches!(c.open_batch(&as_owner(2)), Err(CraftError::Paused)));
        assert!(matches!(c.close_batch(&as_owner(2), 1), Err(CraftError::Paused)));
        assert!(c.is_batch_open(1));

        c.unpause(&as_owner(3)).unwrap();
        assert_eq!(c.open_batch(&as_owner(4)).unwrap(), 2);
        c.close_batch(&as_owner(5), 1).unwrap();
        assert_eq!(c.open_batches(), vec![2]);
    }

    #[test]
    fn test_craft_preview_of_empty_batch() {
        let c = make_coordinator();
        let first = c.craft(1).unwrap();
        assert_eq!(first, c.craft(1).unwrap());
        assert_eq!(c.batch(1).unwrap().submission_count, 0);
    }
}
