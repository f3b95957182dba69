// crates/veilcraft-coordinator/src/craft.rs
//
// CraftEngine: derives one encrypted "crafted" value from a batch.
//
// Crafting is a pure function of the batch id and the trait store contents.
// The decryption bridge re-runs it at callback time and compares hashes, so
// policies must not read clocks, randomness, or any state outside their
// arguments. Folding starts from the backend's encryption of zero, which is
// also the result for a batch without submissions.

use veilcraft_core::cipher::{CipherHandle, EncryptedTrait};
use veilcraft_core::error::CraftError;
use veilcraft_core::identity::{Address, BatchId};
use veilcraft_core::traits::EncryptedArithmetic;

use crate::config::CraftPolicyKind;
use crate::store::EncryptedTraitStore;

/// A deterministic aggregation over a batch's traits.
pub trait CraftPolicy: Send + Sync {
    /// Policy name, for logs.
    fn name(&self) -> &'static str;

    /// Combine `traits` (in contributor order) into one ciphertext.
    fn combine(
        &self,
        traits: &[(Address, EncryptedTrait)],
        arithmetic: &dyn EncryptedArithmetic,
    ) -> Result<CipherHandle, CraftError>;
}

/// Σ value · weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedSum;

impl CraftPolicy for WeightedSum {
    fn name(&self) -> &'static str {
        "weighted_sum"
    }

    fn combine(
        &self,
        traits: &[(Address, EncryptedTrait)],
        arithmetic: &dyn EncryptedArithmetic,
    ) -> Result<CipherHandle, CraftError> {
        let mut acc = arithmetic.trivial_zero();
        for (_, record) in traits {
            let weighted = arithmetic.mul(&record.value, &record.weight)?;
            acc = arithmetic.add(&acc, &weighted)?;
        }
        Ok(acc)
    }
}

/// Σ value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueSum;

impl CraftPolicy for ValueSum {
    fn name(&self) -> &'static str {
        "value_sum"
    }

    fn combine(
        &self,
        traits: &[(Address, EncryptedTrait)],
        arithmetic: &dyn EncryptedArithmetic,
    ) -> Result<CipherHandle, CraftError> {
        traits
            .iter()
            .try_fold(arithmetic.trivial_zero(), |acc, (_, record)| {
                arithmetic.add(&acc, &record.value)
            })
    }
}

/// Applies a [`CraftPolicy`] to the trait store.
pub struct CraftEngine {
    policy: Box<dyn CraftPolicy>,
}

impl CraftEngine {
    pub fn new(policy: Box<dyn CraftPolicy>) -> Self {
        Self { policy }
    }

    /// Engine for one of the built-in policies.
    pub fn from_kind(kind: CraftPolicyKind) -> Self {
        match kind {
            CraftPolicyKind::WeightedSum => Self::new(Box::new(WeightedSum)),
            CraftPolicyKind::ValueSum => Self::new(Box::new(ValueSum)),
        }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Craft `batch_id` from the store's current contents.
    pub fn craft(
        &self,
        batch_id: BatchId,
        store: &EncryptedTraitStore,
        arithmetic: &dyn EncryptedArithmetic,
    ) -> Result<CipherHandle, CraftError> {
        let traits = store.traits_for(batch_id);
        self.policy.combine(&traits, arithmetic)
    }
}

impl std::fmt::Debug for CraftEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CraftEngine")
            .field("policy", &self.policy.name())
            .finish()
    }
}
