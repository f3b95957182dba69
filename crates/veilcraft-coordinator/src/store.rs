// crates/veilcraft-coordinator/src/store.rs
//
// Encrypted trait storage: at most one record per (batch, provider).
//
// A resubmission overwrites the record but keeps the provider's position in
// the batch's contributor order, which is the order crafting folds over.

use std::collections::HashMap;

use veilcraft_core::cipher::{CipherHandle, EncryptedTrait};
use veilcraft_core::error::CraftError;
use veilcraft_core::identity::{Address, BatchId};
use veilcraft_core::traits::EncryptedArithmetic;

use crate::batch::BatchRegistry;

#[derive(Debug, Clone, Default)]
struct BatchTraits {
    /// Providers in order of their first submission.
    order: Vec<Address>,
    records: HashMap<Address, EncryptedTrait>,
}

/// All submitted traits, keyed by batch then provider.
#[derive(Debug, Clone, Default)]
pub struct EncryptedTraitStore {
    batches: HashMap<BatchId, BatchTraits>,
}

impl EncryptedTraitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `provider`'s trait for `batch_id` and bump the batch counter.
    ///
    /// Uninitialized handles are replaced by the backend's encryption of zero
    /// before storage. Returns the batch's new submission count.
    ///
    /// # Errors
    /// Returns `CraftError::BatchClosedOrNonExistent` unless the batch is open.
    pub fn record_submission(
        &mut self,
        batches: &mut BatchRegistry,
        arithmetic: &dyn EncryptedArithmetic,
        batch_id: BatchId,
        provider: Address,
        value: CipherHandle,
        weight: CipherHandle,
    ) -> Result<u64, CraftError> {
        batches.ensure_open(batch_id)?;

        let record = EncryptedTrait {
            value: normalize(arithmetic, value),
            weight: normalize(arithmetic, weight),
        };

        let count = batches.increment_submissions(batch_id)?;
        let entry = self.batches.entry(batch_id).or_default();
        if entry.records.insert(provider, record).is_none() {
            entry.order.push(provider);
        }
        Ok(count)
    }

    /// The trait `provider` last submitted to `batch_id`.
    pub fn get(&self, batch_id: BatchId, provider: &Address) -> Option<&EncryptedTrait> {
        self.batches
            .get(&batch_id)
            .and_then(|b| b.records.get(provider))
    }

    /// Providers that submitted to `batch_id`, in first-submission order.
    pub fn contributors(&self, batch_id: BatchId) -> &[Address] {
        self.batches
            .get(&batch_id)
            .map(|b| b.order.as_slice())
            .unwrap_or(&[])
    }

    /// Current records for `batch_id`, in first-submission order.
    pub fn traits_for(&self, batch_id: BatchId) -> Vec<(Address, EncryptedTrait)> {
        match self.batches.get(&batch_id) {
            Some(batch) => batch
                .order
                .iter()
                .filter_map(|addr| batch.records.get(addr).map(|t| (*addr, *t)))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Replace a handle the backend does not recognise with encrypted zero.
fn normalize(arithmetic: &dyn EncryptedArithmetic, handle: CipherHandle) -> CipherHandle {
    if arithmetic.is_initialized(&handle) {
        handle
    } else {
        arithmetic.trivial_zero()
    }
}
