// crates/veilcraft-coordinator/src/batch.rs
//
// Lifecycle of numbered batches.
//
// Ids are sequential starting at 1; batch 1 exists and is open from
// construction. A batch goes Open -> Closed exactly once and is never
// reopened; opening always allocates the next id. Older batches may still be
// open when a newer one opens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use veilcraft_core::error::CraftError;
use veilcraft_core::identity::BatchId;

/// Public view of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInfo {
    pub id: BatchId,
    pub is_open: bool,
    /// Accepted submissions, counting overwrites.
    pub submission_count: u64,
}

/// Registry of every batch ever created.
#[derive(Debug, Clone)]
pub struct BatchRegistry {
    current: BatchId,
    batches: BTreeMap<BatchId, BatchInfo>,
}

impl BatchRegistry {
    /// Create a registry holding batch 1, open and empty.
    pub fn new() -> Self {
        let mut batches = BTreeMap::new();
        batches.insert(
            1,
            BatchInfo {
                id: 1,
                is_open: true,
                submission_count: 0,
            },
        );
        Self {
            current: 1,
            batches,
        }
    }

    /// Highest batch id allocated so far.
    pub fn current_batch_id(&self) -> BatchId {
        self.current
    }

    pub fn get(&self, batch_id: BatchId) -> Option<&BatchInfo> {
        self.batches.get(&batch_id)
    }

    pub fn exists(&self, batch_id: BatchId) -> bool {
        self.batches.contains_key(&batch_id)
    }

    pub fn is_open(&self, batch_id: BatchId) -> bool {
        self.get(batch_id).map(|b| b.is_open).unwrap_or(false)
    }

    /// Submission count for `batch_id`; zero for unknown ids.
    pub fn submission_count(&self, batch_id: BatchId) -> u64 {
        self.get(batch_id).map(|b| b.submission_count).unwrap_or(0)
    }

    /// Ids of batches currently open, ascending.
    pub fn open_batches(&self) -> Vec<BatchId> {
        self.batches
            .values()
            .filter(|b| b.is_open)
            .map(|b| b.id)
            .collect()
    }

    /// # Errors
    /// Returns `CraftError::BatchClosedOrNonExistent` unless `batch_id` is open.
    pub fn ensure_open(&self, batch_id: BatchId) -> Result<(), CraftError> {
        if !self.is_open(batch_id) {
            return Err(CraftError::BatchClosedOrNonExistent(batch_id));
        }
        Ok(())
    }

    /// Allocate the next id and open it with a zero submission count.
    pub fn open_batch(&mut self) -> BatchId {
        self.current += 1;
        let id = self.current;
        self.batches.insert(
            id,
            BatchInfo {
                id,
                is_open: true,
                submission_count: 0,
            },
        );
        id
    }

    /// # Errors
    /// Returns `CraftError::InvalidBatchState` if the batch is not open.
    pub fn close_batch(&mut self, batch_id: BatchId) -> Result<(), CraftError> {
        match self.batches.get_mut(&batch_id) {
            Some(batch) if batch.is_open => {
                batch.is_open = false;
                Ok(())
            }
            _ => Err(CraftError::InvalidBatchState(batch_id)),
        }
    }

    /// Bump the submission counter of an open batch. Returns the new count.
    pub(crate) fn increment_submissions(&mut self, batch_id: BatchId) -> Result<u64, CraftError> {
        match self.batches.get_mut(&batch_id) {
            Some(batch) if batch.is_open => {
                batch.submission_count += 1;
                Ok(batch.submission_count)
            }
            _ => Err(CraftError::BatchClosedOrNonExistent(batch_id)),
        }
    }
}

impl Default for BatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}
