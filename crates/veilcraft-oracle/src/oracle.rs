// crates/veilcraft-oracle/src/oracle.rs
//
// LocalDecryptionOracle: implements the DecryptionOracle trait from veilcraft-core.
//
// Requests are answered out of band. With a channel attached, every accepted
// request is pushed to a worker task that later calls back into the
// coordinator. Without one, requests accumulate in a queue that tests drain
// with `take_pending`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use veilcraft_core::cipher::{encode_cleartext, CipherHandle};
use veilcraft_core::crypto::{decryption_digest, Keypair};
use veilcraft_core::error::CraftError;
use veilcraft_core::identity::{Address, RequestId};
use veilcraft_core::traits::DecryptionOracle;

use crate::arithmetic::LocalArithmetic;

/// A request the oracle accepted but has not answered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDecryption {
    pub request_id: RequestId,
    pub handles: Vec<CipherHandle>,
    /// Coordinator instance the answer is addressed to.
    pub reply_to: Address,
}

/// The oracle's answer: cleartext bytes plus a signature over them.
#[derive(Debug, Clone, Serialize)]
pub struct DecryptionResponse {
    pub request_id: RequestId,
    pub cleartext: Vec<u8>,
    pub proof: Vec<u8>,
}

/// A single-key decryption oracle backed by [`LocalArithmetic`].
pub struct LocalDecryptionOracle {
    keypair: Keypair,
    arithmetic: Arc<LocalArithmetic>,
    queue: Mutex<VecDeque<PendingDecryption>>,
    outbox: Option<UnboundedSender<PendingDecryption>>,
}

impl LocalDecryptionOracle {
    /// Create an oracle that signs with `keypair` and decrypts via `arithmetic`.
    pub fn new(keypair: Keypair, arithmetic: Arc<LocalArithmetic>) -> Self {
        Self {
            keypair,
            arithmetic,
            queue: Mutex::new(VecDeque::new()),
            outbox: None,
        }
    }

    /// Deliver accepted requests to a worker channel instead of the queue.
    pub fn with_channel(mut self, outbox: UnboundedSender<PendingDecryption>) -> Self {
        self.outbox = Some(outbox);
        self
    }

    /// Public key callers must use to verify this oracle's proofs.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.keypair.public_key_bytes()
    }

    /// Drain all queued requests, oldest first.
    pub fn take_pending(&self) -> Vec<PendingDecryption> {
        self.queue
            .lock()
            .expect("Mutex poisoned")
            .drain(..)
            .collect()
    }

    /// Decrypt and sign one pending request.
    ///
    /// The cleartext is the concatenation of each handle's 8-byte big-endian
    /// plaintext, in request order.
    ///
    /// # Errors
    /// Returns `CraftError::Oracle` if any handle is unknown to the backend.
    pub fn fulfill(&self, pending: &PendingDecryption) -> Result<DecryptionResponse, CraftError> {
        let mut cleartext = Vec::with_capacity(pending.handles.len() * 8);
        for handle in &pending.handles {
            let value = self.arithmetic.decrypt(handle).ok_or_else(|| {
                CraftError::Oracle(format!("Cannot decrypt unknown handle {}", handle))
            })?;
            cleartext.extend_from_slice(&encode_cleartext(value));
        }

        let digest = decryption_digest(&pending.request_id, &pending.handles, &cleartext);
        let proof = self.keypair.sign(&digest);

        tracing::debug!(
            "Oracle fulfilled request {} ({} handle(s))",
            pending.request_id,
            pending.handles.len()
        );

        Ok(DecryptionResponse {
            request_id: pending.request_id,
            cleartext,
            proof,
        })
    }
}

impl DecryptionOracle for LocalDecryptionOracle {
    fn request_decryption(
        &self,
        handles: &[CipherHandle],
        reply_to: &Address,
    ) -> Result<RequestId, CraftError> {
        if handles.is_empty() {
            return Err(CraftError::Oracle(
                "Decryption request must carry at least one handle".to_string(),
            ));
        }

        let pending = PendingDecryption {
            request_id: RequestId::new_v7(),
            handles: handles.to_vec(),
            reply_to: *reply_to,
        };
        let request_id = pending.request_id;

        match &self.outbox {
            Some(outbox) => outbox
                .send(pending)
                .map_err(|_| CraftError::Oracle("Oracle worker channel is closed".to_string()))?,
            None => self.queue.lock().expect("Mutex poisoned").push_back(pending),
        }

        tracing::debug!("Oracle accepted decryption request {}", request_id);
        Ok(request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veilcraft_core::cipher::decode_cleartext;
    use veilcraft_core::crypto::verify_signature;

    fn make_oracle() -> (LocalDecryptionOracle, Arc<LocalArithmetic>) {
        let fhe = Arc::new(LocalArithmetic::new());
        let oracle = LocalDecryptionOracle::new(Keypair::from_seed(&[1u8; 32]), fhe.clone());
        (oracle, fhe)
    }

    #[test]
    fn test_request_is_queued_without_channel() {
        let (oracle, fhe) = make_oracle();
        let h = fhe.encrypt(5);
        let reply_to = Address::derive("coordinator");

        let id = oracle.request_decryption(&[h], &reply_to).unwrap();
        let pending = oracle.take_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].request_id, id);
        assert_eq!(pending[0].handles, vec![h]);
        assert_eq!(pending[0].reply_to, reply_to);

        // Queue is drained.
        assert!(oracle.take_pending().is_empty());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let (oracle, fhe) = make_oracle();
        let h = fhe.encrypt(5);
        let reply_to = Address::derive("coordinator");
        let a = oracle.request_decryption(&[h], &reply_to).unwrap();
        let b = oracle.request_decryption(&[h], &reply_to).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_request_rejected() {
        let (oracle, _) = make_oracle();
        let result = oracle.request_decryption(&[], &Address::derive("coordinator"));
        assert!(matches!(result, Err(CraftError::Oracle(_))));
    }

    #[test]
    fn test_fulfill_signs_cleartext() {
        let (oracle, fhe) = make_oracle();
        let h = fhe.encrypt(99);
        oracle
            .request_decryption(&[h], &Address::derive("coordinator"))
            .unwrap();
        let pending = oracle.take_pending().remove(0);

        let response = oracle.fulfill(&pending).unwrap();
        assert_eq!(decode_cleartext(&response.cleartext).unwrap(), 99);

        let digest = decryption_digest(&pending.request_id, &pending.handles, &response.cleartext);
        assert!(verify_signature(&oracle.public_key_bytes(), &digest, &response.proof).unwrap());
    }

    #[test]
    fn test_fulfill_unknown_handle_fails() {
        let (oracle, _) = make_oracle();
        let pending = PendingDecryption {
            request_id: RequestId::new_v7(),
            handles: vec![CipherHandle::from_bytes([4u8; 32])],
            reply_to: Address::derive("coordinator"),
        };
        assert!(matches!(oracle.fulfill(&pending), Err(CraftError::Oracle(_))));
    }

    #[tokio::test]
    async fn test_request_is_sent_to_channel() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let fhe = Arc::new(LocalArithmetic::new());
        let oracle = LocalDecryptionOracle::new(Keypair::generate(), fhe.clone()).with_channel(tx);

        let h = fhe.encrypt(3);
        let id = oracle
            .request_decryption(&[h], &Address::derive("coordinator"))
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.request_id, id);
        assert!(oracle.take_pending().is_empty());
    }

    #[tokio::test]
    async fn test_closed_channel_is_an_oracle_error() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let fhe = Arc::new(LocalArithmetic::new());
        let oracle = LocalDecryptionOracle::new(Keypair::generate(), fhe.clone()).with_channel(tx);
        let h = fhe.encrypt(3);
        let result = oracle.request_decryption(&[h], &Address::derive("coordinator"));
        assert!(matches!(result, Err(CraftError::Oracle(_))));
    }
}
