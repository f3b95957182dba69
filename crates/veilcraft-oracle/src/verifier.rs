// crates/veilcraft-oracle/src/verifier.rs
//
// SignatureProofVerifier: Implements the ProofVerifier trait from veilcraft-core.
//
// A proof is the oracle's ed25519 signature over the decryption digest
// (request id, handles, cleartext). Anything else fails verification.

use veilcraft_core::cipher::CipherHandle;
use veilcraft_core::crypto::{decryption_digest, verify_signature};
use veilcraft_core::error::CraftError;
use veilcraft_core::identity::RequestId;
use veilcraft_core::traits::ProofVerifier;

/// Verifies decryption proofs against one trusted oracle public key.
#[derive(Debug, Clone)]
pub struct SignatureProofVerifier {
    oracle_key: [u8; 32],
}

impl SignatureProofVerifier {
    /// Trust proofs signed by `oracle_key`.
    pub fn new(oracle_key: [u8; 32]) -> Self {
        Self { oracle_key }
    }

    /// The trusted oracle public key.
    pub fn oracle_key(&self) -> &[u8; 32] {
        &self.oracle_key
    }
}

impl ProofVerifier for SignatureProofVerifier {
    fn verify_decryption(
        &self,
        request_id: &RequestId,
        handles: &[CipherHandle],
        cleartext: &[u8],
        proof: &[u8],
    ) -> Result<bool, CraftError> {
        let digest = decryption_digest(request_id, handles, cleartext);
        verify_signature(&self.oracle_key, &digest, proof)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::arithmetic::LocalArithmetic;
    use crate::oracle::LocalDecryptionOracle;
    use veilcraft_core::cipher::encode_cleartext;
    use veilcraft_core::crypto::Keypair;
    use veilcraft_core::identity::Address;
    use veilcraft_core::traits::DecryptionOracle;

    fn fulfilled() -> (SignatureProofVerifier, crate::oracle::PendingDecryption, crate::oracle::DecryptionResponse) {
        let fhe = Arc::new(LocalArithmetic::new());
        let oracle = LocalDecryptionOracle::new(Keypair::generate(), fhe.clone());
        let h = fhe.encrypt(12);
        oracle
            .request_decryption(&[h], &Address::derive("coordinator"))
            .unwrap();
        let pending = oracle.take_pending().remove(0);
        let response = oracle.fulfill(&pending).unwrap();
        (
            SignatureProofVerifier::new(oracle.public_key_bytes()),
            pending,
            response,
        )
    }

    #[test]
    fn test_valid_proof_verifies() {
        let (verifier, pending, response) = fulfilled();
        assert!(verifier
            .verify_decryption(&pending.request_id, &pending.handles, &response.cleartext, &response.proof)
            .unwrap());
    }

    #[test]
    fn test_tampered_cleartext_fails() {
        let (verifier, pending, response) = fulfilled();
        let forged = encode_cleartext(13);
        assert!(!verifier
            .verify_decryption(&pending.request_id, &pending.handles, &forged, &response.proof)
            .unwrap());
    }

    #[test]
    fn test_proof_bound_to_request_id() {
        let (verifier, pending, response) = fulfilled();
        assert!(!verifier
            .verify_decryption(&RequestId::new_v7(), &pending.handles, &response.cleartext, &response.proof)
            .unwrap());
    }

    #[test]
    fn test_untrusted_key_fails() {
        let (_, pending, response) = fulfilled();
        let other = SignatureProofVerifier::new(Keypair::generate().public_key_bytes());
        assert!(!other
            .verify_decryption(&pending.request_id, &pending.handles, &response.cleartext, &response.proof)
            .unwrap());
    }

    #[test]
    fn test_malformed_proof_is_an_error() {
        let (verifier, pending, response) = fulfilled();
        let result =
            verifier.verify_decryption(&pending.request_id, &pending.handles, &response.cleartext, &[1, 2, 3]);
        assert!(result.is_err());
    }
}
