// crates/veilcraft-core/src/traits.rs

use crate::cipher::CipherHandle;
use crate::error::CraftError;
use crate::identity::{Address, RequestId};

/// Homomorphic operations on opaque ciphertext handles.
///
/// Implemented by veilcraft-oracle (`LocalArithmetic`) for local use; a
/// production deployment wraps a real FHE library.
///
/// Operations must be deterministic: the same operands always yield the
/// same result handle. Crafting is re-run at callback time and compared
/// against the committed hash, so a backend that returned fresh handles for
/// repeated operations would make every callback fail.
pub trait EncryptedArithmetic: Send + Sync {
    /// Handle of an encryption of zero.
    fn trivial_zero(&self) -> CipherHandle;

    /// Whether `handle` refers to a ciphertext the backend knows about.
    fn is_initialized(&self, handle: &CipherHandle) -> bool;

    /// Encrypted addition.
    fn add(&self, lhs: &CipherHandle, rhs: &CipherHandle) -> Result<CipherHandle, CraftError>;

    /// Encrypted multiplication.
    fn mul(&self, lhs: &CipherHandle, rhs: &CipherHandle) -> Result<CipherHandle, CraftError>;
}

/// The asynchronous threshold-decryption service.
///
/// Implemented by veilcraft-oracle (`LocalDecryptionOracle`).
pub trait DecryptionOracle: Send + Sync {
    /// Queue `handles` for decryption on behalf of the coordinator `reply_to`.
    ///
    /// Returns a request id that is unique across the oracle's lifetime and
    /// will be echoed back with the answer.
    fn request_decryption(
        &self,
        handles: &[CipherHandle],
        reply_to: &Address,
    ) -> Result<RequestId, CraftError>;
}

/// Checks that a cleartext really is the oracle's decryption of `handles`.
///
/// Implemented by veilcraft-oracle (`SignatureProofVerifier`).
pub trait ProofVerifier: Send + Sync {
    /// Returns `true` if `proof` attests `cleartext` for this request and handles.
    fn verify_decryption(
        &self,
        request_id: &RequestId,
        handles: &[CipherHandle],
        cleartext: &[u8],
        proof: &[u8],
    ) -> Result<bool, CraftError>;
}
