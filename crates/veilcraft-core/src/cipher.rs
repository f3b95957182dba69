// crates/veilcraft-core/src/cipher.rs
//
// Opaque ciphertext handles and the encrypted trait record.
//
// A handle is a 32-byte reference to a ciphertext held by the encrypted
// arithmetic collaborator. The coordinator never sees plaintext; it only
// stores, combines, and hashes handles.

use serde::{Deserialize, Serialize};

use crate::error::CraftError;
use crate::hexid::impl_hex32;

/// Reference to one ciphertext held by the encrypted arithmetic backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CipherHandle([u8; 32]);

impl_hex32!(CipherHandle);

impl CipherHandle {
    /// The handle of a value that was never set.
    pub const UNINITIALIZED: CipherHandle = CipherHandle([0u8; 32]);
}

/// Commitment over the ciphertext sequence sent for decryption.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash([u8; 32]);

impl_hex32!(StateHash);

/// One provider's encrypted contribution to a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedTrait {
    /// Encrypted trait value.
    pub value: CipherHandle,
    /// Encrypted weight applied to the value when crafting.
    pub weight: CipherHandle,
}

/// Width of an encoded cleartext, in bytes.
pub const CLEARTEXT_LEN: usize = 8;

/// Encode a decrypted result the way the oracle returns it: 8 bytes, big-endian.
pub fn encode_cleartext(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Decode the oracle's cleartext bytes into the crafted result.
///
/// # Errors
/// Returns `CraftError::MalformedCleartext` unless exactly 8 bytes are given.
pub fn decode_cleartext(bytes: &[u8]) -> Result<u64, CraftError> {
    let array: [u8; CLEARTEXT_LEN] = bytes
        .try_into()
        .map_err(|_| CraftError::MalformedCleartext(bytes.len()))?;
    Ok(u64::from_be_bytes(array))
}
