// crates/veilcraft-oracle/src/arithmetic.rs
//
// LocalArithmetic: implements the EncryptedArithmetic trait from veilcraft-core.
//
// Ciphertexts are simulated: each handle maps to a plaintext u64 in a private
// table. Fresh encryptions get random handles, so encrypting the same value
// twice produces two distinct handles, just like a real FHE scheme. Derived
// handles (zero, add, mul) are a hash of the operation and its operands,
// which makes re-running the same computation reproduce the same handle.

use std::collections::HashMap;
use std::sync::RwLock;

use sha2::{Digest, Sha256};

use veilcraft_core::cipher::CipherHandle;
use veilcraft_core::error::CraftError;
use veilcraft_core::traits::EncryptedArithmetic;

const HANDLE_DOMAIN: &[u8] = b"veilcraft/local-fhe/v1";

/// In-memory encrypted arithmetic backend.
#[derive(Debug)]
pub struct LocalArithmetic {
    /// Map from handle to the plaintext it encrypts.
    ciphertexts: RwLock<HashMap<CipherHandle, u64>>,
    zero: CipherHandle,
}

impl LocalArithmetic {
    /// Create a backend that knows only the trivial encryption of zero.
    pub fn new() -> Self {
        let zero = derive_handle(b"zero", &[]);
        let mut ciphertexts = HashMap::new();
        ciphertexts.insert(zero, 0);
        Self {
            ciphertexts: RwLock::new(ciphertexts),
            zero,
        }
    }

    /// Encrypt a cleartext under a fresh random handle.
    pub fn encrypt(&self, value: u64) -> CipherHandle {
        let mut map = self.ciphertexts.write().expect("RwLock poisoned");
        loop {
            let handle = CipherHandle::from_bytes(rand::random::<[u8; 32]>());
            if handle.is_zero() || map.contains_key(&handle) {
                continue;
            }
            map.insert(handle, value);
            return handle;
        }
    }

    /// Decrypt a handle. Returns `None` for handles this backend never produced.
    pub fn decrypt(&self, handle: &CipherHandle) -> Option<u64> {
        self.ciphertexts
            .read()
            .expect("RwLock poisoned")
            .get(handle)
            .copied()
    }

    /// Number of ciphertexts held.
    pub fn len(&self) -> usize {
        self.ciphertexts.read().expect("RwLock poisoned").len()
    }

    /// Whether no ciphertexts are held. Never true: zero is always present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn binary_op(
        &self,
        op: &'static [u8],
        lhs: &CipherHandle,
        rhs: &CipherHandle,
        f: fn(u64, u64) -> u64,
    ) -> Result<CipherHandle, CraftError> {
        let mut map = self.ciphertexts.write().expect("RwLock poisoned");
        let a = *map
            .get(lhs)
            .ok_or_else(|| CraftError::Arithmetic(format!("Unknown operand handle {}", lhs)))?;
        let b = *map
            .get(rhs)
            .ok_or_else(|| CraftError::Arithmetic(format!("Unknown operand handle {}", rhs)))?;

        let handle = derive_handle(op, &[lhs, rhs]);
        map.insert(handle, f(a, b));
        Ok(handle)
    }
}

impl Default for LocalArithmetic {
    fn default() -> Self {
        Self::new()
    }
}

impl EncryptedArithmetic for LocalArithmetic {
    fn trivial_zero(&self) -> CipherHandle {
        self.zero
    }

    fn is_initialized(&self, handle: &CipherHandle) -> bool {
        !handle.is_zero()
            && self
                .ciphertexts
                .read()
                .expect("RwLock poisoned")
                .contains_key(handle)
    }

    fn add(&self, lhs: &CipherHandle, rhs: &CipherHandle) -> Result<CipherHandle, CraftError> {
        self.binary_op(b"add", lhs, rhs, u64::wrapping_add)
    }

    fn mul(&self, lhs: &CipherHandle, rhs: &CipherHandle) -> Result<CipherHandle, CraftError> {
        self.binary_op(b"mul", lhs, rhs, u64::wrapping_mul)
    }
}

/// Handle of the result of `op` applied to `operands`.
fn derive_handle(op: &[u8], operands: &[&CipherHandle]) -> CipherHandle {
    let mut hasher = Sha256::new();
    hasher.update(HANDLE_DOMAIN);
    hasher.update((op.len() as u32).to_be_bytes());
    hasher.update(op);
    for operand in operands {
        hasher.update(operand.as_bytes());
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    CipherHandle::from_bytes(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let fhe = LocalArithmetic::new();
        let h = fhe.encrypt(42);
        assert_eq!(fhe.decrypt(&h), Some(42));
        assert!(fhe.is_initialized(&h));
    }

    #[test]
    fn test_encrypt_same_value_gives_fresh_handles() {
        let fhe = LocalArithmetic::new();
        let a = fhe.encrypt(5);
        let b = fhe.encrypt(5);
        assert_ne!(a, b);
    }

    #[test]
    fn test_trivial_zero_decrypts_to_zero() {
        let fhe = LocalArithmetic::new();
        let zero = fhe.trivial_zero();
        assert_eq!(fhe.decrypt(&zero), Some(0));
        assert_eq!(LocalArithmetic::new().trivial_zero(), zero);
    }

    #[test]
    fn test_uninitialized_handles() {
        let fhe = LocalArithmetic::new();
        assert!(!fhe.is_initialized(&CipherHandle::UNINITIALIZED));
        assert!(!fhe.is_initialized(&CipherHandle::from_bytes([3u8; 32])));
    }

    #[test]
    fn test_add_and_mul() {
        let fhe = LocalArithmetic::new();
        let a = fhe.encrypt(6);
        let b = fhe.encrypt(7);
        let sum = fhe.add(&a, &b).unwrap();
        let product = fhe.mul(&a, &b).unwrap();
        assert_eq!(fhe.decrypt(&sum), Some(13));
        assert_eq!(fhe.decrypt(&product), Some(42));
    }

    #[test]
    fn test_operations_are_deterministic() {
        let fhe = LocalArithmetic::new();
        let a = fhe.encrypt(6);
        let b = fhe.encrypt(7);
        assert_eq!(fhe.add(&a, &b).unwrap(), fhe.add(&a, &b).unwrap());
        assert_ne!(fhe.add(&a, &b).unwrap(), fhe.mul(&a, &b).unwrap());
        // Operand order is part of the derivation.
        assert_ne!(fhe.add(&a, &b).unwrap(), fhe.add(&b, &a).unwrap());
    }

    #[test]
    fn test_arithmetic_wraps() {
        let fhe = LocalArithmetic::new();
        let max = fhe.encrypt(u64::MAX);
        let one = fhe.encrypt(1);
        let sum = fhe.add(&max, &one).unwrap();
        assert_eq!(fhe.decrypt(&sum), Some(0));
    }

    #[test]
    fn test_unknown_operand_fails() {
        let fhe = LocalArithmetic::new();
        let a = fhe.encrypt(1);
        let bogus = CipherHandle::from_bytes([9u8; 32]);
        assert!(matches!(fhe.add(&a, &bogus), Err(CraftError::Arithmetic(_))));
    }
}
