// crates/veilcraft-core/src/identity.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::hash_bytes;
use crate::hexid::impl_hex32;

/// Identifier of a batch. Ids start at 1 and only ever grow.
pub type BatchId = u64;

/// An account on the coordinator: the owner, a provider, or any other caller.
///
/// Addresses are 32 bytes wide so an ed25519 public key can be used directly
/// as an address. The all-zero address is reserved and never holds a role.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl_hex32!(Address);

impl Address {
    /// The reserved all-zero address.
    pub const ZERO: Address = Address([0u8; 32]);

    /// Use an ed25519 public key as an address.
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        Self(*public_key)
    }

    /// Derive a stable address from a human-readable label.
    ///
    /// Used for fixtures and configuration files where operators refer to
    /// accounts by name (e.g., "owner", "alice") instead of raw hex.
    pub fn derive(label: &str) -> Self {
        Self(hash_bytes(label.as_bytes()))
    }

    /// Parse either a 0x-prefixed hex address or a label.
    pub fn parse_or_derive(input: &str) -> Result<Self, crate::error::CraftError> {
        if input.starts_with("0x") {
            Self::from_hex(input)
        } else {
            Ok(Self::derive(input))
        }
    }
}

/// Opaque identifier the decryption oracle assigns to one decryption request.
///
/// The oracle guarantees uniqueness and echoes the id back in its callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Allocate a fresh time-ordered id (UUID v7).
    pub fn new_v7() -> Self {
        Self(Uuid::now_v7())
    }

    /// The raw 16 bytes, used when binding a proof to its request.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// The wrapped UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
