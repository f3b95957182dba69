// crates/veilcraft-core/src/lib.rs
//
// veilcraft-core: Core types, traits, and crypto primitives for the Veilcraft
// confidential batch crafting coordinator.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines identifiers, the encrypted trait record, the protocol-wide error
// taxonomy, the event vocabulary, and the interfaces of the external
// collaborators (encrypted arithmetic, decryption oracle, proof verification).

pub mod call;
pub mod cipher;
pub mod crypto;
pub mod error;
pub mod event;
mod hexid;
pub mod identity;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use veilcraft_core::Address;`

// Identity types
pub use identity::{Address, BatchId, RequestId};

// Call context
pub use call::{ActionKind, CallContext};

// Ciphertext types
pub use cipher::{decode_cleartext, encode_cleartext, CipherHandle, EncryptedTrait, StateHash};

// Events
pub use event::CoordinatorEvent;

// Error type
pub use error::{CraftError, ErrorCategory};

// Traits
pub use traits::{DecryptionOracle, EncryptedArithmetic, ProofVerifier};
