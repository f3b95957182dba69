// crates/veilcraft-coordinator/src/lib.rs
//
// veilcraft-coordinator: the Confidential Batch Crafting Coordinator.
//
// Owns batch state, encrypted trait storage, per-provider rate limits, and
// the two-phase craft-request / decryption-callback handshake. All state
// lives in one `Coordinator` value and changes only through its operations;
// the embedding substrate is expected to serialize calls.

pub mod access;
pub mod batch;
pub mod bridge;
pub mod config;
pub mod coordinator;
pub mod craft;
pub mod events;
pub mod rate_limit;
pub mod store;

// Re-export key types for ergonomic access from downstream crates.
pub use access::AccessControl;
pub use batch::{BatchInfo, BatchRegistry};
pub use bridge::{canonical_handles, DecryptionContext, DecryptionOracleBridge};
pub use config::{CoordinatorConfig, CraftPolicyKind};
pub use coordinator::{Collaborators, Coordinator};
pub use craft::{CraftEngine, CraftPolicy, ValueSum, WeightedSum};
pub use events::{EventLog, EventRecord};
pub use rate_limit::RateLimiter;
pub use store::EncryptedTraitStore;
