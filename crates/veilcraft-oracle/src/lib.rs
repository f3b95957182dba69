// crates/veilcraft-oracle/src/lib.rs
//
// veilcraft-oracle: In-process stand-ins for the coordinator's external
// collaborators.
//
// - `LocalArithmetic`: handle-addressed "encrypted" arithmetic over wrapping
//   u64 values. Plaintexts never leave this type except through decryption.
// - `LocalDecryptionOracle`: accepts decryption requests, hands them to a
//   worker (channel) or a queue, and answers with a signed cleartext.
// - `SignatureProofVerifier`: checks the oracle's ed25519 proofs.

pub mod arithmetic;
pub mod oracle;
pub mod verifier;

pub use arithmetic::LocalArithmetic;
pub use oracle::{DecryptionResponse, LocalDecryptionOracle, PendingDecryption};
pub use verifier::SignatureProofVerifier;
