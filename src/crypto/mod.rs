//! Cryptographic primitives: digests, fingerprints, and the compact
//! signed-token codec.

pub mod compact;
pub mod digest;
