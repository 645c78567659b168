//! Gatepass error types.
//!
//! Validation denials are NOT errors: the validator always returns a
//! terminal decision value. Errors in this enum surface only from
//! issuance, key management, and infrastructure failures.

use thiserror::Error;

/// Errors that can occur during grant issuance and key management.
#[derive(Debug, Error)]
pub enum GatepassError {
    /// Configuration is invalid (fatal at startup).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No signing keypair is configured and generation is disallowed.
    #[error("No signing key available")]
    NoKeyAvailable,

    /// Key material could not be parsed or loaded.
    #[error("Invalid key material: {0}")]
    KeyInvalid(String),

    /// Requested grant TTL falls outside the configured bounds.
    #[error("Invalid TTL: {requested}s (allowed {min}-{max}s)")]
    InvalidTtl {
        /// The TTL the caller asked for, in seconds.
        requested: u64,
        /// Minimum permitted TTL in seconds.
        min: u64,
        /// Maximum permitted TTL in seconds.
        max: u64,
    },

    /// Opaque issuance requires a concrete gate audience.
    #[error("Invalid audience: {0}")]
    InvalidAudience(String),

    /// Issuance was attempted for a subject that is not active.
    #[error("Subject {subject} is not active (status: {status})")]
    SubjectInactive {
        /// The subject the grant was requested for.
        subject: String,
        /// The status the oracle reported.
        status: String,
    },

    /// The replay/status store cannot be reached.
    ///
    /// During validation this is never propagated; the validator fails
    /// closed and returns a denial instead.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Claims or token material failed to encode or decode.
    #[error("Codec error: {0}")]
    CodecError(String),

    /// Token signature verification failed.
    #[error("Signature verification failed")]
    SignatureInvalid,

    /// The audit sink rejected a record. Logged locally and swallowed by
    /// the validator; never allowed to change a decision.
    #[error("Audit sink unavailable: {0}")]
    AuditUnavailable(String),
}
