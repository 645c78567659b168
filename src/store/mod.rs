//! Shared TTL-aware key/value store used as a distributed replay guard.
//!
//! All mutable shared state lives behind this trait: claims records for
//! opaque codes, consumption markers, per-grant replay markers, debounce
//! records, and the subject-status cache. The `set_if_absent` primitive
//! must be atomic in the backing store; that atomicity is what gives
//! at-most-one-acceptance semantics across validator instances. An
//! in-process mutex is NOT a substitute when validators run in more than
//! one process.

pub mod memory;

use crate::GatepassError;
use std::time::Duration;

/// Extra TTL added to replay records beyond the grant's remaining life,
/// so a record never expires while the grant it guards could still be
/// replayed.
pub const REPLAY_MARGIN: Duration = Duration::from_secs(60);

/// Minimum TTL for code-consumption markers.
pub const CONSUMED_TTL: Duration = Duration::from_secs(600);

/// TTL-aware key/value store used for replay guarding and status caching.
///
/// Implementations for shared backends (Redis-class stores) must map
/// `set_if_absent` onto the backend's atomic set-if-not-exists-with-expiry
/// operation.
pub trait ReplayStore: Send + Sync {
    /// Write a value with a TTL, overwriting any existing record.
    fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), GatepassError>;

    /// Atomically create a record only if the key is absent.
    ///
    /// Returns `true` iff this call created the record. This is the
    /// load-bearing primitive for at-most-once acceptance.
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, GatepassError>;

    /// Read a value if present and unexpired.
    fn get(&self, key: &str) -> Result<Option<String>, GatepassError>;

    /// Check presence without reading the value.
    fn exists(&self, key: &str) -> Result<bool, GatepassError> {
        Ok(self.get(key)?.is_some())
    }
}

/// Store key for an opaque code's claims record.
pub fn code_key(code: &str) -> String {
    format!("code:{}", code)
}

/// Store key marking an opaque code as consumed.
pub fn consumed_key(code: &str) -> String {
    format!("consumed:{}", code)
}

/// Store key marking a grant identifier as accepted.
pub fn seen_key(jti: &str) -> String {
    format!("seen:{}", jti)
}

/// Store key for the per-(device, code) debounce record.
pub fn debounce_key(device_id: &str, code: &str) -> String {
    format!("seen:{}:{}", device_id, code)
}

/// Store key for a cached subject status.
pub fn status_key(subject: &str) -> String {
    format!("status:{}", subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout_matches_wire_contract() {
        assert_eq!(code_key("AB12CD34EF"), "code:AB12CD34EF");
        assert_eq!(consumed_key("AB12CD34EF"), "consumed:AB12CD34EF");
        assert_eq!(seen_key("jti-1"), "seen:jti-1");
        assert_eq!(debounce_key("gate-9", "AB12CD34EF"), "seen:gate-9:AB12CD34EF");
        assert_eq!(status_key("user-1"), "status:user-1");
    }

    #[test]
    fn debounce_key_distinct_per_device() {
        assert_ne!(debounce_key("d1", "C"), debounce_key("d2", "C"));
    }
}
