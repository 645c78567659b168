//! In-process TTL store.
//!
//! Suitable for tests and single-instance deployments. Expiry is
//! evaluated lazily against the injected clock on every read and
//! conditional write, so deterministic tests can advance a `MockClock`
//! past a TTL instead of sleeping.

use crate::clock::Clock;
use crate::store::ReplayStore;
use crate::GatepassError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// TTL-aware in-memory store keyed by string.
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create an empty store evaluating TTLs against the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn deadline(&self, ttl: Duration) -> DateTime<Utc> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        self.clock
            .now_utc()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn lock_err() -> GatepassError {
        GatepassError::StoreUnavailable("store lock poisoned".to_string())
    }
}

impl ReplayStore for MemoryStore {
    fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), GatepassError> {
        let expires_at = self.deadline(ttl);
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, GatepassError> {
        let now = self.clock.now_utc();
        let expires_at = self.deadline(ttl);
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;
        // A dead record does not block re-creation
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(true)
    }

    fn get(&self, key: &str) -> Result<Option<String>, GatepassError> {
        let now = self.clock.now_utc();
        let entries = self.entries.read().map_err(|_| Self::lock_err())?;
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.value.clone()))
    }
}
