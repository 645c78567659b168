//! Subject-status resolution with bounded caching.
//!
//! The validator must not hit the authoritative membership store on every
//! scan. [`CachedStatusOracle`] consults the shared store first and falls
//! back to the authoritative oracle once per cache window. The cache may
//! lag a revocation by up to its TTL; that is an accepted, documented
//! trade-off, not a defect.

use crate::store::{status_key, ReplayStore};
use crate::GatepassError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Current standing of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectStatus {
    /// Member in good standing; entitled to pass.
    Active,
    /// Membership suspended.
    Suspended,
    /// Membership lapsed.
    Expired,
    /// Subject not known to the authoritative source.
    Unknown,
}

impl SubjectStatus {
    /// Wire/cache representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectStatus::Active => "active",
            SubjectStatus::Suspended => "suspended",
            SubjectStatus::Expired => "expired",
            SubjectStatus::Unknown => "unknown",
        }
    }

    /// Parse a cache value; anything unrecognized maps to `Unknown`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "active" => SubjectStatus::Active,
            "suspended" => SubjectStatus::Suspended,
            "expired" => SubjectStatus::Expired,
            _ => SubjectStatus::Unknown,
        }
    }

    /// Only `Active` subjects are entitled to pass.
    pub fn is_active(&self) -> bool {
        matches!(self, SubjectStatus::Active)
    }
}

/// Answers "is this subject currently allowed".
///
/// Implemented by the embedding service over its membership store; this
/// crate only consumes it.
pub trait UserStatusOracle: Send + Sync {
    /// Resolve the subject's current status.
    fn status(&self, subject: &str) -> Result<SubjectStatus, GatepassError>;
}

/// Caching wrapper over an authoritative oracle.
///
/// Reads `status:<subject>` from the shared store; on miss, consults the
/// inner oracle once and writes the result back with a bounded TTL.
pub struct CachedStatusOracle {
    inner: Arc<dyn UserStatusOracle>,
    store: Arc<dyn ReplayStore>,
    cache_ttl: Duration,
}

impl CachedStatusOracle {
    /// Wrap an authoritative oracle with a shared-store cache.
    pub fn new(
        inner: Arc<dyn UserStatusOracle>,
        store: Arc<dyn ReplayStore>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            inner,
            store,
            cache_ttl,
        }
    }
}

impl UserStatusOracle for CachedStatusOracle {
    fn status(&self, subject: &str) -> Result<SubjectStatus, GatepassError> {
        let key = status_key(subject);
        if let Some(cached) = self.store.get(&key)? {
            return Ok(SubjectStatus::from_str_lossy(&cached));
        }
        let status = self.inner.status(subject)?;
        // Cache write failure should not flip the freshly resolved answer
        if let Err(e) = self.store.put(&key, status.as_str(), self.cache_ttl) {
            tracing::warn!(subject, error = %e, "failed to cache subject status");
        }
        Ok(status)
    }
}

/// Fixed-map oracle for tests and embedded setups.
///
/// Unlisted subjects resolve to `Unknown`.
#[derive(Default)]
pub struct StaticStatusOracle {
    statuses: HashMap<String, SubjectStatus>,
}

impl StaticStatusOracle {
    /// Build from explicit (subject, status) pairs.
    pub fn new(pairs: impl IntoIterator<Item = (String, SubjectStatus)>) -> Self {
        Self {
            statuses: pairs.into_iter().collect(),
        }
    }

    /// Mark a subject active.
    pub fn with_active(mut self, subject: &str) -> Self {
        self.statuses
            .insert(subject.to_string(), SubjectStatus::Active);
        self
    }
}

impl UserStatusOracle for StaticStatusOracle {
    fn status(&self, subject: &str) -> Result<SubjectStatus, GatepassError> {
        Ok(self
            .statuses
            .get(subject)
            .copied()
            .unwrap_or(SubjectStatus::Unknown))
    }
}
