//! The validation decision engine a gate scanner calls.
//!
//! Both pipelines are pure, ordered check sequences: each stage can
//! short-circuit to a terminal denial, neither retries internally, and a
//! denial is final for that specific grant. Every call, success or
//! failure, produces exactly one audit record before returning; the
//! record is written fire-and-forget and can never change the decision.
//!
//! When the shared store cannot perform reuse prevention, validation
//! fails CLOSED: the grant is denied rather than silently admitted.

mod opaque;
mod signed;

use crate::audit::{AccessAttempt, AccessLog};
use crate::clock::Clock;
use crate::config::GatepassConfig;
use crate::keys::KeyManager;
use crate::status::UserStatusOracle;
use crate::store::ReplayStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Multi-stage decision engine for both grant variants.
pub struct TokenValidator {
    config: GatepassConfig,
    keys: Arc<KeyManager>,
    store: Arc<dyn ReplayStore>,
    oracle: Arc<dyn UserStatusOracle>,
    audit: Arc<dyn AccessLog>,
    clock: Arc<dyn Clock>,
}

impl TokenValidator {
    /// Build a validator from its collaborators.
    pub fn new(
        config: GatepassConfig,
        keys: Arc<KeyManager>,
        store: Arc<dyn ReplayStore>,
        oracle: Arc<dyn UserStatusOracle>,
        audit: Arc<dyn AccessLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            keys,
            store,
            oracle,
            audit,
            clock,
        }
    }

    /// Best-effort audit write. A failing sink is logged and swallowed.
    fn log_attempt(&self, attempt: AccessAttempt) {
        if let Err(e) = self.audit.record(&attempt) {
            tracing::warn!(error = %e, "failed to record access attempt");
        }
    }

    /// Replay-record TTL: the grant's remaining life plus the safety
    /// margin, so the record cannot expire while a replay is possible.
    fn replay_ttl(&self, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        let remaining = (expires_at - now).to_std().unwrap_or_default();
        remaining + crate::store::REPLAY_MARGIN
    }
}
