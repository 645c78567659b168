//! Access-log sink for validation attempts.
//!
//! Every validation call produces exactly one attempt record, written
//! fire-and-forget: a failing sink is logged locally and swallowed, and
//! must never block or flip the returned decision. Records carry a
//! one-way fingerprint of the presented grant, never the raw value.

use crate::GatepassError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

/// Terminal outcome of a validation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The gate may open.
    Authorized,
    /// The gate stays closed.
    Denied,
}

/// One durable record per validation attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AccessAttempt {
    /// When the attempt was decided.
    pub at: DateTime<Utc>,

    /// Resolved subject, when the pipeline got far enough to know one.
    pub subject: Option<String>,

    /// Gate/device identity declared by the caller.
    pub gate_id: Option<String>,

    /// Terminal outcome.
    pub outcome: AttemptOutcome,

    /// Denial reason code, or the `repeat` tag on a debounced accept.
    pub reason: Option<String>,

    /// One-way hash of the presented token or code.
    pub grant_fingerprint: String,

    /// Signing-key id (signed path only).
    pub kid: Option<String>,

    /// Wall time spent deciding, in milliseconds.
    pub latency_ms: i64,

    /// Caller IP, when the transport layer supplied one.
    pub caller_ip: Option<String>,

    /// Caller user agent, when supplied.
    pub user_agent: Option<String>,
}

/// Durable sink for access attempts (external collaborator).
pub trait AccessLog: Send + Sync {
    /// Persist one attempt record.
    fn record(&self, attempt: &AccessAttempt) -> Result<(), GatepassError>;
}

/// Sink that emits each attempt as a structured tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAccessLog;

impl AccessLog for TracingAccessLog {
    fn record(&self, attempt: &AccessAttempt) -> Result<(), GatepassError> {
        tracing::info!(
            outcome = ?attempt.outcome,
            reason = attempt.reason.as_deref().unwrap_or(""),
            subject = attempt.subject.as_deref().unwrap_or(""),
            gate_id = attempt.gate_id.as_deref().unwrap_or(""),
            fingerprint = %attempt.grant_fingerprint,
            kid = attempt.kid.as_deref().unwrap_or(""),
            latency_ms = attempt.latency_ms,
            "gate access attempt"
        );
        Ok(())
    }
}

/// Collecting sink for tests.
#[derive(Default)]
pub struct MemoryAccessLog {
    attempts: Mutex<Vec<AccessAttempt>>,
}

impl MemoryAccessLog {
    /// Snapshot of all recorded attempts.
    pub fn attempts(&self) -> Vec<AccessAttempt> {
        self.attempts
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    /// Number of recorded attempts.
    pub fn len(&self) -> usize {
        self.attempts.lock().map(|a| a.len()).unwrap_or(0)
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AccessLog for MemoryAccessLog {
    fn record(&self, attempt: &AccessAttempt) -> Result<(), GatepassError> {
        self.attempts
            .lock()
            .map_err(|_| GatepassError::AuditUnavailable("log lock poisoned".to_string()))?
            .push(attempt.clone());
        Ok(())
    }
}

/// Failing sink for tests asserting fire-and-forget behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingAccessLog;

impl AccessLog for FailingAccessLog {
    fn record(&self, _attempt: &AccessAttempt) -> Result<(), GatepassError> {
        Err(GatepassError::AuditUnavailable("sink offline".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_attempt() -> AccessAttempt {
        AccessAttempt {
            at: Utc::now(),
            subject: Some("user-1".to_string()),
            gate_id: Some("G1".to_string()),
            outcome: AttemptOutcome::Denied,
            reason: Some("replayed".to_string()),
            grant_fingerprint: "abc123".to_string(),
            kid: None,
            latency_ms: 3,
            caller_ip: None,
            user_agent: None,
        }
    }

    #[test]
    fn memory_log_collects_in_order() {
        let log = MemoryAccessLog::default();
        assert!(log.is_empty());
        log.record(&sample_attempt()).unwrap();
        let mut second = sample_attempt();
        second.outcome = AttemptOutcome::Authorized;
        second.reason = None;
        log.record(&second).unwrap();

        let attempts = log.attempts();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].outcome, AttemptOutcome::Denied);
        assert_eq!(attempts[1].outcome, AttemptOutcome::Authorized);
    }

    #[test]
    fn tracing_log_accepts_records() {
        let log = TracingAccessLog;
        assert!(log.record(&sample_attempt()).is_ok());
    }

    #[test]
    fn failing_log_errors() {
        let log = FailingAccessLog;
        assert!(matches!(
            log.record(&sample_attempt()),
            Err(GatepassError::AuditUnavailable(_))
        ));
    }

    #[test]
    fn outcome_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AttemptOutcome::Authorized).unwrap(),
            "\"authorized\""
        );
    }
}
