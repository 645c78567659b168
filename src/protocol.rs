//! Request/response models for the external issue/validate/resolve surface.
//!
//! These are the bodies an HTTP layer binds to; the decision enums are the
//! only externally observable outputs of validation. A validation response
//! is always a complete decision, never a partial.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response to a signed-grant issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedGrant {
    /// Compact signed token the client presents at the gate.
    pub token: String,

    /// Grant expiry.
    pub exp: DateTime<Utc>,

    /// Identifier of the key that signed the token.
    pub kid: String,

    /// Server time at issuance, for client clock alignment.
    pub server_time: DateTime<Utc>,

    /// Clients should fetch a replacement by this instant (15s before
    /// expiry) to avoid presenting a stale grant at the gate.
    pub refresh_at: DateTime<Utc>,

    /// Effective lifetime in seconds.
    pub ttl_seconds: u64,

    /// Bound gate, when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Response to an opaque-code issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpaqueGrant {
    /// Short human-typeable code indexing the server-side claims record.
    pub code: String,

    /// Grant expiry.
    pub expires_at: DateTime<Utc>,

    /// Server time at issuance.
    pub server_now: DateTime<Utc>,

    /// Effective lifetime in seconds.
    pub ttl_seconds: u64,
}

/// A gate's request to validate a signed token.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRequest {
    /// The presented compact token.
    pub token: String,

    /// The gate's own identity, enabling the audience check.
    #[serde(default)]
    pub gate_id: Option<String>,

    /// Caller IP for the audit record.
    #[serde(default)]
    pub caller_ip: Option<String>,

    /// Caller user agent for the audit record.
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Terminal result of signed-token validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictResult {
    /// Grant accepted; the gate may open.
    Allow,
    /// Grant rejected on policy grounds (scope, status, replay).
    Deny,
    /// Grant lifetime has passed.
    Expired,
    /// Structurally or cryptographically unacceptable token.
    Invalid,
    /// Token bound to a different gate.
    WrongAudience,
}

impl VerdictResult {
    /// Terse code for audit records.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictResult::Allow => "allow",
            VerdictResult::Deny => "deny",
            VerdictResult::Expired => "expired",
            VerdictResult::Invalid => "invalid",
            VerdictResult::WrongAudience => "wrong_audience",
        }
    }
}

/// Decision returned for a signed-token validation. Never partial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenVerdict {
    /// Terminal result.
    pub result: VerdictResult,

    /// Resolved subject, when the pipeline got far enough to know one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Grant expiry, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_until: Option<DateTime<Utc>>,

    /// Terse machine-readable detail (e.g. "replayed", "store_unavailable").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TokenVerdict {
    /// A bare denial-class verdict with a detail code.
    pub fn rejection(result: VerdictResult, error: &str) -> Self {
        Self {
            result,
            sub: None,
            allowed_until: None,
            error: Some(error.to_string()),
        }
    }
}

/// A gate's request to resolve an opaque code.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    /// The presented code.
    pub code: String,

    /// The gate's own identity; must match the code's bound audience.
    pub audience_declared: String,

    /// Scanning device identity, used for the debounce window.
    pub device_id: String,

    /// Caller IP for the audit record.
    #[serde(default)]
    pub caller_ip: Option<String>,

    /// Caller user agent for the audit record.
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Terminal outcome of an opaque-code resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The gate may open.
    Authorized,
    /// The gate stays closed.
    Denied,
}

/// Closed reason set for resolution decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// No claims record exists for the presented code.
    InvalidCode,
    /// The grant's lifetime has passed.
    Expired,
    /// The declared gate does not match the bound audience.
    WrongAudience,
    /// The grant was already accepted once.
    Replayed,
    /// The subject is not currently active.
    UserInactive,
    /// The replay store could not be reached; validation fails closed.
    StoreUnavailable,
    /// Same-device re-scan inside the debounce window. The only reason
    /// ever paired with an authorized outcome.
    Repeat,
}

impl DecisionReason {
    /// Terse code for audit records and response bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::InvalidCode => "invalid_code",
            DecisionReason::Expired => "expired",
            DecisionReason::WrongAudience => "wrong_audience",
            DecisionReason::Replayed => "replayed",
            DecisionReason::UserInactive => "user_inactive",
            DecisionReason::StoreUnavailable => "store_unavailable",
            DecisionReason::Repeat => "repeat",
        }
    }
}

/// Decision returned for an opaque-code resolution. Never partial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Terminal outcome.
    pub decision: Outcome,

    /// Reason code; `None` on a clean accept.
    pub reason: Option<DecisionReason>,

    /// Resolved subject, when known.
    pub user_id: Option<String>,

    /// Grant expiry, when known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Decision {
    /// A denial with no resolved subject.
    pub fn denied(reason: DecisionReason) -> Self {
        Self {
            decision: Outcome::Denied,
            reason: Some(reason),
            user_id: None,
            expires_at: None,
        }
    }

    /// True when the gate may open.
    pub fn is_authorized(&self) -> bool {
        self.decision == Outcome::Authorized
    }
}
