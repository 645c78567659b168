//! Signed-token validation pipeline.
//!
//! The grant is self-verifying, so no store lookup is needed to obtain
//! claims, but the store still arbitrates replay. The algorithm check is
//! an allow-list of exactly one tag, closing algorithm-confusion
//! attacks, and the `kid` must match the current signing key with no
//! rotation grace.

use super::TokenValidator;
use crate::audit::{AccessAttempt, AttemptOutcome};
use crate::crypto::compact::{decode_unverified, verify_signature};
use crate::crypto::digest::fingerprint;
use crate::grant::timestamp_utc;
use crate::keys::ALLOWED_ALGORITHM;
use crate::protocol::{TokenVerdict, ValidateRequest, VerdictResult};
use crate::store::seen_key;
use std::time::Instant;

impl TokenValidator {
    /// Validate a signed token to a terminal gate verdict.
    ///
    /// Never returns an error; store outages fail closed as a denial
    /// with `error = "store_unavailable"`.
    pub fn validate(&self, request: &ValidateRequest) -> TokenVerdict {
        let started = Instant::now();
        let (verdict, kid) = self.validate_pipeline(request);

        let reason = match verdict.result {
            VerdictResult::Allow => None,
            result => Some(
                verdict
                    .error
                    .clone()
                    .unwrap_or_else(|| result.as_str().to_string()),
            ),
        };
        self.log_attempt(AccessAttempt {
            at: self.clock.now_utc(),
            subject: verdict.sub.clone(),
            gate_id: request.gate_id.clone(),
            outcome: match verdict.result {
                VerdictResult::Allow => AttemptOutcome::Authorized,
                _ => AttemptOutcome::Denied,
            },
            reason,
            grant_fingerprint: fingerprint(&request.token),
            kid,
            latency_ms: started.elapsed().as_millis() as i64,
            caller_ip: request.caller_ip.clone(),
            user_agent: request.user_agent.clone(),
        });

        verdict
    }

    fn validate_pipeline(&self, request: &ValidateRequest) -> (TokenVerdict, Option<String>) {
        // 1. Structural decode, signature untouched.
        let decoded = match decode_unverified(&request.token) {
            Ok(decoded) => decoded,
            Err(_) => {
                return (
                    TokenVerdict::rejection(VerdictResult::Invalid, "malformed"),
                    None,
                )
            }
        };
        let kid = Some(decoded.header.kid.clone());
        let claims = &decoded.claims;

        // 2. Algorithm pin: allow-list, not denylist.
        if decoded.header.alg != ALLOWED_ALGORITHM {
            return (
                TokenVerdict::rejection(VerdictResult::Invalid, "algorithm_not_allowed"),
                kid,
            );
        }

        // 3. Key identifier must match the current key exactly. A token
        // signed under a rotated-out key is invalid with no exception.
        let pair = match self.keys.current() {
            Ok(pair) => pair,
            Err(_) => {
                return (
                    TokenVerdict::rejection(VerdictResult::Invalid, "no_signing_key"),
                    kid,
                )
            }
        };
        if decoded.header.kid != pair.kid {
            return (
                TokenVerdict::rejection(VerdictResult::Invalid, "unknown_kid"),
                kid,
            );
        }

        // 4. Time window with bounded clock tolerance. Claim timestamps
        // are unauthenticated at this stage, so the arithmetic must
        // saturate rather than trip overflow checks on hostile values.
        let now = self.clock.now_utc();
        let tolerance = self.config.clock_tolerance_secs as i64;
        let expires_at = timestamp_utc(claims.exp);
        if claims.exp.saturating_add(tolerance) < now.timestamp() {
            return (
                TokenVerdict {
                    result: VerdictResult::Expired,
                    sub: Some(claims.sub.clone()),
                    allowed_until: Some(expires_at),
                    error: None,
                },
                kid,
            );
        }
        if claims.nbf.saturating_sub(tolerance) > now.timestamp() {
            return (
                TokenVerdict::rejection(VerdictResult::Invalid, "not_yet_valid"),
                kid,
            );
        }

        // 5. Scope pin.
        if claims.scope != self.config.scope {
            return (
                TokenVerdict::rejection(VerdictResult::Deny, "wrong_scope"),
                kid,
            );
        }

        // 6. Audience, only when both sides declare one. Runs before the
        // replay guard so a wrong-gate scan leaves the grant unconsumed.
        if let (Some(gate), Some(aud)) = (request.gate_id.as_deref(), claims.aud.as_deref()) {
            if gate != aud {
                return (
                    TokenVerdict {
                        result: VerdictResult::WrongAudience,
                        sub: Some(claims.sub.clone()),
                        allowed_until: Some(expires_at),
                        error: None,
                    },
                    kid,
                );
            }
        }

        // 7. Signature verification against the current public key.
        if verify_signature(
            &decoded.signed_input,
            &decoded.signature_b64,
            pair.verifying_key(),
        )
        .is_err()
        {
            return (
                TokenVerdict::rejection(VerdictResult::Invalid, "bad_signature"),
                kid,
            );
        }

        // 8. Replay guard: first acceptance wins; store outage denies.
        match self.store.set_if_absent(
            &seen_key(&claims.jti),
            "1",
            self.replay_ttl(expires_at, now),
        ) {
            Ok(true) => {}
            Ok(false) => {
                return (
                    TokenVerdict {
                        result: VerdictResult::Deny,
                        sub: Some(claims.sub.clone()),
                        allowed_until: Some(expires_at),
                        error: Some("replayed".to_string()),
                    },
                    kid,
                )
            }
            Err(e) => {
                tracing::error!(error = %e, "replay store unavailable; failing closed");
                return (
                    TokenVerdict::rejection(VerdictResult::Deny, "store_unavailable"),
                    kid,
                );
            }
        }

        // 9. Subject status (cached oracle). Fail closed on oracle errors.
        match self.oracle.status(&claims.sub) {
            Ok(status) if status.is_active() => {}
            Ok(_) => {
                return (
                    TokenVerdict {
                        result: VerdictResult::Deny,
                        sub: Some(claims.sub.clone()),
                        allowed_until: Some(expires_at),
                        error: Some("user_inactive".to_string()),
                    },
                    kid,
                )
            }
            Err(e) => {
                tracing::error!(error = %e, "status resolution failed; failing closed");
                return (
                    TokenVerdict::rejection(VerdictResult::Deny, "store_unavailable"),
                    kid,
                );
            }
        }

        // 10. Success.
        (
            TokenVerdict {
                result: VerdictResult::Allow,
                sub: Some(claims.sub.clone()),
                allowed_until: Some(expires_at),
                error: None,
            },
            kid,
        )
    }
}
