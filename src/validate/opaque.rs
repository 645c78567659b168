//! Opaque-code resolution pipeline.
//!
//! Stage order is load-bearing: expiry is checked before the replay
//! guards so a stale code reports `expired` rather than `replayed`, and
//! the audience check runs before any replay-state mutation so a
//! wrong-gate scan does not burn the grant's one acceptance.

use super::TokenValidator;
use crate::audit::{AccessAttempt, AttemptOutcome};
use crate::crypto::digest::fingerprint;
use crate::grant::CodeClaims;
use crate::protocol::{Decision, DecisionReason, Outcome, ResolveRequest};
use crate::store::{code_key, consumed_key, debounce_key, seen_key, CONSUMED_TTL};
use crate::GatepassError;
use std::time::{Duration, Instant};

impl TokenValidator {
    /// Resolve an opaque code to a terminal gate decision.
    ///
    /// Never returns an error; store outages fail closed as
    /// `denied/store_unavailable`.
    pub fn resolve(&self, request: &ResolveRequest) -> Decision {
        let started = Instant::now();
        let decision = self.resolve_pipeline(request);

        self.log_attempt(AccessAttempt {
            at: self.clock.now_utc(),
            subject: decision.user_id.clone(),
            gate_id: Some(request.audience_declared.clone()),
            outcome: match decision.decision {
                Outcome::Authorized => AttemptOutcome::Authorized,
                Outcome::Denied => AttemptOutcome::Denied,
            },
            reason: decision.reason.map(|r| r.as_str().to_string()),
            grant_fingerprint: fingerprint(&request.code),
            kid: None,
            latency_ms: started.elapsed().as_millis() as i64,
            caller_ip: request.caller_ip.clone(),
            user_agent: request.user_agent.clone(),
        });

        decision
    }

    fn resolve_pipeline(&self, request: &ResolveRequest) -> Decision {
        let now = self.clock.now_utc();

        // 1. Lookup: the store is the source of truth for this variant.
        let stored = match self.store.get(&code_key(&request.code)) {
            Ok(Some(json)) => json,
            Ok(None) => return Decision::denied(DecisionReason::InvalidCode),
            Err(e) => return self.store_down(e),
        };
        let claims = match CodeClaims::from_json(&stored) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::error!(error = %e, "unparseable claims record for presented code");
                return Decision::denied(DecisionReason::InvalidCode);
            }
        };
        let expires_at = claims.expires_at();

        // 2. Expiry wins over every later denial. Consume the code so a
        // borderline-timed double-resolve cannot race into the replay
        // stage with fresher luck.
        if expires_at <= now {
            if let Err(e) = self.store.put(&consumed_key(&request.code), "1", CONSUMED_TTL) {
                tracing::warn!(error = %e, "failed to consume expired code");
            }
            return Decision {
                decision: Outcome::Denied,
                reason: Some(DecisionReason::Expired),
                user_id: Some(claims.sub),
                expires_at: Some(expires_at),
            };
        }

        // 3. Audience, before any replay-state mutation: a scan at the
        // wrong gate must leave the grant usable at the right one.
        if claims.aud != request.audience_declared {
            return Decision {
                decision: Outcome::Denied,
                reason: Some(DecisionReason::WrongAudience),
                user_id: Some(claims.sub),
                expires_at: Some(expires_at),
            };
        }

        let denied = |reason: DecisionReason, sub: &str| Decision {
            decision: Outcome::Denied,
            reason: Some(reason),
            user_id: Some(sub.to_string()),
            expires_at: Some(expires_at),
        };

        // 4. Consumption guard. A collision is a replay unless it is the
        // same device bouncing inside the debounce window.
        let mut repeat = false;
        if !self.config.allow_code_reuse {
            match self
                .store
                .set_if_absent(&consumed_key(&request.code), "1", CONSUMED_TTL)
            {
                Ok(true) => {}
                Ok(false) => {
                    match self.same_device_bounce(request) {
                        Ok(true) => repeat = true,
                        Ok(false) => return denied(DecisionReason::Replayed, &claims.sub),
                        Err(e) => return self.store_down(e),
                    }
                }
                Err(e) => return self.store_down(e),
            }
        }

        // 5. Grant-identity guard: defense in depth against two code
        // strings referencing the same underlying grant.
        match self.store.set_if_absent(
            &seen_key(&claims.jti),
            "1",
            self.replay_ttl(expires_at, now),
        ) {
            Ok(true) => {}
            Ok(false) if repeat || self.config.allow_code_reuse => {}
            Ok(false) => return denied(DecisionReason::Replayed, &claims.sub),
            Err(e) => return self.store_down(e),
        }

        // 6. Subject status (cached oracle). Fail closed on oracle errors.
        match self.oracle.status(&claims.sub) {
            Ok(status) if status.is_active() => {}
            Ok(_) => return denied(DecisionReason::UserInactive, &claims.sub),
            Err(e) => return self.store_down(e),
        }

        // 7. Debounce: a repeat that survived every stage is the same
        // legitimate scan bouncing; a first pass writes the window record.
        if self.config.debounce_window_ms > 0 {
            if repeat {
                return Decision {
                    decision: Outcome::Authorized,
                    reason: Some(DecisionReason::Repeat),
                    user_id: Some(claims.sub),
                    expires_at: Some(expires_at),
                };
            }
            let window = Duration::from_millis(self.config.debounce_window_ms);
            if let Err(e) = self.store.put(
                &debounce_key(&request.device_id, &request.code),
                "1",
                window,
            ) {
                // Losing the debounce record costs a future repeat-accept,
                // never an acceptance it shouldn't grant
                tracing::warn!(error = %e, "failed to write debounce record");
            }
        }

        // 8. Success.
        Decision {
            decision: Outcome::Authorized,
            reason: None,
            user_id: Some(claims.sub),
            expires_at: Some(expires_at),
        }
    }

    fn same_device_bounce(&self, request: &ResolveRequest) -> Result<bool, GatepassError> {
        if self.config.debounce_window_ms == 0 {
            return Ok(false);
        }
        self.store
            .exists(&debounce_key(&request.device_id, &request.code))
    }

    fn store_down(&self, error: GatepassError) -> Decision {
        tracing::error!(error = %error, "replay store unavailable; failing closed");
        Decision::denied(DecisionReason::StoreUnavailable)
    }
}
