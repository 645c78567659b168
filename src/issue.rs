//! Grant issuance: the signed and opaque variants.
//!
//! Both entry points share two invariants: every grant carries a globally
//! unique `jti` and the fixed entry scope, and the subject's status is
//! confirmed active before anything is minted. Issuing for an inactive or
//! unknown subject is a hard error, never a soft one.

use crate::clock::Clock;
use crate::config::GatepassConfig;
use crate::crypto::compact::sign_compact;
use crate::grant::{derive_code, CodeClaims, GrantClaims};
use crate::keys::KeyManager;
use crate::protocol::{OpaqueGrant, SignedGrant};
use crate::status::UserStatusOracle;
use crate::store::{code_key, ReplayStore, REPLAY_MARGIN};
use crate::GatepassError;
use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// How long before expiry a client should refresh its signed grant, so a
/// replacement is in hand before the current one goes stale at the gate.
const REFRESH_LEAD_SECS: i64 = 15;

/// Mints signed tokens and opaque codes.
pub struct TokenIssuer {
    config: GatepassConfig,
    keys: Arc<KeyManager>,
    store: Arc<dyn ReplayStore>,
    oracle: Arc<dyn UserStatusOracle>,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// Build an issuer from its collaborators.
    pub fn new(
        config: GatepassConfig,
        keys: Arc<KeyManager>,
        store: Arc<dyn ReplayStore>,
        oracle: Arc<dyn UserStatusOracle>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            keys,
            store,
            oracle,
            clock,
        }
    }

    /// Issue a self-contained signed grant, verifiable offline.
    ///
    /// # Errors
    /// - `InvalidTtl` - requested lifetime outside the configured bounds
    /// - `SubjectInactive` - the subject is not currently active
    /// - `NoKeyAvailable` - no signing key is configured
    pub fn issue_signed(
        &self,
        subject: &str,
        audience: Option<&str>,
        ttl_seconds: Option<u64>,
    ) -> Result<SignedGrant, GatepassError> {
        let ttl = self.bounded_ttl(ttl_seconds)?;
        self.require_active(subject)?;

        let pair = self.keys.current()?;
        let now = self.clock.now_utc();
        let exp = now + ChronoDuration::seconds(ttl as i64);

        let claims = GrantClaims {
            iss: self.config.issuer.clone(),
            sub: subject.to_string(),
            scope: self.config.scope.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: exp.timestamp(),
            aud: audience.map(str::to_string),
            jti: Uuid::new_v4().to_string(),
        };
        let token = sign_compact(&claims, &pair)?;

        tracing::debug!(subject, kid = %pair.kid, ttl, "issued signed grant");

        Ok(SignedGrant {
            token,
            exp,
            kid: pair.kid,
            server_time: now,
            refresh_at: exp - ChronoDuration::seconds(REFRESH_LEAD_SECS),
            ttl_seconds: ttl,
            aud: audience.map(str::to_string),
        })
    }

    /// Issue an opaque code whose claims live only in the shared store.
    ///
    /// Unlike the signed variant the audience is mandatory here: a
    /// gate-less code cannot be revoke-scoped and is not permitted.
    ///
    /// # Errors
    /// - `InvalidAudience` - audience empty or shorter than 2 characters
    /// - `InvalidTtl` - requested lifetime outside the configured bounds
    /// - `SubjectInactive` - the subject is not currently active
    /// - `StoreUnavailable` - the claims record could not be written
    pub fn issue_opaque(
        &self,
        subject: &str,
        audience: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<OpaqueGrant, GatepassError> {
        if audience.chars().count() < 2 {
            return Err(GatepassError::InvalidAudience(format!(
                "audience must be at least 2 characters, got {:?}",
                audience
            )));
        }
        let ttl = self.bounded_ttl(ttl_seconds)?;
        self.require_active(subject)?;

        let now = self.clock.now_utc();
        let exp = now + ChronoDuration::seconds(ttl as i64);

        // The presentable code is derived from the identifier one-way, so
        // holding a code reveals nothing about the grant id behind it.
        let id = Uuid::new_v4();
        let code = derive_code(&id);

        let claims = CodeClaims {
            sub: subject.to_string(),
            aud: audience.to_string(),
            scope: self.config.scope.clone(),
            exp: exp.timestamp(),
            jti: id.to_string(),
            created_at: now.timestamp(),
        };
        let record_ttl = Duration::from_secs(ttl) + REPLAY_MARGIN;
        self.store.put(&code_key(&code), &claims.to_json()?, record_ttl)?;

        tracing::debug!(subject, audience, ttl, "issued opaque grant");

        Ok(OpaqueGrant {
            code,
            expires_at: exp,
            server_now: now,
            ttl_seconds: ttl,
        })
    }

    fn bounded_ttl(&self, requested: Option<u64>) -> Result<u64, GatepassError> {
        let ttl = requested.unwrap_or(self.config.default_ttl_secs);
        if ttl < self.config.min_ttl_secs || ttl > self.config.max_ttl_secs {
            return Err(GatepassError::InvalidTtl {
                requested: ttl,
                min: self.config.min_ttl_secs,
                max: self.config.max_ttl_secs,
            });
        }
        Ok(ttl)
    }

    fn require_active(&self, subject: &str) -> Result<(), GatepassError> {
        let status = self.oracle.status(subject)?;
        if !status.is_active() {
            return Err(GatepassError::SubjectInactive {
                subject: subject.to_string(),
                status: status.as_str().to_string(),
            });
        }
        Ok(())
    }
}
