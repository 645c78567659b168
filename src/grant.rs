//! Grant claims and opaque-code derivation.
//!
//! Two grant variants share one claim vocabulary:
//! - the signed variant embeds [`GrantClaims`] in a compact token,
//! - the opaque variant stores [`CodeClaims`] server-side under a short
//!   code that carries no claims itself.

use crate::crypto::digest::sha256_hex;
use crate::GatepassError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a signed grant (unix-second timestamps on the wire).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantClaims {
    /// Issuer identifier.
    pub iss: String,

    /// Subject (user id) the grant entitles.
    pub sub: String,

    /// Scope string; always the fixed entry-access scope.
    pub scope: String,

    /// Issued-at, unix seconds.
    pub iat: i64,

    /// Not-before, unix seconds.
    pub nbf: i64,

    /// Expiry, unix seconds.
    pub exp: i64,

    /// Bound gate identifier, when the caller requested one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Unique grant identifier used for replay detection.
    pub jti: String,
}

impl GrantClaims {
    /// Expiry as a UTC timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp_utc(self.exp)
    }
}

/// Server-side claims record backing an opaque code.
///
/// The shared store is the source of truth for this variant; the code a
/// client presents is only an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeClaims {
    /// Subject (user id) the grant entitles.
    pub sub: String,

    /// Bound gate identifier (always present for the opaque variant).
    pub aud: String,

    /// Scope string.
    pub scope: String,

    /// Expiry, unix seconds.
    pub exp: i64,

    /// Unique grant identifier used for replay detection.
    pub jti: String,

    /// Creation time, unix seconds.
    pub created_at: i64,
}

impl CodeClaims {
    /// Expiry as a UTC timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp_utc(self.exp)
    }

    /// Serialize for the `code:<code>` store entry.
    pub fn to_json(&self) -> Result<String, GatepassError> {
        serde_json::to_string(self)
            .map_err(|e| GatepassError::CodecError(format!("Failed to serialize claims: {}", e)))
    }

    /// Deserialize a `code:<code>` store entry.
    pub fn from_json(json: &str) -> Result<Self, GatepassError> {
        serde_json::from_str(json)
            .map_err(|e| GatepassError::CodecError(format!("Failed to parse claims: {}", e)))
    }
}

/// Number of leading digest bytes used for the presentable code.
const CODE_DIGEST_BYTES: usize = 5;

/// Derive a short human-typeable code from a fresh random identifier.
///
/// The code is the uppercase hex of the leading SHA-256 bytes of the
/// identifier, so it is not invertible back to the identifier and carries
/// no secret material of its own.
pub fn derive_code(id: &Uuid) -> String {
    let digest = sha256_hex(id.as_bytes());
    digest[..CODE_DIGEST_BYTES * 2].to_uppercase()
}

/// Convert unix seconds to a UTC timestamp, clamping out-of-range values.
pub fn timestamp_utc(secs: i64) -> DateTime<Utc> {
    match Utc.timestamp_opt(secs, 0) {
        chrono::LocalResult::Single(dt) => dt,
        _ => DateTime::<Utc>::MIN_UTC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_code_claims() -> CodeClaims {
        CodeClaims {
            sub: "user-42".to_string(),
            aud: "G1".to_string(),
            scope: "gate:entry".to_string(),
            exp: 1_767_225_900,
            jti: Uuid::new_v4().to_string(),
            created_at: 1_767_225_600,
        }
    }

    #[test]
    fn code_claims_json_roundtrip() {
        let claims = sample_code_claims();
        let json = claims.to_json().unwrap();
        let restored = CodeClaims::from_json(&json).unwrap();
        assert_eq!(restored.sub, claims.sub);
        assert_eq!(restored.aud, claims.aud);
        assert_eq!(restored.exp, claims.exp);
        assert_eq!(restored.jti, claims.jti);
    }

    #[test]
    fn code_claims_malformed_json_rejected() {
        let result = CodeClaims::from_json("{not json");
        assert!(matches!(result, Err(GatepassError::CodecError(_))));
    }

    #[test]
    fn derived_code_shape() {
        let code = derive_code(&Uuid::new_v4());
        assert_eq!(code.len(), 10);
        assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn derived_code_is_deterministic_per_id() {
        let id = Uuid::new_v4();
        assert_eq!(derive_code(&id), derive_code(&id));
        assert_ne!(derive_code(&id), derive_code(&Uuid::new_v4()));
    }

    #[test]
    fn derived_code_differs_from_identifier() {
        let id = Uuid::new_v4();
        let code = derive_code(&id);
        assert!(!id.to_string().to_uppercase().contains(&code));
    }

    #[test]
    fn grant_claims_aud_omitted_when_none() {
        let claims = GrantClaims {
            iss: "gatepass".to_string(),
            sub: "user-1".to_string(),
            scope: "gate:entry".to_string(),
            iat: 100,
            nbf: 100,
            exp: 400,
            aud: None,
            jti: "j-1".to_string(),
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("aud"));
    }

    #[test]
    fn timestamp_utc_roundtrip() {
        let dt = timestamp_utc(1_767_225_600);
        assert_eq!(dt.timestamp(), 1_767_225_600);
    }
}
