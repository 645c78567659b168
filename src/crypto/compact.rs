//! Compact signed-token codec.
//!
//! Wire format: `b64url(header) . b64url(claims) . b64url(signature)`
//! with no padding. The header names the algorithm and the `kid` of the
//! signing key; the signature covers the first two segments verbatim.
//!
//! Decoding and verification are deliberately separate steps: the
//! validator pins the algorithm and key identifier from the decoded
//! header BEFORE any signature math runs.

use crate::grant::GrantClaims;
use crate::keys::KeyPair;
use crate::GatepassError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Token header naming the signing algorithm and key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    /// Algorithm wire tag (must equal the service allow-list entry).
    pub alg: String,

    /// Identifier of the key that produced the signature.
    pub kid: String,
}

/// A structurally decoded token, signature not yet verified.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    /// Decoded header.
    pub header: Header,

    /// Decoded claim set.
    pub claims: GrantClaims,

    /// The exact bytes the signature covers (`header.claims`).
    pub signed_input: String,

    /// Base64url-encoded signature segment.
    pub signature_b64: String,
}

/// Encode and sign a claim set into a compact token.
pub fn sign_compact(claims: &GrantClaims, pair: &KeyPair) -> Result<String, GatepassError> {
    let header = Header {
        alg: pair.algorithm.wire_tag().to_string(),
        kid: pair.kid.clone(),
    };
    let header_b64 = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&header)
            .map_err(|e| GatepassError::CodecError(format!("Failed to encode header: {}", e)))?,
    );
    let claims_b64 = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(claims)
            .map_err(|e| GatepassError::CodecError(format!("Failed to encode claims: {}", e)))?,
    );
    let signed_input = format!("{}.{}", header_b64, claims_b64);
    let signature = pair.sign(signed_input.as_bytes());
    Ok(format!(
        "{}.{}",
        signed_input,
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}

/// Decode a compact token without verifying its signature.
pub fn decode_unverified(token: &str) -> Result<DecodedToken, GatepassError> {
    let mut segments = token.split('.');
    let (header_b64, claims_b64, signature_b64) =
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(h), Some(c), Some(s), None) if !h.is_empty() && !c.is_empty() && !s.is_empty() => {
                (h, c, s)
            }
            _ => {
                return Err(GatepassError::CodecError(
                    "Token must have exactly three segments".to_string(),
                ))
            }
        };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|e| GatepassError::CodecError(format!("Invalid header base64: {}", e)))?;
    let header: Header = serde_json::from_slice(&header_bytes)
        .map_err(|e| GatepassError::CodecError(format!("Invalid header JSON: {}", e)))?;

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|e| GatepassError::CodecError(format!("Invalid claims base64: {}", e)))?;
    let claims: GrantClaims = serde_json::from_slice(&claims_bytes)
        .map_err(|e| GatepassError::CodecError(format!("Invalid claims JSON: {}", e)))?;

    Ok(DecodedToken {
        header,
        claims,
        signed_input: format!("{}.{}", header_b64, claims_b64),
        signature_b64: signature_b64.to_string(),
    })
}

/// Verify an Ed25519 signature over the signed input.
pub fn verify_signature(
    signed_input: &str,
    signature_b64: &str,
    verifying_key: &VerifyingKey,
) -> Result<(), GatepassError> {
    let sig_bytes = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|e| GatepassError::CodecError(format!("Invalid signature base64: {}", e)))?;

    let sig_array: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| GatepassError::SignatureInvalid)?;

    let signature = Signature::from_bytes(&sig_array);

    verifying_key
        .verify(signed_input.as_bytes(), &signature)
        .map_err(|_| GatepassError::SignatureInvalid)?;

    Ok(())
}
