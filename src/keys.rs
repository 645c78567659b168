//! Signing-key management: the active keypair, its identifier, and rotation.
//!
//! The manager is an explicitly constructed value injected into the issuer
//! and validator, never a process global. Rotation swaps the current pair
//! atomically; grants signed under the retired `kid` become unverifiable
//! immediately (no grace window).

use crate::config::GatepassConfig;
use crate::crypto::digest::sha256_hex;
use crate::GatepassError;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use std::sync::RwLock;

/// The single signature algorithm this service accepts.
///
/// An allow-list of exactly one tag; anything else in a token header
/// (including "none") is rejected outright.
pub const ALLOWED_ALGORITHM: &str = "EdDSA";

/// Signature algorithm tag attached to each keypair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// Ed25519 over the compact signed input.
    Ed25519,
}

impl SignatureAlgorithm {
    /// Wire tag placed in token headers.
    pub fn wire_tag(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Ed25519 => ALLOWED_ALGORITHM,
        }
    }
}

/// An asymmetric keypair plus its identifier and algorithm tag.
#[derive(Clone)]
pub struct KeyPair {
    /// Key identifier derived from the verifying key.
    pub kid: String,

    /// Algorithm this pair signs with.
    pub algorithm: SignatureAlgorithm,

    signing: SigningKey,
    verifying: VerifyingKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never expose key bytes through Debug
        f.debug_struct("KeyPair")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl KeyPair {
    /// Build a keypair from an Ed25519 seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(&seed);
        Self::from_signing_key(signing)
    }

    /// Parse a hex-encoded 32-byte Ed25519 seed.
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self, GatepassError> {
        let bytes = hex::decode(seed_hex)
            .map_err(|e| GatepassError::KeyInvalid(format!("Invalid seed hex: {}", e)))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| GatepassError::KeyInvalid("Seed must be 32 bytes".to_string()))?;
        Ok(Self::from_seed(seed))
    }

    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        let signing = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing)
    }

    fn from_signing_key(signing: SigningKey) -> Self {
        let verifying = signing.verifying_key();
        let kid = derive_kid(&verifying);
        Self {
            kid,
            algorithm: SignatureAlgorithm::Ed25519,
            signing,
            verifying,
        }
    }

    /// Sign a message with this pair.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing.sign(message)
    }

    /// The verification half of this pair.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying
    }

    /// Confirm the pair is structurally usable as both signing and
    /// verification material by round-tripping a probe signature.
    pub fn is_usable(&self) -> bool {
        let probe = b"gatepass-key-probe";
        let sig = self.signing.sign(probe);
        self.verifying.verify(probe, &sig).is_ok()
    }
}

/// Derive a key identifier from the verifying key.
///
/// First 8 bytes of SHA-256 over the raw public key, hex-encoded.
fn derive_kid(verifying: &VerifyingKey) -> String {
    let digest = sha256_hex(verifying.as_bytes());
    digest[..16].to_string()
}

/// Owns the current signing keypair and supports rotation.
pub struct KeyManager {
    current: RwLock<Option<KeyPair>>,
}

impl KeyManager {
    /// Load key material per configuration.
    ///
    /// A configured seed is parsed and becomes the current pair. Without a
    /// seed, production configurations fail with `NoKeyAvailable`;
    /// non-production configurations generate an ephemeral pair and warn.
    pub fn from_config(config: &GatepassConfig) -> Result<Self, GatepassError> {
        let pair = match config.signing_seed_hex {
            Some(ref seed_hex) => KeyPair::from_seed_hex(seed_hex)?,
            None if config.production => return Err(GatepassError::NoKeyAvailable),
            None => {
                let pair = KeyPair::generate();
                tracing::warn!(
                    kid = %pair.kid,
                    "no signing seed configured; generated EPHEMERAL keypair - \
                     all grants become unverifiable on restart"
                );
                pair
            }
        };
        if !pair.is_usable() {
            return Err(GatepassError::KeyInvalid(
                "configured keypair failed sign/verify probe".to_string(),
            ));
        }
        Ok(Self {
            current: RwLock::new(Some(pair)),
        })
    }

    /// Build a manager around an existing pair (tests, embedded setups).
    pub fn with_pair(pair: KeyPair) -> Self {
        Self {
            current: RwLock::new(Some(pair)),
        }
    }

    /// The active keypair.
    pub fn current(&self) -> Result<KeyPair, GatepassError> {
        let guard = self
            .current
            .read()
            .map_err(|_| GatepassError::KeyInvalid("key lock poisoned".to_string()))?;
        guard.clone().ok_or(GatepassError::NoKeyAvailable)
    }

    /// Generate a new keypair and make it current.
    ///
    /// Side effect: grants signed under the previous `kid` are
    /// unverifiable from this moment on. The rotation is recorded for
    /// audit with both identifiers.
    pub fn rotate(&self) -> Result<KeyPair, GatepassError> {
        let fresh = KeyPair::generate();
        let mut guard = self
            .current
            .write()
            .map_err(|_| GatepassError::KeyInvalid("key lock poisoned".to_string()))?;
        let old_kid = guard.as_ref().map(|p| p.kid.clone());
        tracing::info!(
            old_kid = old_kid.as_deref().unwrap_or("none"),
            new_kid = %fresh.kid,
            algorithm = fresh.algorithm.wire_tag(),
            "signing key rotated"
        );
        *guard = Some(fresh.clone());
        Ok(fresh)
    }

    /// Confirm the current keypair is structurally usable.
    pub fn validate(&self) -> bool {
        self.current.read().ok().and_then(|g| g.clone()).is_some_and(|p| p.is_usable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known Ed25519 test vector seed (DO NOT USE IN PRODUCTION)
    const TEST_SEED_HEX: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn non_production_config() -> GatepassConfig {
        GatepassConfig {
            production: false,
            ..Default::default()
        }
    }

    #[test]
    fn keypair_from_seed_hex_signs_and_verifies() {
        let pair = KeyPair::from_seed_hex(TEST_SEED_HEX).unwrap();
        assert!(pair.is_usable());
        let sig = pair.sign(b"message");
        assert!(pair.verifying_key().verify(b"message", &sig).is_ok());
    }

    #[test]
    fn keypair_seed_is_deterministic() {
        let a = KeyPair::from_seed_hex(TEST_SEED_HEX).unwrap();
        let b = KeyPair::from_seed_hex(TEST_SEED_HEX).unwrap();
        assert_eq!(a.kid, b.kid);
    }

    #[test]
    fn keypair_invalid_seed_hex_rejected() {
        assert!(matches!(
            KeyPair::from_seed_hex("not hex"),
            Err(GatepassError::KeyInvalid(_))
        ));
        assert!(matches!(
            KeyPair::from_seed_hex("abcd"),
            Err(GatepassError::KeyInvalid(_))
        ));
    }

    #[test]
    fn kid_is_16_hex_chars() {
        let pair = KeyPair::generate();
        assert_eq!(pair.kid.len(), 16);
        assert!(pair.kid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn manager_from_config_with_seed() {
        let config = GatepassConfig {
            signing_seed_hex: Some(TEST_SEED_HEX.to_string()),
            ..Default::default()
        };
        let manager = KeyManager::from_config(&config).unwrap();
        assert!(manager.validate());
    }

    #[test]
    fn manager_production_without_seed_fails() {
        let config = GatepassConfig::default();
        assert!(matches!(
            KeyManager::from_config(&config),
            Err(GatepassError::NoKeyAvailable)
        ));
    }

    #[test]
    fn manager_non_production_generates_ephemeral() {
        let manager = KeyManager::from_config(&non_production_config()).unwrap();
        assert!(manager.current().is_ok());
    }

    #[test]
    fn rotation_changes_kid() {
        let manager = KeyManager::from_config(&non_production_config()).unwrap();
        let before = manager.current().unwrap();
        let after = manager.rotate().unwrap();
        assert_ne!(before.kid, after.kid);
        assert_eq!(manager.current().unwrap().kid, after.kid);
    }

    #[test]
    fn old_signature_fails_under_rotated_key() {
        let manager = KeyManager::from_config(&non_production_config()).unwrap();
        let old = manager.current().unwrap();
        let sig = old.sign(b"grant");
        manager.rotate().unwrap();
        let current = manager.current().unwrap();
        assert!(current.verifying_key().verify(b"grant", &sig).is_err());
    }

    #[test]
    fn debug_does_not_leak_key_bytes() {
        let pair = KeyPair::from_seed_hex(TEST_SEED_HEX).unwrap();
        let rendered = format!("{:?}", pair);
        assert!(rendered.contains(&pair.kid));
        assert!(!rendered.contains("9d61b19d"));
    }
}
