//! Gatepass configuration.

/// Configuration for grant issuance and validation.
///
/// Constructed explicitly by the embedding service and passed in; the
/// library never reads the environment itself.
#[derive(Debug, Clone)]
pub struct GatepassConfig {
    /// Issuer identifier placed in the `iss` claim (e.g., "gatepass").
    pub issuer: String,

    /// The single scope string granted for gate entry.
    pub scope: String,

    /// Default grant lifetime in seconds when the caller does not specify one.
    pub default_ttl_secs: u64,

    /// Minimum grant lifetime a caller may request.
    pub min_ttl_secs: u64,

    /// Maximum grant lifetime a caller may request.
    pub max_ttl_secs: u64,

    /// Clock tolerance applied to `exp`/`nbf` checks on the signed path.
    pub clock_tolerance_secs: u64,

    /// Debounce window for same-device re-scans, in milliseconds.
    /// Zero disables the debounce path entirely.
    pub debounce_window_ms: u64,

    /// Allow a code to be resolved more than once.
    /// Non-production testing only; rejected by `validate()` in production.
    pub allow_code_reuse: bool,

    /// Production mode. Disables ephemeral key generation and code reuse.
    pub production: bool,

    /// Ed25519 signing seed, hex-encoded (64 characters).
    ///
    /// When absent in a non-production configuration an ephemeral keypair
    /// is generated at startup with a loud warning. In production the
    /// seed is required.
    pub signing_seed_hex: Option<String>,

    /// TTL for cached subject-status lookups, in seconds.
    pub status_cache_ttl_secs: u64,
}

impl Default for GatepassConfig {
    fn default() -> Self {
        Self {
            issuer: "gatepass".to_string(),
            scope: "gate:entry".to_string(),
            default_ttl_secs: 300,
            min_ttl_secs: 60,
            max_ttl_secs: 600,
            clock_tolerance_secs: 30,
            debounce_window_ms: 1000,
            allow_code_reuse: false,
            production: true,
            signing_seed_hex: None,
            status_cache_ttl_secs: 3600,
        }
    }
}

impl GatepassConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::GatepassError> {
        if self.issuer.is_empty() {
            return Err(crate::GatepassError::ConfigError(
                "issuer cannot be empty".to_string(),
            ));
        }
        if self.scope.is_empty() {
            return Err(crate::GatepassError::ConfigError(
                "scope cannot be empty".to_string(),
            ));
        }
        if self.min_ttl_secs == 0 || self.min_ttl_secs > self.max_ttl_secs {
            return Err(crate::GatepassError::ConfigError(format!(
                "invalid TTL bounds: {}-{}",
                self.min_ttl_secs, self.max_ttl_secs
            )));
        }
        if self.default_ttl_secs < self.min_ttl_secs || self.default_ttl_secs > self.max_ttl_secs {
            return Err(crate::GatepassError::ConfigError(format!(
                "default TTL {}s outside bounds {}-{}",
                self.default_ttl_secs, self.min_ttl_secs, self.max_ttl_secs
            )));
        }
        if let Some(ref seed) = self.signing_seed_hex {
            if seed.len() != 64 {
                return Err(crate::GatepassError::ConfigError(format!(
                    "signing_seed_hex must be 64 hex characters, got {}",
                    seed.len()
                )));
            }
        }
        if self.allow_code_reuse && self.production {
            return Err(crate::GatepassError::ConfigError(
                "allow_code_reuse must not be enabled in production".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatepassError;

    #[test]
    fn default_config_is_valid_with_seed() {
        let config = GatepassConfig {
            signing_seed_hex: Some("a".repeat(64)),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_issuer_rejected() {
        let config = GatepassConfig {
            issuer: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GatepassError::ConfigError(_))
        ));
    }

    #[test]
    fn inverted_ttl_bounds_rejected() {
        let config = GatepassConfig {
            min_ttl_secs: 600,
            max_ttl_secs: 60,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_ttl_outside_bounds_rejected() {
        let config = GatepassConfig {
            default_ttl_secs: 30,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn short_seed_rejected() {
        let config = GatepassConfig {
            signing_seed_hex: Some("abcd".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn code_reuse_in_production_rejected() {
        let config = GatepassConfig {
            allow_code_reuse: true,
            production: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn code_reuse_outside_production_allowed() {
        let config = GatepassConfig {
            allow_code_reuse: true,
            production: false,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
