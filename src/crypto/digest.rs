//! SHA-256 digest helpers.
//!
//! Used for key-identifier derivation, opaque-code derivation, and the
//! one-way fingerprints written to audit records in place of raw grants.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 of `data` and return it hex-encoded.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    hex::encode(hash)
}

/// One-way fingerprint of a presented token or code for audit records.
///
/// The raw value must never reach the audit log; the fingerprint is enough
/// to correlate repeated presentations of the same grant.
pub fn fingerprint(presented: &str) -> String {
    sha256_hex(presented.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_known_vector() {
        // SHA-256 of the empty string
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn fingerprint_is_stable_and_distinct() {
        let a = fingerprint("CODE-AAAA");
        let b = fingerprint("CODE-AAAA");
        let c = fingerprint("CODE-BBBB");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn fingerprint_does_not_contain_input() {
        let fp = fingerprint("SECRET-TOKEN-VALUE");
        assert!(!fp.contains("SECRET"));
    }
}
