//! Password hashing and verification. The stored credential is an unsalted
//! SHA-256 hex digest, kept compatible with databases written by earlier
//! versions of the application.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash a password to a lowercase hex digest. Deterministic: the same input
/// always produces the same output, which is what lets `verify_password`
/// compare digests directly.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Check a candidate password against a stored digest in constant time.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let hashed = hash_password(password);
    if hashed.len() != stored_hash.len() {
        return false;
    }
    hashed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn hashing_is_deterministic() {
        assert_eq!(hash_password("secret"), hash_password("secret"));
        assert_ne!(hash_password("secret"), hash_password("Secret"));
    }

    #[test]
    fn known_digest_matches() {
        // SHA-256 of the empty string is a fixed, well-known value.
        assert_eq!(
            hash_password(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn verify_accepts_correct_and_rejects_wrong() {
        let stored = hash_password("secret");
        assert!(verify_password("secret", &stored));
        assert!(!verify_password("wrong", &stored));
        assert!(!verify_password("secret", "not-a-digest"));
    }
}
