//! Password hashing
//! Mission: One-way salted hashes; plaintext never reaches storage

use anyhow::{Context, Result};
use tracing::warn;

/// bcrypt wrapper carrying the configured cost factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password. A failure here aborts the write.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        bcrypt::hash(plaintext, self.cost).context("Failed to hash password")
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// A malformed digest is reported as a mismatch so that callers see one
    /// "invalid credentials" outcome.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match bcrypt::verify(plaintext, digest) {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Stored password digest could not be verified: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let digest = hasher.hash("secret1").unwrap();

        assert_ne!(digest, "secret1");
        assert!(hasher.verify("secret1", &digest));
        assert!(!hasher.verify("secret2", &digest));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::new(4);
        let a = hasher.hash("secret1").unwrap();
        let b = hasher.hash("secret1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_digest_is_mismatch() {
        let hasher = PasswordHasher::new(4);
        assert!(!hasher.verify("secret1", "not-a-bcrypt-digest"));
    }
}
