//! Password hashing
//!
//! Credentials are hashed with Argon2id and a per-password random salt,
//! stored in PHC string format. The plaintext is consumed on the way in and
//! can only ever be checked, never read back: the module exposes exactly
//! `hash_password` and `verify_password`, nothing that returns a password.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password with Argon2id and a fresh random salt.
///
/// Returns the PHC string (algorithm, parameters, salt and hash).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash string.
///
/// Returns `false` on mismatch; an error only when the stored hash itself
/// is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))
        .context("Failed to parse password hash")?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e))
            .context("Password verification error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id_phc() {
        let hash = hash_password("hunter2").expect("Failed to hash password");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let a = hash_password("hunter2").expect("Failed to hash password");
        let b = hash_password("hunter2").expect("Failed to hash password");
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_correct_password() {
        let hash = hash_password("hunter2").expect("Failed to hash password");
        assert!(verify_password("hunter2", &hash).expect("Verification errored"));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("hunter2").expect("Failed to hash password");
        assert!(!verify_password("*******", &hash).expect("Verification errored"));
    }

    #[test]
    fn test_verify_malformed_hash_is_error() {
        assert!(verify_password("hunter2", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_hash_does_not_contain_password() {
        let hash = hash_password("somelongpassword").expect("Failed to hash password");
        assert!(!hash.contains("somelongpassword"));
    }
}
