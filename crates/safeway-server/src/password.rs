//! Password hashing and credential validation.
//!
//! Hashes are Argon2id PHC strings carrying their own random salt and
//! parameters. The server-wide pepper is keyed in as the Argon2 secret and
//! never stored.

use std::sync::LazyLock;

use argon2::password_hash::{
    self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex")
});

fn argon2(pepper: &str) -> Result<Argon2<'_>, password_hash::Error> {
    Ok(Argon2::new_with_secret(
        pepper.as_bytes(),
        Algorithm::Argon2id,
        Version::V0x13,
        Params::default(),
    )?)
}

/// Hashes `password` under a fresh salt. CPU-bound; call from a blocking
/// task.
///
/// # Errors
///
/// Returns [`password_hash::Error`] if the pepper is rejected as an Argon2
/// secret or hashing fails.
pub fn hash_password(password: &str, pepper: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(argon2(pepper)?
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// `false` for a wrong password, a different pepper, or a malformed hash.
#[must_use]
pub fn verify_password(password: &str, pepper: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    argon2(pepper).is_ok_and(|a| a.verify_password(password.as_bytes(), &parsed).is_ok())
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[must_use]
pub fn is_acceptable_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_an_argon2id_phc_string() {
        let stored = hash_password("hunter22", "pepper").expect("hash");
        assert!(stored.starts_with("$argon2id$v=19$"), "got {stored}");
        assert!(!stored.contains("hunter22"));
    }

    #[test]
    fn each_hash_gets_its_own_salt() {
        let a = hash_password("hunter22", "pepper").expect("hash");
        let b = hash_password("hunter22", "pepper").expect("hash");
        assert_ne!(a, b);
        assert!(verify_password("hunter22", "pepper", &a));
        assert!(verify_password("hunter22", "pepper", &b));
    }

    #[test]
    fn verify_accepts_only_the_right_password() {
        let stored = hash_password("correct horse", "pepper").expect("hash");
        assert!(verify_password("correct horse", "pepper", &stored));
        assert!(!verify_password("wrong horse", "pepper", &stored));
    }

    #[test]
    fn a_different_pepper_fails_verification() {
        let stored = hash_password("correct horse", "pepper").expect("hash");
        assert!(!verify_password("correct horse", "other-pepper", &stored));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("correct horse", "pepper", "short"));
        assert!(!verify_password("correct horse", "pepper", ""));
        let legacy_hex = "a".repeat(64);
        assert!(!verify_password("correct horse", "pepper", &legacy_hex));
    }

    #[test]
    fn email_and_password_rules() {
        assert!(is_valid_email("walker@example.com"));
        assert!(!is_valid_email("walker@example"));
        assert!(!is_valid_email("walker example.com"));
        assert!(is_acceptable_password("123456"));
        assert!(!is_acceptable_password("12345"));
    }
}
