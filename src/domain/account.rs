//! User accounts: registration rules and password hashing.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use rust_decimal::Decimal;

use super::error::FinanceError;

/// A stored user row.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub cash: Decimal,
}

/// A registration form that passed validation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
}

impl Registration {
    pub fn validate(
        username: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<Self, FinanceError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(FinanceError::validation("Username can't be empty."));
        }
        if password.is_empty() {
            return Err(FinanceError::validation("Password can't be empty"));
        }
        if password != confirmation {
            return Err(FinanceError::validation("Passwords don't match."));
        }
        Ok(Registration {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Hashes a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, FinanceError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| FinanceError::PasswordHash {
            reason: e.to_string(),
        })
}

/// A malformed stored hash verifies as false.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => hasher()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_accepts_matching_passwords() {
        let reg = Registration::validate(" alice ", "hunter2", "hunter2").unwrap();
        assert_eq!(reg.username, "alice");
    }

    #[test]
    fn registration_rejects_empty_username() {
        let err = Registration::validate("", "pw", "pw").unwrap_err();
        assert_eq!(err.to_string(), "Username can't be empty.");
    }

    #[test]
    fn registration_rejects_empty_password() {
        let err = Registration::validate("bob", "", "").unwrap_err();
        assert_eq!(err.to_string(), "Password can't be empty");
    }

    #[test]
    fn registration_rejects_mismatched_confirmation() {
        let err = Registration::validate("bob", "pw1", "pw2").unwrap_err();
        assert_eq!(err.to_string(), "Passwords don't match.");
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
