//! Credential verification: salted Argon2id password hashes.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=19456,t=2,p=1$...`), so
//! the parameters travel with the hash and verification never needs to know
//! which cost settings were current when the hash was produced.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Well-formed hash at the default Argon2id cost that no account owns.
const DECOY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The stored hash is not a parseable PHC string.
    #[error("stored password hash is corrupt: {0}")]
    CorruptHash(String),
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Check `password` against a stored PHC hash.
///
/// Any mismatch is `Ok(false)`. The comparison itself is constant-time inside
/// `argon2`. Only an unparseable stored hash is an error.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| PasswordError::CorruptHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Like [`verify_password`], but with no stored hash the password is checked
/// against a decoy of the same cost and the answer is always `Ok(false)`.
///
/// Login runs this for unknown usernames so they take as long as a wrong
/// password.
pub fn verify_password_or_decoy(password: &str, stored_hash: Option<&str>) -> Result<bool, PasswordError> {
    match stored_hash {
        Some(hash) => verify_password(password, hash),
        None => verify_password(password, DECOY_HASH).map(|_| false),
    }
}
