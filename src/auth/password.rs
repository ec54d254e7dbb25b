use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::thread_rng;

use crate::services::IdentityError;

pub fn check_policy(password: &str, min_len: usize) -> Result<(), IdentityError> {
    if password.chars().count() < min_len {
        return Err(IdentityError::PasswordTooShort { min_len });
    }
    Ok(())
}

/// Argon2id with a fresh random salt. CPU-heavy; call from a blocking thread.
pub fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| IdentityError::Internal(format!("password hashing failed: {err}")))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, IdentityError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| IdentityError::Internal(format!("stored password hash is invalid: {err}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
