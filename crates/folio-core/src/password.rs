use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 20;

/// Hash a password into an argon2id PHC string.
pub fn hash(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Generic(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored PHC string. Malformed hashes never match.
pub fn verify(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Validate a password change and return the new hash.
///
/// Checks run in a fixed order so the caller always sees the first failing rule.
pub fn change(
    stored_hash: &str,
    current: &str,
    new: &str,
    confirm: &str,
) -> Result<String, AppError> {
    if !verify(current, stored_hash) {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }
    if new != confirm {
        return Err(AppError::BadRequest(
            "New password and confirmation do not match".into(),
        ));
    }
    if new == current {
        return Err(AppError::BadRequest(
            "New password must differ from the current password".into(),
        ));
    }
    let len = new.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(AppError::BadRequest(format!(
            "Password must be {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} characters"
        )));
    }
    hash(new)
}
