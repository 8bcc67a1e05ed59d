use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;

use crate::errors::AppError;

const MIN_PASSWORD_LENGTH: usize = 8;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::bad_request(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::internal(format!("failed to hash password: {err}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|err| AppError::internal(format!("invalid password hash: {err}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Validate a percentage field supplied by a caller.
pub fn ensure_percentage(value: f64, field: &str) -> Result<(), AppError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(AppError::bad_request(format!("{field} must be between 0 and 100")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_bounds() {
        assert!(ensure_percentage(0.0, "progress").is_ok());
        assert!(ensure_percentage(100.0, "progress").is_ok());
        assert!(ensure_percentage(-0.1, "progress").is_err());
        assert!(ensure_percentage(100.5, "progress").is_err());
    }

    #[test]
    fn short_password_rejected() {
        assert!(hash_password("short").is_err());
    }
}
