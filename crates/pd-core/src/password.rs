use thiserror::Error;

/// Work factor used by [`hash_password`].
pub const DEFAULT_COST: u32 = 12;

/// bcrypt only consumes the first 72 bytes of its input.
const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Hashing failed: {0}")]
    HashFailed(String),
    #[error("Password exceeds 72 bytes")]
    TooLong,
    #[error("Invalid hash format")]
    InvalidFormat,
}

/// Hash a password with bcrypt and a freshly generated salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hash a password with an explicit bcrypt cost (4..=31).
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, PasswordError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong);
    }

    bcrypt::hash(password, cost).map_err(|e| PasswordError::HashFailed(e.to_string()))
}

/// Verify a password against a bcrypt hash.
///
/// Returns `Ok(false)` on mismatch and `Err(InvalidFormat)` when `hash` is not
/// a bcrypt hash at all.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }

    bcrypt::verify(password, hash).map_err(|_| PasswordError::InvalidFormat)
}

/// Check that `password` matches `hashed_password`.
///
/// Malformed hashes never validate.
pub fn is_valid(hashed_password: &str, password: &str) -> bool {
    verify_password(password, hashed_password).unwrap_or(false)
}
