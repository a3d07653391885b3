// accounts/src/password.rs

//! One-way password digests (Argon2, PHC string format).

use crate::error::{AccountsError, AccountsResult};
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use tracing::{debug, error, instrument};

/// Hashes `password` with a fresh random salt.
#[instrument(name = "password::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> AccountsResult<String> {
  if password.is_empty() {
    return Err(AccountsError::PasswordHash(
      "password cannot be empty for hashing".to_string(),
    ));
  }

  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(digest) => {
      debug!("Password hashed.");
      Ok(digest.to_string())
    }
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AccountsError::PasswordHash(argon_err.to_string()))
    }
  }
}

/// Verifies `attempt` against a stored digest.
///
/// A mismatch is `Ok(false)`. An unparsable digest is an error: it means the
/// stored row is corrupt, not that the caller typed the wrong password.
#[instrument(name = "password::verify_password", skip_all, err(Display), fields(digest_len = digest.len()))]
pub fn verify_password(digest: &str, attempt: &str) -> AccountsResult<bool> {
  let parsed = PasswordHash::new(digest).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password digest.");
    AccountsError::PasswordHash(format!("invalid stored password digest: {}", parse_err))
  })?;

  match Argon2::default().verify_password(attempt.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: digests do not match.");
      Ok(false)
    }
    Err(other) => {
      error!(error = %other, "Argon2 password verification encountered an error.");
      Err(AccountsError::PasswordHash(other.to_string()))
    }
  }
}
