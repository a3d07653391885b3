// accounts/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

use crate::migration::MigrationError;
use crate::pipeline::PipelineError;
use crate::store::StoreError;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum AccountsError {
  /// Returned only by callers that choose to turn a failed validation into an error;
  /// `Users::save` itself reports validation failures as `SaveOutcome::Invalid`.
  #[error("Validation failed: {0}")]
  Invalid(ValidationErrors),

  #[error("Storage error: {0}")]
  Store(#[from] StoreError),

  #[error("Migration error: {0}")]
  Migration(#[from] MigrationError),

  #[error("Save pipeline error: {0}")]
  Pipeline(#[from] PipelineError),

  #[error("User not found: {0}")]
  NotFound(Uuid),

  #[error("Cannot persist a new user without a password")]
  MissingPassword,

  #[error("Password hashing failed: {0}")]
  PasswordHash(String),

  #[error("Error in pipeline handler or external operation. Source: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for AccountsError {
  fn from(err: AnyhowError) -> Self {
    AccountsError::Handler { source: err }
  }
}

impl AccountsError {
  /// True when the storage layer rejected the write because `email_lower` is already claimed.
  /// Callers treat this as "email taken", not as a fatal error.
  pub fn is_email_taken(&self) -> bool {
    matches!(self, AccountsError::Store(store_err) if store_err.is_email_lower_violation())
  }
}

pub type AccountsResult<T, E = AccountsError> = std::result::Result<T, E>;
