// accounts_app/src/errors.rs

use accounts::{AccountsError, ValidationErrors};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(ValidationErrors),

  /// Another sign-up claimed the address between our check and our write.
  #[error("Email has already been taken, please try again with another address")]
  EmailTaken,

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("Accounts Error: {source}")]
  Accounts {
    #[from]
    source: AccountsError,
  },

  #[error("I/O Error: {0}")]
  Io(#[from] std::io::Error),
}

impl AppError {
  /// Process exit code for the admin CLI.
  pub fn exit_code(&self) -> i32 {
    match self {
      AppError::Validation(_) | AppError::EmailTaken | AppError::Auth(_) | AppError::NotFound(_) => 1,
      AppError::Config(_) => 78, // EX_CONFIG
      _ => 2,
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
