// accounts/src/store/mod.rs

//! The storage seam. `Users` only ever talks to an injected `UserStore`.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::user::User;

pub use memory::MemoryUserStore;

/// Name of the unique index over `users.email_lower`.
pub const EMAIL_LOWER_INDEX: &str = "index_users_on_email_lower";
/// Name of the primary-key constraint of `users`.
pub const PRIMARY_KEY: &str = "users_pkey";

#[derive(Debug, Error)]
pub enum StoreError {
  /// A unique index rejected the write. Nothing was written.
  #[error("Unique constraint '{index}' violated")]
  UniqueViolation { index: String },

  #[error("Row not found: {0}")]
  RowNotFound(Uuid),

  #[error("Storage backend error: {source}")]
  Backend {
    #[source]
    source: anyhow::Error,
  },
}

impl StoreError {
  pub fn is_email_lower_violation(&self) -> bool {
    matches!(self, StoreError::UniqueViolation { index } if index == EMAIL_LOWER_INDEX)
  }
}

impl From<anyhow::Error> for StoreError {
  fn from(err: anyhow::Error) -> Self {
    StoreError::Backend { source: err }
  }
}

/// Persistence for `users` rows.
///
/// Implementations must enforce the `email_lower` unique index themselves:
/// `insert` and `update` fail with `StoreError::UniqueViolation` rather than
/// write a second row with the same `email_lower`. That check is the backstop
/// for two writers that both passed application validation.
#[async_trait]
pub trait UserStore: Send + Sync {
  async fn insert(&self, user: &User) -> Result<(), StoreError>;

  /// Replaces the row with `user.id`. Fails with `RowNotFound` if there is none.
  async fn update(&self, user: &User) -> Result<(), StoreError>;

  async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError>;

  /// Exact, case-sensitive match on the stored `email`.
  async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

  async fn find_by_email_lower(&self, email_lower: &str) -> Result<Option<User>, StoreError>;

  async fn count(&self) -> Result<u64, StoreError>;
}
