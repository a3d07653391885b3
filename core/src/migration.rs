// accounts/src/migration.rs

//! The `add_lowercase_email_to_users` migration.
//!
//! Existing rows are backfilled with `lowercase(email)` before the unique
//! index is switched on, and the whole thing is all-or-nothing: if two legacy
//! rows fold to the same address nothing is written. The Postgres rendition
//! of the same steps lives in the application's `migrations/` directory.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::user::normalize_email;

pub const ADD_LOWERCASE_EMAIL_VERSION: i64 = 20120811145841;
pub const ADD_LOWERCASE_EMAIL_NAME: &str = "add_lowercase_email_to_users";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MigrationError {
  #[error("Rows {first} and {second} both fold to '{email_lower}'; resolve the duplicate before adding the unique index")]
  DuplicateEmailLower {
    email_lower: String,
    first: Uuid,
    second: Uuid,
  },

  #[error("Migration {0} has already been applied")]
  AlreadyApplied(i64),
}

/// A `users` row as it existed before `email_lower` was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyUserRow {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  pub password_digest: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackfillReport {
  pub rows_backfilled: usize,
}

/// Computes `(id, email_lower)` for every row, or the first collision.
///
/// Rows are visited in id order so the reported pair is stable.
#[instrument(name = "migration::plan_email_lower_backfill", skip_all)]
pub fn plan_email_lower_backfill<'a>(
  rows: impl IntoIterator<Item = (Uuid, &'a str)>,
) -> Result<Vec<(Uuid, String)>, MigrationError> {
  let mut rows: Vec<(Uuid, &str)> = rows.into_iter().collect();
  rows.sort_by_key(|(id, _)| *id);

  let mut seen: HashMap<String, Uuid> = HashMap::with_capacity(rows.len());
  let mut plan = Vec::with_capacity(rows.len());
  for (id, email) in rows {
    let email_lower = normalize_email(email);
    if let Some(first) = seen.get(&email_lower) {
      warn!(%email_lower, %first, second = %id, "Legacy rows collide under case folding.");
      return Err(MigrationError::DuplicateEmailLower {
        email_lower,
        first: *first,
        second: id,
      });
    }
    seen.insert(email_lower.clone(), id);
    plan.push((id, email_lower));
  }

  info!(rows = plan.len(), "email_lower backfill planned.");
  Ok(plan)
}
