// accounts/src/user.rs

//! The persisted `User` record and the `UserChangeset` used to create or change one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::error::AccountsResult;
use crate::password;

/// A persisted user account.
///
/// `email_lower` always equals `normalize_email(&email)` for rows written by
/// `Users::save`; the storage layer keeps a unique index over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  pub email_lower: String,
  #[serde(skip)] // Never expose the digest
  pub password_digest: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl User {
  /// Checks `attempt` against the stored digest with the same one-way hash used at creation.
  /// An empty attempt never matches.
  pub fn authenticate(&self, attempt: &str) -> AccountsResult<bool> {
    if attempt.is_empty() {
      return Ok(false);
    }
    password::verify_password(&self.password_digest, attempt)
  }

  /// Starts a changeset for updating this record. No password is set, so the
  /// password rules stay out of the way unless the caller sets one.
  pub fn changeset(&self) -> UserChangeset {
    UserChangeset {
      id: Some(self.id),
      name: self.name.clone(),
      email: self.email.clone(),
      password: None,
      password_confirmation: None,
    }
  }
}

/// Case folding used for the derived `email_lower` column. ASCII only.
pub fn normalize_email(email: &str) -> String {
  email.to_ascii_lowercase()
}

/// Candidate values for a new or existing user, including the transient
/// password fields that are never persisted.
#[derive(Clone, Default)]
pub struct UserChangeset {
  /// `None` for a record that has not been saved yet.
  pub id: Option<Uuid>,
  pub name: String,
  pub email: String,
  pub password: Option<String>,
  pub password_confirmation: Option<String>,
}

impl UserChangeset {
  pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      email: email.into(),
      ..Default::default()
    }
  }

  pub fn with_password(mut self, password: impl Into<String>, confirmation: impl Into<String>) -> Self {
    self.password = Some(password.into());
    self.password_confirmation = Some(confirmation.into());
    self
  }

  pub fn is_new_record(&self) -> bool {
    self.id.is_none()
  }

  /// New records always need a password; existing ones only when one of the
  /// password fields was touched.
  pub fn sets_password(&self) -> bool {
    self.is_new_record() || self.password.is_some() || self.password_confirmation.is_some()
  }

  pub fn email_lower(&self) -> String {
    normalize_email(&self.email)
  }
}

impl fmt::Debug for UserChangeset {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let redact = |p: &Option<String>| p.as_ref().map(|_| "[REDACTED]");
    f.debug_struct("UserChangeset")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("email", &self.email)
      .field("password", &redact(&self.password))
      .field("password_confirmation", &redact(&self.password_confirmation))
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_email_folds_ascii_case_only() {
    assert_eq!(normalize_email("User@Example.COM"), "user@example.com");
    assert_eq!(normalize_email("ÜSER@example.com"), "Üser@example.com");
  }

  #[test]
  fn debug_output_redacts_passwords() {
    let changeset = UserChangeset::new("Example User", "user@example.com").with_password("foobar", "foobar");
    let rendered = format!("{:?}", changeset);
    assert!(!rendered.contains("foobar"));
    assert!(rendered.contains("[REDACTED]"));
  }

  #[test]
  fn changeset_for_existing_record_does_not_set_password() {
    let now = Utc::now();
    let user = User {
      id: Uuid::new_v4(),
      name: "Example User".into(),
      email: "user@example.com".into(),
      email_lower: "user@example.com".into(),
      password_digest: String::new(),
      created_at: now,
      updated_at: now,
    };
    let changeset = user.changeset();
    assert!(!changeset.is_new_record());
    assert!(!changeset.sets_password());
    assert!(UserChangeset::new("a", "b").sets_password());
  }
}
