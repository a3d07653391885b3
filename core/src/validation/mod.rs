// accounts/src/validation/mod.rs

//! Validation failures and the rule set run against a `UserChangeset`.

pub mod email;
pub mod rules;

use serde::Serialize;
use std::fmt;

pub use email::{is_valid_email, MAX_ADDRESS_LEN};
pub use rules::{email_uniqueness, validate_changeset, Rule, NAME_MAX_LEN, PASSWORD_MIN_LEN, RULES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
  Name,
  Email,
  Password,
  PasswordConfirmation,
}

impl Field {
  pub fn as_str(self) -> &'static str {
    match self {
      Field::Name => "name",
      Field::Email => "email",
      Field::Password => "password",
      Field::PasswordConfirmation => "password_confirmation",
    }
  }

  fn human(self) -> &'static str {
    match self {
      Field::Name => "Name",
      Field::Email => "Email",
      Field::Password => "Password",
      Field::PasswordConfirmation => "Password confirmation",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ErrorKind {
  Blank,
  TooLong { max: usize },
  TooShort { min: usize },
  Invalid,
  Taken,
  Confirmation,
}

impl ErrorKind {
  pub fn message(&self) -> String {
    match self {
      ErrorKind::Blank => "can't be blank".to_string(),
      ErrorKind::TooLong { max } => format!("is too long (maximum is {} characters)", max),
      ErrorKind::TooShort { min } => format!("is too short (minimum is {} characters)", min),
      ErrorKind::Invalid => "is invalid".to_string(),
      ErrorKind::Taken => "has already been taken".to_string(),
      ErrorKind::Confirmation => "doesn't match Password".to_string(),
    }
  }
}

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
  pub field: Field,
  #[serde(flatten)]
  pub kind: ErrorKind,
}

impl ValidationError {
  pub fn new(field: Field, kind: ErrorKind) -> Self {
    Self { field, kind }
  }

  /// e.g. "Email has already been taken"
  pub fn full_message(&self) -> String {
    format!("{} {}", self.field.human(), self.kind.message())
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.full_message())
  }
}

/// Every failure collected for one candidate record, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, error: ValidationError) {
    self.0.push(error);
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
    self.0.iter()
  }

  /// Failure kinds recorded against `field`.
  pub fn on(&self, field: Field) -> Vec<ErrorKind> {
    self.0.iter().filter(|e| e.field == field).map(|e| e.kind).collect()
  }

  pub fn contains(&self, field: Field, kind: ErrorKind) -> bool {
    self.0.iter().any(|e| e.field == field && e.kind == kind)
  }

  pub fn full_messages(&self) -> Vec<String> {
    self.0.iter().map(ValidationError::full_message).collect()
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.full_messages().join("; "))
  }
}

impl FromIterator<ValidationError> for ValidationErrors {
  fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
    ValidationErrors(iter.into_iter().collect())
  }
}

impl Extend<ValidationError> for ValidationErrors {
  fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, iter: I) {
    self.0.extend(iter);
  }
}

impl IntoIterator for ValidationErrors {
  type Item = ValidationError;
  type IntoIter = std::vec::IntoIter<ValidationError>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}

impl<'a> IntoIterator for &'a ValidationErrors {
  type Item = &'a ValidationError;
  type IntoIter = std::slice::Iter<'a, ValidationError>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}
