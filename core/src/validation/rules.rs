// accounts/src/validation/rules.rs

//! The rule set. Each rule is a pure function that reports at most one failure;
//! `validate_changeset` runs all of them and keeps every failure.
//!
//! A blank value is reported once as `Blank`; the length and format rules stay
//! quiet for blank input.

use super::{is_valid_email, ErrorKind, Field, ValidationError, ValidationErrors};
use crate::user::{User, UserChangeset};

pub const NAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 6;

pub type Rule = fn(&UserChangeset) -> Option<ValidationError>;

pub const RULES: &[Rule] = &[
  name_presence,
  name_length,
  email_presence,
  email_format,
  password_presence,
  password_length,
  password_confirmation_presence,
  password_confirmation_match,
];

/// Runs every rule in `RULES` order. The uniqueness check needs storage and is
/// applied separately through `email_uniqueness`.
pub fn validate_changeset(changeset: &UserChangeset) -> ValidationErrors {
  RULES.iter().filter_map(|rule| rule(changeset)).collect()
}

/// `holder` is whichever persisted record currently owns the changeset's `email_lower`.
pub fn email_uniqueness(changeset: &UserChangeset, holder: Option<&User>) -> Option<ValidationError> {
  match holder {
    Some(other) if Some(other.id) != changeset.id => Some(ValidationError::new(Field::Email, ErrorKind::Taken)),
    _ => None,
  }
}

fn is_blank(value: &str) -> bool {
  value.trim().is_empty()
}

fn is_blank_opt(value: &Option<String>) -> bool {
  value.as_deref().map_or(true, is_blank)
}

fn name_presence(c: &UserChangeset) -> Option<ValidationError> {
  is_blank(&c.name).then(|| ValidationError::new(Field::Name, ErrorKind::Blank))
}

fn name_length(c: &UserChangeset) -> Option<ValidationError> {
  (!is_blank(&c.name) && c.name.chars().count() > NAME_MAX_LEN)
    .then(|| ValidationError::new(Field::Name, ErrorKind::TooLong { max: NAME_MAX_LEN }))
}

fn email_presence(c: &UserChangeset) -> Option<ValidationError> {
  is_blank(&c.email).then(|| ValidationError::new(Field::Email, ErrorKind::Blank))
}

fn email_format(c: &UserChangeset) -> Option<ValidationError> {
  (!is_blank(&c.email) && !is_valid_email(&c.email)).then(|| ValidationError::new(Field::Email, ErrorKind::Invalid))
}

fn password_presence(c: &UserChangeset) -> Option<ValidationError> {
  (c.sets_password() && is_blank_opt(&c.password)).then(|| ValidationError::new(Field::Password, ErrorKind::Blank))
}

fn password_length(c: &UserChangeset) -> Option<ValidationError> {
  if !c.sets_password() || is_blank_opt(&c.password) {
    return None;
  }
  let len = c.password.as_deref().map_or(0, |p| p.chars().count());
  (len < PASSWORD_MIN_LEN).then(|| {
    ValidationError::new(
      Field::Password,
      ErrorKind::TooShort {
        min: PASSWORD_MIN_LEN,
      },
    )
  })
}

fn password_confirmation_presence(c: &UserChangeset) -> Option<ValidationError> {
  (c.sets_password() && is_blank_opt(&c.password_confirmation))
    .then(|| ValidationError::new(Field::PasswordConfirmation, ErrorKind::Blank))
}

fn password_confirmation_match(c: &UserChangeset) -> Option<ValidationError> {
  if !c.sets_password() || is_blank_opt(&c.password_confirmation) {
    return None;
  }
  (c.password != c.password_confirmation)
    .then(|| ValidationError::new(Field::PasswordConfirmation, ErrorKind::Confirmation))
}
