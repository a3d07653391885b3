// accounts_app/src/signup.rs

//! The sign-up surface: a form of `name`, `email`, `password` and
//! `password_confirmation` that either adds exactly one user or reports why not.

use crate::errors::{AppError, Result as AppResult};
use accounts::{SaveOutcome, User, UserChangeset, Users};
use std::fmt;
use tracing::{info, instrument, warn};

#[derive(Clone, Default)]
pub struct SignupForm {
  pub name: String,
  pub email: String,
  pub password: String,
  pub password_confirmation: String,
}

impl fmt::Debug for SignupForm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SignupForm")
      .field("name", &self.name)
      .field("email", &self.email)
      .finish_non_exhaustive()
  }
}

impl From<SignupForm> for UserChangeset {
  fn from(form: SignupForm) -> Self {
    UserChangeset::new(form.name, form.email).with_password(form.password, form.password_confirmation)
  }
}

/// Creates the account described by `form`.
///
/// Validation failures come back as `AppError::Validation` with every failed
/// rule. Losing a race to a concurrent sign-up for the same address surfaces
/// as `AppError::EmailTaken`.
#[instrument(skip(users, form), fields(email = %form.email))]
pub async fn sign_up(users: &Users, form: SignupForm) -> AppResult<User> {
  match users.create(form.into()).await {
    Ok(SaveOutcome::Saved(user)) => {
      info!(user_id = %user.id, "User signed up.");
      Ok(user)
    }
    Ok(SaveOutcome::Invalid(errors)) => {
      warn!(errors = %errors, "Sign-up rejected.");
      Err(AppError::Validation(errors))
    }
    Err(err) if err.is_email_taken() => {
      warn!("Sign-up lost a race for the same email.");
      Err(AppError::EmailTaken)
    }
    Err(err) => Err(err.into()),
  }
}
