// accounts/src/users.rs

//! `Users`: create, update, validate and authenticate user records against an
//! injected `UserStore`.
//!
//! Saving runs a four-step pipeline:
//!
//! 1. `load_existing`  - fetch the persisted row for an update (skipped for new records)
//! 2. `validate`       - rule set plus the `email_lower` uniqueness lookup; failures stop the run
//! 3. `prepare_record` - derive `email_lower`, hash a new password, stamp timestamps
//! 4. `persist`        - insert or update through the store; once written, an
//!    `after` hook drops the plaintext password from the run's context
//!
//! `SaveOptions::skip_validation()` skips step 2. The store's unique index
//! still applies, so a colliding forced save fails with a storage error.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{AccountsError, AccountsResult};
use crate::password;
use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineError, PipelineResult, SkipCondition};
use crate::store::UserStore;
use crate::user::{User, UserChangeset};
use crate::validation::{email_uniqueness, validate_changeset, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
  /// When `false` the rule set and the uniqueness lookup are bypassed.
  pub validate: bool,
}

impl Default for SaveOptions {
  fn default() -> Self {
    Self { validate: true }
  }
}

impl SaveOptions {
  pub fn skip_validation() -> Self {
    Self { validate: false }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
  Saved(User),
  /// Nothing was written.
  Invalid(ValidationErrors),
}

impl SaveOutcome {
  pub fn is_saved(&self) -> bool {
    matches!(self, SaveOutcome::Saved(_))
  }

  pub fn user(&self) -> Option<&User> {
    match self {
      SaveOutcome::Saved(user) => Some(user),
      SaveOutcome::Invalid(_) => None,
    }
  }

  pub fn errors(&self) -> Option<&ValidationErrors> {
    match self {
      SaveOutcome::Saved(_) => None,
      SaveOutcome::Invalid(errors) => Some(errors),
    }
  }

  /// Turns `Invalid` into `AccountsError::Invalid`.
  pub fn into_result(self) -> AccountsResult<User> {
    match self {
      SaveOutcome::Saved(user) => Ok(user),
      SaveOutcome::Invalid(errors) => Err(AccountsError::Invalid(errors)),
    }
  }
}

/// State shared by the steps of one save (or validate) run.
pub struct SaveCtxData {
  store: Arc<dyn UserStore>,
  options: SaveOptions,
  changeset: UserChangeset,
  existing: Option<User>,
  errors: ValidationErrors,
  record: Option<User>,
}

impl SaveCtxData {
  fn new(store: Arc<dyn UserStore>, changeset: UserChangeset, options: SaveOptions) -> Self {
    Self {
      store,
      options,
      changeset,
      existing: None,
      errors: ValidationErrors::new(),
      record: None,
    }
  }
}

pub struct Users {
  store: Arc<dyn UserStore>,
  save_pipeline: Pipeline<SaveCtxData, AccountsError>,
  validate_pipeline: Pipeline<SaveCtxData, AccountsError>,
}

impl Users {
  pub fn new(store: Arc<dyn UserStore>) -> Self {
    Self {
      store,
      save_pipeline: build_pipeline(true),
      validate_pipeline: build_pipeline(false),
    }
  }

  pub fn store(&self) -> &Arc<dyn UserStore> {
    &self.store
  }

  /// Validates and, if valid, persists `changeset`.
  ///
  /// Validation failures come back as `Ok(SaveOutcome::Invalid)`; storage
  /// failures (including a unique-index violation lost to a concurrent
  /// writer) are `Err`.
  #[instrument(
    name = "Users::save",
    skip_all,
    fields(new_record = changeset.is_new_record(), validate = options.validate)
  )]
  pub async fn save(&self, changeset: UserChangeset, options: SaveOptions) -> AccountsResult<SaveOutcome> {
    let ctx = ContextData::new(SaveCtxData::new(self.store.clone(), changeset, options));
    let result = self.save_pipeline.run(ctx.clone()).await?;
    let data = ctx.try_into_inner().map_err(|_| PipelineError::ContextStillShared)?;

    match (result, data.record) {
      (PipelineResult::Stopped, _) => {
        debug!(failures = data.errors.len(), "Save rejected by validation.");
        Ok(SaveOutcome::Invalid(data.errors))
      }
      (PipelineResult::Completed, Some(user)) => Ok(SaveOutcome::Saved(user)),
      (PipelineResult::Completed, None) => Err(AccountsError::from(anyhow::anyhow!(
        "save pipeline completed without a prepared record"
      ))),
    }
  }

  pub async fn create(&self, changeset: UserChangeset) -> AccountsResult<SaveOutcome> {
    self.save(changeset, SaveOptions::default()).await
  }

  /// Runs the rule set and the uniqueness lookup without writing anything.
  #[instrument(name = "Users::validate", skip_all)]
  pub async fn validate(&self, changeset: &UserChangeset) -> AccountsResult<ValidationErrors> {
    let ctx = ContextData::new(SaveCtxData::new(
      self.store.clone(),
      changeset.clone(),
      SaveOptions::default(),
    ));
    self.validate_pipeline.run(ctx.clone()).await?;
    let data = ctx.try_into_inner().map_err(|_| PipelineError::ContextStillShared)?;
    Ok(data.errors)
  }

  pub async fn is_valid(&self, changeset: &UserChangeset) -> AccountsResult<bool> {
    Ok(self.validate(changeset).await?.is_empty())
  }

  /// Looks the record up by its exact stored email and checks `password`.
  /// Returns the record on success, `None` for an unknown email or a wrong password.
  #[instrument(name = "Users::authenticate", skip(self, password), fields(email = %email))]
  pub async fn authenticate(&self, email: &str, password: &str) -> AccountsResult<Option<User>> {
    let Some(user) = self.store.find_by_email(email).await? else {
      debug!("No user with this email.");
      return Ok(None);
    };
    if user.authenticate(password)? {
      info!(user_id = %user.id, "User authenticated.");
      Ok(Some(user))
    } else {
      warn!(user_id = %user.id, "Authentication failed: wrong password.");
      Ok(None)
    }
  }

  pub async fn find(&self, id: Uuid) -> AccountsResult<Option<User>> {
    Ok(self.store.find(id).await?)
  }

  pub async fn find_by_email(&self, email: &str) -> AccountsResult<Option<User>> {
    Ok(self.store.find_by_email(email).await?)
  }

  pub async fn count(&self) -> AccountsResult<u64> {
    Ok(self.store.count().await?)
  }
}

fn build_pipeline(with_persistence: bool) -> Pipeline<SaveCtxData, AccountsError> {
  let is_new_record: SkipCondition<SaveCtxData> = Arc::new(|data: &SaveCtxData| data.changeset.is_new_record());
  let validation_bypassed: SkipCondition<SaveCtxData> = Arc::new(|data: &SaveCtxData| !data.options.validate);

  let mut steps = vec![
    ("load_existing", false, Some(is_new_record)),
    ("validate", false, Some(validation_bypassed)),
  ];
  if with_persistence {
    steps.push(("prepare_record", false, None));
    steps.push(("persist", false, None));
  }

  let mut pipeline = Pipeline::new(&steps);
  pipeline.on("load_existing", load_existing);
  pipeline.on("validate", validate_record);
  if with_persistence {
    pipeline.on("prepare_record", prepare_record);
    pipeline.on("persist", persist_record);
    pipeline.after("persist", forget_plaintext_password);
  }
  pipeline
}

async fn load_existing(ctx: ContextData<SaveCtxData>) -> AccountsResult<PipelineControl> {
  let (store, id) = {
    let guard = ctx.read();
    (guard.store.clone(), guard.changeset.id)
  };
  let Some(id) = id else {
    return Ok(PipelineControl::Continue);
  };

  let existing = store.find(id).await?.ok_or(AccountsError::NotFound(id))?;
  ctx.write().existing = Some(existing);
  Ok(PipelineControl::Continue)
}

async fn validate_record(ctx: ContextData<SaveCtxData>) -> AccountsResult<PipelineControl> {
  let (store, changeset) = {
    let guard = ctx.read();
    (guard.store.clone(), guard.changeset.clone())
  };

  let mut errors = validate_changeset(&changeset);
  if !changeset.email.trim().is_empty() {
    let holder = store.find_by_email_lower(&changeset.email_lower()).await?;
    errors.extend(email_uniqueness(&changeset, holder.as_ref()));
  }

  let control = if errors.is_empty() {
    PipelineControl::Continue
  } else {
    debug!(errors = %errors, "Validation failed.");
    PipelineControl::Stop
  };
  ctx.write().errors = errors;
  Ok(control)
}

async fn prepare_record(ctx: ContextData<SaveCtxData>) -> AccountsResult<PipelineControl> {
  let (changeset, existing) = {
    let guard = ctx.read();
    (guard.changeset.clone(), guard.existing.clone())
  };

  let new_password = changeset.password.as_deref().filter(|p| !p.is_empty());
  let password_digest = match (new_password, &existing) {
    (Some(plain), _) => password::hash_password(plain)?,
    (None, Some(current)) => current.password_digest.clone(),
    (None, None) => return Err(AccountsError::MissingPassword),
  };

  let now = Utc::now();
  let record = User {
    id: existing.as_ref().map_or_else(Uuid::new_v4, |e| e.id),
    email_lower: changeset.email_lower(),
    name: changeset.name,
    email: changeset.email,
    password_digest,
    created_at: existing.as_ref().map_or(now, |e| e.created_at),
    updated_at: now,
  };
  ctx.write().record = Some(record);
  Ok(PipelineControl::Continue)
}

async fn persist_record(ctx: ContextData<SaveCtxData>) -> AccountsResult<PipelineControl> {
  let (store, record, is_new) = {
    let guard = ctx.read();
    (guard.store.clone(), guard.record.clone(), guard.changeset.is_new_record())
  };
  let record = record.ok_or_else(|| anyhow::anyhow!("persist ran before prepare_record"))?;

  if is_new {
    store.insert(&record).await?;
  } else {
    store.update(&record).await?;
  }
  info!(user_id = %record.id, new_record = is_new, "User persisted.");
  Ok(PipelineControl::Continue)
}

async fn forget_plaintext_password(ctx: ContextData<SaveCtxData>) -> AccountsResult<PipelineControl> {
  let mut guard = ctx.write();
  guard.changeset.password = None;
  guard.changeset.password_confirmation = None;
  debug!("Plaintext password dropped from the save context.");
  Ok(PipelineControl::Continue)
}
