// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use accounts::pipeline::Handler;
use accounts::{ContextData, MemoryUserStore, PipelineControl, PipelineError, User, UserChangeset, Users};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::Level;

// --- Tracing (once per test binary) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Account fixtures ---
pub const PASSWORD: &str = "foobar";

pub fn example_user() -> UserChangeset {
  UserChangeset::new("Example User", "user@example.com").with_password(PASSWORD, PASSWORD)
}

pub fn signup(name: &str, email: &str) -> UserChangeset {
  UserChangeset::new(name, email).with_password(PASSWORD, PASSWORD)
}

pub fn memory_users() -> (Arc<MemoryUserStore>, Users) {
  let store = Arc::new(MemoryUserStore::new());
  let users = Users::new(store.clone());
  (store, users)
}

pub async fn create(users: &Users, changeset: UserChangeset) -> User {
  match users.create(changeset).await.expect("create should not hit a storage error") {
    accounts::SaveOutcome::Saved(user) => user,
    accounts::SaveOutcome::Invalid(errors) => panic!("fixture user was invalid: {}", errors),
  }
}

// --- Pipeline test context ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Pipeline error: {0}")]
  Pipeline(#[from] PipelineError),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}
