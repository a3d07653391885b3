// tests/signup_flow_tests.rs
mod common;

use accounts::{AccountsError, Field, SaveOptions, UserChangeset};
use common::*;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_invalid_signup_does_not_create_a_user() {
  setup_tracing();
  let (_store, users) = memory_users();
  let before = users.count().await.unwrap();

  let form = UserChangeset::new("", "").with_password("", "");
  let outcome = users.create(form).await.unwrap();

  let errors = outcome.errors().expect("blank signup must be rejected");
  for field in [Field::Name, Field::Email, Field::Password, Field::PasswordConfirmation] {
    assert!(!errors.on(field).is_empty(), "expected a failure on {}", field.as_str());
  }
  assert_eq!(users.count().await.unwrap(), before);
}

#[tokio::test]
#[serial]
async fn test_valid_signup_creates_a_user() {
  setup_tracing();
  let (_store, users) = memory_users();
  let before = users.count().await.unwrap();

  let user = create(&users, signup("Example User", "User@Example.com")).await;

  assert_eq!(users.count().await.unwrap(), before + 1);
  assert_eq!(user.email, "User@Example.com");
  assert_eq!(user.email_lower, "user@example.com");
  assert_eq!(user.created_at, user.updated_at);
  assert_eq!(users.find(user.id).await.unwrap(), Some(user));
}

#[tokio::test]
#[serial]
async fn test_invalid_outcome_converts_into_error() {
  setup_tracing();
  let (_store, users) = memory_users();

  let err = users
    .create(signup("", "user@example.com"))
    .await
    .unwrap()
    .into_result()
    .unwrap_err();
  match err {
    AccountsError::Invalid(errors) => assert_eq!(errors.full_messages(), vec!["Name can't be blank".to_string()]),
    other => panic!("expected Invalid, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_forced_save_without_password_fails() {
  setup_tracing();
  let (_store, users) = memory_users();

  let err = users
    .save(UserChangeset::new("Example User", "user@example.com"), SaveOptions::skip_validation())
    .await
    .unwrap_err();
  assert!(matches!(err, AccountsError::MissingPassword));
  assert_eq!(users.count().await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn test_update_of_unknown_record_fails() {
  setup_tracing();
  let (_store, users) = memory_users();
  let user = create(&users, example_user()).await;

  let (_other_store, other_users) = memory_users();
  let err = other_users.save(user.changeset(), SaveOptions::default()).await.unwrap_err();
  assert!(matches!(err, AccountsError::NotFound(id) if id == user.id));
}
