// tests/user_validation_tests.rs
mod common;

use accounts::{ErrorKind, Field, UserChangeset};
use common::*;
use serial_test::serial;

const VALID_ADDRESSES: &[&str] = &[
  "user@foo.com",
  "THE_USER@foo.bar.org",
  "first.last@foo.jp",
  "a+b@baz.cn",
];

const INVALID_ADDRESSES: &[&str] = &[
  "user@foo,com",
  "user_at_foo.org",
  "example.user@foo.",
  "foo@bar_baz.com",
  "foo@bar+baz.com",
];

#[tokio::test]
#[serial]
async fn test_example_user_is_valid() {
  setup_tracing();
  let (_store, users) = memory_users();
  assert!(users.is_valid(&example_user()).await.unwrap());
}

#[tokio::test]
#[serial]
async fn test_name_must_be_present() {
  setup_tracing();
  let (_store, users) = memory_users();
  let mut changeset = example_user();
  changeset.name = " ".to_string();

  let errors = users.validate(&changeset).await.unwrap();
  assert_eq!(errors.on(Field::Name), vec![ErrorKind::Blank]);
  assert_eq!(errors.len(), 1);
}

#[tokio::test]
#[serial]
async fn test_name_longer_than_fifty_characters_is_rejected() {
  setup_tracing();
  let (_store, users) = memory_users();
  let mut changeset = example_user();

  changeset.name = "a".repeat(50);
  assert!(users.is_valid(&changeset).await.unwrap());

  changeset.name = "a".repeat(51);
  let errors = users.validate(&changeset).await.unwrap();
  assert_eq!(errors.on(Field::Name), vec![ErrorKind::TooLong { max: 50 }]);
}

#[tokio::test]
#[serial]
async fn test_email_must_be_present() {
  setup_tracing();
  let (_store, users) = memory_users();
  let mut changeset = example_user();
  changeset.email = "  ".to_string();

  let errors = users.validate(&changeset).await.unwrap();
  assert_eq!(errors.on(Field::Email), vec![ErrorKind::Blank]);
}

#[tokio::test]
#[serial]
async fn test_invalid_email_formats_are_rejected() {
  setup_tracing();
  let (_store, users) = memory_users();
  for address in INVALID_ADDRESSES {
    let changeset = signup("Example User", address);
    let errors = users.validate(&changeset).await.unwrap();
    assert_eq!(
      errors.on(Field::Email),
      vec![ErrorKind::Invalid],
      "{} should be rejected",
      address
    );
  }
}

#[tokio::test]
#[serial]
async fn test_valid_email_formats_are_accepted() {
  setup_tracing();
  let (_store, users) = memory_users();
  for address in VALID_ADDRESSES {
    let changeset = signup("Example User", address);
    assert!(
      users.is_valid(&changeset).await.unwrap(),
      "{} should be accepted",
      address
    );
  }
}

#[tokio::test]
#[serial]
async fn test_password_must_be_present() {
  setup_tracing();
  let (_store, users) = memory_users();
  let changeset = UserChangeset::new("Example User", "user@example.com").with_password(" ", " ");

  let errors = users.validate(&changeset).await.unwrap();
  assert_eq!(errors.on(Field::Password), vec![ErrorKind::Blank]);
  assert_eq!(errors.on(Field::PasswordConfirmation), vec![ErrorKind::Blank]);
}

#[tokio::test]
#[serial]
async fn test_new_record_without_password_fields_is_invalid() {
  setup_tracing();
  let (_store, users) = memory_users();
  let errors = users
    .validate(&UserChangeset::new("Example User", "user@example.com"))
    .await
    .unwrap();
  assert!(errors.contains(Field::Password, ErrorKind::Blank));
  assert!(errors.contains(Field::PasswordConfirmation, ErrorKind::Blank));
}

#[tokio::test]
#[serial]
async fn test_password_confirmation_must_match() {
  setup_tracing();
  let (_store, users) = memory_users();
  let changeset = UserChangeset::new("Example User", "user@example.com").with_password("foobar", "mismatch");

  let errors = users.validate(&changeset).await.unwrap();
  assert_eq!(errors.on(Field::PasswordConfirmation), vec![ErrorKind::Confirmation]);
  assert!(errors.on(Field::Password).is_empty());
}

#[tokio::test]
#[serial]
async fn test_password_shorter_than_six_characters_is_rejected() {
  setup_tracing();
  let (_store, users) = memory_users();
  let short = "a".repeat(5);
  let changeset = UserChangeset::new("Example User", "user@example.com").with_password(short.clone(), short);

  let errors = users.validate(&changeset).await.unwrap();
  assert_eq!(errors.on(Field::Password), vec![ErrorKind::TooShort { min: 6 }]);
}

#[tokio::test]
#[serial]
async fn test_all_blank_signup_reports_every_field() {
  setup_tracing();
  let (_store, users) = memory_users();
  let errors = users.validate(&signup("", "")).await.unwrap();

  assert!(errors.contains(Field::Name, ErrorKind::Blank));
  assert!(errors.contains(Field::Email, ErrorKind::Blank));
  assert!(!errors.contains(Field::Email, ErrorKind::Invalid));
  assert_eq!(
    errors.full_messages(),
    vec!["Name can't be blank".to_string(), "Email can't be blank".to_string()]
  );
}

#[tokio::test]
#[serial]
async fn test_existing_record_may_omit_password() {
  setup_tracing();
  let (_store, users) = memory_users();
  let user = create(&users, example_user()).await;

  let mut changeset = user.changeset();
  changeset.name = "Renamed User".to_string();
  assert!(users.is_valid(&changeset).await.unwrap());
}

#[tokio::test]
#[serial]
async fn test_email_longer_than_the_column_is_invalid_and_not_saved() {
  setup_tracing();
  let (_store, users) = memory_users();
  // Every part is within its own limit; the whole address is 298 bytes.
  let address = format!(
    "{}@{}.{}.{}.{}.com",
    "a".repeat(64),
    "b".repeat(63),
    "c".repeat(63),
    "d".repeat(63),
    "e".repeat(37)
  );
  assert!(address.len() > accounts::validation::MAX_ADDRESS_LEN);

  let outcome = users.create(signup("Example User", &address)).await.unwrap();
  assert_eq!(outcome.errors().unwrap().on(Field::Email), vec![ErrorKind::Invalid]);
  assert_eq!(users.count().await.unwrap(), 0);
}
