// accounts/src/store/memory.rs

//! An in-process `UserStore` with a real unique index over `email_lower`.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{StoreError, UserStore, EMAIL_LOWER_INDEX, PRIMARY_KEY};
use crate::migration::{
  plan_email_lower_backfill, BackfillReport, LegacyUserRow, MigrationError, ADD_LOWERCASE_EMAIL_VERSION,
};
use crate::user::User;

#[derive(Debug, Default)]
struct UsersTable {
  rows: HashMap<Uuid, User>,
  /// `None` until the lowercase-email migration has run.
  email_lower_index: Option<HashMap<String, Uuid>>,
}

/// Every write takes the table's write lock for the whole check-and-write, so
/// the index check and the insert cannot interleave with another writer.
#[derive(Debug)]
pub struct MemoryUserStore {
  table: RwLock<UsersTable>,
}

impl Default for MemoryUserStore {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryUserStore {
  /// An empty table with the `email_lower` unique index in place.
  pub fn new() -> Self {
    Self {
      table: RwLock::new(UsersTable {
        rows: HashMap::new(),
        email_lower_index: Some(HashMap::new()),
      }),
    }
  }

  /// A table as it looked before `email_lower` existed: no index and an empty
  /// `email_lower` on every row.
  pub fn from_legacy_rows(rows: impl IntoIterator<Item = LegacyUserRow>) -> Self {
    let rows = rows
      .into_iter()
      .map(|row| {
        let user = User {
          id: row.id,
          name: row.name,
          email: row.email,
          email_lower: String::new(),
          password_digest: row.password_digest,
          created_at: row.created_at,
          updated_at: row.updated_at,
        };
        (user.id, user)
      })
      .collect();

    Self {
      table: RwLock::new(UsersTable {
        rows,
        email_lower_index: None,
      }),
    }
  }

  pub fn has_email_lower_index(&self) -> bool {
    self.table.read().email_lower_index.is_some()
  }

  /// Backfills `email_lower` for every row and then switches the unique index on.
  /// On a collision nothing is modified.
  #[instrument(name = "MemoryUserStore::add_email_lower_index", skip(self), err(Display))]
  pub fn add_email_lower_index(&self) -> Result<BackfillReport, MigrationError> {
    let mut table = self.table.write();
    if table.email_lower_index.is_some() {
      return Err(MigrationError::AlreadyApplied(ADD_LOWERCASE_EMAIL_VERSION));
    }

    let plan = plan_email_lower_backfill(table.rows.values().map(|u| (u.id, u.email.as_str())))?;

    let mut index = HashMap::with_capacity(plan.len());
    for (id, email_lower) in plan {
      if let Some(row) = table.rows.get_mut(&id) {
        row.email_lower = email_lower.clone();
      }
      index.insert(email_lower, id);
    }
    let rows_backfilled = index.len();
    table.email_lower_index = Some(index);

    info!(rows_backfilled, "email_lower backfilled and unique index enabled.");
    Ok(BackfillReport { rows_backfilled })
  }
}

#[async_trait]
impl UserStore for MemoryUserStore {
  #[instrument(name = "MemoryUserStore::insert", skip_all, fields(user_id = %user.id))]
  async fn insert(&self, user: &User) -> Result<(), StoreError> {
    let mut table = self.table.write();
    if table.rows.contains_key(&user.id) {
      warn!("Insert rejected by primary key.");
      return Err(StoreError::UniqueViolation {
        index: PRIMARY_KEY.to_string(),
      });
    }
    if let Some(index) = table.email_lower_index.as_mut() {
      if index.contains_key(&user.email_lower) {
        warn!("Insert rejected by email_lower unique index.");
        return Err(StoreError::UniqueViolation {
          index: EMAIL_LOWER_INDEX.to_string(),
        });
      }
      index.insert(user.email_lower.clone(), user.id);
    }
    table.rows.insert(user.id, user.clone());
    debug!("Row inserted.");
    Ok(())
  }

  #[instrument(name = "MemoryUserStore::update", skip_all, fields(user_id = %user.id))]
  async fn update(&self, user: &User) -> Result<(), StoreError> {
    let mut guard = self.table.write();
    let table = &mut *guard;
    let previous_lower = match table.rows.get(&user.id) {
      Some(row) => row.email_lower.clone(),
      None => return Err(StoreError::RowNotFound(user.id)),
    };

    if let Some(index) = table.email_lower_index.as_mut() {
      if let Some(holder) = index.get(&user.email_lower) {
        if *holder != user.id {
          warn!("Update rejected by email_lower unique index.");
          return Err(StoreError::UniqueViolation {
            index: EMAIL_LOWER_INDEX.to_string(),
          });
        }
      }
      index.remove(&previous_lower);
      index.insert(user.email_lower.clone(), user.id);
    }
    table.rows.insert(user.id, user.clone());
    debug!("Row updated.");
    Ok(())
  }

  async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
    Ok(self.table.read().rows.get(&id).cloned())
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
    Ok(self.table.read().rows.values().find(|u| u.email == email).cloned())
  }

  async fn find_by_email_lower(&self, email_lower: &str) -> Result<Option<User>, StoreError> {
    let table = self.table.read();
    let found = match &table.email_lower_index {
      Some(index) => index.get(email_lower).and_then(|id| table.rows.get(id)),
      None => table.rows.values().find(|u| u.email_lower == email_lower),
    };
    Ok(found.cloned())
  }

  async fn count(&self) -> Result<u64, StoreError> {
    Ok(self.table.read().rows.len() as u64)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn row(email: &str) -> User {
    let now = Utc::now();
    User {
      id: Uuid::new_v4(),
      name: "Example User".into(),
      email: email.into(),
      email_lower: email.to_ascii_lowercase(),
      password_digest: String::new(),
      created_at: now,
      updated_at: now,
    }
  }

  #[tokio::test]
  async fn insert_rejects_duplicate_email_lower() {
    let store = MemoryUserStore::new();
    store.insert(&row("user@example.com")).await.unwrap();
    let err = store.insert(&row("USER@example.com")).await.unwrap_err();
    assert!(err.is_email_lower_violation());
    assert_eq!(store.count().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn insert_rejects_duplicate_primary_key() {
    let store = MemoryUserStore::new();
    let user = row("user@example.com");
    store.insert(&user).await.unwrap();
    let mut same_id = row("other@example.com");
    same_id.id = user.id;
    match store.insert(&same_id).await {
      Err(StoreError::UniqueViolation { index }) => assert_eq!(index, PRIMARY_KEY),
      other => panic!("expected primary key violation, got {:?}", other),
    }
    // The failed insert must not have claimed the address.
    assert!(store.find_by_email_lower("other@example.com").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn update_moves_the_index_entry() {
    let store = MemoryUserStore::new();
    let mut user = row("user@example.com");
    store.insert(&user).await.unwrap();

    user.email = "new@example.com".into();
    user.email_lower = "new@example.com".into();
    store.update(&user).await.unwrap();

    assert!(store.find_by_email_lower("user@example.com").await.unwrap().is_none());
    assert_eq!(store.find_by_email_lower("new@example.com").await.unwrap().unwrap().id, user.id);
    // The old address is free again.
    store.insert(&row("user@example.com")).await.unwrap();
  }

  #[tokio::test]
  async fn update_of_missing_row_fails() {
    let store = MemoryUserStore::new();
    assert!(matches!(
      store.update(&row("user@example.com")).await,
      Err(StoreError::RowNotFound(_))
    ));
  }

  #[tokio::test]
  async fn find_by_email_is_exact() {
    let store = MemoryUserStore::new();
    store.insert(&row("User@Example.com")).await.unwrap();
    assert!(store.find_by_email("User@Example.com").await.unwrap().is_some());
    assert!(store.find_by_email("user@example.com").await.unwrap().is_none());
  }
}
