// accounts_app/src/pg_store.rs

//! `UserStore` over the Postgres `users` table.

use accounts::store::EMAIL_LOWER_INDEX;
use accounts::{StoreError, User, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{event, instrument, Level};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, email_lower, password_digest, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
struct UserRow {
  id: Uuid,
  name: String,
  email: String,
  email_lower: String,
  password_digest: String,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
  fn from(row: UserRow) -> Self {
    User {
      id: row.id,
      name: row.name,
      email: row.email,
      email_lower: row.email_lower,
      password_digest: row.password_digest,
      created_at: row.created_at,
      updated_at: row.updated_at,
    }
  }
}

/// Maps a unique violation (SQLSTATE 23505) to `StoreError::UniqueViolation`
/// carrying the constraint name; everything else is a backend error.
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.is_unique_violation() {
      let index = db_err.constraint().unwrap_or(EMAIL_LOWER_INDEX).to_string();
      event!(Level::WARN, %index, "Write rejected by unique index.");
      return StoreError::UniqueViolation { index };
    }
  }
  event!(Level::ERROR, error = %err, "Database error in user store.");
  StoreError::from(anyhow::Error::new(err))
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
  pool: PgPool,
}

impl PgUserStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>, StoreError> {
    let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
    let row = sqlx::query_as::<_, UserRow>(&sql)
      .bind(value)
      .fetch_optional(&self.pool)
      .await
      .map_err(map_sqlx_error)?;
    Ok(row.map(User::from))
  }
}

#[async_trait]
impl UserStore for PgUserStore {
  #[instrument(name = "PgUserStore::insert", skip_all, fields(user_id = %user.id))]
  async fn insert(&self, user: &User) -> Result<(), StoreError> {
    sqlx::query(
      "INSERT INTO users (id, name, email, email_lower, password_digest, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.email_lower)
    .bind(&user.password_digest)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&self.pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
  }

  #[instrument(name = "PgUserStore::update", skip_all, fields(user_id = %user.id))]
  async fn update(&self, user: &User) -> Result<(), StoreError> {
    let result = sqlx::query(
      "UPDATE users SET name = $2, email = $3, email_lower = $4, password_digest = $5, updated_at = $6 \
       WHERE id = $1",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.email_lower)
    .bind(&user.password_digest)
    .bind(user.updated_at)
    .execute(&self.pool)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
      return Err(StoreError::RowNotFound(user.id));
    }
    Ok(())
  }

  async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    let row = sqlx::query_as::<_, UserRow>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(map_sqlx_error)?;
    Ok(row.map(User::from))
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
    self.fetch_one_by("email", email).await
  }

  async fn find_by_email_lower(&self, email_lower: &str) -> Result<Option<User>, StoreError> {
    self.fetch_one_by("email_lower", email_lower).await
  }

  async fn count(&self) -> Result<u64, StoreError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
      .fetch_one(&self.pool)
      .await
      .map_err(map_sqlx_error)?;
    Ok(u64::try_from(count).unwrap_or(0))
  }
}
