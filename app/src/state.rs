// accounts_app/src/state.rs
use crate::config::AppConfig;
use crate::pg_store::PgUserStore;
use accounts::{AvatarConfig, Users};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub users: Arc<Users>,
  pub avatars: AvatarConfig,
}

impl AppState {
  pub async fn connect(config: AppConfig) -> crate::errors::Result<Self> {
    let db_pool = PgPoolOptions::new()
      .max_connections(config.database_max_connections)
      .connect(&config.database_url)
      .await?;
    info!(max_connections = config.database_max_connections, "Connected to the database.");

    let store = Arc::new(PgUserStore::new(db_pool.clone()));
    Ok(Self {
      users: Arc::new(Users::new(store)),
      avatars: AvatarConfig::new(config.avatar_base_url.clone()),
      db_pool,
    })
  }
}
