use carpool_core::StoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Maps a driver error onto the store taxonomy. `entity` names what was being read.
pub fn map_sqlx_error(err: sqlx::Error, entity: &str) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound(entity.to_string()),
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict(db.message().to_string())
        }
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Corrupt(format!("{} column {}: {}", entity, index, source))
        }
        other => {
            tracing::error!(error = %other, entity, "Database error");
            StoreError::Unavailable(other.to_string())
        }
    }
}

/// Shorthand for `map_err(|e| map_sqlx_error(e, entity))`.
pub(crate) trait SqlxResultExt<T> {
    fn or_store(self, entity: &str) -> Result<T, StoreError>;
}

impl<T> SqlxResultExt<T> for Result<T, sqlx::Error> {
    fn or_store(self, entity: &str) -> Result<T, StoreError> {
        self.map_err(|e| map_sqlx_error(e, entity))
    }
}
