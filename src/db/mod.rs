mod dashboard_queries;
mod feature_ops;
mod knowledge_ops;
mod mappers;
mod partner_ops;
mod people_ops;
mod reminder_ops;
mod store_port;
mod types;
mod user_ops;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use crate::error::{CrmError, Result};

pub const SCHEMA_SQL: &str = include_str!("schema.sql");

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Clone)]
pub struct CrmDb {
    pool: PgPool,
}

impl CrmDb {
    /// # Errors
    /// Returns an error if the database connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to connect to database: {e}")))?;

        info!("Connected to PostgreSQL partner database");
        Ok(Self { pool })
    }

    /// Wraps an existing pool (for testing).
    #[must_use]
    pub const fn new_with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the bundled schema. Every statement is idempotent.
    ///
    /// # Errors
    /// Returns an error if any statement fails.
    pub async fn initialize_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(self.pool())
            .await
            .map(|_result| info!("Partner schema is up to date"))
            .map_err(|e| CrmError::DatabaseError(format!("Failed to initialize schema: {e}")))
    }
}

#[must_use]
pub fn resolve_pool_max_connections() -> u32 {
    resolve_pool_max_connections_from(|key| std::env::var(key).ok())
}

pub fn resolve_pool_max_connections_from<F>(env_lookup: F) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    env_lookup("PARTNER_DESK_DB_MAX_CONNECTIONS")
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}
