//! SQLite-backed persistence for patterns, misses, and feedback.
//!
//! `Database` wraps a `SqlitePool`; operation groups live in extension
//! traits (`patterns::PatternCurationOps`) and the engine-facing
//! `PatternStore` implementation.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

pub mod migrations;
pub mod models;
pub mod patterns;

/// Connection pool wrapper all database operations hang off.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) a database file and run migrations.
    pub async fn connect(path: &Path) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        migrations::run_migrations(&pool).await?;
        info!("Database ready at {}", path.display());
        Ok(Self { pool })
    }

    /// In-memory database for tests and ephemeral use.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        migrations::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
