use crate::domain::error::{AppError, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;

const SCHEMA_V1: &str = include_str!("../../../resources/schema.sql");

/// Connect, apply pending migrations and verify the connection.
pub async fn init_database(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let pool = connect_pool(database_url, max_connections).await?;

    apply_migrations(&pool).await?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Database health check failed: {e}")))?;

    Ok(pool)
}

pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let in_memory = database_url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::DatabaseError(format!("Failed to parse database URL: {e}")))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .pragma("foreign_keys", "ON");

    if !in_memory {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5));

    // An in-memory database lives exactly as long as its connection.
    if in_memory {
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    pool_options
        .connect_with(options)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to connect database: {e}")))
}

async fn apply_migrations(pool: &SqlitePool) -> Result<()> {
    // Schema version lives in PRAGMA user_version; v1 == schema.sql.
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to read user_version: {e}")))?;

    if version < 1 {
        apply_schema(pool, SCHEMA_V1).await?;
        sqlx::query("PRAGMA user_version = 1")
            .execute(pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to set user_version: {e}")))?;
        tracing::info!(version = 1, "Applied database schema");
    }

    Ok(())
}

async fn apply_schema(pool: &SqlitePool, schema: &str) -> Result<()> {
    for statement in schema.split(';') {
        let stmt = statement.trim();
        if stmt.is_empty() {
            continue;
        }
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to apply schema: {e}")))?;
    }
    Ok(())
}
