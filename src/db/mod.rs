//! Database access layer
//!
//! SQLite via sqlx with idempotent schema initialization. WAL mode and
//! foreign keys are enabled on every pool. The UNIQUE(identity_id,
//! day_key) constraint on submissions is load-bearing: it is what makes
//! the one-per-day rule hold under concurrent submits.

use crate::error::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub mod identities;
pub mod submissions;
pub mod summaries;

/// Open (creating if needed) the database and ensure the schema exists.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_and_migrate(&pool).await?;
    Ok(pool)
}

/// In-memory pool for tests. Single connection so the shared schema
/// survives across acquires.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    configure_and_migrate(&pool).await?;
    Ok(pool)
}

async fn configure_and_migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    create_identities_table(pool).await?;
    create_submissions_table(pool).await?;
    create_ai_summaries_table(pool).await?;
    Ok(())
}

async fn create_identities_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS identities (
            id TEXT PRIMARY KEY,
            fingerprint TEXT NOT NULL UNIQUE,
            language TEXT,
            age_group TEXT,
            created_at TIMESTAMP NOT NULL,
            last_seen_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            id TEXT PRIMARY KEY,
            identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
            ip_hash TEXT NOT NULL,
            answers TEXT NOT NULL,
            raw_score INTEGER NOT NULL,
            score INTEGER NOT NULL,
            severity TEXT NOT NULL,
            language TEXT NOT NULL,
            age_group TEXT NOT NULL,
            submitted_at TIMESTAMP NOT NULL,
            day_key TEXT NOT NULL,
            UNIQUE (identity_id, day_key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_submissions_submitted_at ON submissions(submitted_at)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_ai_summaries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ai_summaries (
            identity_id TEXT PRIMARY KEY,
            summary TEXT NOT NULL,
            themes TEXT NOT NULL,
            generated_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
