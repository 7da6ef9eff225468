use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::error::CoreError;

pub type DbPool = SqlitePool;

/// Opens (creating if necessary) the database at `database_url` and
/// bootstraps the schema. `sqlite::memory:` works for tests.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, CoreError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

async fn init_schema(pool: &DbPool) -> Result<(), CoreError> {
    let statements = [
        r#"CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            calendar_id TEXT,
            starts_at TEXT NOT NULL,
            ends_at TEXT NOT NULL,
            recurrence TEXT NOT NULL DEFAULT 'none',
            recurrence_until TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"#,
        r#"CREATE TABLE IF NOT EXISTS todos (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            notes TEXT,
            course TEXT,
            due_on TEXT,
            completed INTEGER NOT NULL DEFAULT 0,
            recurrence TEXT NOT NULL DEFAULT 'none',
            recurrence_until TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"#,
        r#"CREATE TABLE IF NOT EXISTS assignments (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            course TEXT,
            due_on TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            recurrence TEXT NOT NULL DEFAULT 'none',
            recurrence_until TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"#,
        // One exception per template per occurrence date; the primary key
        // carries the upsert semantics.
        r#"CREATE TABLE IF NOT EXISTS occurrence_exceptions (
            parent_kind TEXT NOT NULL,
            parent_id TEXT NOT NULL,
            exception_date TEXT NOT NULL,
            exception_kind TEXT NOT NULL,
            overrides TEXT,
            created_at TEXT NOT NULL,
            PRIMARY KEY (parent_kind, parent_id, exception_date)
        )"#,
        r#"CREATE TABLE IF NOT EXISTS preferences (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )"#,
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
