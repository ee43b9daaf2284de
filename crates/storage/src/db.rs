use chrono::{DateTime, NaiveDateTime, Utc};
use outlay_core::{ExpenseError, RuleError, DEFAULT_RULES};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use thiserror::Error;

pub type DbPool = Pool<Sqlite>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid expense: {0}")]
    InvalidExpense(#[from] ExpenseError),
    #[error("Invalid rule: {0}")]
    InvalidRule(#[from] RuleError),
    #[error("Expense not found: {0}")]
    ExpenseNotFound(i64),
    #[error("Rule not found: {0}")]
    RuleNotFound(i64),
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

pub async fn create_db(path: &Path) -> Result<DbPool, StoreError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA cache_size = -32000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// A private database living as long as the pool's single connection.
pub async fn create_in_memory_db() -> Result<DbPool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            vendor TEXT,
            payment_method TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categorization_rules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL,
            keyword TEXT NOT NULL,
            case_sensitive INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    for index in [
        "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)",
        "CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category)",
        "CREATE INDEX IF NOT EXISTS idx_categorization_rules_category ON categorization_rules(category)",
        "CREATE INDEX IF NOT EXISTS idx_categorization_rules_keyword ON categorization_rules(keyword)",
    ] {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}

/// Inserts [`DEFAULT_RULES`] when the rule table is empty; returns how many
/// rules were added. Existing rule sets, including deliberately edited ones,
/// are left alone.
pub async fn seed_default_rules(pool: &DbPool) -> Result<u64, StoreError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categorization_rules")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for (category, keyword, case_sensitive) in DEFAULT_RULES {
        sqlx::query(
            "INSERT INTO categorization_rules (category, keyword, case_sensitive) VALUES (?, ?, ?)",
        )
        .bind(*category)
        .bind(*keyword)
        .bind(*case_sensitive)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!(rules = DEFAULT_RULES.len(), "Seeded default categorization rules");
    Ok(DEFAULT_RULES.len() as u64)
}

/// SQLite `datetime('now')` text, always UTC.
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .map_err(|_| StoreError::Corrupt(format!("timestamp '{s}'")))
}
