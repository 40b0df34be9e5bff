use crate::errors::{DbError, DbResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

// Embed migration SQL files at compile time
const MIGRATION_INIT: &str = include_str!("../migrations/20250601000000_init.sql");

const MIGRATIONS: &[(&str, &str)] = &[("20250601000000_init.sql", MIGRATION_INIT)];

/// Open a connection pool, creating the database file if needed.
pub async fn init_pool(database_url: &str) -> DbResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(DbError::Sqlx)?
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory database exists per connection; pin the pool to one so
    // every handle sees the same schema.
    let in_memory = database_url.contains(":memory:");
    SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 5 })
        .min_connections(if in_memory { 1 } else { 0 })
        .connect_with(options)
        .await
        .map_err(DbError::Sqlx)
}

/// Split a migration file into executable statements. Line comments are
/// dropped first so a `;` inside prose never truncates a statement.
fn statements(sql: &str) -> Vec<String> {
    let without_comments: String = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    without_comments
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Apply any embedded migrations not yet recorded in `schema_migrations`.
/// Safe to call on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            name TEXT PRIMARY KEY NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::Migration(format!("failed to create migrations table: {}", e)))?;

    for (name, sql) in MIGRATIONS {
        let applied: Option<String> =
            sqlx::query_scalar("SELECT name FROM schema_migrations WHERE name = ?")
                .bind(name)
                .fetch_optional(pool)
                .await
                .map_err(|e| DbError::Migration(format!("failed to check {}: {}", name, e)))?;
        if applied.is_some() {
            continue;
        }

        log::info!("applying migration {}", name);
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| DbError::Migration(format!("failed to begin {}: {}", name, e)))?;

        // SQLite executes one statement at a time
        for statement in statements(sql) {
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::Migration(format!("{} failed: {}", name, e)))?;
        }

        sqlx::query("INSERT INTO schema_migrations (name) VALUES (?)")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("failed to record {}: {}", name, e)))?;
        tx.commit()
            .await
            .map_err(|e| DbError::Migration(format!("failed to commit {}: {}", name, e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_split_ignores_commented_semicolons() {
        let sql = "-- sets up t; nothing else\nCREATE TABLE t (\n    x TEXT -- label\n);\n-- done\nCREATE INDEX idx_t ON t(x);\n";
        let parsed = statements(sql);
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].starts_with("CREATE TABLE t"));
        assert!(parsed[1].starts_with("CREATE INDEX"));
    }

    #[test]
    fn test_embedded_migrations_split_cleanly() {
        for (name, sql) in MIGRATIONS {
            for statement in statements(sql) {
                assert!(!statement.trim_start().starts_with("--"), "{}", name);
                assert!(
                    statement.to_uppercase().starts_with("CREATE"),
                    "{}: unexpected statement: {}",
                    name,
                    statement
                );
            }
        }
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(applied as usize, MIGRATIONS.len());
    }

    #[tokio::test]
    async fn test_schema_has_expected_tables() {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        for table in ["raw_complaints", "processed_complaints", "staff"] {
            let found: Option<String> = sqlx::query_scalar(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_optional(&pool)
            .await
            .unwrap();
            assert_eq!(found.as_deref(), Some(table));
        }
    }
}
