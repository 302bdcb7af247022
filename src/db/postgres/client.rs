use std::time::Duration;

use anyhow::Context;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use log::{info, warn};
use tokio_postgres::NoTls;

use crate::config::PostgresSettings;

const SCHEMA_PATH: &str = "schema/postgres.sql";

/// Connection attempts before giving up at startup.
const CONNECT_ATTEMPTS: u32 = 3;

/// Break a schema file into executable statements.
///
/// Splits on `;` outside `$$ ... $$` bodies and outside `--` line comments.
/// Whitespace-only fragments are dropped.
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut in_body = false;
    let mut in_comment = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match c {
            '\n' if in_comment => in_comment = false,
            _ if in_comment => {},
            '-' if !in_body && next == Some('-') => in_comment = true,
            '$' if next == Some('$') => {
                in_body = !in_body;
                chars.next();
            },
            ';' if !in_body => {
                statements.push(&sql[start..i]);
                start = i + 1;
            },
            _ => {},
        }
    }
    statements.push(&sql[start..]);

    statements.retain(|stmt| !strip_comments(stmt).is_empty());
    statements
}

/// Statement text with `--` comment lines removed, for emptiness checks.
fn strip_comments(stmt: &str) -> String {
    stmt.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_pool(settings: &PostgresSettings) -> anyhow::Result<Pool> {
    let mut pg_config = tokio_postgres::Config::new();
    pg_config
        .host(&settings.host)
        .port(settings.port)
        .user(&settings.user)
        .password(&settings.password)
        .dbname(&settings.database);

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Pool::builder(manager)
        .max_size(settings.pool_size)
        .build()
        .context("Failed to create PostgreSQL connection pool")
}

/// PostgreSQL client with connection pooling.
///
/// Sink for processed stablecoin and chain rows plus cron checkpoints.
/// Uses `deadpool-postgres` for connection management.
#[derive(Clone)]
pub struct PostgresClient {
    pub pool: Pool,
}

impl PostgresClient {
    /// Build the pool and wait for a first connection, backing off between
    /// attempts.
    pub async fn new(settings: PostgresSettings) -> anyhow::Result<Self> {
        info!(
            "Connecting to PostgreSQL at {}:{}/{}",
            settings.host, settings.port, settings.database
        );
        let pool = build_pool(&settings)?;

        let mut attempt = 1;
        loop {
            match pool.get().await {
                Ok(_) => {
                    info!("Connected to PostgreSQL");
                    return Ok(Self { pool });
                },
                Err(e) if attempt >= CONNECT_ATTEMPTS => {
                    return Err(anyhow::Error::new(e).context(format!(
                        "Failed to connect to PostgreSQL after {} attempts",
                        CONNECT_ATTEMPTS
                    )));
                },
                Err(e) => {
                    let delay = Duration::from_millis(200 << attempt);
                    warn!(
                        "PostgreSQL connection attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, CONNECT_ATTEMPTS, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
            }
        }
    }

    /// Health check - verify connection is still alive
    pub async fn health_check(&self) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .context("PostgreSQL health check failed")?;
        Ok(())
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let schema = tokio::fs::read_to_string(SCHEMA_PATH)
            .await
            .with_context(|| format!("Failed to read {}", SCHEMA_PATH))?;

        let statements = split_sql_statements(&schema);
        for stmt in &statements {
            client
                .batch_execute(stmt.trim())
                .await
                .with_context(|| format!("Migration statement failed: {}", stmt.trim()))?;
        }

        info!("Applied {} schema statements", statements.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_statements() {
        let sql = "CREATE SCHEMA a;\n\nCREATE TABLE a.t (x INT);\n";
        assert_eq!(
            split_sql_statements(sql)
                .iter()
                .map(|s| s.trim())
                .collect::<Vec<_>>(),
            vec!["CREATE SCHEMA a", "CREATE TABLE a.t (x INT)"]
        );
    }

    #[test]
    fn test_split_keeps_dollar_quoted_bodies() {
        let sql = "CREATE FUNCTION f() RETURNS void AS $$ BEGIN PERFORM 1; END; $$ LANGUAGE plpgsql; SELECT 1";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("PERFORM 1; END;"));
        assert_eq!(stmts[1].trim(), "SELECT 1");
    }

    #[test]
    fn test_split_ignores_semicolons_in_comments() {
        let sql = "-- header; not a statement\nCREATE SCHEMA a;\n-- trailing note\n";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 1);
        assert_eq!(strip_comments(stmts[0]), "CREATE SCHEMA a");
    }

    #[test]
    fn test_split_bundled_schema() {
        let schema = include_str!("../../../schema/postgres.sql");
        let stmts = split_sql_statements(schema);
        assert_eq!(stmts.len(), 6);
        assert!(stmts.iter().all(|s| !s.trim().is_empty()));
    }
}
