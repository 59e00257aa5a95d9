//! Database handle over the supported dialects, plus connection bootstrap.

use crate::dialect::Dialect;
use crate::error::AppError;
use crate::item::Item;
use crate::settings::{Settings, SettingsError};
use crate::sql::{bind_pg, bind_sqlite, pg_row_to_item, sqlite_row_to_item, QueryBuf};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{ConnectOptions, Row};
use std::path::Path;
use std::str::FromStr;

/// Shared connection pool. Cloning is cheap; all checkout and locking is the pool's.
#[derive(Clone, Debug)]
pub enum Database {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

impl Database {
    pub async fn connect(settings: &Settings) -> Result<Self, AppError> {
        match settings.database_type {
            Dialect::Sqlite3 => Self::connect_sqlite(&settings.sqlite3_database_file, settings.max_connections).await,
            Dialect::Postgresql => {
                let url = settings
                    .database_url
                    .as_deref()
                    .ok_or(SettingsError::Missing("DATABASE_URL"))?;
                ensure_database_exists(url).await?;
                let pool = PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .connect(url)
                    .await?;
                Ok(Database::Postgres(pool))
            }
        }
    }

    pub async fn connect_sqlite(path: &Path, max_connections: u32) -> Result<Self, AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| std::io::Error::new(e.kind(), format!("cannot create {}: {}", parent.display(), e)))?;
        }
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;
        Ok(Database::Sqlite(pool))
    }

    /// Single-connection in-memory database; every checkout sees the same data.
    pub async fn sqlite_in_memory() -> Result<Self, AppError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;
        Ok(Database::Sqlite(pool))
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            Database::Sqlite(_) => Dialect::Sqlite3,
            Database::Postgres(_) => Dialect::Postgresql,
        }
    }

    /// Execute a statement without parameters (DDL).
    pub async fn execute_ddl(&self, sql: &str) -> Result<(), AppError> {
        tracing::debug!(sql = %sql, "ddl");
        match self {
            Database::Sqlite(pool) => {
                sqlx::query(sql).execute(pool).await?;
            }
            Database::Postgres(pool) => {
                sqlx::query(sql).execute(pool).await?;
            }
        }
        Ok(())
    }

    /// Execute a statement and return the number of affected rows.
    pub async fn execute(&self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let affected = match self {
            Database::Sqlite(pool) => {
                let query = q.params.iter().fold(sqlx::query(&q.sql), bind_sqlite);
                query.execute(pool).await?.rows_affected()
            }
            Database::Postgres(pool) => {
                let query = q.params.iter().fold(sqlx::query(&q.sql), bind_pg);
                query.execute(pool).await?.rows_affected()
            }
        };
        Ok(affected)
    }

    /// Execute a statement whose first returned column is an integer (e.g. `RETURNING id`).
    pub async fn fetch_i64(&self, q: &QueryBuf) -> Result<i64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let value = match self {
            Database::Sqlite(pool) => {
                let query = q.params.iter().fold(sqlx::query(&q.sql), bind_sqlite);
                query.fetch_one(pool).await?.try_get::<i64, _>(0)?
            }
            Database::Postgres(pool) => {
                let query = q.params.iter().fold(sqlx::query(&q.sql), bind_pg);
                query.fetch_one(pool).await?.try_get::<i64, _>(0)?
            }
        };
        Ok(value)
    }

    pub async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Item>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = match self {
            Database::Sqlite(pool) => {
                let query = q.params.iter().fold(sqlx::query(&q.sql), bind_sqlite);
                query.fetch_optional(pool).await?.map(|r| sqlite_row_to_item(&r))
            }
            Database::Postgres(pool) => {
                let query = q.params.iter().fold(sqlx::query(&q.sql), bind_pg);
                query.fetch_optional(pool).await?.map(|r| pg_row_to_item(&r))
            }
        };
        Ok(row)
    }

    pub async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Item>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = match self {
            Database::Sqlite(pool) => {
                let query = q.params.iter().fold(sqlx::query(&q.sql), bind_sqlite);
                query.fetch_all(pool).await?.iter().map(sqlite_row_to_item).collect()
            }
            Database::Postgres(pool) => {
                let query = q.params.iter().fold(sqlx::query(&q.sql), bind_pg);
                query.fetch_all(pool).await?.iter().map(pg_row_to_item).collect()
            }
        };
        Ok(rows)
    }

    /// Whether a table of that name exists. Used by readiness checks and tests.
    pub async fn table_exists(&self, name: &str) -> Result<bool, AppError> {
        let exists = match self {
            Database::Sqlite(pool) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")
                    .bind(name)
                    .fetch_one(pool)
                    .await?
                    > 0
            }
            Database::Postgres(pool) => {
                sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = $1)",
                )
                .bind(name)
                .fetch_one(pool)
                .await?
            }
        };
        Ok(exists)
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.execute_ddl("SELECT 1").await
    }
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = PgConnectOptions::from_str(&admin_url)
        .map_err(|e| SettingsError::Invalid {
            key: "DATABASE_URL",
            reason: e.to_string(),
        })?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", crate::sql::quote(&db_name)?))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or(SettingsError::Invalid {
            key: "DATABASE_URL",
            reason: "no database path".into(),
        })?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}
