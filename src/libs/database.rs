// database.rs
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row};
use tracing::info;

use crate::libs::schema::Dialect;

/// One result row, keyed by column name in select order.
pub type Record = serde_json::Map<String, Value>;

/// What a non-select statement reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteSummary {
    pub affected_rows: u64,
    pub insert_id: u64,
}

/// A pooled relational database the relay forwards statements to.
#[async_trait]
pub trait Database: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Round-trip a trivial statement to prove the pool can connect.
    async fn ping(&self) -> sqlx::Result<()>;

    /// Create the configured database if the server supports it. Returns the
    /// database name when something was attempted.
    async fn ensure_database(&self) -> sqlx::Result<Option<String>>;

    async fn fetch_records(&self, sql: &str) -> sqlx::Result<Vec<Record>>;

    async fn execute(&self, sql: &str) -> sqlx::Result<WriteSummary>;
}

// -------- MySQL --------

pub struct MySqlDatabase {
    pool: MySqlPool,
    /// Server-level options (no default schema) plus the schema to create.
    bootstrap: Option<(MySqlConnectOptions, String)>,
}

impl MySqlDatabase {
    /// Build a pool that connects on first use, so an unreachable server
    /// does not stop the process from starting.
    pub fn connect_lazy(
        options: MySqlConnectOptions,
        bootstrap: Option<(MySqlConnectOptions, String)>,
        max_connections: u32,
    ) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy_with(options);
        Self { pool, bootstrap }
    }

    fn decode_row(row: &MySqlRow) -> Record {
        let mut map = Record::new();
        for col in row.columns() {
            map.insert(col.name().to_string(), Self::decode_value(row, col.ordinal()));
        }
        map
    }

    fn decode_value(row: &MySqlRow, idx: usize) -> Value {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.map(Value::from).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
            return v.map(Value::from).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return v.map(Value::from).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
            return v.map(Value::from).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return v.map(Value::from).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
            return v
                .map(|dt| Value::from(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
                .unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
            return v.map(|dt| Value::from(dt.to_rfc3339())).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
            return v
                .map(|d| Value::from(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveTime>, _>(idx) {
            return v
                .map(|t| Value::from(t.format("%H:%M:%S").to_string()))
                .unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
            return v
                .map(|b| Value::from(String::from_utf8_lossy(&b).into_owned()))
                .unwrap_or(Value::Null);
        }
        // DECIMAL and friends arrive as text on the wire.
        match row.try_get_unchecked::<Option<String>, _>(idx) {
            Ok(Some(v)) => Value::from(v),
            _ => Value::Null,
        }
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn ping(&self) -> sqlx::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn ensure_database(&self) -> sqlx::Result<Option<String>> {
        let Some((server, name)) = &self.bootstrap else {
            return Ok(None);
        };
        let mut conn = server.connect().await?;
        let sql = format!(
            "CREATE DATABASE IF NOT EXISTS `{}`",
            name.replace('`', "``")
        );
        sqlx::Executor::execute(&mut conn, sqlx::raw_sql(&sql)).await?;
        conn.close().await?;
        Ok(Some(name.clone()))
    }

    async fn fetch_records(&self, sql: &str) -> sqlx::Result<Vec<Record>> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(Self::decode_row).collect())
    }

    async fn execute(&self, sql: &str) -> sqlx::Result<WriteSummary> {
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(WriteSummary {
            affected_rows: result.rows_affected(),
            insert_id: result.last_insert_id(),
        })
    }
}

// -------- SQLite --------

pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub fn connect_lazy(options: SqliteConnectOptions, max_connections: u32) -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy_with(options.create_if_missing(true));
        Self { pool }
    }

    /// Private in-memory database on a single pinned connection. The
    /// connection must never be recycled or the data goes with it.
    pub async fn in_memory() -> sqlx::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    fn decode_row(row: &SqliteRow) -> Record {
        let mut map = Record::new();
        for col in row.columns() {
            map.insert(col.name().to_string(), Self::decode_value(row, col.ordinal()));
        }
        map
    }

    fn decode_value(row: &SqliteRow, idx: usize) -> Value {
        match row.try_get::<Option<i64>, _>(idx) {
            Ok(Some(v)) => Value::from(v),
            Ok(None) => Value::Null,
            Err(_) => match row.try_get::<Option<f64>, _>(idx) {
                Ok(Some(v)) => Value::from(v),
                Ok(None) => Value::Null,
                Err(_) => match row.try_get::<Option<String>, _>(idx) {
                    Ok(Some(v)) => Value::from(v),
                    Ok(None) => Value::Null,
                    Err(_) => match row.try_get::<Option<Vec<u8>>, _>(idx) {
                        Ok(Some(v)) => Value::from(String::from_utf8_lossy(&v).into_owned()),
                        _ => Value::Null,
                    },
                },
            },
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn ping(&self) -> sqlx::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn ensure_database(&self) -> sqlx::Result<Option<String>> {
        // The file is created on connect.
        Ok(None)
    }

    async fn fetch_records(&self, sql: &str) -> sqlx::Result<Vec<Record>> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(Self::decode_row).collect())
    }

    async fn execute(&self, sql: &str) -> sqlx::Result<WriteSummary> {
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(WriteSummary {
            affected_rows: result.rows_affected(),
            insert_id: u64::try_from(result.last_insert_rowid()).unwrap_or_default(),
        })
    }
}

/// Where the relay sends its statements.
#[derive(Debug, Clone)]
pub enum DatabaseTarget {
    MySql {
        options: MySqlConnectOptions,
        bootstrap: Option<(MySqlConnectOptions, String)>,
    },
    Sqlite(SqliteConnectOptions),
}

/// Build the pooled backend for `target` without touching the network.
pub fn connect_lazy(target: DatabaseTarget, max_connections: u32) -> Arc<dyn Database> {
    match target {
        DatabaseTarget::MySql { options, bootstrap } => {
            info!(
                host = options.get_host(),
                port = options.get_port(),
                database = options.get_database().unwrap_or_default(),
                "using MySQL backend"
            );
            Arc::new(MySqlDatabase::connect_lazy(options, bootstrap, max_connections))
        }
        DatabaseTarget::Sqlite(options) => {
            info!(filename = %options.get_filename().display(), "using SQLite backend");
            Arc::new(SqliteDatabase::connect_lazy(options, max_connections))
        }
    }
}
