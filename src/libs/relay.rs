// relay.rs
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::libs::admission::admit;
use crate::libs::database::Database;
use crate::libs::error::{RelayError, RelayResult};
use crate::libs::executor::{QueryOutcome, execute};
use crate::libs::messages::MessageKey;
use crate::libs::schema::{PATIENT_TABLE, TableSchema, ensure_table};

/// The admit, ensure-schema, execute pipeline behind every request.
pub struct Relay {
    db: Arc<dyn Database>,
    table: TableSchema,
}

impl Relay {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self::with_table(db, PATIENT_TABLE)
    }

    pub fn with_table(db: Arc<dyn Database>, table: TableSchema) -> Self {
        Self { db, table }
    }

    pub fn database(&self) -> &dyn Database {
        self.db.as_ref()
    }

    pub async fn process(&self, raw: &str) -> RelayResult<QueryOutcome> {
        let query = admit(raw).inspect_err(|e| debug!(reason = %e, "query rejected"))?;
        ensure_table(self.database(), &self.table).await?;
        execute(self.database(), &query).await
    }

    /// Startup preparation. Every step logs its own failure and the server
    /// keeps running; requests will surface the problem later.
    pub async fn bootstrap(&self) {
        if let Err(e) = self.db.ping().await {
            let err = RelayError::DatabaseConnectionError(e.to_string());
            error!(error = %err, "database unreachable at startup");
        }

        match self.db.ensure_database().await {
            Ok(Some(name)) => info!(database = %name, "{}", MessageKey::DatabaseReady),
            Ok(None) => {}
            Err(e) => {
                let err = RelayError::CreateDatabaseError(e.to_string());
                error!(error = %err, "database bootstrap failed");
                return;
            }
        }

        match ensure_table(self.database(), &self.table).await {
            Ok(()) => info!(table = self.table.name, "{}", MessageKey::TableReady),
            Err(err) => error!(error = %err, "table bootstrap failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::database::SqliteDatabase;

    async fn relay() -> Relay {
        Relay::new(Arc::new(SqliteDatabase::in_memory().await.unwrap()))
    }

    #[tokio::test]
    async fn creates_table_on_first_query() {
        let relay = relay().await;
        let out = relay.process("SELECT * FROM patient").await.unwrap();
        assert_eq!(out, QueryOutcome::Rows(Vec::new()));
    }

    #[tokio::test]
    async fn rejects_before_touching_database() {
        let relay = relay().await;
        assert_eq!(
            relay.process("drop table patient").await,
            Err(RelayError::OperationNotAllowed)
        );
        // The table was never created because admission failed first.
        let rows = relay
            .database()
            .fetch_records("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'patient'")
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn bootstrap_prepares_table() {
        let relay = relay().await;
        relay.bootstrap().await;
        let rows = relay
            .database()
            .fetch_records("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'patient'")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn create_failure_stops_the_query() {
        let relay = Relay::with_table(
            Arc::new(SqliteDatabase::in_memory().await.unwrap()),
            TableSchema {
                name: "patient(",
                columns: &[],
            },
        );
        let err = relay
            .process("INSERT INTO patient (name) VALUES ('x')")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::CreateTableError(_)));
    }

    #[tokio::test]
    async fn unreachable_database_keeps_serving_with_errors() {
        use sqlx::sqlite::SqliteConnectOptions;

        // The parent directory does not exist, so every connect fails.
        let path = std::env::temp_dir()
            .join(format!("patient-relay-missing-{}", std::process::id()))
            .join("relay.db");
        let db = SqliteDatabase::connect_lazy(SqliteConnectOptions::new().filename(path), 1);
        let relay = Relay::new(Arc::new(db));

        relay.bootstrap().await;

        match relay.process("SELECT * FROM patient").await {
            Err(RelayError::CreateTableError(details)) => assert!(!details.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }
}
