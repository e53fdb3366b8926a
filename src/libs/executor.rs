// executor.rs
use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::warn;

use crate::libs::admission::{AdmittedQuery, StatementKind};
use crate::libs::database::{Database, Record, WriteSummary};
use crate::libs::error::{RelayError, RelayResult};
use crate::libs::messages::MessageKey;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<Record>),
    Write(WriteSummary),
}

#[derive(Serialize)]
struct WriteBody<'a> {
    message: &'static str,
    #[serde(flatten)]
    summary: &'a WriteSummary,
}

impl QueryOutcome {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            QueryOutcome::Rows(rows) => serde_json::Value::Array(
                rows.iter().cloned().map(serde_json::Value::Object).collect(),
            ),
            QueryOutcome::Write(summary) => serde_json::to_value(WriteBody {
                message: MessageKey::QuerySuccess.text(),
                summary,
            })
            .unwrap_or_default(),
        }
    }
}

impl IntoResponse for QueryOutcome {
    fn into_response(self) -> Response {
        Json(self.to_json()).into_response()
    }
}

/// Run an admitted statement once. Driver errors are reported, never retried.
pub async fn execute(db: &dyn Database, query: &AdmittedQuery) -> RelayResult<QueryOutcome> {
    let outcome = match query.kind {
        StatementKind::Select => db.fetch_records(&query.sql).await.map(QueryOutcome::Rows),
        StatementKind::Insert => db.execute(&query.sql).await.map(QueryOutcome::Write),
    };
    outcome.map_err(|e| {
        warn!(error = %e, "query failed");
        RelayError::QueryExecutionError(e.to_string())
    })
}
