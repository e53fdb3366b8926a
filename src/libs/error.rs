// error.rs
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::libs::messages::MessageKey;

pub type RelayResult<T> = Result<T, RelayError>;

/// Every way a relayed request can fail. Each variant maps to a fixed status
/// and catalog message; database-phase variants also carry the driver text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("{}", MessageKey::NoQuery)]
    NoQuery,

    #[error("{}", MessageKey::MethodNotAllowed)]
    MethodNotAllowed,

    #[error("{}", MessageKey::NotFound)]
    NotFound,

    #[error("{}", MessageKey::OperationNotAllowed)]
    OperationNotAllowed,

    #[error("{}", MessageKey::OnlySelectInsert)]
    OnlySelectInsert,

    #[error("{}: {}", MessageKey::DatabaseConnectionError, .0)]
    DatabaseConnectionError(String),

    #[error("{}: {}", MessageKey::CreateDatabaseError, .0)]
    CreateDatabaseError(String),

    #[error("{}: {}", MessageKey::CreateTableError, .0)]
    CreateTableError(String),

    #[error("{}: {}", MessageKey::QueryExecutionError, .0)]
    QueryExecutionError(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::NoQuery | RelayError::OnlySelectInsert => StatusCode::BAD_REQUEST,
            RelayError::OperationNotAllowed => StatusCode::FORBIDDEN,
            RelayError::NotFound => StatusCode::NOT_FOUND,
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::DatabaseConnectionError(_)
            | RelayError::CreateDatabaseError(_)
            | RelayError::CreateTableError(_)
            | RelayError::QueryExecutionError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message_key(&self) -> MessageKey {
        match self {
            RelayError::NoQuery => MessageKey::NoQuery,
            RelayError::MethodNotAllowed => MessageKey::MethodNotAllowed,
            RelayError::NotFound => MessageKey::NotFound,
            RelayError::OperationNotAllowed => MessageKey::OperationNotAllowed,
            RelayError::OnlySelectInsert => MessageKey::OnlySelectInsert,
            RelayError::DatabaseConnectionError(_) => MessageKey::DatabaseConnectionError,
            RelayError::CreateDatabaseError(_) => MessageKey::CreateDatabaseError,
            RelayError::CreateTableError(_) => MessageKey::CreateTableError,
            RelayError::QueryExecutionError(_) => MessageKey::QueryExecutionError,
        }
    }

    /// Driver error text, present only for database-phase failures.
    pub fn details(&self) -> Option<&str> {
        match self {
            RelayError::DatabaseConnectionError(d)
            | RelayError::CreateDatabaseError(d)
            | RelayError::CreateTableError(d)
            | RelayError::QueryExecutionError(d) => Some(d),
            _ => None,
        }
    }
}

/// JSON body written for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a str>,
}

impl<'a> From<&'a RelayError> for ErrorBody<'a> {
    fn from(err: &'a RelayError) -> Self {
        Self {
            error: err.message_key().text(),
            details: err.details(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}
