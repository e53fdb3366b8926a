// messages.rs

/// Symbolic keys for every user-facing string the relay emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    NoQuery,
    MethodNotAllowed,
    NotFound,
    OperationNotAllowed,
    OnlySelectInsert,
    DatabaseConnectionError,
    CreateDatabaseError,
    CreateTableError,
    QueryExecutionError,
    DatabaseReady,
    TableReady,
    QuerySuccess,
}

impl MessageKey {
    pub const fn text(self) -> &'static str {
        match self {
            MessageKey::NoQuery => "No SQL query provided",
            MessageKey::MethodNotAllowed => "Method not allowed",
            MessageKey::NotFound => "Not Found",
            MessageKey::OperationNotAllowed => "Operation not allowed",
            MessageKey::OnlySelectInsert => "Only SELECT or INSERT queries are allowed",
            MessageKey::DatabaseConnectionError => "Error connecting to MySQL",
            MessageKey::CreateDatabaseError => "Error creating database",
            MessageKey::CreateTableError => "Error creating table",
            MessageKey::QueryExecutionError => "Error executing query",
            MessageKey::DatabaseReady => "Database is ready",
            MessageKey::TableReady => "Table is ready",
            MessageKey::QuerySuccess => "Query executed successfully",
        }
    }
}

impl std::fmt::Display for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}
