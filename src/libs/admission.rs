// admission.rs
use crate::libs::error::{RelayError, RelayResult};

/// Matched anywhere in the lower-cased text, not as whole tokens, so a column
/// such as `update_time` is refused too.
pub const DENIED_KEYWORDS: [&str; 4] = ["update", "delete", "drop", "alter"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
}

/// A statement that passed the filter, with its caller's casing intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedQuery {
    pub sql: String,
    pub kind: StatementKind,
}

/// Decide whether `raw` may be forwarded to the database.
pub fn admit(raw: &str) -> RelayResult<AdmittedQuery> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return Err(RelayError::NoQuery);
    }

    if DENIED_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return Err(RelayError::OperationNotAllowed);
    }

    let kind = if lowered.starts_with("select") {
        StatementKind::Select
    } else if lowered.starts_with("insert") {
        StatementKind::Insert
    } else {
        return Err(RelayError::OnlySelectInsert);
    };

    Ok(AdmittedQuery {
        sql: raw.to_string(),
        kind,
    })
}
