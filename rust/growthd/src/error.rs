use serde_json::{json, Value};
use thiserror::Error;

/// Failures raised by a worksheet backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row {index} is out of range (worksheet has {rows} rows including header)")]
    RowOutOfRange { index: usize, rows: usize },

    #[error("expected {expected} values per row, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("worksheet unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Unavailable(format!("corrupt cell data: {e}"))
    }
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("student with roll number {0} already exists")]
    DuplicateKey(String),

    #[error("no student found with roll number {0}")]
    NotFound(String),

    #[error("missing required columns: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("record store unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("row {row} is malformed: {message}")]
    MalformedRow { row: usize, message: String },

    /// A bulk import stopped partway. Rows in `added` were committed.
    #[error("import stopped after {} rows were added: {source}", added.len())]
    ImportInterrupted {
        added: Vec<String>,
        source: Box<RepoError>,
    },
}

impl From<StoreError> for RepoError {
    fn from(e: StoreError) -> Self {
        RepoError::UpstreamUnavailable(e.to_string())
    }
}

impl RepoError {
    /// Stable wire code for the IPC error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            RepoError::DuplicateKey(_) => "duplicate_key",
            RepoError::NotFound(_) => "not_found",
            RepoError::SchemaMismatch { .. } => "schema_mismatch",
            RepoError::UpstreamUnavailable(_) => "upstream_unavailable",
            RepoError::InvalidRecord(_) | RepoError::InvalidArgument(_) => "bad_params",
            RepoError::MalformedRow { .. } => "malformed_row",
            RepoError::ImportInterrupted { source, .. } => source.code(),
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            RepoError::DuplicateKey(roll) | RepoError::NotFound(roll) => {
                Some(json!({ "rollNumber": roll }))
            }
            RepoError::SchemaMismatch { missing } => Some(json!({ "missing": missing })),
            RepoError::MalformedRow { row, .. } => Some(json!({ "row": row })),
            RepoError::ImportInterrupted { added, .. } => Some(json!({ "added": added })),
            _ => None,
        }
    }
}
