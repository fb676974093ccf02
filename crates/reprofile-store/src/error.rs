use thiserror::Error;

/// Errors surfaced by the tenant registry and store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("field encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("tenant not found: {0}")]
    TenantNotFound(String),

    #[error("record not found: {0}")]
    RecordNotFound(i64),

    #[error("field is not a repeater: {field}")]
    NotARepeater { field: String },
}
