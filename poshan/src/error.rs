//! Error types.

#[derive(thiserror::Error, Debug)]
pub enum PoshanError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    #[error("Invalid state for column '{column}': {reason}")]
    InvalidColumnState { column: String, reason: String },
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Invalid keyword pattern: {0}")]
    InvalidKeywordPattern(#[from] regex::Error),
    #[error("Wrapped anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
    #[error("Wrapped polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
    #[error("Wrapped IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Wrapped serde JSON error: {0}")]
    SerdeJSONError(#[from] serde_json::Error),
}

impl PoshanError {
    pub fn invalid_column_state(column: &str, reason: impl Into<String>) -> Self {
        Self::InvalidColumnState {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

pub type PoshanResult<T> = Result<T, PoshanError>;
