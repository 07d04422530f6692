use polars::error::PolarsError;
use poshan::error::PoshanError;

#[derive(thiserror::Error, Debug)]
pub enum PoshanCliError {
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("serde JSON error: {0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("poshan error: {0}")]
    PoshanError(#[from] PoshanError),
    #[error("std IO error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type PoshanCliResult<T> = Result<T, PoshanCliError>;
