use serde::Serialize;
use thiserror::Error;

/// A second record claimed an already indexed codice redazionale.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("duplicate codice redazionale `{codice}`")]
pub struct DuplicateKeyError {
    pub codice: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no record with codice redazionale `{0}`")]
    NotFound(String),

    #[error(transparent)]
    Duplicate(#[from] DuplicateKeyError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "parquet")]
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
