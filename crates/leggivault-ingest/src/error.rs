use leggivault_core::{BlockOrigin, ValidationError};
use leggivault_store::DuplicateKeyError;
use serde::Serialize;
use thiserror::Error;

/// Why one block (or one file) did not make it into the index.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "stage", content = "detail", rename_all = "snake_case")]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Duplicate(#[from] DuplicateKeyError),

    #[error("cannot read file: {message}")]
    Read { message: String },
}

impl IngestError {
    pub(crate) fn read(err: impl std::fmt::Display) -> Self {
        Self::Read {
            message: err.to_string(),
        }
    }
}

/// An [`IngestError`] tied to where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestFailure {
    pub origin: BlockOrigin,
    pub error: IngestError,
}

impl std::fmt::Display for IngestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.origin, self.error)
    }
}
