use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// A metadata block that cannot become a record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("field `{field}` is malformed: {reason}")]
    Malformed { field: String, reason: String },

    #[error("front matter is not a YAML mapping")]
    NotAMapping,

    #[error("front matter block is not terminated by `---`")]
    Unterminated,

    #[error("YAML syntax error: {message}")]
    Yaml { message: String },
}

impl ValidationError {
    pub(crate) fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field, when the error concerns one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field } => Some(*field),
            Self::Malformed { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for ValidationError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}

/// A non-fatal data-quality finding on an accepted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyWarning {
    /// Folder segments disagree with `data-emanazione`.
    FolderDate {
        codice: String,
        folder: String,
        data_emanazione: NaiveDate,
    },
    /// Folder act-number segment disagrees with `numero-atto`.
    FolderNumber {
        codice: String,
        folder: u32,
        numero_atto: u32,
    },
    /// Date spelled out in the file name disagrees with `data-emanazione`.
    FileNameDate {
        codice: String,
        file_date: NaiveDate,
        data_emanazione: NaiveDate,
    },
    /// Two dates that should be ordered are not.
    DateOrder {
        codice: String,
        earlier: &'static str,
        later: &'static str,
    },
}

impl ConsistencyWarning {
    pub fn codice(&self) -> &str {
        match self {
            Self::FolderDate { codice, .. }
            | Self::FolderNumber { codice, .. }
            | Self::FileNameDate { codice, .. }
            | Self::DateOrder { codice, .. } => codice,
        }
    }
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FolderDate {
                codice,
                folder,
                data_emanazione,
            } => write!(
                f,
                "{codice}: folder date {folder} disagrees with data-emanazione {data_emanazione}"
            ),
            Self::FolderNumber {
                codice,
                folder,
                numero_atto,
            } => write!(
                f,
                "{codice}: folder number {folder} disagrees with numero-atto {numero_atto}"
            ),
            Self::FileNameDate {
                codice,
                file_date,
                data_emanazione,
            } => write!(
                f,
                "{codice}: file name date {file_date} disagrees with data-emanazione {data_emanazione}"
            ),
            Self::DateOrder {
                codice,
                earlier,
                later,
            } => write!(f, "{codice}: {earlier} is after {later}"),
        }
    }
}
