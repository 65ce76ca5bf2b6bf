use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathDbError {
    #[error("Invalid field path '{path}': {reason}")]
    InvalidFieldPath { path: String, reason: String },

    #[error("Duplicate value {value} for unique field '{path}'")]
    FieldDuplicated { path: String, value: String },

    #[error("Malformed field path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("Database corrupted: {0}")]
    DatabaseCorrupted(String),

    #[error("Database object cannot be serialized: {0}")]
    DatabaseObjectCorrupted(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PathDbError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        PathDbError::InvalidFieldPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn duplicated(path: &str, value: &serde_json::Value) -> Self {
        PathDbError::FieldDuplicated {
            path: path.to_string(),
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PathDbError>;
