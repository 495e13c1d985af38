use std::fmt;
use std::time::Duration;

/// Patient fields that carry a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Id,
    TagId,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Id => f.write_str("id"),
            UniqueField::TagId => f.write_str("tagId"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("duplicate {0}: already assigned to another patient")]
    Duplicate(UniqueField),
    #[error("unknown patient: {0}")]
    PatientNotFound(String),
    #[error("unknown tag: {0}")]
    TagNotFound(String),
    #[error("no patients match the query")]
    NoMatches,
    #[error("location for tag {tag_id} not recorded: too soon after the previous reading")]
    TooSoon { tag_id: String },

    #[error("patient store did not respond within {0:?}")]
    StoreTimeout(Duration),
    #[error("patient store task failed: {0}")]
    StoreTask(String),
    #[error("failed to read patient store: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write patient store: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize patients: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize patients: {0}")]
    Deserialization(serde_json::Error),
    #[error("patient store is inconsistent: {0}")]
    CorruptStore(String),
}

impl PatientError {
    /// Whether the error comes from the store itself rather than from the request.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            PatientError::StoreTimeout(_)
                | PatientError::StoreTask(_)
                | PatientError::FileRead(_)
                | PatientError::FileWrite(_)
                | PatientError::Serialization(_)
                | PatientError::Deserialization(_)
                | PatientError::CorruptStore(_)
        )
    }
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;
