use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EntityError {
    #[error("No active schema registered for entity type '{0}'")]
    SchemaMissing(String),

    #[error("Content for '{entity_type}' failed validation: {reason}")]
    Validation { entity_type: String, reason: String },

    #[error("Entity {0} not found")]
    NotFound(Uuid),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type StoreResult<T> = std::result::Result<T, EntityError>;

impl EntityError {
    pub fn validation(entity_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            entity_type: entity_type.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// True when the failure came from the backend rather than from the caller's input.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Storage(_))
    }
}
