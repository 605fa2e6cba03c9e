use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid file reference: {0}")]
    InvalidReference(String),

    #[error("Cannot delete {entity}: still referenced ({constraint})")]
    ReferentialConflict {
        entity: String,
        constraint: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Statistics tree is corrupt: node {node_id} is its own ancestor")]
    CorruptTree { node_id: DbId },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image processing failed: {0}")]
    Image(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` for the "something is already gone" kinds that delete and
    /// cleanup paths are allowed to swallow.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            CoreError::NotFound { .. } | CoreError::FileNotFound(_) | CoreError::InvalidReference(_)
        )
    }
}
