//! Storage error types.

use thiserror::Error;

use mintd_domain::{DomainError, ResourceKind};

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Project not found.
    #[error("project not found: {project_id}")]
    ProjectNotFound { project_id: String },

    /// Issuer node not found.
    #[error("issuer node not found: {node_id}")]
    NodeNotFound { node_id: String },

    /// Asset not found.
    #[error("asset not found: {asset_id}")]
    AssetNotFound { asset_id: String },

    /// Pagination cursor failed to decode or targets another collection.
    #[error("invalid cursor: {message}")]
    InvalidCursor { message: String },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Creation conflict.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Transaction error.
    #[error("transaction error: {message}")]
    TransactionError { message: String },

    /// Internal error.
    #[error("internal storage error: {message}")]
    Internal { message: String },
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ProjectNotFound { project_id } => DomainError::NotFound {
                kind: ResourceKind::Project,
                id: project_id,
            },
            StorageError::NodeNotFound { node_id } => DomainError::NotFound {
                kind: ResourceKind::IssuerNode,
                id: node_id,
            },
            StorageError::AssetNotFound { asset_id } => DomainError::NotFound {
                kind: ResourceKind::Asset,
                id: asset_id,
            },
            StorageError::InvalidCursor { message } | StorageError::InvalidInput { message } => {
                DomainError::InvalidRequest { message }
            }
            StorageError::Conflict { message } => DomainError::Conflict { message },
            StorageError::TransactionError { message } | StorageError::Internal { message } => {
                DomainError::Internal { message }
            }
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
