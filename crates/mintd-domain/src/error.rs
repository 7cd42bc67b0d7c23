//! Domain error types for resource-layer operations.

use thiserror::Error;

/// The kinds of resource addressable through this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Project,
    IssuerNode,
    Asset,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Project => "project",
            ResourceKind::IssuerNode => "issuer node",
            ResourceKind::Asset => "asset",
        };
        f.write_str(name)
    }
}

/// Domain-specific errors for resource-layer operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Authorization denied, or the resource is not visible to the caller.
    /// The wire response never distinguishes these two cases.
    #[error("forbidden")]
    Forbidden,

    /// Resource ID does not resolve. Surfaced only after the authorization
    /// walk has already passed for the caller.
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },

    /// Malformed creation payload or invalid pagination parameters.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Domain-level creation conflict.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Storage or transaction failure.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    /// Convenience constructor for invalid-request errors.
    pub fn invalid(message: impl Into<String>) -> Self {
        DomainError::InvalidRequest {
            message: message.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
