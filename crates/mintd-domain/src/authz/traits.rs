//! Traits for the lookups needed by the authorization resolver.

use async_trait::async_trait;

use crate::error::DomainResult;

/// Read-only access to project membership and child→parent resolution.
///
/// Implementations must be thread-safe and side-effect free; the resolver
/// issues at most two parent lookups and one membership check per decision.
#[async_trait]
pub trait AccessSource: Send + Sync {
    /// Whether the user holds membership on the project.
    async fn is_project_member(&self, user_id: &str, project_id: &str) -> DomainResult<bool>;

    /// Resolves an issuer node to its owning project, or `None` if the node
    /// ID does not resolve.
    async fn issuer_node_project(&self, node_id: &str) -> DomainResult<Option<String>>;

    /// Resolves an asset to its owning issuer node, or `None` if the asset
    /// ID does not resolve.
    async fn asset_issuer_node(&self, asset_id: &str) -> DomainResult<Option<String>>;
}
