//! Top-down authorization chain resolution.

use thiserror::Error;

use crate::error::{DomainError, ResourceKind};

use super::traits::AccessSource;
use super::{Principal, ResourceRef};

/// Internal outcome of an authorization walk.
///
/// `Forbidden` and `NotFound` are distinct here so callers can log the real
/// reason, but the wire response collapses both into the same `forbidden`
/// error: an unauthorized caller must not learn whether a resource exists.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("forbidden")]
    Forbidden,

    #[error("{kind} not found during authorization: {id}")]
    NotFound { kind: ResourceKind, id: String },

    #[error(transparent)]
    Source(DomainError),
}

impl From<AuthzError> for DomainError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden | AuthzError::NotFound { .. } => DomainError::Forbidden,
            AuthzError::Source(inner) => inner,
        }
    }
}

/// Decides access by walking the containment hierarchy to the owning
/// project and checking the principal's membership there.
pub struct Authorizer<A> {
    source: A,
}

impl<A: AccessSource> Authorizer<A> {
    pub fn new(source: A) -> Self {
        Self { source }
    }

    /// Walks `resource` up to its project and checks membership.
    ///
    /// The chain is strict: assets delegate to their issuer node, which
    /// delegates to its project. An unresolvable link yields `NotFound`
    /// with the failing kind; a resolved chain without membership yields
    /// `Forbidden`.
    pub async fn authorize(
        &self,
        principal: &Principal,
        resource: &ResourceRef,
    ) -> Result<(), AuthzError> {
        match resource {
            ResourceRef::Project { id } => self.check_project(principal, id).await,
            ResourceRef::IssuerNode { id } => {
                let project_id = self.resolve_node_project(id).await?;
                self.check_project(principal, &project_id).await
            }
            ResourceRef::Asset { id } => {
                let node_id = self
                    .source
                    .asset_issuer_node(id)
                    .await
                    .map_err(AuthzError::Source)?
                    .ok_or_else(|| AuthzError::NotFound {
                        kind: ResourceKind::Asset,
                        id: id.clone(),
                    })?;
                let project_id = self.resolve_node_project(&node_id).await?;
                self.check_project(principal, &project_id).await
            }
        }
    }

    async fn resolve_node_project(&self, node_id: &str) -> Result<String, AuthzError> {
        self.source
            .issuer_node_project(node_id)
            .await
            .map_err(AuthzError::Source)?
            .ok_or_else(|| AuthzError::NotFound {
                kind: ResourceKind::IssuerNode,
                id: node_id.to_string(),
            })
    }

    async fn check_project(
        &self,
        principal: &Principal,
        project_id: &str,
    ) -> Result<(), AuthzError> {
        let member = self
            .source
            .is_project_member(&principal.user_id, project_id)
            .await
            .map_err(AuthzError::Source)?;
        if member {
            Ok(())
        } else {
            Err(AuthzError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use async_trait::async_trait;

    use crate::error::DomainResult;

    use super::*;

    /// Fixed in-memory hierarchy for resolver tests.
    #[derive(Default)]
    struct FakeAccess {
        members: HashSet<(String, String)>,
        node_projects: HashMap<String, String>,
        asset_nodes: HashMap<String, String>,
    }

    impl FakeAccess {
        fn with_member(mut self, user: &str, project: &str) -> Self {
            self.members.insert((user.into(), project.into()));
            self
        }

        fn with_node(mut self, node: &str, project: &str) -> Self {
            self.node_projects.insert(node.into(), project.into());
            self
        }

        fn with_asset(mut self, asset: &str, node: &str) -> Self {
            self.asset_nodes.insert(asset.into(), node.into());
            self
        }
    }

    #[async_trait]
    impl AccessSource for FakeAccess {
        async fn is_project_member(&self, user_id: &str, project_id: &str) -> DomainResult<bool> {
            Ok(self
                .members
                .contains(&(user_id.to_string(), project_id.to_string())))
        }

        async fn issuer_node_project(&self, node_id: &str) -> DomainResult<Option<String>> {
            Ok(self.node_projects.get(node_id).cloned())
        }

        async fn asset_issuer_node(&self, asset_id: &str) -> DomainResult<Option<String>> {
            Ok(self.asset_nodes.get(asset_id).cloned())
        }
    }

    fn fixture() -> Authorizer<FakeAccess> {
        Authorizer::new(
            FakeAccess::default()
                .with_member("alice", "proj-1")
                .with_node("node-1", "proj-1")
                .with_asset("asset-1", "node-1"),
        )
    }

    #[tokio::test]
    async fn member_is_allowed_at_every_level() {
        let authz = fixture();
        let alice = Principal::new("alice");

        for resource in [
            ResourceRef::project("proj-1"),
            ResourceRef::issuer_node("node-1"),
            ResourceRef::asset("asset-1"),
        ] {
            authz.authorize(&alice, &resource).await.unwrap();
        }
    }

    #[tokio::test]
    async fn non_member_is_denied_at_every_level() {
        let authz = fixture();
        let mallory = Principal::new("mallory");

        for resource in [
            ResourceRef::project("proj-1"),
            ResourceRef::issuer_node("node-1"),
            ResourceRef::asset("asset-1"),
        ] {
            let err = authz.authorize(&mallory, &resource).await.unwrap_err();
            assert!(matches!(err, AuthzError::Forbidden), "got {err:?}");
        }
    }

    #[tokio::test]
    async fn unresolvable_node_is_not_found_internally() {
        let authz = fixture();
        let err = authz
            .authorize(&Principal::new("alice"), &ResourceRef::issuer_node("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthzError::NotFound {
                kind: ResourceKind::IssuerNode,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unresolvable_asset_is_not_found_internally() {
        let authz = fixture();
        let err = authz
            .authorize(&Principal::new("alice"), &ResourceRef::asset("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthzError::NotFound {
                kind: ResourceKind::Asset,
                ..
            }
        ));
    }

    #[test]
    fn wire_collapse_hides_existence() {
        // Denied and unresolvable both map to the same domain error.
        let forbidden: DomainError = AuthzError::Forbidden.into();
        let missing: DomainError = AuthzError::NotFound {
            kind: ResourceKind::IssuerNode,
            id: "ghost".into(),
        }
        .into();
        assert!(matches!(forbidden, DomainError::Forbidden));
        assert!(matches!(missing, DomainError::Forbidden));
    }
}
