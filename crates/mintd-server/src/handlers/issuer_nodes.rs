//! Issuer-node operations.

use serde_json::Value;
use tracing::instrument;

use mintd_domain::{normalize, AccessSource, DomainError, DomainResult, Principal, ResourceRef};
use mintd_storage::{
    ActivityRecord, DataStore, IssuerNode, PageQuery, PaginatedResult, StoreTransaction,
    TransactionRecord,
};

use crate::create::create_within_transaction;

use super::ResourceHandlers;

impl<S, A> ResourceHandlers<S, A>
where
    S: DataStore,
    A: AccessSource,
{
    /// Creates an issuer node under a project from a raw creation payload
    /// (canonical or deprecated shape).
    #[instrument(skip(self, principal, payload), fields(project_id = %project_id))]
    pub async fn create_issuer_node(
        &self,
        principal: &Principal,
        project_id: &str,
        payload: Value,
    ) -> DomainResult<IssuerNode> {
        self.authorize(principal, ResourceRef::project(project_id))
            .await?;

        let req = normalize(payload)?;

        let project_id = project_id.to_string();
        let node = create_within_transaction(self.store(), move |tx| {
            Box::pin(async move { tx.create_issuer_node(&project_id, &req).await })
        })
        .await?;
        Ok(node)
    }

    pub async fn list_issuer_nodes(
        &self,
        principal: &Principal,
        project_id: &str,
    ) -> DomainResult<Vec<IssuerNode>> {
        self.authorize(principal, ResourceRef::project(project_id))
            .await?;
        Ok(self.store().list_issuer_nodes(project_id).await?)
    }

    pub async fn get_issuer_node(
        &self,
        principal: &Principal,
        node_id: &str,
    ) -> DomainResult<IssuerNode> {
        self.authorize(principal, ResourceRef::issuer_node(node_id))
            .await?;
        Ok(self.store().get_issuer_node(node_id).await?)
    }

    pub async fn update_issuer_node(
        &self,
        principal: &Principal,
        node_id: &str,
        label: Option<String>,
    ) -> DomainResult<IssuerNode> {
        self.authorize(principal, ResourceRef::issuer_node(node_id))
            .await?;
        let label = label.ok_or_else(|| DomainError::invalid("label is required"))?;
        Ok(self
            .store()
            .update_issuer_node_label(node_id, &label)
            .await?)
    }

    pub async fn delete_issuer_node(
        &self,
        principal: &Principal,
        node_id: &str,
    ) -> DomainResult<()> {
        self.authorize(principal, ResourceRef::issuer_node(node_id))
            .await?;
        Ok(self.store().delete_issuer_node(node_id).await?)
    }

    pub async fn node_activity(
        &self,
        principal: &Principal,
        node_id: &str,
        page: &PageQuery,
    ) -> DomainResult<PaginatedResult<ActivityRecord>> {
        self.authorize(principal, ResourceRef::issuer_node(node_id))
            .await?;
        Ok(self.store().node_activity(node_id, page).await?)
    }

    pub async fn node_transactions(
        &self,
        principal: &Principal,
        node_id: &str,
        page: &PageQuery,
    ) -> DomainResult<PaginatedResult<TransactionRecord>> {
        self.authorize(principal, ResourceRef::issuer_node(node_id))
            .await?;
        Ok(self.store().node_transactions(node_id, page).await?)
    }
}
