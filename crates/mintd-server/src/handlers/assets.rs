//! Asset operations.

use serde_json::Value;
use tracing::instrument;

use mintd_domain::{AccessSource, DomainError, DomainResult, Principal, ResourceRef};
use mintd_storage::{
    ActivityRecord, Asset, DataStore, PageQuery, PaginatedResult, StoreTransaction,
    TransactionRecord,
};

use crate::create::create_within_transaction;

use super::ResourceHandlers;

impl<S, A> ResourceHandlers<S, A>
where
    S: DataStore,
    A: AccessSource,
{
    /// Creates an asset under an already-authorized issuer node.
    #[instrument(skip(self, principal, definition), fields(node_id = %node_id))]
    pub async fn create_asset(
        &self,
        principal: &Principal,
        node_id: &str,
        label: String,
        definition: Value,
    ) -> DomainResult<Asset> {
        self.authorize(principal, ResourceRef::issuer_node(node_id))
            .await?;

        let node_id = node_id.to_string();
        let asset = create_within_transaction(self.store(), move |tx| {
            Box::pin(async move { tx.create_asset(&node_id, &label, definition).await })
        })
        .await?;
        Ok(asset)
    }

    pub async fn list_assets(
        &self,
        principal: &Principal,
        node_id: &str,
        page: &PageQuery,
    ) -> DomainResult<PaginatedResult<Asset>> {
        self.authorize(principal, ResourceRef::issuer_node(node_id))
            .await?;
        Ok(self.store().list_assets(node_id, page).await?)
    }

    pub async fn get_asset(&self, principal: &Principal, asset_id: &str) -> DomainResult<Asset> {
        self.authorize(principal, ResourceRef::asset(asset_id))
            .await?;
        Ok(self.store().get_asset(asset_id).await?)
    }

    pub async fn update_asset(
        &self,
        principal: &Principal,
        asset_id: &str,
        label: Option<String>,
    ) -> DomainResult<Asset> {
        self.authorize(principal, ResourceRef::asset(asset_id))
            .await?;
        let label = label.ok_or_else(|| DomainError::invalid("label is required"))?;
        Ok(self.store().update_asset_label(asset_id, &label).await?)
    }

    pub async fn delete_asset(&self, principal: &Principal, asset_id: &str) -> DomainResult<()> {
        self.authorize(principal, ResourceRef::asset(asset_id))
            .await?;
        Ok(self.store().delete_asset(asset_id).await?)
    }

    pub async fn asset_activity(
        &self,
        principal: &Principal,
        asset_id: &str,
        page: &PageQuery,
    ) -> DomainResult<PaginatedResult<ActivityRecord>> {
        self.authorize(principal, ResourceRef::asset(asset_id))
            .await?;
        Ok(self.store().asset_activity(asset_id, page).await?)
    }

    pub async fn asset_transactions(
        &self,
        principal: &Principal,
        asset_id: &str,
        page: &PageQuery,
    ) -> DomainResult<PaginatedResult<TransactionRecord>> {
        self.authorize(principal, ResourceRef::asset(asset_id))
            .await?;
        Ok(self.store().asset_transactions(asset_id, page).await?)
    }
}
