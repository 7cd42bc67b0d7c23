//! Adapters bridging the storage layer to the domain authorization traits.

use std::sync::Arc;

use async_trait::async_trait;

use mintd_domain::{AccessSource, DomainResult};
use mintd_storage::DataStore;

/// Implements the domain [`AccessSource`] over any [`DataStore`], letting
/// the authorizer work against whatever backend the server was built with.
pub struct StoreAccessSource<S> {
    store: Arc<S>,
}

impl<S> StoreAccessSource<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DataStore> AccessSource for StoreAccessSource<S> {
    async fn is_project_member(&self, user_id: &str, project_id: &str) -> DomainResult<bool> {
        Ok(self.store.is_project_member(user_id, project_id).await?)
    }

    async fn issuer_node_project(&self, node_id: &str) -> DomainResult<Option<String>> {
        Ok(self.store.issuer_node_project(node_id).await?)
    }

    async fn asset_issuer_node(&self, asset_id: &str) -> DomainResult<Option<String>> {
        Ok(self.store.asset_issuer_node(asset_id).await?)
    }
}
