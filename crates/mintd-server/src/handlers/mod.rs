//! Resource handlers.
//!
//! Each operation composes the same chain: authorize the principal against
//! the target resource, then (for creations) normalize the payload and run
//! the domain creation inside the transactional creator, then (for
//! listings) apply the pagination protocol. Authorization always runs
//! first; nothing else happens for a denied caller.

mod assets;
mod issuer_nodes;

use std::sync::Arc;

use tracing::debug;

use mintd_domain::{AccessSource, Authorizer, DomainResult, Principal, ResourceRef};
use mintd_storage::DataStore;

/// Handlers for every resource operation, generic over the storage backend
/// and the authorization source.
pub struct ResourceHandlers<S, A> {
    store: Arc<S>,
    authorizer: Authorizer<A>,
}

impl<S, A> ResourceHandlers<S, A>
where
    S: DataStore,
    A: AccessSource,
{
    pub fn new(store: Arc<S>, authorizer: Authorizer<A>) -> Self {
        Self { store, authorizer }
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Gate for every operation. The internal denial reason (forbidden vs
    /// unresolvable) is logged here and then collapsed for the caller.
    pub(crate) async fn authorize(
        &self,
        principal: &Principal,
        resource: ResourceRef,
    ) -> DomainResult<()> {
        if let Err(err) = self.authorizer.authorize(principal, &resource).await {
            debug!(
                user_id = %principal.user_id,
                resource = ?resource,
                reason = %err,
                "authorization denied"
            );
            return Err(err.into());
        }
        Ok(())
    }
}
