//! Application state for HTTP handlers.

use std::sync::Arc;

use mintd_domain::Authorizer;
use mintd_server::ResourceHandlers;
use mintd_storage::DataStore;

use crate::adapters::StoreAccessSource;

/// Application state shared across all HTTP handlers.
///
/// The authorizer reaches the backend through [`StoreAccessSource`], so the
/// handlers work with any storage backend that implements `DataStore`.
pub struct AppState<S: DataStore> {
    /// The storage backend.
    pub storage: Arc<S>,
    /// The resource handlers composing authorize → normalize → create/read
    /// → paginate.
    pub handlers: ResourceHandlers<S, StoreAccessSource<S>>,
}

impl<S: DataStore> AppState<S> {
    /// Creates a new application state over a storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        let access = StoreAccessSource::new(Arc::clone(&storage));
        let handlers = ResourceHandlers::new(Arc::clone(&storage), Authorizer::new(access));
        Self { storage, handlers }
    }
}
