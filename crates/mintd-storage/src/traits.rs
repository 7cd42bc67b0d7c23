//! DataStore trait definition, resource types, and the pagination protocol.

use async_trait::async_trait;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use mintd_domain::CreateNodeRequest;

use crate::error::{StorageError, StorageResult};

/// One entry of an issuer node's stored signature policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyEntry {
    /// Public key material. For generated entries this is supplied by the
    /// key-derivation collaborator behind the creation scope.
    pub xpub: String,
    /// Whether the key was generated on behalf of the caller.
    pub generated: bool,
}

/// A key-management/issuance scope within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuerNode {
    pub id: String,
    pub project_id: String,
    pub label: String,
    pub keys: Vec<KeyEntry>,
    pub sigs_required: u32,
    pub created_at: DateTime<Utc>,
}

/// Issuance totals for an asset. Maintained by external issuance
/// collaborators; this layer only ever reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Circulation {
    pub total: u64,
}

/// An issuable unit under an issuer node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    /// Content-derived hash identity.
    pub id: String,
    pub issuer_node_id: String,
    pub label: String,
    /// Opaque structured metadata supplied at creation.
    pub definition: Value,
    pub circulation: Circulation,
    /// Position in the node's asset listing order.
    pub sort_key: u64,
    pub created_at: DateTime<Utc>,
}

/// An append-only activity event attached to a node or asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    pub id: String,
    pub sort_key: u64,
    pub created_at: DateTime<Utc>,
    /// Opaque event payload, returned to clients verbatim.
    pub data: Value,
}

/// An append-only transaction event attached to a node or asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub id: String,
    pub sort_key: u64,
    pub created_at: DateTime<Utc>,
    /// Opaque transaction payload, returned to clients verbatim.
    pub data: Value,
}

// ============================================================
// Pagination protocol
// ============================================================

/// Caller-supplied paging parameters. `cursor` is opaque; `limit` is
/// clamped against the collection's [`PageLimits`].
#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

/// Per-collection default and maximum page sizes.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default: u32,
    pub max: u32,
}

/// Limits for asset listings.
pub const ASSET_PAGE_LIMITS: PageLimits = PageLimits {
    default: 100,
    max: 500,
};

/// Limits for activity and transaction listings.
pub const ACTIVITY_PAGE_LIMITS: PageLimits = PageLimits {
    default: 50,
    max: 200,
};

impl PageLimits {
    /// Resolves a requested page size: omitted selects the default,
    /// oversized is clamped to the maximum, zero is an error.
    pub fn resolve(&self, requested: Option<u32>) -> StorageResult<usize> {
        match requested {
            None => Ok(self.default as usize),
            Some(0) => Err(StorageError::InvalidInput {
                message: "page size must be positive".to_string(),
            }),
            Some(n) => Ok(n.min(self.max) as usize),
        }
    }
}

/// One page of an ordered collection plus the resume token.
///
/// `last` is `None` exactly when no items remain strictly beyond the final
/// returned ordering key.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub last: Option<String>,
}

/// Opaque pagination position: collection identity plus the last ordering
/// key the caller has seen.
///
/// Tokens are scoped to one collection; presenting a token against a
/// different collection is rejected rather than silently yielding another
/// collection's positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub collection: String,
    pub last_key: u64,
}

impl Cursor {
    const VERSION: &'static str = "v1";

    pub fn new(collection: impl Into<String>, last_key: u64) -> Self {
        Self {
            collection: collection.into(),
            last_key,
        }
    }

    /// Encodes the cursor as an opaque token.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(format!(
            "{}:{}:{}",
            Self::VERSION,
            self.collection,
            self.last_key
        ))
    }

    /// Decodes a token and checks it belongs to `collection`.
    pub fn decode(token: &str, collection: &str) -> StorageResult<Self> {
        let invalid = |message: &str| StorageError::InvalidCursor {
            message: message.to_string(),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| invalid("cursor is not valid base64"))?;
        let decoded =
            String::from_utf8(bytes).map_err(|_| invalid("cursor is not valid utf-8"))?;

        let rest = decoded
            .strip_prefix("v1:")
            .ok_or_else(|| invalid("unrecognized cursor version"))?;
        // The collection identity may itself contain ':'; the ordering key
        // is always the final segment.
        let (found_collection, key) = rest
            .rsplit_once(':')
            .ok_or_else(|| invalid("malformed cursor"))?;
        let last_key: u64 = key.parse().map_err(|_| invalid("malformed cursor"))?;

        if found_collection != collection {
            return Err(invalid("cursor does not belong to this collection"));
        }

        Ok(Cursor::new(found_collection, last_key))
    }

    /// Resolves an optional caller token into the ordering key to resume
    /// strictly after. Absent and empty tokens both mean "start from the
    /// beginning of the collection's order".
    pub fn start_after(token: Option<&str>, collection: &str) -> StorageResult<Option<u64>> {
        match token {
            None => Ok(None),
            Some("") => Ok(None),
            Some(t) => Ok(Some(Self::decode(t, collection)?.last_key)),
        }
    }
}

// ============================================================
// Storage traits
// ============================================================

/// Abstract storage interface for the resource layer.
///
/// Implementations must be thread-safe (Send + Sync) and support async
/// operations. Reads, label updates, and deletes operate directly on the
/// store; creations go through the transactional scope from [`DataStore::begin`].
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    /// The transactional creation scope for this backend.
    type Tx: StoreTransaction;

    /// Opens a transactional scope. Effects buffer inside the scope and
    /// become visible only on a successful commit; dropping the scope
    /// discards them.
    async fn begin(&self) -> StorageResult<Self::Tx>;

    // Membership and hierarchy resolution

    /// Whether the user holds membership on the project.
    async fn is_project_member(&self, user_id: &str, project_id: &str) -> StorageResult<bool>;

    /// Resolves an issuer node to its owning project ID.
    async fn issuer_node_project(&self, node_id: &str) -> StorageResult<Option<String>>;

    /// Resolves an asset to its owning issuer node ID.
    async fn asset_issuer_node(&self, asset_id: &str) -> StorageResult<Option<String>>;

    // Issuer nodes

    async fn get_issuer_node(&self, node_id: &str) -> StorageResult<IssuerNode>;

    /// Lists all issuer nodes in a project, oldest first.
    async fn list_issuer_nodes(&self, project_id: &str) -> StorageResult<Vec<IssuerNode>>;

    async fn update_issuer_node_label(
        &self,
        node_id: &str,
        label: &str,
    ) -> StorageResult<IssuerNode>;

    /// Deletes an issuer node. Cascade semantics for children belong to the
    /// backing store, not this layer.
    async fn delete_issuer_node(&self, node_id: &str) -> StorageResult<()>;

    // Assets

    async fn get_asset(&self, asset_id: &str) -> StorageResult<Asset>;

    async fn list_assets(
        &self,
        node_id: &str,
        page: &PageQuery,
    ) -> StorageResult<PaginatedResult<Asset>>;

    async fn update_asset_label(&self, asset_id: &str, label: &str) -> StorageResult<Asset>;

    async fn delete_asset(&self, asset_id: &str) -> StorageResult<()>;

    // Histories

    async fn node_activity(
        &self,
        node_id: &str,
        page: &PageQuery,
    ) -> StorageResult<PaginatedResult<ActivityRecord>>;

    async fn asset_activity(
        &self,
        asset_id: &str,
        page: &PageQuery,
    ) -> StorageResult<PaginatedResult<ActivityRecord>>;

    async fn node_transactions(
        &self,
        node_id: &str,
        page: &PageQuery,
    ) -> StorageResult<PaginatedResult<TransactionRecord>>;

    async fn asset_transactions(
        &self,
        asset_id: &str,
        page: &PageQuery,
    ) -> StorageResult<PaginatedResult<TransactionRecord>>;
}

/// A transactional creation scope.
///
/// Creations invoked on the scope buffer until [`commit`](StoreTransaction::commit);
/// dropping the scope (explicitly via [`rollback`](StoreTransaction::rollback)
/// or by unwinding) discards every buffered effect. A caller must never
/// treat a returned resource as created unless commit succeeded.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Creates an issuer node from a canonical creation request.
    async fn create_issuer_node(
        &mut self,
        project_id: &str,
        req: &CreateNodeRequest,
    ) -> StorageResult<IssuerNode>;

    /// Creates an asset under an issuer node.
    async fn create_asset(
        &mut self,
        node_id: &str,
        label: &str,
        definition: Value,
    ) -> StorageResult<Asset>;

    /// Applies all buffered effects atomically.
    async fn commit(self) -> StorageResult<()>
    where
        Self: Sized;

    /// Discards all buffered effects.
    async fn rollback(self) -> StorageResult<()>
    where
        Self: Sized;
}
