//! In-memory storage implementation.
//!
//! Backs the resource layer with `DashMap`s for thread-safe concurrent
//! access. Ordering keys come from a single monotonic counter, so every
//! collection pages in stable ascending order and appended items can never
//! sort before an already-returned one.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::instrument;

use mintd_domain::{CreateNodeRequest, KeySpec};

use crate::error::{StorageError, StorageResult};
use crate::traits::{
    ActivityRecord, Asset, Circulation, Cursor, DataStore, IssuerNode, KeyEntry, PageLimits,
    PageQuery, PaginatedResult, StoreTransaction, TransactionRecord, ACTIVITY_PAGE_LIMITS,
    ASSET_PAGE_LIMITS,
};

#[derive(Default)]
struct Inner {
    /// Project ID -> member user IDs. Projects are created externally; the
    /// seeding methods below stand in for that collaborator.
    projects: DashMap<String, HashSet<String>>,
    nodes: DashMap<String, IssuerNode>,
    assets: DashMap<String, Asset>,
    node_activity: DashMap<String, Vec<ActivityRecord>>,
    asset_activity: DashMap<String, Vec<ActivityRecord>>,
    node_txs: DashMap<String, Vec<TransactionRecord>>,
    asset_txs: DashMap<String, Vec<TransactionRecord>>,
    /// Global ordering-key counter. Strictly increasing, never reused.
    seq: AtomicU64,
    /// Test hook: when set, every commit fails after the domain work ran.
    fail_commits: AtomicBool,
}

impl Inner {
    fn next_key(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn require_node(&self, node_id: &str) -> StorageResult<()> {
        if self.nodes.contains_key(node_id) {
            Ok(())
        } else {
            Err(StorageError::NodeNotFound {
                node_id: node_id.to_string(),
            })
        }
    }

    fn require_asset(&self, asset_id: &str) -> StorageResult<()> {
        if self.assets.contains_key(asset_id) {
            Ok(())
        } else {
            Err(StorageError::AssetNotFound {
                asset_id: asset_id.to_string(),
            })
        }
    }
}

/// In-memory implementation of [`DataStore`].
///
/// Cloning is cheap and shares the underlying maps.
#[derive(Clone, Default)]
pub struct MemoryDataStore {
    inner: Arc<Inner>,
}

fn assets_collection(node_id: &str) -> String {
    format!("assets:{node_id}")
}

fn activity_collection(owner: &str, id: &str) -> String {
    format!("{owner}-activity:{id}")
}

fn txs_collection(owner: &str, id: &str) -> String {
    format!("{owner}-txs:{id}")
}

/// Pages `items` in ascending `sort_key` order, resuming strictly after the
/// cursor position. Probes one element past the limit so `last` is absent
/// exactly when nothing remains beyond the returned page.
fn paginate<T: Clone>(
    mut items: Vec<T>,
    sort_key: impl Fn(&T) -> u64,
    collection: &str,
    page: &PageQuery,
    limits: PageLimits,
) -> StorageResult<PaginatedResult<T>> {
    let limit = limits.resolve(page.limit)?;
    let after = Cursor::start_after(page.cursor.as_deref(), collection)?;

    items.sort_by_key(|item| sort_key(item));
    let start = match after {
        Some(key) => items.partition_point(|item| sort_key(item) <= key),
        None => 0,
    };

    let mut page_items: Vec<T> = items.into_iter().skip(start).take(limit + 1).collect();
    let has_more = page_items.len() > limit;
    if has_more {
        page_items.truncate(limit);
    }

    let last = if has_more {
        page_items
            .last()
            .map(|item| Cursor::new(collection, sort_key(item)).encode())
    } else {
        None
    };

    Ok(PaginatedResult {
        items: page_items,
        last,
    })
}

impl MemoryDataStore {
    /// Creates a new in-memory data store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory data store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Seeds a project with its member set. Stands in for the external
    /// project-provisioning collaborator.
    pub fn insert_project(&self, project_id: &str, members: &[&str]) {
        self.inner.projects.insert(
            project_id.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
    }

    /// Appends an activity record to an issuer node's history. Stands in
    /// for the external activity-ingestion collaborator.
    pub fn record_node_activity(
        &self,
        node_id: &str,
        data: Value,
    ) -> StorageResult<ActivityRecord> {
        self.inner.require_node(node_id)?;
        let record = self.new_activity_record(data);
        self.inner
            .node_activity
            .entry(node_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    /// Appends an activity record to an asset's history.
    pub fn record_asset_activity(
        &self,
        asset_id: &str,
        data: Value,
    ) -> StorageResult<ActivityRecord> {
        self.inner.require_asset(asset_id)?;
        let record = self.new_activity_record(data);
        self.inner
            .asset_activity
            .entry(asset_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    /// Appends a transaction record to an issuer node's history.
    pub fn record_node_transaction(
        &self,
        node_id: &str,
        data: Value,
    ) -> StorageResult<TransactionRecord> {
        self.inner.require_node(node_id)?;
        let record = self.new_transaction_record(data);
        self.inner
            .node_txs
            .entry(node_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    /// Appends a transaction record to an asset's history.
    pub fn record_asset_transaction(
        &self,
        asset_id: &str,
        data: Value,
    ) -> StorageResult<TransactionRecord> {
        self.inner.require_asset(asset_id)?;
        let record = self.new_transaction_record(data);
        self.inner
            .asset_txs
            .entry(asset_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    /// Increments an asset's circulation total. Issuance only ever adds;
    /// this layer has no decrement path.
    pub fn add_circulation(&self, asset_id: &str, amount: u64) -> StorageResult<u64> {
        let mut asset =
            self.inner
                .assets
                .get_mut(asset_id)
                .ok_or_else(|| StorageError::AssetNotFound {
                    asset_id: asset_id.to_string(),
                })?;
        asset.circulation.total += amount;
        Ok(asset.circulation.total)
    }

    /// Test hook: make subsequent commits fail after the domain work ran.
    pub fn set_fail_commits(&self, enabled: bool) {
        self.inner.fail_commits.store(enabled, Ordering::SeqCst);
    }

    fn new_activity_record(&self, data: Value) -> ActivityRecord {
        ActivityRecord {
            id: ulid::Ulid::new().to_string(),
            sort_key: self.inner.next_key(),
            created_at: Utc::now(),
            data,
        }
    }

    fn new_transaction_record(&self, data: Value) -> TransactionRecord {
        TransactionRecord {
            id: ulid::Ulid::new().to_string(),
            sort_key: self.inner.next_key(),
            created_at: Utc::now(),
            data,
        }
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> StorageResult<MemoryTransaction> {
        Ok(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            new_nodes: Vec::new(),
            new_assets: Vec::new(),
        })
    }

    async fn is_project_member(&self, user_id: &str, project_id: &str) -> StorageResult<bool> {
        Ok(self
            .inner
            .projects
            .get(project_id)
            .is_some_and(|members| members.contains(user_id)))
    }

    async fn issuer_node_project(&self, node_id: &str) -> StorageResult<Option<String>> {
        Ok(self
            .inner
            .nodes
            .get(node_id)
            .map(|node| node.project_id.clone()))
    }

    async fn asset_issuer_node(&self, asset_id: &str) -> StorageResult<Option<String>> {
        Ok(self
            .inner
            .assets
            .get(asset_id)
            .map(|asset| asset.issuer_node_id.clone()))
    }

    async fn get_issuer_node(&self, node_id: &str) -> StorageResult<IssuerNode> {
        self.inner
            .nodes
            .get(node_id)
            .map(|node| node.value().clone())
            .ok_or_else(|| StorageError::NodeNotFound {
                node_id: node_id.to_string(),
            })
    }

    async fn list_issuer_nodes(&self, project_id: &str) -> StorageResult<Vec<IssuerNode>> {
        let mut nodes: Vec<IssuerNode> = self
            .inner
            .nodes
            .iter()
            .filter(|entry| entry.project_id == project_id)
            .map(|entry| entry.value().clone())
            .collect();
        nodes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(nodes)
    }

    #[instrument(skip(self), fields(node_id = %node_id))]
    async fn update_issuer_node_label(
        &self,
        node_id: &str,
        label: &str,
    ) -> StorageResult<IssuerNode> {
        let mut node =
            self.inner
                .nodes
                .get_mut(node_id)
                .ok_or_else(|| StorageError::NodeNotFound {
                    node_id: node_id.to_string(),
                })?;
        node.label = label.to_string();
        Ok(node.clone())
    }

    async fn delete_issuer_node(&self, node_id: &str) -> StorageResult<()> {
        if self.inner.nodes.remove(node_id).is_none() {
            return Err(StorageError::NodeNotFound {
                node_id: node_id.to_string(),
            });
        }
        self.inner.node_activity.remove(node_id);
        self.inner.node_txs.remove(node_id);
        Ok(())
    }

    async fn get_asset(&self, asset_id: &str) -> StorageResult<Asset> {
        self.inner
            .assets
            .get(asset_id)
            .map(|asset| asset.value().clone())
            .ok_or_else(|| StorageError::AssetNotFound {
                asset_id: asset_id.to_string(),
            })
    }

    async fn list_assets(
        &self,
        node_id: &str,
        page: &PageQuery,
    ) -> StorageResult<PaginatedResult<Asset>> {
        self.inner.require_node(node_id)?;
        let assets: Vec<Asset> = self
            .inner
            .assets
            .iter()
            .filter(|entry| entry.issuer_node_id == node_id)
            .map(|entry| entry.value().clone())
            .collect();
        paginate(
            assets,
            |asset| asset.sort_key,
            &assets_collection(node_id),
            page,
            ASSET_PAGE_LIMITS,
        )
    }

    #[instrument(skip(self), fields(asset_id = %asset_id))]
    async fn update_asset_label(&self, asset_id: &str, label: &str) -> StorageResult<Asset> {
        let mut asset =
            self.inner
                .assets
                .get_mut(asset_id)
                .ok_or_else(|| StorageError::AssetNotFound {
                    asset_id: asset_id.to_string(),
                })?;
        asset.label = label.to_string();
        Ok(asset.clone())
    }

    async fn delete_asset(&self, asset_id: &str) -> StorageResult<()> {
        if self.inner.assets.remove(asset_id).is_none() {
            return Err(StorageError::AssetNotFound {
                asset_id: asset_id.to_string(),
            });
        }
        self.inner.asset_activity.remove(asset_id);
        self.inner.asset_txs.remove(asset_id);
        Ok(())
    }

    async fn node_activity(
        &self,
        node_id: &str,
        page: &PageQuery,
    ) -> StorageResult<PaginatedResult<ActivityRecord>> {
        self.inner.require_node(node_id)?;
        let records = self
            .inner
            .node_activity
            .get(node_id)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        paginate(
            records,
            |record| record.sort_key,
            &activity_collection("node", node_id),
            page,
            ACTIVITY_PAGE_LIMITS,
        )
    }

    async fn asset_activity(
        &self,
        asset_id: &str,
        page: &PageQuery,
    ) -> StorageResult<PaginatedResult<ActivityRecord>> {
        self.inner.require_asset(asset_id)?;
        let records = self
            .inner
            .asset_activity
            .get(asset_id)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        paginate(
            records,
            |record| record.sort_key,
            &activity_collection("asset", asset_id),
            page,
            ACTIVITY_PAGE_LIMITS,
        )
    }

    async fn node_transactions(
        &self,
        node_id: &str,
        page: &PageQuery,
    ) -> StorageResult<PaginatedResult<TransactionRecord>> {
        self.inner.require_node(node_id)?;
        let records = self
            .inner
            .node_txs
            .get(node_id)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        paginate(
            records,
            |record| record.sort_key,
            &txs_collection("node", node_id),
            page,
            ACTIVITY_PAGE_LIMITS,
        )
    }

    async fn asset_transactions(
        &self,
        asset_id: &str,
        page: &PageQuery,
    ) -> StorageResult<PaginatedResult<TransactionRecord>> {
        self.inner.require_asset(asset_id)?;
        let records = self
            .inner
            .asset_txs
            .get(asset_id)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        paginate(
            records,
            |record| record.sort_key,
            &txs_collection("asset", asset_id),
            page,
            ACTIVITY_PAGE_LIMITS,
        )
    }
}

/// Transactional creation scope for [`MemoryDataStore`].
///
/// Creations buffer in the scope and apply in [`commit`](StoreTransaction::commit);
/// dropping the scope discards them, so any exit path that skips commit is
/// a rollback.
pub struct MemoryTransaction {
    inner: Arc<Inner>,
    new_nodes: Vec<IssuerNode>,
    new_assets: Vec<Asset>,
}

/// Placeholder key material for generated entries. Stands in for the
/// key-derivation collaborator.
fn generated_xpub() -> String {
    format!("xpub-gen-{}", ulid::Ulid::new().to_string().to_lowercase())
}

/// Content-derived asset identity: a digest over the owning node, label,
/// definition, and the assigned ordering key.
fn asset_id(node_id: &str, label: &str, definition: &Value, sort_key: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(node_id.as_bytes());
    hasher.update([0]);
    hasher.update(label.as_bytes());
    hasher.update([0]);
    hasher.update(definition.to_string().as_bytes());
    hasher.update([0]);
    hasher.update(sort_key.to_le_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn create_issuer_node(
        &mut self,
        project_id: &str,
        req: &CreateNodeRequest,
    ) -> StorageResult<IssuerNode> {
        if !self.inner.projects.contains_key(project_id) {
            return Err(StorageError::ProjectNotFound {
                project_id: project_id.to_string(),
            });
        }

        let keys = req
            .keys
            .iter()
            .map(|spec| match spec {
                KeySpec::External { key } => KeyEntry {
                    xpub: key.clone(),
                    generated: false,
                },
                KeySpec::Generate => KeyEntry {
                    xpub: generated_xpub(),
                    generated: true,
                },
            })
            .collect();

        let node = IssuerNode {
            id: ulid::Ulid::new().to_string(),
            project_id: project_id.to_string(),
            label: req.label.clone(),
            keys,
            sigs_required: req.sigs_required,
            created_at: Utc::now(),
        };

        self.new_nodes.push(node.clone());
        Ok(node)
    }

    async fn create_asset(
        &mut self,
        node_id: &str,
        label: &str,
        definition: Value,
    ) -> StorageResult<Asset> {
        // Read-your-writes: a node created earlier in this scope is visible.
        let node_known = self.inner.nodes.contains_key(node_id)
            || self.new_nodes.iter().any(|n| n.id == node_id);
        if !node_known {
            return Err(StorageError::NodeNotFound {
                node_id: node_id.to_string(),
            });
        }

        let sort_key = self.inner.next_key();
        let asset = Asset {
            id: asset_id(node_id, label, &definition, sort_key),
            issuer_node_id: node_id.to_string(),
            label: label.to_string(),
            definition,
            circulation: Circulation::default(),
            sort_key,
            created_at: Utc::now(),
        };

        self.new_assets.push(asset.clone());
        Ok(asset)
    }

    async fn commit(self) -> StorageResult<()> {
        if self.inner.fail_commits.load(Ordering::SeqCst) {
            return Err(StorageError::TransactionError {
                message: "commit failed".to_string(),
            });
        }

        use dashmap::mapref::entry::Entry;
        for node in self.new_nodes {
            match self.inner.nodes.entry(node.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(StorageError::Conflict {
                        message: format!("issuer node already exists: {}", node.id),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(node);
                }
            }
        }
        for asset in self.new_assets {
            match self.inner.assets.entry(asset.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(StorageError::Conflict {
                        message: format!("asset already exists: {}", asset.id),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(asset);
                }
            }
        }
        Ok(())
    }

    async fn rollback(self) -> StorageResult<()> {
        // Buffered effects are discarded with the scope.
        Ok(())
    }
}
