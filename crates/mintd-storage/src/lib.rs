//! mintd-storage: storage abstraction layer
//!
//! This crate provides the storage abstraction for mintd, including:
//! - The `DataStore` trait and its transactional creation scope
//! - The cursor-based pagination protocol
//! - An in-memory implementation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               mintd-storage                  │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs   - DataStore trait, pagination  │
//! │  memory.rs   - In-memory implementation     │
//! │  testutil.rs - Failure-injection helpers    │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod testutil;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::{MemoryDataStore, MemoryTransaction};
pub use traits::{
    ActivityRecord, Asset, Circulation, Cursor, DataStore, IssuerNode, KeyEntry, PageLimits,
    PageQuery, PaginatedResult, StoreTransaction, TransactionRecord, ACTIVITY_PAGE_LIMITS,
    ASSET_PAGE_LIMITS,
};
