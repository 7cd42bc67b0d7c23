//! mintd-server: resource handlers and business logic
//!
//! This crate composes the domain protocols over a storage backend:
//! - Resource handlers for issuer nodes and assets
//!   (authorize → normalize → create/read/write → paginate)
//! - The transactional creator wrapping domain creations in an atomic scope
//! - Configuration management
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               mintd-server                   │
//! ├─────────────────────────────────────────────┤
//! │  config.rs   - Configuration management     │
//! │  create.rs   - Transactional creator        │
//! │  handlers/   - Resource handlers            │
//! │    issuer_nodes.rs - Node operations        │
//! │    assets.rs       - Asset operations       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod create;
pub mod handlers;

// Re-exports for convenience
pub use config::{ConfigLoadError, ServerConfig};
pub use create::create_within_transaction;
pub use handlers::ResourceHandlers;
