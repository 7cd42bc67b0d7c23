//! mintd-api: HTTP API layer
//!
//! This crate provides the client-facing surface:
//! - HTTP REST endpoints via Axum
//! - Wire-level error mapping (including the existence-hiding collapse)
//! - Adapters bridging the storage layer to the domain authorization traits
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 mintd-api                    │
//! ├─────────────────────────────────────────────┤
//! │  http/          - HTTP REST endpoints       │
//! │  adapters.rs    - Storage → domain bridges  │
//! │  observability.rs - Logging initialization  │
//! └─────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod http;
pub mod observability;
