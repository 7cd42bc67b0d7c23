//! mintd-domain: core domain logic for the issuance resource layer
//!
//! This crate contains the protocol logic that is independent of any
//! storage backend or transport:
//! - Creation-request normalization (deprecated and canonical shapes)
//! - The authorization resolver walking the Project → IssuerNode → Asset
//!   containment chain
//! - The domain error taxonomy
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                mintd-domain                  │
//! ├─────────────────────────────────────────────┤
//! │  request.rs  - Payload normalization        │
//! │  authz/      - Authorization resolver       │
//! │  error.rs    - Error taxonomy               │
//! └─────────────────────────────────────────────┘
//! ```

pub mod authz;
pub mod error;
pub mod request;
mod request_proptest;

// Re-export commonly used types at the crate root
pub use authz::{AccessSource, Authorizer, AuthzError, Principal, ResourceRef};
pub use error::{DomainError, DomainResult, ResourceKind};
pub use request::{normalize, CreateNodeRequest, KeySpec};
