//! Authorization resolver for the Project → IssuerNode → Asset hierarchy.
//!
//! Access to every resource is decided by walking the containment chain up
//! to the owning project and checking the caller's membership there. The
//! walk is a pure read-then-decide: it performs no writes and must run
//! before any other work in a handler.

mod resolver;
mod traits;

pub use resolver::{Authorizer, AuthzError};
pub use traits::AccessSource;

use crate::error::ResourceKind;

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
}

impl Principal {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// A reference to a resource in the containment hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRef {
    Project { id: String },
    IssuerNode { id: String },
    Asset { id: String },
}

impl ResourceRef {
    pub fn project(id: impl Into<String>) -> Self {
        ResourceRef::Project { id: id.into() }
    }

    pub fn issuer_node(id: impl Into<String>) -> Self {
        ResourceRef::IssuerNode { id: id.into() }
    }

    pub fn asset(id: impl Into<String>) -> Self {
        ResourceRef::Asset { id: id.into() }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRef::Project { .. } => ResourceKind::Project,
            ResourceRef::IssuerNode { .. } => ResourceKind::IssuerNode,
            ResourceRef::Asset { .. } => ResourceKind::Asset,
        }
    }
}
