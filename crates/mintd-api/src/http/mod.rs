//! HTTP REST surface.

pub mod routes;
pub mod state;

pub use routes::{create_router, create_router_with_body_limit, ApiError, PRINCIPAL_HEADER};
pub use state::AppState;
