//! HTTP route definitions and handlers.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::error;

use mintd_domain::{DomainError, Principal};
use mintd_storage::{
    ActivityRecord, Asset, DataStore, IssuerNode, PageQuery, PaginatedResult, TransactionRecord,
};

use super::state::AppState;

/// Header carrying the authenticated caller's user ID, injected by the
/// fronting authentication gateway. Requests without it are rejected with
/// the same `forbidden` error an unauthorized caller would see.
pub const PRINCIPAL_HEADER: &str = "x-mintd-user";

/// Default request body size limit (1MB).
/// This prevents memory exhaustion from oversized payloads.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

// ============================================================
// Error Handling
// ============================================================

/// Wire error codes.
///
/// `forbidden` deliberately covers both authorization denial and resources
/// that do not resolve during the authorization walk: callers without
/// project membership must not be able to probe for resource existence.
/// `not_found` appears only after authorization has passed.
pub mod error_codes {
    /// Authorization denied, or resource not visible to the caller (403).
    pub const FORBIDDEN: &str = "forbidden";
    /// Resource does not exist; surfaced only post-authorization (404).
    pub const NOT_FOUND: &str = "not_found";
    /// Malformed payload or invalid pagination parameters (400).
    pub const INVALID_REQUEST: &str = "invalid_request";
    /// Domain-level creation conflict (409).
    pub const CONFLICT: &str = "conflict";
    /// Request body exceeds the size limit (413).
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    /// Unexpected internal error (500).
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// API error response format.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a forbidden error (403).
    pub fn forbidden() -> Self {
        Self::new(error_codes::FORBIDDEN, "forbidden")
    }

    /// Creates a not found error (404).
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(error_codes::NOT_FOUND, message)
    }

    /// Creates an invalid request error (400).
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_REQUEST, message)
    }

    /// Creates a conflict error (409).
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(error_codes::CONFLICT, message)
    }

    /// Creates an internal error (500).
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(error_codes::INTERNAL_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use error_codes::*;

        let status = match self.code.as_str() {
            FORBIDDEN => StatusCode::FORBIDDEN,
            NOT_FOUND => StatusCode::NOT_FOUND,
            INVALID_REQUEST => StatusCode::BAD_REQUEST,
            CONFLICT => StatusCode::CONFLICT,
            PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Forbidden => ApiError::forbidden(),
            // Post-authorization miss. The kind is safe to name; the ID is
            // already known to the caller.
            DomainError::NotFound { kind, .. } => ApiError::not_found(format!("{kind} not found")),
            DomainError::InvalidRequest { message } => ApiError::invalid_request(message),
            DomainError::Conflict { message } => ApiError::conflict(message),
            DomainError::Internal { message } => {
                // Log the root cause; return a stable, minimal message.
                error!(error = %message, "internal error");
                ApiError::internal_error("internal error")
            }
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================
// Extractors
// ============================================================

/// Custom JSON extractor that returns 400 Bad Request instead of 422
/// Unprocessable Entity for deserialization errors, preserving 413 for
/// body-limit rejections.
pub struct JsonBadRequest<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBadRequest<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBadRequest(value)),
            Err(rejection) => {
                let message = rejection.body_text();
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    Err(ApiError::new(error_codes::PAYLOAD_TOO_LARGE, message))
                } else {
                    Err(ApiError::invalid_request(message))
                }
            }
        }
    }
}

/// Extracts the authenticated principal from the gateway-injected header.
pub struct CallerPrincipal(pub Principal);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CallerPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(PRINCIPAL_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|value| CallerPrincipal(Principal::new(value)))
            .ok_or_else(ApiError::forbidden)
    }
}

// ============================================================
// Wire types
// ============================================================

/// Query parameters shared by all paginated listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl From<PageParams> for PageQuery {
    fn from(params: PageParams) -> Self {
        PageQuery {
            cursor: params.cursor,
            limit: params.page_size,
        }
    }
}

/// Body for label updates.
#[derive(Debug, Deserialize)]
pub struct UpdateLabelRequest {
    #[serde(default)]
    pub label: Option<String>,
}

/// Body for asset creation.
#[derive(Debug, Deserialize)]
pub struct CreateAssetRequest {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub definition: Value,
}

#[derive(Debug, Serialize)]
pub struct KeyEntryResponse {
    pub xpub: String,
    pub generated: bool,
}

#[derive(Debug, Serialize)]
pub struct IssuerNodeResponse {
    pub id: String,
    pub label: String,
    pub project_id: String,
    pub keys: Vec<KeyEntryResponse>,
    pub sigs_required: u32,
    pub created_at: String,
}

impl From<IssuerNode> for IssuerNodeResponse {
    fn from(node: IssuerNode) -> Self {
        Self {
            id: node.id,
            label: node.label,
            project_id: node.project_id,
            keys: node
                .keys
                .into_iter()
                .map(|key| KeyEntryResponse {
                    xpub: key.xpub,
                    generated: key.generated,
                })
                .collect(),
            sigs_required: node.sigs_required,
            created_at: node.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListIssuerNodesResponse {
    pub last: Option<String>,
    pub issuer_nodes: Vec<IssuerNodeResponse>,
}

/// Narrowed asset view: id, label, and the circulation total only, pending
/// a richer accounting model. Do not widen without revisiting issuance
/// reporting.
#[derive(Debug, Serialize)]
pub struct AssetSummaryResponse {
    pub id: String,
    pub label: String,
    pub circulation: u64,
}

impl From<Asset> for AssetSummaryResponse {
    fn from(asset: Asset) -> Self {
        Self {
            id: asset.id,
            label: asset.label,
            circulation: asset.circulation.total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListAssetsResponse {
    pub last: Option<String>,
    pub assets: Vec<AssetSummaryResponse>,
}

/// Response for a freshly created asset.
#[derive(Debug, Serialize)]
pub struct CreatedAssetResponse {
    pub id: String,
    pub issuer_node_id: String,
    pub label: String,
}

impl From<Asset> for CreatedAssetResponse {
    fn from(asset: Asset) -> Self {
        Self {
            id: asset.id,
            issuer_node_id: asset.issuer_node_id,
            label: asset.label,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivityListResponse {
    pub last: Option<String>,
    pub activities: Vec<Value>,
}

impl From<PaginatedResult<ActivityRecord>> for ActivityListResponse {
    fn from(page: PaginatedResult<ActivityRecord>) -> Self {
        Self {
            last: page.last,
            activities: page.items.into_iter().map(|record| record.data).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub last: Option<String>,
    pub transactions: Vec<Value>,
}

impl From<PaginatedResult<TransactionRecord>> for TransactionListResponse {
    fn from(page: PaginatedResult<TransactionRecord>) -> Self {
        Self {
            last: page.last,
            transactions: page.items.into_iter().map(|record| record.data).collect(),
        }
    }
}

// ============================================================
// Router
// ============================================================

fn api_routes<S: DataStore>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route(
            "/projects/:project_id/issuer-nodes",
            post(create_issuer_node::<S>).get(list_issuer_nodes::<S>),
        )
        .route(
            "/issuer-nodes/:node_id",
            get(get_issuer_node::<S>)
                .put(update_issuer_node::<S>)
                .delete(delete_issuer_node::<S>),
        )
        .route(
            "/issuer-nodes/:node_id/assets",
            get(list_assets::<S>).post(create_asset::<S>),
        )
        .route("/issuer-nodes/:node_id/activity", get(node_activity::<S>))
        .route(
            "/issuer-nodes/:node_id/transactions",
            get(node_transactions::<S>),
        )
        .route(
            "/assets/:asset_id",
            get(get_asset::<S>)
                .put(update_asset::<S>)
                .delete(delete_asset::<S>),
        )
        .route("/assets/:asset_id/activity", get(asset_activity::<S>))
        .route(
            "/assets/:asset_id/transactions",
            get(asset_transactions::<S>),
        )
}

/// Creates the HTTP router with the default body size limit.
pub fn create_router<S: DataStore>(state: AppState<S>) -> Router {
    create_router_with_body_limit(state, DEFAULT_BODY_LIMIT)
}

/// Creates the HTTP router with a custom body size limit.
pub fn create_router_with_body_limit<S: DataStore>(
    state: AppState<S>,
    body_limit: usize,
) -> Router {
    let shared_state = Arc::new(state);
    api_routes::<S>()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check::<S>))
        .with_state(shared_state)
        .layer(RequestBodyLimitLayer::new(body_limit))
}

// ============================================================
// Health and Readiness Checks
// ============================================================

/// Liveness probe: the process is up. Does not check dependencies.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Readiness probe: issues a cheap read against the storage backend.
async fn readiness_check<S: DataStore>(State(state): State<Arc<AppState<S>>>) -> impl IntoResponse {
    match state.storage.is_project_member("", "").await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "checks": { "storage": "ok" }
            })),
        ),
        Err(err) => {
            error!(error = %err, "readiness check failed: storage unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not_ready",
                    "checks": { "storage": "unavailable" }
                })),
            )
        }
    }
}

// ============================================================
// Issuer nodes
// ============================================================

async fn create_issuer_node<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(project_id): Path<String>,
    JsonBadRequest(payload): JsonBadRequest<Value>,
) -> ApiResult<impl IntoResponse> {
    let node = state
        .handlers
        .create_issuer_node(&principal, &project_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(IssuerNodeResponse::from(node))))
}

async fn list_issuer_nodes<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(project_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let nodes = state
        .handlers
        .list_issuer_nodes(&principal, &project_id)
        .await?;
    Ok(Json(ListIssuerNodesResponse {
        last: None,
        issuer_nodes: nodes.into_iter().map(IssuerNodeResponse::from).collect(),
    }))
}

async fn get_issuer_node<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(node_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let node = state.handlers.get_issuer_node(&principal, &node_id).await?;
    Ok(Json(IssuerNodeResponse::from(node)))
}

async fn update_issuer_node<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(node_id): Path<String>,
    JsonBadRequest(body): JsonBadRequest<UpdateLabelRequest>,
) -> ApiResult<impl IntoResponse> {
    let node = state
        .handlers
        .update_issuer_node(&principal, &node_id, body.label)
        .await?;
    Ok(Json(IssuerNodeResponse::from(node)))
}

async fn delete_issuer_node<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(node_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state
        .handlers
        .delete_issuer_node(&principal, &node_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn node_activity<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(node_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .handlers
        .node_activity(&principal, &node_id, &params.into())
        .await?;
    Ok(Json(ActivityListResponse::from(page)))
}

async fn node_transactions<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(node_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .handlers
        .node_transactions(&principal, &node_id, &params.into())
        .await?;
    Ok(Json(TransactionListResponse::from(page)))
}

// ============================================================
// Assets
// ============================================================

async fn list_assets<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(node_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .handlers
        .list_assets(&principal, &node_id, &params.into())
        .await?;
    Ok(Json(ListAssetsResponse {
        last: page.last,
        assets: page
            .items
            .into_iter()
            .map(AssetSummaryResponse::from)
            .collect(),
    }))
}

async fn create_asset<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(node_id): Path<String>,
    JsonBadRequest(body): JsonBadRequest<CreateAssetRequest>,
) -> ApiResult<impl IntoResponse> {
    let asset = state
        .handlers
        .create_asset(&principal, &node_id, body.label, body.definition)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedAssetResponse::from(asset))))
}

async fn get_asset<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(asset_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let asset = state.handlers.get_asset(&principal, &asset_id).await?;
    Ok(Json(AssetSummaryResponse::from(asset)))
}

async fn update_asset<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(asset_id): Path<String>,
    JsonBadRequest(body): JsonBadRequest<UpdateLabelRequest>,
) -> ApiResult<impl IntoResponse> {
    let asset = state
        .handlers
        .update_asset(&principal, &asset_id, body.label)
        .await?;
    Ok(Json(AssetSummaryResponse::from(asset)))
}

async fn delete_asset<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(asset_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.handlers.delete_asset(&principal, &asset_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn asset_activity<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(asset_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .handlers
        .asset_activity(&principal, &asset_id, &params.into())
        .await?;
    Ok(Json(ActivityListResponse::from(page)))
}

async fn asset_transactions<S: DataStore>(
    State(state): State<Arc<AppState<S>>>,
    CallerPrincipal(principal): CallerPrincipal,
    Path(asset_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .handlers
        .asset_transactions(&principal, &asset_id, &params.into())
        .await?;
    Ok(Json(TransactionListResponse::from(page)))
}
