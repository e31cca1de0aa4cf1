use crate::auth::Authorizer;
use crate::config::Listener as ListenerConfig;
use crate::fallback::FallbackProvider;
use crate::metrics_defs::{LOOKUP_DURATION, REQUESTS};
use crate::resolver::{ResolveError, resolve_groups};
use crate::store::GroupStore;
use crate::types::Group;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

const EMPTY_MESSAGE: &str = "no groups were found";

#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

struct GroupsStateInner {
    enabled: bool,
    store: Arc<dyn GroupStore>,
    fallback: Arc<dyn FallbackProvider>,
    authorizer: Arc<dyn Authorizer>,
}

/// Everything a request needs. Immutable once built; each request opens its
/// own store connection.
#[derive(Clone)]
pub struct GroupsState {
    inner: Arc<GroupsStateInner>,
}

impl GroupsState {
    pub fn new(
        enabled: bool,
        store: Arc<dyn GroupStore>,
        fallback: Arc<dyn FallbackProvider>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        GroupsState {
            inner: Arc::new(GroupsStateInner {
                enabled,
                store,
                fallback,
                authorizer,
            }),
        }
    }
}

pub fn router(state: GroupsState) -> Router {
    Router::new()
        .route("/api/groups", get(handler))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(listener: &ListenerConfig, state: GroupsState) -> Result<(), ServeError> {
    let app = router(state);
    let addr = format!("{}:{}", listener.host, listener.port);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "groups API listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Serialize)]
struct ApiResponse {
    groups: Vec<Group>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl From<Vec<Group>> for ApiResponse {
    fn from(groups: Vec<Group>) -> Self {
        let message = groups.is_empty().then_some(EMPTY_MESSAGE);
        ApiResponse { groups, message }
    }
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error: String,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GroupsApiError {
    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("the groups API is not enabled")]
    Disabled,

    #[error("could not connect to the database or read the groups")]
    Unavailable,

    #[error("could not connect to the database or read the groups")]
    StoreFailed,

    #[error("internal error")]
    Internal,
}

impl From<ResolveError> for GroupsApiError {
    fn from(value: ResolveError) -> Self {
        match value {
            ResolveError::StoreFailed => GroupsApiError::StoreFailed,
            ResolveError::Unavailable => GroupsApiError::Unavailable,
        }
    }
}

impl IntoResponse for GroupsApiError {
    fn into_response(self) -> Response {
        let status = match self {
            GroupsApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            GroupsApiError::Disabled => StatusCode::SERVICE_UNAVAILABLE,
            GroupsApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            GroupsApiError::StoreFailed => StatusCode::INTERNAL_SERVER_ERROR,
            GroupsApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "groups request failed");
        }

        let body = Json(ApiErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

async fn handler(
    State(state): State<GroupsState>,
    headers: HeaderMap,
) -> Result<ApiResponse, GroupsApiError> {
    counter!(REQUESTS).increment(1);

    if !state.inner.authorizer.authorize(&headers) {
        return Err(GroupsApiError::Unauthorized);
    }

    if !state.inner.enabled {
        return Err(GroupsApiError::Disabled);
    }

    let store = state.inner.store.clone();
    let fallback = state.inner.fallback.clone();
    let start = Instant::now();

    // Both sources are plain file reads, keep them off the async workers.
    let result =
        tokio::task::spawn_blocking(move || resolve_groups(store.as_ref(), fallback.as_ref()))
            .await;
    histogram!(LOOKUP_DURATION).record(start.elapsed().as_secs_f64());

    let groups = result.map_err(|e| {
        tracing::error!(error = %e, "groups lookup task failed");
        GroupsApiError::Internal
    })??;

    Ok(groups.into())
}

async fn health() -> &'static str {
    "ok\n"
}
