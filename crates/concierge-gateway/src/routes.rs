//! HTTP surface.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | GET /health | liveness |
//! | POST /api/chat | guest question → `{answer, source}` or `{error}` |
//! | GET/POST /api/faq | list (optional `?lang=`) / create FAQ entries |
//! | GET/PUT/DELETE /api/faq/:id | read / replace / remove one entry |

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Path, Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use concierge_core::{
    AnswerRouter, ChatFailure, FaqEntry, FaqRecord, FaqStore, Language, RouterError, StoreError,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;

pub struct AppState {
    pub router: AnswerRouter,
    pub store: FaqStore,
}

#[derive(Deserialize)]
struct FaqListQuery {
    #[serde(default)]
    lang: Option<String>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/faq", get(list_faq).post(create_faq))
        .route(
            "/api/faq/:id",
            get(get_faq).put(update_faq).delete(delete_faq),
        )
        .with_state(state)
        .layer(axum::middleware::from_fn(log_request))
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    tracing::info!(
        target: "concierge::gateway",
        method = %request.method(),
        path = %request.uri().path(),
        peer = %peer,
        "request"
    );
    next.run(request).await
}

async fn health() -> &'static str {
    "OK"
}

fn chat_failure(e: &RouterError) -> Response {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ChatFailure::from(e))).into_response()
}

/// POST /api/chat. The body is parsed here rather than by `Json<_>` so that every
/// malformed request gets the same `{error}` shape.
async fn chat_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let raw: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            let err = RouterError::InvalidRequest(format!("body is not JSON: {}", e));
            tracing::warn!(target: "concierge::gateway", error = %err, "chat request rejected");
            return chat_failure(&err);
        }
    };

    match state.router.resolve(&raw).await {
        Ok(answer) => Json(answer).into_response(),
        Err(e) => chat_failure(&e),
    }
}

fn store_error(e: StoreError) -> (StatusCode, String) {
    match e {
        StoreError::Invalid(msg) => (StatusCode::BAD_REQUEST, msg),
        other => {
            tracing::error!(target: "concierge::gateway", error = %other, "FAQ store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

fn not_found(id: u64) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("FAQ entry {} not found", id))
}

async fn list_faq(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FaqListQuery>,
) -> Result<Json<Vec<FaqEntry>>, (StatusCode, String)> {
    let language = match query.lang.as_deref() {
        Some(code) => Some(
            code.parse::<Language>()
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?,
        ),
        None => None,
    };
    state.store.list(language).map(Json).map_err(store_error)
}

async fn create_faq(
    State(state): State<Arc<AppState>>,
    Json(record): Json<FaqRecord>,
) -> Result<(StatusCode, Json<FaqEntry>), (StatusCode, String)> {
    let entry = state.store.insert(record).map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_faq(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<FaqEntry>, (StatusCode, String)> {
    state
        .store
        .get(id)
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

async fn update_faq(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(record): Json<FaqRecord>,
) -> Result<Json<FaqEntry>, (StatusCode, String)> {
    state
        .store
        .update(id, record)
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

async fn delete_faq(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.store.delete(id).map_err(store_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
