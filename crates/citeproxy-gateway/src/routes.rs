//! HTTP surface: `/api/chat`, `/health` and the static front-end.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use citeproxy_core::{ChatAnswer, Orchestrator, ProxyError};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::Instrument;

/// Error text returned with 400 when no question was sent.
pub const NO_QUESTION: &str = "Ingen fråga skickades";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<String>,
}

pub fn build_app(state: AppState, static_dir: &Path) -> Router {
    // Every response, errors included, is readable from any origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
        .layer(cors)
}

async fn health() -> &'static str {
    "OK"
}

/// POST /api/chat: run the question through the orchestrator.
///
/// The orchestration runs in its own task. If the client disconnects, axum drops
/// this handler, the drop guard cancels the token and the task stops polling.
async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatAnswer>, ApiError> {
    let question = match body {
        Ok(Json(req)) => req.question.unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!(target: "citeproxy::gateway", error = %rejection, "unreadable chat body");
            return Err(ApiError(ProxyError::InvalidInput));
        }
    };

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id);
    let token = CancellationToken::new();
    let _cancel_on_drop = token.clone().drop_guard();

    let orchestrator = Arc::clone(&state.orchestrator);
    let task = tokio::spawn(
        async move { orchestrator.handle(&question, &token).await }.instrument(span.clone()),
    );

    let answer = task
        .await
        .map_err(|e| ApiError(ProxyError::Internal(e.to_string())))??;
    span.in_scope(|| {
        tracing::info!(target: "citeproxy::gateway", citations = answer.citations.len(), "chat answered");
    });
    Ok(Json(answer))
}

/// Maps [`ProxyError`] to the JSON error contract.
#[derive(Debug)]
pub struct ApiError(pub ProxyError);

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_client_error() {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": NO_QUESTION })),
            )
                .into_response();
        }
        tracing::error!(target: "citeproxy::gateway", error = %self.0, "chat request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}
