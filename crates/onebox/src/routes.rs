//! HTTP routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;

use onebox_core::{
    DisplayFields, EmailDocument, IncomingEmail, Onebox, SearchFilters, SearchResults,
};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Core components.
    pub onebox: Onebox,
    /// Queue feeding the ingestion loop.
    pub ingest: mpsc::Sender<IncomingEmail>,
}

/// Builds the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/emails", get(search).post(enqueue))
        .route("/emails/search", get(search))
        .route("/emails/:id/categorize", post(categorize))
        .route("/emails/:id/suggest-reply", post(suggest_reply))
        .with_state(state)
}

/// Query string of the search endpoints.
#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    folder: Option<String>,
    account: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmailResponse {
    id: String,
    email: EmailDocument,
}

#[derive(Debug, Default, Deserialize)]
struct SuggestReplyRequest {
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Serialize)]
struct SuggestReplyResponse {
    id: String,
    reply: String,
}

/// Core error rendered as `{ "error": ... }`.
struct ApiError(onebox_core::Error);

impl From<onebox_core::Error> for ApiError {
    fn from(e: onebox_core::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            onebox_core::Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResults> {
    let filters = SearchFilters {
        folder: params.folder.filter(|f| !f.is_empty()),
        account: params.account.filter(|a| !a.is_empty()),
    };
    Json(state.onebox.search.search(&params.q, &filters).await)
}

async fn enqueue(
    State(state): State<AppState>,
    Json(email): Json<IncomingEmail>,
) -> Result<StatusCode, ApiError> {
    if email.id.trim().is_empty() {
        return Err(onebox_core::Error::invalid_argument("email id must not be empty").into());
    }
    state
        .ingest
        .send(email)
        .await
        .map_err(|_| onebox_core::Error::Unavailable("ingestion queue".into()))?;
    Ok(StatusCode::ACCEPTED)
}

async fn categorize(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(fields): Json<DisplayFields>,
) -> Result<Json<EmailResponse>, ApiError> {
    let email = state.onebox.pipeline.categorize_manual(&id, fields).await?;
    Ok(Json(EmailResponse { id, email }))
}

async fn suggest_reply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SuggestReplyRequest>,
) -> Result<Json<SuggestReplyResponse>, ApiError> {
    let reply = state
        .onebox
        .assistant
        .suggest_reply(request.body.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(SuggestReplyResponse { id, reply }))
}
