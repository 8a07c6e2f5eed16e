use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use leadsignal_common::{LeadSignalError, SearchParams, SourceMethod};

use crate::AppState;

#[derive(Deserialize)]
pub struct GenerateRequest {
    method: SourceMethod,
    #[serde(default)]
    role_terms: Vec<String>,
    #[serde(default)]
    location_terms: Vec<String>,
    #[serde(default)]
    industry_terms: Vec<String>,
    #[serde(default)]
    company_size_buckets: Vec<String>,
    result_limit: Option<u32>,
}

/// Start a generation run. Returns the session id immediately; the
/// pipeline runs in the background and is observed via the status route.
pub async fn generate_leads(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateRequest>,
) -> impl IntoResponse {
    let params = SearchParams {
        method: body.method,
        role_terms: body.role_terms,
        location_terms: body.location_terms,
        industry_terms: body.industry_terms,
        company_size_buckets: body.company_size_buckets,
        result_limit: body.result_limit,
    };

    match state.pipeline.start(params).await {
        Ok(session_id) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({"session_id": session_id})),
        )
            .into_response(),
        Err(LeadSignalError::Validation(message)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": message})),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to start generation run");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to start generation run"})),
            )
                .into_response()
        }
    }
}

/// Poll the progress of a generation run. Unknown or evicted session ids
/// are 404, a shape distinct from any running session's status.
pub async fn generation_status(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.pipeline.registry().snapshot(session_id).await {
        Some(snapshot) => Json(snapshot).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "session not found"})),
        )
            .into_response(),
    }
}
