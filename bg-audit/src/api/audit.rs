//! Audit API handler
//!
//! POST /audit runs the full workflow for one video and answers with the
//! verdict. Audit failures (bad source, extraction, model) are still a 200
//! with `status: FAIL`; only a malformed request or a crashed workflow task
//! produce an error status.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::workflow::AuditResponse;
use crate::AppState;

/// POST /audit request
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditRequest {
    pub video_url: String,
}

/// POST /audit
pub async fn start_audit(
    State(state): State<AppState>,
    Json(request): Json<AuditRequest>,
) -> ApiResult<Json<AuditResponse>> {
    let video_url = request.video_url.trim().to_string();
    if video_url.is_empty() {
        return Err(ApiError::BadRequest("video_url must not be empty".to_string()));
    }

    // Own task so a panic inside a stage surfaces as a JoinError, not a dropped connection
    let workflow = state.workflow.clone();
    let handle = tokio::spawn(async move { workflow.run_audit(&video_url).await });

    match handle.await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!(error = %e, "Audit workflow task failed");
            Err(ApiError::Internal(format!("Audit workflow failed: {}", e)))
        }
    }
}

/// Build audit routes
pub fn audit_routes() -> Router<AppState> {
    Router::new().route("/audit", post(start_audit))
}
