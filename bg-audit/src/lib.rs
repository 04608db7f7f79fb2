//! bg-audit library interface
//!
//! Video compliance audit service: extracts the spoken and on-screen content
//! of a video, retrieves the relevant brand/regulatory rules and asks a
//! reasoning model for a structured verdict.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::workflow::AuditWorkflow;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Stateless workflow shared by every request
    pub workflow: Arc<AuditWorkflow>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(workflow: AuditWorkflow) -> Self {
        Self {
            workflow: Arc::new(workflow),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::audit_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
