//! WebAPI - REST API Endpoints
//!
//! ## Responsibilities
//!
//! - HTTP API routes
//! - Request validation
//! - Response formatting

mod ptz_routes;
mod routes;

pub use ptz_routes::{move_seconds, AxisQuery, DEFAULT_MOVE_SECONDS};
pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::models::HealthResponse;
use crate::ptz_controller::SessionLifecycle;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let lifecycle = state.session.lifecycle().await;

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_sec: state.started_at.elapsed().as_secs(),
        session_ready: lifecycle == SessionLifecycle::Ready,
        session: lifecycle.to_string(),
    };

    Json(response)
}
