//! API route definitions

use super::ptz_routes::{
    ptz_home, ptz_move, ptz_move_unbounded, ptz_position, ptz_status, ptz_stop,
};
use crate::discovery::DeviceDescriptor;
use crate::error::{Error, Result};
use crate::ptz_controller::SessionSnapshot;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/healthz", get(super::health_check))
        .route("/status", get(ptz_status))
        // Device
        .route("/discover", get(discover))
        .route("/profile", get(profile))
        // PTZ
        .route("/home", get(ptz_home))
        .route("/move", get(ptz_move).post(ptz_move_unbounded))
        .route("/position", get(ptz_position))
        .route("/stop", get(ptz_stop))
        .with_state(state)
}

/// GET /discover
/// 起動時に探索したデバイス一覧
async fn discover(State(state): State<AppState>) -> Result<Json<Vec<DeviceDescriptor>>> {
    if state.discovered.is_empty() {
        return Err(Error::NotFound("no ONVIF device discovered".to_string()));
    }
    Ok(Json(state.discovered.as_ref().clone()))
}

/// GET /profile
/// 有効プロファイルと選択可能プロファイル
async fn profile(State(state): State<AppState>) -> Result<Json<SessionSnapshot>> {
    Ok(Json(state.session.snapshot().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ptz_controller::testing::{full_capabilities, ready_dispatcher};
    use crate::ptz_controller::{AxisConfig, DeviceSession, MotionDispatcher};
    use crate::ptz_controller::testing::{RecordingTransport, StaticConnector};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::sync::Arc;

    fn descriptor() -> DeviceDescriptor {
        DeviceDescriptor::from_probe_match(
            "urn:uuid:1".to_string(),
            "http://192.168.1.20/onvif/device_service",
            "onvif://www.onvif.org/name/C200",
        )
    }

    #[tokio::test]
    async fn test_discover_lists_devices() {
        let (dispatcher, _) = ready_dispatcher(full_capabilities(), AxisConfig::default()).await;
        let state = AppState::new(Arc::new(dispatcher), vec![descriptor()]);

        let Json(devices) = discover(State(state)).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].friendly_name.as_deref(), Some("C200"));
    }

    #[tokio::test]
    async fn test_discover_empty_is_not_found() {
        let (dispatcher, _) = ready_dispatcher(full_capabilities(), AxisConfig::default()).await;
        let state = AppState::new(Arc::new(dispatcher), Vec::new());

        let err = discover(State(state)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_profile_before_initialize_is_unavailable() {
        let transport = Arc::new(RecordingTransport::new(full_capabilities()));
        let session = Arc::new(DeviceSession::new(Arc::new(StaticConnector::new(transport))));
        let dispatcher = MotionDispatcher::new(session, AxisConfig::default());
        let state = AppState::new(Arc::new(dispatcher), Vec::new());

        let err = profile(State(state)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_profile_after_initialize() {
        let (dispatcher, _) = ready_dispatcher(full_capabilities(), AxisConfig::default()).await;
        let state = AppState::new(Arc::new(dispatcher), Vec::new());

        let Json(snapshot) = profile(State(state)).await.unwrap();
        assert_eq!(snapshot.active_profile.token, "profile_1");
        assert!(snapshot.capabilities.ptz_home);
    }
}
