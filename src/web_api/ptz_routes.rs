//! PTZ API Routes
//!
//! PTZ操作のHTTP APIエンドポイント

use crate::error::{Error, Result};
use crate::ptz_controller::{MotionRequest, PtzResponse, PtzStatus};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

/// GET /move のデフォルト移動時間（秒）
pub const DEFAULT_MOVE_SECONDS: u32 = 1;

/// Axis query (`?x=&y=&z=&t=`); missing axes are 0.0
#[derive(Debug, Default, Deserialize)]
pub struct AxisQuery {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    /// Seconds, only read by GET /move; fractions are truncated
    pub t: Option<f64>,
}

impl AxisQuery {
    fn continuous(&self, timeout_seconds: Option<u32>) -> MotionRequest {
        MotionRequest::continuous(
            self.x.unwrap_or(0.0),
            self.y.unwrap_or(0.0),
            self.z.unwrap_or(0.0),
            timeout_seconds,
        )
    }

    fn absolute(&self) -> MotionRequest {
        MotionRequest::absolute(
            self.x.unwrap_or(0.0),
            self.y.unwrap_or(0.0),
            self.z.unwrap_or(0.0),
        )
    }
}

/// Move duration for GET /move (`t=1.5` runs for 1 second, `t=0` has no timeout)
pub fn move_seconds(t: Option<f64>) -> Result<u32> {
    match t {
        None => Ok(DEFAULT_MOVE_SECONDS),
        Some(secs) if (0.0..=f64::from(u32::MAX)).contains(&secs) => {
            Ok(secs.trunc() as u32)
        }
        Some(secs) => Err(Error::InvalidRequest(format!(
            "t must be a non-negative number of seconds, got {}",
            secs
        ))),
    }
}

fn axis_query(query: std::result::Result<Query<AxisQuery>, QueryRejection>) -> Result<AxisQuery> {
    query
        .map(|Query(q)| q)
        .map_err(|rejection| Error::InvalidRequest(rejection.body_text()))
}

/// GET /move
/// 連続移動（t秒後に停止、既定1秒）
pub async fn ptz_move(
    State(state): State<AppState>,
    query: std::result::Result<Query<AxisQuery>, QueryRejection>,
) -> Result<Json<PtzResponse>> {
    let query = axis_query(query)?;
    let request = query.continuous(Some(move_seconds(query.t)?));

    state.dispatcher.dispatch_continuous(&request).await?;
    Ok(Json(PtzResponse::success()))
}

/// POST /move
/// 連続移動（停止指示まで継続）
pub async fn ptz_move_unbounded(
    State(state): State<AppState>,
    query: std::result::Result<Query<AxisQuery>, QueryRejection>,
) -> Result<Json<PtzResponse>> {
    let request = axis_query(query)?.continuous(None);

    state.dispatcher.dispatch_continuous(&request).await?;
    Ok(Json(PtzResponse::success_with_message(
        "moving until /stop is requested",
    )))
}

/// GET /position
/// 絶対位置移動
pub async fn ptz_position(
    State(state): State<AppState>,
    query: std::result::Result<Query<AxisQuery>, QueryRejection>,
) -> Result<Json<PtzResponse>> {
    let request = axis_query(query)?.absolute();

    state.dispatcher.dispatch_absolute(&request).await?;
    Ok(Json(PtzResponse::success()))
}

/// GET /home
/// ホームポジション移動
pub async fn ptz_home(State(state): State<AppState>) -> Result<Json<PtzResponse>> {
    state.dispatcher.go_home().await?;
    Ok(Json(PtzResponse::success()))
}

/// GET /stop
/// PTZ停止
pub async fn ptz_stop(State(state): State<AppState>) -> Result<Json<PtzResponse>> {
    state.dispatcher.stop().await?;
    Ok(Json(PtzResponse::success()))
}

/// GET /status
/// PTZステータス取得
pub async fn ptz_status(State(state): State<AppState>) -> Json<PtzStatus> {
    Json(state.dispatcher.status().await)
}
