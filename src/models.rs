//! Shared models and types for PTZ Camserver

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_sec: u64,
    pub session_ready: bool,
    /// セッション状態（"ready" / "faulted: ..." など）
    pub session: String,
}
