//! Device transport seams
//!
//! モーションエンジンはこのトレイト経由でのみカメラと通信する。

use crate::ptz_controller::{
    Credentials, PresetDescriptor, ProfileDescriptor, PtzCapabilities, PtzVector,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Transport-level failure, preserved as the source of engine errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// TCP接続失敗
    #[error("connection failed: {0}")]
    Connect(String),

    /// 応答タイムアウト
    #[error("request timed out")]
    Timeout,

    /// 認証拒否（HTTP 401 / SOAP NotAuthorized）
    #[error("credentials rejected by device")]
    Unauthorized,

    /// HTTPエラーステータス
    #[error("{action} failed with status {status}: {body}")]
    Status {
        action: String,
        status: u16,
        body: String,
    },

    /// SOAP Fault
    #[error("{action} returned SOAP fault: {reason}")]
    Fault { action: String, reason: String },

    /// 応答XMLの解釈失敗
    #[error("malformed {action} response: {detail}")]
    Malformed { action: String, detail: String },

    /// その他のHTTPクライアントエラー
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),
}

impl TransportError {
    /// Classify a reqwest failure the way the scanner probes do
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Http(error)
        }
    }
}

/// PTZ command channel to one initialized device
#[async_trait]
pub trait PtzTransport: Send + Sync {
    /// PTZ node capabilities
    async fn capabilities(&self) -> Result<PtzCapabilities, TransportError>;

    /// Media profiles in device order (presets not populated)
    async fn profiles(&self) -> Result<Vec<ProfileDescriptor>, TransportError>;

    async fn presets(&self, profile_token: &str) -> Result<Vec<PresetDescriptor>, TransportError>;

    /// Velocity move; `timeout` is sent to the device when given
    async fn continuous_move(
        &self,
        profile_token: &str,
        velocity: PtzVector,
        timeout: Option<Duration>,
    ) -> Result<(), TransportError>;

    async fn absolute_move(
        &self,
        profile_token: &str,
        position: PtzVector,
        speed: PtzVector,
    ) -> Result<(), TransportError>;

    async fn stop(&self, profile_token: &str) -> Result<(), TransportError>;

    async fn goto_home(&self, profile_token: &str) -> Result<(), TransportError>;
}

/// Opens a transport against a device service address
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    async fn connect(
        &self,
        address: &str,
        credentials: &Credentials,
    ) -> Result<Arc<dyn PtzTransport>, TransportError>;
}
