//! PTZ Controller type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// PTZ軸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Pan,
    Tilt,
    Zoom,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pan => "x",
            Self::Tilt => "y",
            Self::Zoom => "z",
        };
        f.write_str(name)
    }
}

/// 移動モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveMode {
    /// 速度指定（停止またはタイムアウトまで移動）
    Continuous,
    /// 絶対位置指定
    Absolute,
}

impl MoveMode {
    /// Legal zoom range for this mode
    pub fn zoom_range(&self) -> (f64, f64) {
        match self {
            Self::Continuous => (-1.0, 1.0),
            Self::Absolute => (0.0, 1.0),
        }
    }
}

/// Pan/Tilt/Zoom の3値
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PtzVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PtzVector {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// All three axes at the same value
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value)
    }
}

/// Operator motion command, validated then discarded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionRequest {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Seconds the camera should keep moving (Continuous only)
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
    pub mode: MoveMode,
}

impl MotionRequest {
    pub fn continuous(x: f64, y: f64, z: f64, timeout_seconds: Option<u32>) -> Self {
        Self {
            x,
            y,
            z,
            timeout_seconds,
            mode: MoveMode::Continuous,
        }
    }

    pub fn absolute(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            timeout_seconds: None,
            mode: MoveMode::Absolute,
        }
    }

    pub fn axes(&self) -> PtzVector {
        PtzVector::new(self.x, self.y, self.z)
    }

    /// Move timeout as a duration; zero means "no timeout"
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(u64::from(secs)))
    }
}

/// Device-native coordinate produced by the normalizer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedCoordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub mode: MoveMode,
    /// 正規化前の値（ログ用）
    pub requested: PtzVector,
}

impl NormalizedCoordinate {
    pub fn vector(&self) -> PtzVector {
        PtzVector::new(self.x, self.y, self.z)
    }
}

/// PTZ機能
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PtzCapability {
    #[serde(rename = "ptzContinuous")]
    Continuous,
    #[serde(rename = "ptzAbsolute")]
    Absolute,
    #[serde(rename = "ptzHome")]
    Home,
}

impl fmt::Display for PtzCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Continuous => "ptzContinuous",
            Self::Absolute => "ptzAbsolute",
            Self::Home => "ptzHome",
        };
        f.write_str(name)
    }
}

/// Capability set reported by the device's PTZ node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PtzCapabilities {
    pub ptz_continuous: bool,
    pub ptz_absolute: bool,
    pub ptz_home: bool,
}

impl PtzCapabilities {
    pub fn has(&self, capability: PtzCapability) -> bool {
        match capability {
            PtzCapability::Continuous => self.ptz_continuous,
            PtzCapability::Absolute => self.ptz_absolute,
            PtzCapability::Home => self.ptz_home,
        }
    }

    pub fn any(&self) -> bool {
        self.ptz_continuous || self.ptz_absolute || self.ptz_home
    }
}

/// PTZプリセット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetDescriptor {
    pub token: String,
    pub name: Option<String>,
}

/// メディアプロファイル
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDescriptor {
    pub token: String,
    pub name: Option<String>,
    #[serde(default)]
    pub supported_presets: Vec<PresetDescriptor>,
}

impl ProfileDescriptor {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            name: None,
            supported_presets: Vec::new(),
        }
    }
}

/// Device login passed through to the ONVIF session
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 動作状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Idle,
    /// 連続移動中（`until` は予定停止時刻）
    Moving {
        until: Option<tokio::time::Instant>,
    },
    /// 絶対位置コマンド送信中
    Positioning,
}

impl MotionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Moving { .. } => "moving",
            Self::Positioning => "positioning",
        }
    }
}

/// PTZ操作結果
#[derive(Debug, Clone, Serialize)]
pub struct PtzResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PtzResponse {
    pub fn success() -> Self {
        Self {
            ok: true,
            error: None,
            message: None,
        }
    }

    pub fn success_with_message(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            message: None,
        }
    }
}

/// PTZステータス
#[derive(Debug, Clone, Serialize)]
pub struct PtzStatus {
    pub lifecycle: super::SessionLifecycle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub capabilities: PtzCapabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_profile: Option<String>,
    /// `None` while a command is in flight
    pub motion: Option<&'static str>,
    pub busy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_pending_ms: Option<u64>,
}
