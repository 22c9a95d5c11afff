//! Application state
//!
//! Holds the process configuration and all shared components

use crate::discovery::DeviceDescriptor;
use crate::error::{Error, Result};
use crate::ptz_controller::{AxisConfig, Credentials, DeviceSession, MotionDispatcher};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 3000;
const DEFAULT_DEVICE_TIMEOUT_MS: u64 = 10_000;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Device login (LOGIN / PASSWORD)
    pub credentials: Credentials,
    /// Axis calibration
    pub axis: AxisConfig,
    /// Static management address or URL (CAM_MGMT_IP)
    pub static_address: Option<String>,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// WS-Discovery listen window
    pub discovery_timeout: Duration,
    /// Per-request SOAP timeout
    pub device_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            axis: AxisConfig::default(),
            static_address: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            discovery_timeout: Duration::from_millis(DEFAULT_DISCOVERY_TIMEOUT_MS),
            device_timeout: Duration::from_millis(DEFAULT_DEVICE_TIMEOUT_MS),
        }
    }
}

impl AppConfig {
    /// 環境変数から読み込み
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let axis = AxisConfig {
            invert_x: parse_bool("INVERSE_X_AXIS", get("INVERSE_X_AXIS"))?,
            invert_y: parse_bool("INVERSE_Y_AXIS", get("INVERSE_Y_AXIS"))?,
            zero_azimuth: parse_number("CAM_ZERO_AZIMUTH", get("CAM_ZERO_AZIMUTH"), 0.0)?,
            prefer_static_address: parse_bool(
                "PREFER_CAM_MGMT_IP_THAN_CAM_MGMT_URL",
                get("PREFER_CAM_MGMT_IP_THAN_CAM_MGMT_URL"),
            )?,
            emulate_absolute_timeout: parse_bool(
                "CAM_NOT_SUPPORT_ABS_MOVE_TIMEOUT",
                get("CAM_NOT_SUPPORT_ABS_MOVE_TIMEOUT"),
            )?,
        };
        axis.validate()?;

        let discovery_timeout_ms = parse_number(
            "DISCOVERY_TIMEOUT_MS",
            get("DISCOVERY_TIMEOUT_MS"),
            DEFAULT_DISCOVERY_TIMEOUT_MS,
        )?;
        let device_timeout_ms = parse_number(
            "DEVICE_TIMEOUT_MS",
            get("DEVICE_TIMEOUT_MS"),
            DEFAULT_DEVICE_TIMEOUT_MS,
        )?;
        if device_timeout_ms == 0 {
            return Err(Error::Config("DEVICE_TIMEOUT_MS must be positive".to_string()));
        }

        Ok(Self {
            credentials: Credentials::new(
                lookup("LOGIN").unwrap_or_default(),
                lookup("PASSWORD").unwrap_or_default(),
            ),
            axis,
            static_address: get("CAM_MGMT_IP"),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_number("PORT", get("PORT"), DEFAULT_PORT)?,
            discovery_timeout: Duration::from_millis(discovery_timeout_ms),
            device_timeout: Duration::from_millis(device_timeout_ms),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(key: &str, value: Option<String>) -> Result<bool> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| Error::Config(format!("{} is not a valid number: '{}'", key, v))),
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<DeviceSession>,
    pub dispatcher: Arc<MotionDispatcher>,
    /// 起動時の探索結果
    pub discovered: Arc<Vec<DeviceDescriptor>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(dispatcher: Arc<MotionDispatcher>, discovered: Vec<DeviceDescriptor>) -> Self {
        Self {
            session: Arc::clone(dispatcher.session()),
            dispatcher,
            discovered: Arc::new(discovered),
            started_at: Instant::now(),
        }
    }
}
