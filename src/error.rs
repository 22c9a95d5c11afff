//! Error handling for PTZ Camserver

use crate::onvif::TransportError;
use crate::ptz_controller::{Axis, PtzCapability};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WS-Discovery failure (socket / send)
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    /// Device did not answer or answered garbage during initialization
    #[error("Device unreachable at {address}: {reason}")]
    DeviceUnreachable { address: String, reason: String },

    /// Credentials rejected
    #[error("Authentication failed for {address}")]
    AuthenticationFailed { address: String },

    /// Device reported zero media profiles
    #[error("No media profile available on {address}")]
    NoProfileAvailable { address: String },

    /// Session not initialized (or faulted)
    #[error("Session not ready: {0}")]
    SessionNotReady(String),

    /// Axis value outside its legal range
    #[error("Axis {axis} value {value} out of range [{min}, {max}]")]
    AxisOutOfRange {
        axis: Axis,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Pan could not be rebased into [-1, 1]
    #[error("Pan normalization overflow: x={x}, zero_azimuth={zero_azimuth}, result={result}")]
    NormalizationOverflow {
        x: f64,
        zero_azimuth: f64,
        result: f64,
    },

    /// Capability missing on the device
    #[error("Operation not supported by device: {0}")]
    UnsupportedOperation(PtzCapability),

    /// Device rejected or failed a motion command
    #[error("{command} failed: {source}")]
    DeviceCommandFailed {
        command: &'static str,
        #[source]
        source: TransportError,
    },

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed HTTP request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Error::DiscoveryFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DISCOVERY_FAILED"),
            Error::DeviceUnreachable { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DEVICE_UNREACHABLE")
            }
            Error::AuthenticationFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "AUTHENTICATION_FAILED")
            }
            Error::NoProfileAvailable { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "NO_PROFILE_AVAILABLE")
            }
            Error::SessionNotReady(_) => (StatusCode::SERVICE_UNAVAILABLE, "SESSION_NOT_READY"),
            Error::AxisOutOfRange { .. } => (StatusCode::BAD_REQUEST, "AXIS_OUT_OF_RANGE"),
            Error::NormalizationOverflow { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "NORMALIZATION_OVERFLOW")
            }
            Error::UnsupportedOperation(_) => (StatusCode::NOT_FOUND, "UNSUPPORTED_OPERATION"),
            Error::DeviceCommandFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DEVICE_COMMAND_FAILED")
            }
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error_code = %error_code,
                message = %message,
                "Request error"
            );
        } else {
            tracing::warn!(
                status = %status,
                error_code = %error_code,
                message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
