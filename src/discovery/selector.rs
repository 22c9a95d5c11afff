//! Discovery selector
//!
//! Picks the device address the session is initialized against. No I/O.

use super::types::DeviceDescriptor;
use crate::error::{Error, Result};
use reqwest::Url;

const DEVICE_SERVICE_PATH: &str = "/onvif/device_service";

/// 制御対象アドレスの決定
///
/// - `prefer_static`: static address, unconditionally
/// - otherwise the first discovered device that advertises a service address
/// - otherwise the static address
pub fn select_address(
    discovered: &[DeviceDescriptor],
    static_address: Option<&str>,
    prefer_static: bool,
) -> Result<String> {
    let static_url = static_address.and_then(device_service_url);

    if prefer_static {
        return static_url.ok_or_else(|| {
            Error::Config(format!(
                "static camera address preferred but CAM_MGMT_IP is unusable: {:?}",
                static_address
            ))
        });
    }

    let first_discovered = discovered
        .iter()
        .find_map(|device| device.service_addresses.first());
    if let Some(address) = first_discovered {
        tracing::debug!(address = %address, "Selected discovered device");
        return Ok(address.clone());
    }

    static_url.ok_or_else(|| {
        Error::Config("no camera discovered and CAM_MGMT_IP is not set".to_string())
    })
}

/// Expand a bare host or validate a full URL into a device service URL
pub fn device_service_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}{}", raw.trim_end_matches('/'), DEVICE_SERVICE_PATH)
    };

    let url = Url::parse(&candidate).ok()?;
    let scheme_ok = matches!(url.scheme(), "http" | "https");
    if !scheme_ok || url.host_str().map_or(true, str::is_empty) {
        return None;
    }

    Some(candidate)
}
