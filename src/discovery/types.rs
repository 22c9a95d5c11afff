//! Discovery type definitions

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

const NAME_SCOPE_PREFIX: &str = "onvif://www.onvif.org/name/";

/// 探索で見つかったデバイス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// WS-Addressing endpoint (usually `urn:uuid:...`)
    pub endpoint_address: String,
    pub friendly_name: Option<String>,
    /// Device service URLs in advertised order
    pub service_addresses: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl DeviceDescriptor {
    /// Build from a ProbeMatch's whitespace-separated XAddrs / Scopes lists
    pub fn from_probe_match(endpoint_address: String, xaddrs: &str, scopes: &str) -> Self {
        let scopes: Vec<String> = scopes.split_whitespace().map(str::to_string).collect();
        Self {
            endpoint_address,
            friendly_name: friendly_name(&scopes),
            service_addresses: xaddrs.split_whitespace().map(str::to_string).collect(),
            scopes,
        }
    }
}

/// Name from the `onvif://www.onvif.org/name/<name>` scope
pub fn friendly_name(scopes: &[String]) -> Option<String> {
    scopes
        .iter()
        .find_map(|scope| scope.strip_prefix(NAME_SCOPE_PREFIX))
        .map(percent_decode)
        .filter(|name| !name.is_empty())
}

/// Decode `%XX` escapes; invalid UTF-8 is replaced, not rejected
pub fn percent_decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| {
            String::from_utf8_lossy(&urlencoding::decode_binary(value.as_bytes())).into_owned()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_probe_match() {
        let device = DeviceDescriptor::from_probe_match(
            "urn:uuid:3fa1fe68-b915-4053-a3e1-ac15a21f5f91".to_string(),
            "http://192.168.1.20:2020/onvif/device_service http://[fe80::1]/onvif/device_service",
            "onvif://www.onvif.org/type/video_encoder onvif://www.onvif.org/name/TP-IPC%20Garage",
        );

        assert_eq!(device.service_addresses.len(), 2);
        assert_eq!(
            device.service_addresses[0],
            "http://192.168.1.20:2020/onvif/device_service"
        );
        assert_eq!(device.friendly_name.as_deref(), Some("TP-IPC Garage"));
        assert_eq!(device.scopes.len(), 2);
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("a%20b"), "a b");
        assert_eq!(percent_decode("%E3%82%AB%E3%83%A1%E3%83%A9"), "カメラ");
        assert_eq!(percent_decode("x%41"), "xA");
        assert_eq!(percent_decode("%E3%82"), "\u{FFFD}");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn test_missing_name_scope() {
        let scopes = vec!["onvif://www.onvif.org/hardware/C200".to_string()];
        assert_eq!(friendly_name(&scopes), None);
    }
}
