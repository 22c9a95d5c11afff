//! ONVIF PTZ client
//!
//! SOAP over HTTP with WS-Security UsernameToken authentication.
//! Service addresses (media / PTZ) are resolved once at connect time via
//! GetCapabilities.

use super::security::{escape_xml, generate_ws_security_header};
use super::transport::{DeviceConnector, PtzTransport, TransportError};
use super::xml::{
    element_text, extract_capability_xaddr, extract_elements, extract_xml_value,
    opening_tag_attribute,
};
use crate::ptz_controller::{
    Credentials, PresetDescriptor, ProfileDescriptor, PtzCapabilities, PtzVector,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

const ENVELOPE_NAMESPACES: &str = concat!(
    r#"xmlns:s="http://www.w3.org/2003/05/soap-envelope" "#,
    r#"xmlns:tds="http://www.onvif.org/ver10/device/wsdl" "#,
    r#"xmlns:trt="http://www.onvif.org/ver10/media/wsdl" "#,
    r#"xmlns:tptz="http://www.onvif.org/ver20/ptz/wsdl" "#,
    r#"xmlns:tt="http://www.onvif.org/ver10/schema""#
);

/// Creates [`OnvifClient`]s sharing one HTTP connection pool
pub struct OnvifConnector {
    client: Client,
}

impl OnvifConnector {
    /// 新規作成（`timeout` はSOAPリクエスト単位）
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl DeviceConnector for OnvifConnector {
    async fn connect(
        &self,
        address: &str,
        credentials: &Credentials,
    ) -> Result<Arc<dyn PtzTransport>, TransportError> {
        let mut device = OnvifClient {
            device_url: address.to_string(),
            media_url: address.to_string(),
            ptz_url: None,
            credentials: credentials.clone(),
            client: self.client.clone(),
        };

        let body = device
            .send_soap(
                address,
                "GetCapabilities",
                "<tds:GetCapabilities><tds:Category>All</tds:Category></tds:GetCapabilities>",
            )
            .await?;

        let services = parse_service_addresses(&body);
        if let Some(media) = services.media {
            device.media_url = media;
        }
        device.ptz_url = services.ptz;

        tracing::info!(
            device_url = %device.device_url,
            media_url = %device.media_url,
            ptz_url = ?device.ptz_url,
            "ONVIF device connected"
        );

        Ok(Arc::new(device))
    }
}

/// ONVIF PTZ制御クライアント
pub struct OnvifClient {
    /// デバイスサービス（例: http://192.168.x.x:2020/onvif/device_service）
    device_url: String,
    media_url: String,
    /// PTZ非対応カメラではNone
    ptz_url: Option<String>,
    credentials: Credentials,
    client: Client,
}

impl OnvifClient {
    fn ptz_url(&self, action: &str) -> Result<&str, TransportError> {
        self.ptz_url.as_deref().ok_or_else(|| TransportError::Malformed {
            action: action.to_string(),
            detail: "device did not advertise a PTZ service".to_string(),
        })
    }

    fn envelope(&self, body: &str) -> String {
        let header = if self.credentials.username.is_empty() {
            String::new()
        } else {
            generate_ws_security_header(&self.credentials.username, &self.credentials.password)
        };

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope {}>
  {}
  <s:Body>
    {}
  </s:Body>
</s:Envelope>"#,
            ENVELOPE_NAMESPACES, header, body
        )
    }

    /// SOAPリクエスト送信
    async fn send_soap(&self, url: &str, action: &str, body: &str) -> Result<String, TransportError> {
        tracing::debug!(url = %url, action = %action, "Sending ONVIF request");

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/soap+xml; charset=utf-8")
            .body(self.envelope(body))
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status();
        let text = response.text().await.map_err(TransportError::from_reqwest)?;

        if status == StatusCode::UNAUTHORIZED
            || (!status.is_success() && text.contains("NotAuthorized"))
        {
            tracing::warn!(url = %url, action = %action, "ONVIF request not authorized");
            return Err(TransportError::Unauthorized);
        }

        if !status.is_success() {
            tracing::error!(status = %status, action = %action, "ONVIF request failed");
            return Err(match soap_fault_reason(&text) {
                Some(reason) => TransportError::Fault {
                    action: action.to_string(),
                    reason,
                },
                None => TransportError::Status {
                    action: action.to_string(),
                    status: status.as_u16(),
                    body: text,
                },
            });
        }

        tracing::debug!(action = %action, "ONVIF command executed successfully");
        Ok(text)
    }
}

#[async_trait]
impl PtzTransport for OnvifClient {
    async fn capabilities(&self) -> Result<PtzCapabilities, TransportError> {
        if self.ptz_url.is_none() {
            return Ok(PtzCapabilities::default());
        }
        let body = self
            .send_soap(self.ptz_url("GetNodes")?, "GetNodes", "<tptz:GetNodes/>")
            .await?;
        Ok(parse_node_capabilities(&body))
    }

    async fn profiles(&self) -> Result<Vec<ProfileDescriptor>, TransportError> {
        let body = self
            .send_soap(&self.media_url, "GetProfiles", "<trt:GetProfiles/>")
            .await?;
        Ok(parse_profiles(&body))
    }

    async fn presets(&self, profile_token: &str) -> Result<Vec<PresetDescriptor>, TransportError> {
        let body = format!(
            "<tptz:GetPresets><tptz:ProfileToken>{}</tptz:ProfileToken></tptz:GetPresets>",
            escape_xml(profile_token)
        );
        let response = self
            .send_soap(self.ptz_url("GetPresets")?, "GetPresets", &body)
            .await?;
        Ok(parse_presets(&response))
    }

    async fn continuous_move(
        &self,
        profile_token: &str,
        velocity: PtzVector,
        timeout: Option<Duration>,
    ) -> Result<(), TransportError> {
        let timeout = timeout
            .map(|t| format!("<tptz:Timeout>{}</tptz:Timeout>", xs_duration(t)))
            .unwrap_or_default();
        let body = format!(
            r#"<tptz:ContinuousMove>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
      <tptz:Velocity>
        <tt:PanTilt x="{:.4}" y="{:.4}"/>
        <tt:Zoom x="{:.4}"/>
      </tptz:Velocity>{}
    </tptz:ContinuousMove>"#,
            escape_xml(profile_token),
            velocity.x,
            velocity.y,
            velocity.z,
            timeout
        );
        self.send_soap(self.ptz_url("ContinuousMove")?, "ContinuousMove", &body)
            .await
            .map(|_| ())
    }

    async fn absolute_move(
        &self,
        profile_token: &str,
        position: PtzVector,
        speed: PtzVector,
    ) -> Result<(), TransportError> {
        let body = format!(
            r#"<tptz:AbsoluteMove>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
      <tptz:Position>
        <tt:PanTilt x="{:.4}" y="{:.4}"/>
        <tt:Zoom x="{:.4}"/>
      </tptz:Position>
      <tptz:Speed>
        <tt:PanTilt x="{:.4}" y="{:.4}"/>
        <tt:Zoom x="{:.4}"/>
      </tptz:Speed>
    </tptz:AbsoluteMove>"#,
            escape_xml(profile_token),
            position.x,
            position.y,
            position.z,
            speed.x,
            speed.y,
            speed.z
        );
        self.send_soap(self.ptz_url("AbsoluteMove")?, "AbsoluteMove", &body)
            .await
            .map(|_| ())
    }

    async fn stop(&self, profile_token: &str) -> Result<(), TransportError> {
        let body = format!(
            r#"<tptz:Stop>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
      <tptz:PanTilt>true</tptz:PanTilt>
      <tptz:Zoom>true</tptz:Zoom>
    </tptz:Stop>"#,
            escape_xml(profile_token)
        );
        self.send_soap(self.ptz_url("Stop")?, "Stop", &body)
            .await
            .map(|_| ())
    }

    async fn goto_home(&self, profile_token: &str) -> Result<(), TransportError> {
        let body = format!(
            "<tptz:GotoHomePosition><tptz:ProfileToken>{}</tptz:ProfileToken></tptz:GotoHomePosition>",
            escape_xml(profile_token)
        );
        self.send_soap(self.ptz_url("GotoHomePosition")?, "GotoHomePosition", &body)
            .await
            .map(|_| ())
    }
}

/// Service XAddrs from a GetCapabilities response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceAddresses {
    pub media: Option<String>,
    pub ptz: Option<String>,
}

pub fn parse_service_addresses(xml: &str) -> ServiceAddresses {
    ServiceAddresses {
        media: extract_capability_xaddr(xml, "Media"),
        ptz: extract_capability_xaddr(xml, "PTZ"),
    }
}

/// Capabilities from a GetNodes response (first node wins)
pub fn parse_node_capabilities(xml: &str) -> PtzCapabilities {
    let node = extract_elements(xml, "PTZNode")
        .into_iter()
        .next()
        .unwrap_or_else(|| xml.to_string());

    PtzCapabilities {
        ptz_continuous: node.contains("ContinuousPanTiltVelocitySpace")
            || node.contains("ContinuousZoomVelocitySpace"),
        ptz_absolute: node.contains("AbsolutePanTiltPositionSpace")
            || node.contains("AbsoluteZoomPositionSpace"),
        ptz_home: extract_xml_value(&node, "HomeSupported")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
    }
}

/// Profiles from a GetProfiles response, in device order
pub fn parse_profiles(xml: &str) -> Vec<ProfileDescriptor> {
    extract_elements(xml, "Profiles")
        .iter()
        .filter_map(|element| {
            let token = opening_tag_attribute(element, "token")?;
            Some(ProfileDescriptor {
                token,
                name: element_text(element, "Name"),
                supported_presets: Vec::new(),
            })
        })
        .collect()
}

/// Presets from a GetPresets response
pub fn parse_presets(xml: &str) -> Vec<PresetDescriptor> {
    extract_elements(xml, "Preset")
        .iter()
        .filter_map(|element| {
            let token = opening_tag_attribute(element, "token")?;
            Some(PresetDescriptor {
                token,
                name: element_text(element, "Name"),
            })
        })
        .collect()
}

/// Reason text of a SOAP 1.2 fault
pub fn soap_fault_reason(xml: &str) -> Option<String> {
    if !xml.contains("Fault") {
        return None;
    }
    element_text(xml, "Text")
        .or_else(|| element_text(xml, "faultstring"))
        .or_else(|| Some("unspecified fault".to_string()))
}

/// xs:duration for a move timeout
pub fn xs_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("PT{}S", duration.as_secs())
    } else {
        format!("PT{:.3}S", duration.as_secs_f64())
    }
}
