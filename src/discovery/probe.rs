//! WS-Discovery probe
//!
//! Multicasts a Probe for ONVIF video transmitters and collects ProbeMatch
//! answers until the listen window closes.

use super::types::DeviceDescriptor;
use crate::error::{Error, Result};
use crate::onvif::xml::{element_text, extract_elements};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};
use uuid::Uuid;

/// WS-Discovery multicast group
pub const MULTICAST_ADDR: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 3702);

const PROBE_TYPES: [&str; 2] = ["dn:NetworkVideoTransmitter", "tds:Device"];

/// ONVIFデバイス探索
pub struct DiscoveryProbe {
    listen_window: Duration,
}

impl DiscoveryProbe {
    pub fn new(listen_window: Duration) -> Self {
        Self { listen_window }
    }

    /// Probe the local segment; an empty result is not an error
    pub async fn discover(&self) -> Result<Vec<DeviceDescriptor>> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(|e| Error::DiscoveryFailed(format!("bind failed: {}", e)))?;

        for probe_type in PROBE_TYPES {
            let message = probe_message(&Uuid::new_v4().to_string(), probe_type);
            socket
                .send_to(message.as_bytes(), SocketAddr::V4(MULTICAST_ADDR))
                .await
                .map_err(|e| Error::DiscoveryFailed(format!("probe send failed: {}", e)))?;
        }

        tracing::debug!(
            window_ms = self.listen_window.as_millis() as u64,
            "WS-Discovery probe sent"
        );

        let devices = collect_matches(&socket, Instant::now() + self.listen_window).await;

        tracing::info!(count = devices.len(), "WS-Discovery finished");
        Ok(devices)
    }
}

/// Collect ProbeMatch answers until `deadline`, deduplicated by endpoint.
/// A receive error ends collection early with what was gathered so far.
pub async fn collect_matches(socket: &UdpSocket, deadline: Instant) -> Vec<DeviceDescriptor> {
    let mut devices: Vec<DeviceDescriptor> = Vec::new();
    let mut buf = vec![0u8; 65_535];

    loop {
        let (len, from) = match timeout_at(deadline, socket.recv_from(&mut buf)).await {
            Ok(Ok(received)) => received,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "WS-Discovery receive failed, stopping early");
                break;
            }
            Err(_) => break,
        };

        let response = String::from_utf8_lossy(&buf[..len]);
        for device in parse_probe_matches(&response) {
            if devices
                .iter()
                .any(|d| d.endpoint_address == device.endpoint_address)
            {
                continue;
            }
            tracing::info!(
                from = %from,
                endpoint = %device.endpoint_address,
                name = ?device.friendly_name,
                xaddrs = ?device.service_addresses,
                "ONVIF device discovered"
            );
            devices.push(device);
        }
    }

    devices
}

/// Probe envelope for one device type
pub fn probe_message(message_id: &str, probe_type: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:a="http://schemas.xmlsoap.org/ws/2004/08/addressing" xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery" xmlns:dn="http://www.onvif.org/ver10/network/wsdl" xmlns:tds="http://www.onvif.org/ver10/device/wsdl">
<s:Header>
<a:Action s:mustUnderstand="1">http://schemas.xmlsoap.org/ws/2005/04/discovery/Probe</a:Action>
<a:MessageID>uuid:{}</a:MessageID>
<a:ReplyTo><a:Address>http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous</a:Address></a:ReplyTo>
<a:To s:mustUnderstand="1">urn:schemas-xmlsoap-org:ws:2005:04:discovery</a:To>
</s:Header>
<s:Body>
<d:Probe><d:Types>{}</d:Types></d:Probe>
</s:Body>
</s:Envelope>"#,
        message_id, probe_type
    )
}

/// All ProbeMatch entries in a ProbeMatches response
pub fn parse_probe_matches(xml: &str) -> Vec<DeviceDescriptor> {
    extract_elements(xml, "ProbeMatch")
        .iter()
        .filter_map(|entry| {
            let endpoint = element_text(entry, "Address")?;
            let xaddrs = element_text(entry, "XAddrs").unwrap_or_default();
            let scopes = element_text(entry, "Scopes").unwrap_or_default();
            Some(DeviceDescriptor::from_probe_match(endpoint, &xaddrs, &scopes))
        })
        .collect()
}
