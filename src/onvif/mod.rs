//! ONVIF Transport Module
//!
//! ONVIF SOAPによるカメラ制御（Device / Media / PTZ サービス）

mod client;
mod security;
mod transport;
pub mod xml;

pub use client::{
    parse_node_capabilities, parse_presets, parse_profiles, parse_service_addresses,
    OnvifClient, OnvifConnector, ServiceAddresses,
};
pub use security::{build_security_header, escape_xml, generate_ws_security_header};
pub use transport::{DeviceConnector, PtzTransport, TransportError};
