//! Discovery Module
//!
//! WS-Discoveryによるカメラ探索と制御対象の選択

mod probe;
mod selector;
mod types;

pub use probe::{parse_probe_matches, probe_message, DiscoveryProbe, MULTICAST_ADDR};
pub use selector::{device_service_url, select_address};
pub use types::{friendly_name, percent_decode, DeviceDescriptor};
