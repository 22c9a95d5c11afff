//! PTZ Camserver Library
//!
//! ONVIF PTZ camera motion-command engine
//!
//! ## Architecture
//!
//! 1. Discovery - WS-Discovery probe and device address selection
//! 2. Onvif - SOAP transport (Device / Media / PTZ services)
//! 3. PtzController - session, coordinate normalizer, motion dispatcher
//! 4. WebAPI - REST API endpoints
//!
//! ## Design Principles
//!
//! - One controlled device per process
//! - Every motion command passes through the session's command slot
//! - Out-of-range input is rejected, never clamped

pub mod discovery;
pub mod error;
pub mod models;
pub mod onvif;
pub mod ptz_controller;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::{AppConfig, AppState};
