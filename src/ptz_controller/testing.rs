//! In-memory transport for engine tests

use super::axis::AxisConfig;
use super::dispatcher::MotionDispatcher;
use super::session::DeviceSession;
use super::types::{
    Credentials, PresetDescriptor, ProfileDescriptor, PtzCapabilities, PtzVector,
};
use crate::onvif::{DeviceConnector, PtzTransport, TransportError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    ContinuousMove {
        velocity: PtzVector,
        timeout: Option<Duration>,
    },
    AbsoluteMove {
        position: PtzVector,
        speed: PtzVector,
    },
    Stop,
    GotoHome,
}

pub fn full_capabilities() -> PtzCapabilities {
    PtzCapabilities {
        ptz_continuous: true,
        ptz_absolute: true,
        ptz_home: true,
    }
}

/// Records every command instead of talking to a camera
pub struct RecordingTransport {
    capabilities: PtzCapabilities,
    profiles: Mutex<Vec<ProfileDescriptor>>,
    presets: Vec<PresetDescriptor>,
    fail: AtomicBool,
    commands: Mutex<Vec<Recorded>>,
}

impl RecordingTransport {
    pub fn new(capabilities: PtzCapabilities) -> Self {
        Self {
            capabilities,
            profiles: Mutex::new(vec![ProfileDescriptor::new("profile_1")]),
            presets: Vec::new(),
            fail: AtomicBool::new(false),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn with_profiles(self, profiles: Vec<ProfileDescriptor>) -> Self {
        *self.profiles.lock().unwrap() = profiles;
        self
    }

    pub fn with_presets(mut self, presets: Vec<PresetDescriptor>) -> Self {
        self.presets = presets;
        self
    }

    pub fn set_profiles(&self, profiles: Vec<ProfileDescriptor>) {
        *self.profiles.lock().unwrap() = profiles;
    }

    /// Make every motion command fail with a SOAP fault
    pub fn fail_commands(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<Recorded> {
        self.commands.lock().unwrap().clone()
    }

    pub fn stop_count(&self) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == Recorded::Stop)
            .count()
    }

    fn record(&self, action: &str, command: Recorded) -> Result<(), TransportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Fault {
                action: action.to_string(),
                reason: "Action failed".to_string(),
            });
        }
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}

#[async_trait]
impl PtzTransport for RecordingTransport {
    async fn capabilities(&self) -> Result<PtzCapabilities, TransportError> {
        Ok(self.capabilities)
    }

    async fn profiles(&self) -> Result<Vec<ProfileDescriptor>, TransportError> {
        Ok(self.profiles.lock().unwrap().clone())
    }

    async fn presets(&self, _profile_token: &str) -> Result<Vec<PresetDescriptor>, TransportError> {
        Ok(self.presets.clone())
    }

    async fn continuous_move(
        &self,
        _profile_token: &str,
        velocity: PtzVector,
        timeout: Option<Duration>,
    ) -> Result<(), TransportError> {
        self.record("ContinuousMove", Recorded::ContinuousMove { velocity, timeout })
    }

    async fn absolute_move(
        &self,
        _profile_token: &str,
        position: PtzVector,
        speed: PtzVector,
    ) -> Result<(), TransportError> {
        self.record("AbsoluteMove", Recorded::AbsoluteMove { position, speed })
    }

    async fn stop(&self, _profile_token: &str) -> Result<(), TransportError> {
        self.record("Stop", Recorded::Stop)
    }

    async fn goto_home(&self, _profile_token: &str) -> Result<(), TransportError> {
        self.record("GotoHomePosition", Recorded::GotoHome)
    }
}

/// Hands out the same transport for every address
pub struct StaticConnector {
    transport: Arc<RecordingTransport>,
    failure: Option<fn() -> TransportError>,
    addresses: Mutex<Vec<String>>,
}

impl StaticConnector {
    pub fn new(transport: Arc<RecordingTransport>) -> Self {
        Self {
            transport,
            failure: None,
            addresses: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, failure: fn() -> TransportError) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn addresses(&self) -> Vec<String> {
        self.addresses.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceConnector for StaticConnector {
    async fn connect(
        &self,
        address: &str,
        _credentials: &Credentials,
    ) -> Result<Arc<dyn PtzTransport>, TransportError> {
        self.addresses.lock().unwrap().push(address.to_string());
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(self.transport.clone()),
        }
    }
}

/// Dispatcher over an initialized session backed by a recording transport
pub async fn ready_dispatcher(
    capabilities: PtzCapabilities,
    config: AxisConfig,
) -> (MotionDispatcher, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::new(capabilities));
    let session = Arc::new(DeviceSession::new(Arc::new(StaticConnector::new(
        transport.clone(),
    ))));
    session
        .initialize("http://camera.local/onvif/device_service", &Credentials::default())
        .await
        .unwrap();
    (MotionDispatcher::new(session, config), transport)
}
