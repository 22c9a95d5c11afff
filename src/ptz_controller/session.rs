//! Device session
//!
//! The single controlled camera for this process. Owns the transport handle,
//! the capability set and the active profile, and carries the serialized
//! command slot every mutating operation has to pass through.
//!
//! ## Lifecycle
//!
//! `Uninitialized → Initializing → Ready | Faulted(reason)`
//!
//! Readers (`active_profile`, `has_capability`, `snapshot`) only take the
//! state read lock and never wait behind in-flight device I/O.

use super::stop_timer::PendingStopTimer;
use super::types::{
    Credentials, MotionState, ProfileDescriptor, PtzCapabilities, PtzCapability,
};
use crate::error::{Error, Result};
use crate::onvif::{DeviceConnector, PtzTransport, TransportError};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// セッション状態（外部公開用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum SessionLifecycle {
    Uninitialized,
    Initializing,
    Ready,
    Faulted(String),
}

impl fmt::Display for SessionLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("uninitialized"),
            Self::Initializing => f.write_str("initializing"),
            Self::Ready => f.write_str("ready"),
            Self::Faulted(reason) => write!(f, "faulted: {}", reason),
        }
    }
}

/// Initialized device, immutable once published
pub(crate) struct ActiveDevice {
    pub(crate) address: String,
    pub(crate) transport: Arc<dyn PtzTransport>,
    pub(crate) capabilities: PtzCapabilities,
    pub(crate) profiles: Vec<ProfileDescriptor>,
    pub(crate) active_profile: ProfileDescriptor,
}

impl ActiveDevice {
    pub(crate) fn profile_token(&self) -> &str {
        &self.active_profile.token
    }

    pub(crate) fn require(&self, capability: PtzCapability) -> Result<()> {
        if self.capabilities.has(capability) {
            Ok(())
        } else {
            tracing::warn!(
                address = %self.address,
                capability = %capability,
                "Rejected command: capability not supported by device"
            );
            Err(Error::UnsupportedOperation(capability))
        }
    }
}

enum SessionState {
    Uninitialized,
    Initializing,
    Ready(Arc<ActiveDevice>),
    Faulted(String),
}

impl SessionState {
    fn lifecycle(&self) -> SessionLifecycle {
        match self {
            Self::Uninitialized => SessionLifecycle::Uninitialized,
            Self::Initializing => SessionLifecycle::Initializing,
            Self::Ready(_) => SessionLifecycle::Ready,
            Self::Faulted(reason) => SessionLifecycle::Faulted(reason.clone()),
        }
    }
}

/// Read-only view for the profile endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub address: String,
    pub capabilities: PtzCapabilities,
    pub active_profile: ProfileDescriptor,
    pub profiles: Vec<ProfileDescriptor>,
}

/// Serialized execution context for one session
#[derive(Default)]
pub(crate) struct CommandSlot {
    pub(crate) motion: MotionState,
    pub(crate) pending_stop: Option<PendingStopTimer>,
    pub(crate) next_timer_id: u64,
}

impl CommandSlot {
    /// Cancel the live stop timer, if any
    pub(crate) fn cancel_pending_stop(&mut self) -> bool {
        match self.pending_stop.take() {
            Some(timer) => {
                timer.cancel();
                true
            }
            None => false,
        }
    }
}

/// Single-owner camera session
pub struct DeviceSession {
    connector: Arc<dyn DeviceConnector>,
    state: RwLock<SessionState>,
    slot: Arc<Mutex<CommandSlot>>,
}

impl DeviceSession {
    /// 新規作成（未初期化）
    pub fn new(connector: Arc<dyn DeviceConnector>) -> Self {
        Self {
            connector,
            state: RwLock::new(SessionState::Uninitialized),
            slot: Arc::new(Mutex::new(CommandSlot::default())),
        }
    }

    /// Connect to the device, cache capabilities and select the first profile
    ///
    /// Runs inside the command slot, so it never interleaves with a motion
    /// command. Re-initializing cancels any pending stop timer.
    pub async fn initialize(
        &self,
        address: &str,
        credentials: &Credentials,
    ) -> Result<PtzCapabilities> {
        let mut slot = self.slot.lock().await;
        slot.cancel_pending_stop();
        slot.motion = MotionState::Idle;

        *self.state.write().await = SessionState::Initializing;
        tracing::info!(address = %address, username = %credentials.username, "Initializing device session");

        match self.open_device(address, credentials).await {
            Ok(device) => {
                let capabilities = device.capabilities;
                tracing::info!(
                    address = %address,
                    profile = %device.active_profile.token,
                    profiles = device.profiles.len(),
                    presets = device.active_profile.supported_presets.len(),
                    capabilities = ?capabilities,
                    "Device session ready"
                );
                *self.state.write().await = SessionState::Ready(Arc::new(device));
                Ok(capabilities)
            }
            Err(e) => {
                tracing::error!(address = %address, error = %e, "Could not initialize camera");
                *self.state.write().await = SessionState::Faulted(e.to_string());
                Err(e)
            }
        }
    }

    async fn open_device(&self, address: &str, credentials: &Credentials) -> Result<ActiveDevice> {
        let transport = self
            .connector
            .connect(address, credentials)
            .await
            .map_err(|e| connect_error(address, e))?;

        let capabilities = transport
            .capabilities()
            .await
            .map_err(|e| connect_error(address, e))?;

        let mut profiles = transport
            .profiles()
            .await
            .map_err(|e| connect_error(address, e))?;

        if profiles.is_empty() {
            return Err(Error::NoProfileAvailable {
                address: address.to_string(),
            });
        }

        // プリセットは表示用のみ。取得失敗は致命的ではない
        if capabilities.any() {
            match transport.presets(&profiles[0].token).await {
                Ok(presets) => profiles[0].supported_presets = presets,
                Err(e) => tracing::warn!(
                    address = %address,
                    profile = %profiles[0].token,
                    error = %e,
                    "Failed to fetch PTZ presets"
                ),
            }
        }

        let active_profile = profiles[0].clone();

        Ok(ActiveDevice {
            address: address.to_string(),
            transport,
            capabilities,
            profiles,
            active_profile,
        })
    }

    pub async fn lifecycle(&self) -> SessionLifecycle {
        self.state.read().await.lifecycle()
    }

    pub async fn active_profile(&self) -> Result<ProfileDescriptor> {
        Ok(self.ready_device().await?.active_profile.clone())
    }

    pub async fn has_capability(&self, capability: PtzCapability) -> Result<bool> {
        Ok(self.ready_device().await?.capabilities.has(capability))
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let device = self.ready_device().await?;
        Ok(SessionSnapshot {
            address: device.address.clone(),
            capabilities: device.capabilities,
            active_profile: device.active_profile.clone(),
            profiles: device.profiles.clone(),
        })
    }

    pub(crate) async fn ready_device(&self) -> Result<Arc<ActiveDevice>> {
        match &*self.state.read().await {
            SessionState::Ready(device) => Ok(Arc::clone(device)),
            other => Err(Error::SessionNotReady(other.lifecycle().to_string())),
        }
    }

    pub(crate) fn slot(&self) -> &Arc<Mutex<CommandSlot>> {
        &self.slot
    }
}

fn connect_error(address: &str, error: TransportError) -> Error {
    match error {
        TransportError::Unauthorized => Error::AuthenticationFailed {
            address: address.to_string(),
        },
        other => Error::DeviceUnreachable {
            address: address.to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ptz_controller::testing::{full_capabilities, RecordingTransport, StaticConnector};
    use crate::ptz_controller::PresetDescriptor;

    const ADDRESS: &str = "http://192.168.1.100:2020/onvif/device_service";

    #[tokio::test]
    async fn test_initialize_selects_first_profile() {
        let transport = Arc::new(
            RecordingTransport::new(full_capabilities())
                .with_profiles(vec![
                    ProfileDescriptor::new("profile_1"),
                    ProfileDescriptor::new("profile_2"),
                ])
                .with_presets(vec![PresetDescriptor {
                    token: "1".to_string(),
                    name: Some("Gate".to_string()),
                }]),
        );
        let connector = Arc::new(StaticConnector::new(transport));
        let session = DeviceSession::new(connector.clone());

        let caps = session
            .initialize(ADDRESS, &Credentials::new("admin", "admin!"))
            .await
            .unwrap();

        assert_eq!(caps, full_capabilities());
        assert_eq!(session.lifecycle().await, SessionLifecycle::Ready);
        assert_eq!(connector.addresses(), vec![ADDRESS.to_string()]);

        let profile = session.active_profile().await.unwrap();
        assert_eq!(profile.token, "profile_1");
        assert_eq!(profile.supported_presets.len(), 1);

        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.profiles.len(), 2);
        assert_eq!(snapshot.address, ADDRESS);
        assert!(session.has_capability(PtzCapability::Home).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_discovery_initializes_preferred_static_address() {
        let address = crate::discovery::select_address(&[], Some("192.168.1.20"), true).unwrap();

        let transport = Arc::new(RecordingTransport::new(full_capabilities()));
        let connector = Arc::new(StaticConnector::new(transport));
        let session = DeviceSession::new(connector.clone());

        session
            .initialize(&address, &Credentials::new("admin", "admin!"))
            .await
            .unwrap();

        assert_eq!(
            connector.addresses(),
            vec!["http://192.168.1.20/onvif/device_service".to_string()]
        );
        assert_eq!(session.lifecycle().await, SessionLifecycle::Ready);
        assert_eq!(session.snapshot().await.unwrap().address, address);
    }

    #[tokio::test]
    async fn test_readers_before_initialize() {
        let transport = Arc::new(RecordingTransport::new(full_capabilities()));
        let session = DeviceSession::new(Arc::new(StaticConnector::new(transport)));

        assert_eq!(session.lifecycle().await, SessionLifecycle::Uninitialized);
        assert!(matches!(
            session.active_profile().await,
            Err(Error::SessionNotReady(_))
        ));
        assert!(matches!(
            session.has_capability(PtzCapability::Continuous).await,
            Err(Error::SessionNotReady(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let transport = Arc::new(RecordingTransport::new(full_capabilities()));
        let connector = StaticConnector::new(transport).failing(|| TransportError::Unauthorized);
        let session = DeviceSession::new(Arc::new(connector));

        let result = session.initialize(ADDRESS, &Credentials::new("admin", "wrong")).await;
        assert!(matches!(result, Err(Error::AuthenticationFailed { .. })));
        assert!(matches!(session.lifecycle().await, SessionLifecycle::Faulted(_)));
        assert!(session.active_profile().await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_device() {
        let transport = Arc::new(RecordingTransport::new(full_capabilities()));
        let connector = StaticConnector::new(transport)
            .failing(|| TransportError::Connect("connection refused".to_string()));
        let session = DeviceSession::new(Arc::new(connector));

        let result = session.initialize(ADDRESS, &Credentials::default()).await;
        match result {
            Err(Error::DeviceUnreachable { address, reason }) => {
                assert_eq!(address, ADDRESS);
                assert!(reason.contains("connection refused"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_profiles() {
        let transport = Arc::new(RecordingTransport::new(full_capabilities()).with_profiles(vec![]));
        let session = DeviceSession::new(Arc::new(StaticConnector::new(transport)));

        let result = session.initialize(ADDRESS, &Credentials::default()).await;
        assert!(matches!(result, Err(Error::NoProfileAvailable { .. })));
        assert!(matches!(session.lifecycle().await, SessionLifecycle::Faulted(_)));
    }

    #[tokio::test]
    async fn test_reinitialize_recovers_from_fault() {
        let transport = Arc::new(RecordingTransport::new(full_capabilities()).with_profiles(vec![]));
        let session = DeviceSession::new(Arc::new(StaticConnector::new(transport.clone())));

        assert!(session.initialize(ADDRESS, &Credentials::default()).await.is_err());

        transport.set_profiles(vec![ProfileDescriptor::new("profile_1")]);
        assert!(session.initialize(ADDRESS, &Credentials::default()).await.is_ok());
        assert_eq!(session.lifecycle().await, SessionLifecycle::Ready);
    }
}
