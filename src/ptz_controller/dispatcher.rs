//! Motion dispatcher
//!
//! Validates, normalizes and sends motion commands to the session's device.
//! Every command holds the session's command slot from validation until the
//! device call returns, so commands are applied strictly in arrival order and
//! stop-timer arming / cancellation never race.

use super::axis::AxisConfig;
use super::normalizer;
use super::session::DeviceSession;
use super::stop_timer::PendingStopTimer;
use super::types::{
    MotionRequest, MotionState, MoveMode, PtzCapability, PtzStatus, PtzVector,
};
use crate::error::{Error, Result};
use crate::onvif::TransportError;
use std::sync::Arc;
use tokio::time::Instant;

/// AbsoluteMove速度（全軸共通）
pub const ABSOLUTE_MOVE_SPEED: f64 = 1.0;

/// PTZコマンド送信
pub struct MotionDispatcher {
    session: Arc<DeviceSession>,
    config: AxisConfig,
}

impl MotionDispatcher {
    pub fn new(session: Arc<DeviceSession>, config: AxisConfig) -> Self {
        Self { session, config }
    }

    pub fn session(&self) -> &Arc<DeviceSession> {
        &self.session
    }

    pub fn config(&self) -> &AxisConfig {
        &self.config
    }

    /// Velocity move, optionally bounded by `timeout_seconds`
    ///
    /// With timeout emulation enabled the device receives no timeout and a
    /// [`PendingStopTimer`] sends Stop instead. A still-pending timer from an
    /// earlier move is cancelled once this move has been accepted.
    pub async fn dispatch_continuous(&self, request: &MotionRequest) -> Result<()> {
        let mut slot = self.session.slot().lock().await;
        let device = self.session.ready_device().await?;
        device.require(PtzCapability::Continuous)?;

        let coordinate = normalizer::normalize(request.axes(), MoveMode::Continuous, &self.config)?;
        let timeout = request.timeout();
        let emulate = self.config.emulate_absolute_timeout;
        let native_timeout = if emulate { None } else { timeout };

        tracing::info!(
            requested = ?coordinate.requested,
            x = coordinate.x,
            y = coordinate.y,
            z = coordinate.z,
            timeout_secs = ?request.timeout_seconds,
            emulated_timeout = emulate && timeout.is_some(),
            "Dispatching continuous move"
        );

        device
            .transport
            .continuous_move(device.profile_token(), coordinate.vector(), native_timeout)
            .await
            .map_err(|source| command_failed("ContinuousMove", source))?;

        if slot.cancel_pending_stop() {
            tracing::debug!("Pending stop superseded by new continuous move");
        }

        slot.motion = MotionState::Moving {
            until: timeout.map(|t| Instant::now() + t),
        };

        if let (true, Some(after)) = (emulate, timeout) {
            slot.next_timer_id += 1;
            let timer = PendingStopTimer::arm(
                Arc::clone(self.session.slot()),
                Arc::clone(&device),
                slot.next_timer_id,
                after,
            );
            slot.pending_stop = Some(timer);
        }

        Ok(())
    }

    /// Position move against the active profile at full speed
    pub async fn dispatch_absolute(&self, request: &MotionRequest) -> Result<()> {
        let mut slot = self.session.slot().lock().await;
        let device = self.session.ready_device().await?;
        device.require(PtzCapability::Absolute)?;

        let coordinate = normalizer::normalize(request.axes(), MoveMode::Absolute, &self.config)?;

        tracing::info!(
            requested = ?coordinate.requested,
            x = coordinate.x,
            y = coordinate.y,
            z = coordinate.z,
            "Dispatching absolute move"
        );

        let previous = slot.motion;
        slot.motion = MotionState::Positioning;

        let result = device
            .transport
            .absolute_move(
                device.profile_token(),
                coordinate.vector(),
                PtzVector::uniform(ABSOLUTE_MOVE_SPEED),
            )
            .await;

        match result {
            Ok(()) => {
                slot.cancel_pending_stop();
                slot.motion = MotionState::Idle;
                Ok(())
            }
            Err(source) => {
                slot.motion = previous;
                Err(command_failed("AbsoluteMove", source))
            }
        }
    }

    /// ホームポジション移動（先に停止を送る）
    pub async fn go_home(&self) -> Result<()> {
        let mut slot = self.session.slot().lock().await;
        let device = self.session.ready_device().await?;
        device.require(PtzCapability::Home)?;

        tracing::info!(address = %device.address, "Executing PTZ go home");

        device
            .transport
            .stop(device.profile_token())
            .await
            .map_err(|source| command_failed("Stop", source))?;
        slot.cancel_pending_stop();
        slot.motion = MotionState::Idle;

        device
            .transport
            .goto_home(device.profile_token())
            .await
            .map_err(|source| command_failed("GotoHomePosition", source))
    }

    /// PTZ停止（停止中でもエラーにしない）
    pub async fn stop(&self) -> Result<()> {
        let mut slot = self.session.slot().lock().await;
        let device = self.session.ready_device().await?;

        tracing::info!(address = %device.address, "Executing PTZ stop");

        device
            .transport
            .stop(device.profile_token())
            .await
            .map_err(|source| command_failed("Stop", source))?;

        slot.cancel_pending_stop();
        slot.motion = MotionState::Idle;
        Ok(())
    }

    /// PTZステータス取得
    pub async fn status(&self) -> PtzStatus {
        let lifecycle = self.session.lifecycle().await;
        let device = self.session.ready_device().await.ok();

        let (motion, busy, stop_pending_ms) = match self.session.slot().try_lock() {
            Ok(slot) => {
                let motion = match slot.motion {
                    MotionState::Moving { until: Some(until) } if until <= Instant::now() => {
                        MotionState::Idle
                    }
                    other => other,
                };
                let pending = slot
                    .pending_stop
                    .as_ref()
                    .map(|timer| timer.remaining().as_millis() as u64);
                (Some(motion.label()), false, pending)
            }
            Err(_) => (None, true, None),
        };

        PtzStatus {
            lifecycle,
            address: device.as_ref().map(|d| d.address.clone()),
            capabilities: device
                .as_ref()
                .map(|d| d.capabilities)
                .unwrap_or_default(),
            active_profile: device.as_ref().map(|d| d.active_profile.token.clone()),
            motion,
            busy,
            stop_pending_ms,
        }
    }
}

fn command_failed(command: &'static str, source: TransportError) -> Error {
    tracing::error!(command = command, error = %source, "PTZ command failed");
    Error::DeviceCommandFailed { command, source }
}
