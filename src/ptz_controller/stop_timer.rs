//! Emulated move timeout
//!
//! Some firmware ignores the ContinuousMove `Timeout` element and keeps
//! panning until told otherwise. For those devices the move is sent without a
//! timeout and a deferred Stop is scheduled instead.
//!
//! The timer task takes the session's command slot before sending Stop and
//! only fires if it is still the armed timer. Cancellation aborts the task
//! while the canceller holds the slot.

use super::session::{ActiveDevice, CommandSlot};
use super::types::MotionState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// 停止予約（セッションごとに最大1つ）
pub struct PendingStopTimer {
    id: u64,
    armed_at: Instant,
    fire_at: Instant,
    handle: JoinHandle<()>,
}

impl PendingStopTimer {
    /// Schedule a Stop `after` from now
    pub(crate) fn arm(
        slot: Arc<Mutex<CommandSlot>>,
        device: Arc<ActiveDevice>,
        id: u64,
        after: Duration,
    ) -> Self {
        let armed_at = Instant::now();
        let fire_at = armed_at + after;

        tracing::debug!(timer_id = id, after_ms = after.as_millis() as u64, "Stop timer armed");

        let handle = tokio::spawn(fire(slot, device, id, fire_at));

        Self {
            id,
            armed_at,
            fire_at,
            handle,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn armed_at(&self) -> Instant {
        self.armed_at
    }

    pub fn fire_at(&self) -> Instant {
        self.fire_at
    }

    pub fn remaining(&self) -> Duration {
        self.fire_at.saturating_duration_since(Instant::now())
    }

    /// 停止予約の取り消し
    pub fn cancel(self) {
        self.handle.abort();
        tracing::debug!(timer_id = self.id, "Stop timer cancelled");
    }
}

async fn fire(slot: Arc<Mutex<CommandSlot>>, device: Arc<ActiveDevice>, id: u64, fire_at: Instant) {
    tokio::time::sleep_until(fire_at).await;

    let mut slot = slot.lock().await;
    if slot.pending_stop.as_ref().map(PendingStopTimer::id) != Some(id) {
        tracing::debug!(timer_id = id, "Stop timer superseded");
        return;
    }
    slot.pending_stop = None;

    match device.transport.stop(device.profile_token()).await {
        Ok(()) => {
            slot.motion = MotionState::Idle;
            tracing::info!(
                address = %device.address,
                timer_id = id,
                "Move timeout elapsed, camera stopped"
            );
        }
        Err(e) => {
            slot.motion = MotionState::Moving { until: None };
            tracing::warn!(
                address = %device.address,
                timer_id = id,
                error = %e,
                "Failed to auto-stop PTZ after move timeout"
            );
        }
    }
}
