//! PTZ Controller Module
//!
//! PTZ対応カメラの操作機能を提供
//!
//! - `normalizer`: 操作座標 → デバイス座標
//! - `session`: 単一カメラのセッションとコマンドスロット
//! - `dispatcher`: コマンド送信と停止タイマー

pub mod axis;
pub mod dispatcher;
pub mod normalizer;
pub mod session;
pub mod stop_timer;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use axis::AxisConfig;
pub use dispatcher::{MotionDispatcher, ABSOLUTE_MOVE_SPEED};
pub use session::{DeviceSession, SessionLifecycle, SessionSnapshot};
pub use stop_timer::PendingStopTimer;
pub use types::*;
