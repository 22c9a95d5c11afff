//! Axis calibration constants
//!
//! 起動時に一度だけ読み込まれ、プロセス終了まで変更されない。

use crate::error::{Error, Result};
use serde::Serialize;

/// Axis inversion and zero-azimuth calibration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AxisConfig {
    /// パン軸反転（モーター取付向き）
    pub invert_x: bool,
    /// チルト軸反転
    pub invert_y: bool,
    /// 物理的な真北（パン0）位置のオフセット [-1.0, 1.0]
    pub zero_azimuth: f64,
    /// 探索結果より静的アドレスを優先
    pub prefer_static_address: bool,
    /// カメラがContinuousMoveのTimeoutを無視する場合、タイマーで停止を送る
    pub emulate_absolute_timeout: bool,
}

impl AxisConfig {
    /// Reject calibration values the pan wrap cannot handle
    pub fn validate(&self) -> Result<()> {
        if !self.zero_azimuth.is_finite() || self.zero_azimuth.abs() > 1.0 {
            return Err(Error::Config(format!(
                "CAM_ZERO_AZIMUTH must be within [-1.0, 1.0], got {}",
                self.zero_azimuth
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity() {
        let config = AxisConfig::default();
        assert!(!config.invert_x);
        assert!(!config.invert_y);
        assert_eq!(config.zero_azimuth, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_azimuth() {
        let config = AxisConfig {
            zero_azimuth: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = AxisConfig {
            zero_azimuth: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
