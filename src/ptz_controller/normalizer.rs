//! Coordinate normalizer
//!
//! Maps an operator axis triple into device-native coordinates.
//!
//! ## Position semantics (Absolute)
//!
//! 1. Range check (x, y in [-1, 1], z in [0, 1])
//! 2. X inversion by mounting reflection (`x - 1` / `x + 1`)
//! 3. Zero-azimuth rebase with single-step wraparound
//! 4. Overflow check on the corrected pan
//! 5. Y inversion by negation
//! 6. Z unchanged
//!
//! ## Velocity semantics (Continuous)
//!
//! Same range check with z in [-1, 1]. Inversion flips the velocity sign;
//! zero-azimuth has no meaning for a speed and is not applied.

use super::axis::AxisConfig;
use super::types::{Axis, MoveMode, NormalizedCoordinate, PtzVector};
use crate::error::{Error, Result};

/// Normalize a requested triple for the given move mode
pub fn normalize(
    requested: PtzVector,
    mode: MoveMode,
    config: &AxisConfig,
) -> Result<NormalizedCoordinate> {
    check_range(requested, mode)?;

    let (x, y) = match mode {
        MoveMode::Absolute => {
            let pan = if config.invert_x {
                invert_pan(requested.x)
            } else {
                requested.x
            };
            let pan = rebase_azimuth(pan, config.zero_azimuth)?;
            let tilt = if config.invert_y { -requested.y } else { requested.y };
            (pan, tilt)
        }
        MoveMode::Continuous => {
            let pan = if config.invert_x { -requested.x } else { requested.x };
            let tilt = if config.invert_y { -requested.y } else { requested.y };
            (pan, tilt)
        }
    };

    Ok(NormalizedCoordinate {
        x,
        y,
        z: requested.z,
        mode,
        requested,
    })
}

/// Reject out-of-range or non-finite input before anything is transformed
pub fn check_range(requested: PtzVector, mode: MoveMode) -> Result<()> {
    check_axis(Axis::Pan, requested.x, -1.0, 1.0)?;
    check_axis(Axis::Tilt, requested.y, -1.0, 1.0)?;
    let (z_min, z_max) = mode.zoom_range();
    check_axis(Axis::Zoom, requested.z, z_min, z_max)
}

fn check_axis(axis: Axis, value: f64, min: f64, max: f64) -> Result<()> {
    // NaN fails both comparisons
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(Error::AxisOutOfRange {
            axis,
            value,
            min,
            max,
        })
    }
}

/// Pan motor mounted the other way round: shift by half a turn
pub fn invert_pan(x: f64) -> f64 {
    if x >= 0.0 {
        x - 1.0
    } else {
        x + 1.0
    }
}

/// Rebase pan against the calibrated zero and wrap back into [-1, 1]
pub fn rebase_azimuth(x: f64, zero_azimuth: f64) -> Result<f64> {
    let delta = x - zero_azimuth;

    // A single wrap step only re-normalizes deltas within [-2, 2]
    if !delta.is_finite() || delta.abs() > 2.0 {
        return Err(overflow(x, zero_azimuth, delta));
    }

    let corrected = if delta < -1.0 {
        1.0 + delta % 1.0
    } else if delta > 1.0 {
        -(1.0 - delta % 1.0)
    } else {
        delta
    };

    if !(-1.0..=1.0).contains(&corrected) {
        return Err(overflow(x, zero_azimuth, corrected));
    }

    Ok(corrected)
}

fn overflow(x: f64, zero_azimuth: f64, result: f64) -> Error {
    tracing::error!(
        x = x,
        zero_azimuth = zero_azimuth,
        result = result,
        "Pan normalization overflow - check CAM_ZERO_AZIMUTH calibration"
    );
    Error::NormalizationOverflow {
        x,
        zero_azimuth,
        result,
    }
}
