//! ADC calibration for the oxygen and pressure channels.
//!
//! Oxygen is calibrated with the sensor open to atmosphere (20.9 % O2).
//! Pressure is calibrated over a sweep from atmospheric to fully
//! pressurised, which spans 600 units on the reactor's gauge.

use crate::config::SensorCalibration;
use crate::error::ValidationError;

/// Atmospheric oxygen, percent.
pub const ATMOSPHERIC_OXYGEN: f64 = 20.9;

/// Gauge span covered by a full pressure sweep.
pub const PRESSURE_SPAN: f64 = 600.0;

impl SensorCalibration {
    pub fn oxygen_percent(&self, raw: f64) -> f64 {
        raw * self.oxygen_factor
    }

    pub fn pressure(&self, raw: f64) -> f64 {
        (raw - self.pressure_zero) * self.pressure_factor
    }
}

/// Oxygen factor from raw readings taken open to atmosphere.
pub fn oxygen_factor(raw: &[f64]) -> Result<f64, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Calibration("no oxygen readings"));
    }
    let mean = raw.iter().sum::<f64>() / raw.len() as f64;
    if !mean.is_finite() || mean == 0.0 {
        return Err(ValidationError::Calibration("oxygen readings average to zero"));
    }
    Ok(ATMOSPHERIC_OXYGEN / mean)
}

/// Pressure factor and zero-point from a full sweep.
pub fn pressure_factor(raw: &[f64]) -> Result<(f64, f64), ValidationError> {
    let mut iter = raw.iter().copied().filter(|v| v.is_finite());
    let first = iter
        .next()
        .ok_or(ValidationError::Calibration("no pressure readings"))?;
    let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if max <= min {
        return Err(ValidationError::Calibration("pressure sweep has no range"));
    }
    Ok((PRESSURE_SPAN / (max - min), min))
}

/// Build a full calibration from both sweeps.
pub fn calibrate(oxygen: &[f64], pressure: &[f64]) -> Result<SensorCalibration, ValidationError> {
    let oxygen_factor = oxygen_factor(oxygen)?;
    let (pressure_factor, pressure_zero) = pressure_factor(pressure)?;
    Ok(SensorCalibration {
        oxygen_factor,
        pressure_factor,
        pressure_zero,
    })
}
