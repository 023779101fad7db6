//! Sensor subsystem: raw samples in, calibrated last-known values out.
//!
//! The [`SensorHub`] owns the calibration, the oxygen smoother and the
//! plausibility band for pressure.  It produces a [`SensorSnapshot`] every
//! time a sample is ingested; the runtime reads the snapshot for quench and
//! degas decisions.

pub mod calibration;

use log::{debug, warn};

use crate::config::{ReactorConfig, SensorCalibration};
use crate::quench::smoothing::OxygenSmoother;

/// One raw reading from the ADC collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub raw_pressure: f64,
    pub raw_oxygen: f64,
    /// Seconds on the runtime clock.
    pub timestamp: f64,
}

/// Calibrated view after the latest sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Smoothed oxygen percentage.  Stale-but-valid between block fills.
    pub oxygen_estimate: Option<f64>,
    /// True when this sample completed a smoothing block.
    pub estimate_updated: bool,
    /// Last pressure reading inside the plausible band.
    pub pressure: Option<f64>,
    /// True when this sample's pressure was discarded.
    pub pressure_rejected: bool,
}

pub struct SensorHub {
    calibration: SensorCalibration,
    pressure_min: f64,
    pressure_max: f64,
    smoother: OxygenSmoother,
    last_pressure: Option<f64>,
    last_sample_at: Option<f64>,
    rejected_pressure: u32,
}

impl SensorHub {
    pub fn new(config: &ReactorConfig) -> Self {
        Self {
            calibration: config.calibration,
            pressure_min: config.pressure_min,
            pressure_max: config.pressure_max,
            smoother: OxygenSmoother::new(),
            last_pressure: None,
            last_sample_at: None,
            rejected_pressure: 0,
        }
    }

    /// Apply calibration and the plausibility band to one raw sample.
    pub fn ingest(&mut self, sample: SensorSample) -> SensorSnapshot {
        self.last_sample_at = Some(sample.timestamp);

        let oxygen = self.calibration.oxygen_percent(sample.raw_oxygen);
        let estimate_updated = self.smoother.push(oxygen).is_some();

        let pressure = self.calibration.pressure(sample.raw_pressure);
        let pressure_rejected = !self.pressure_plausible(pressure);
        if pressure_rejected {
            self.rejected_pressure = self.rejected_pressure.saturating_add(1);
            warn!(
                "Pressure {:.2} outside [{:.1}, {:.1}], keeping last value",
                pressure, self.pressure_min, self.pressure_max
            );
        } else {
            self.last_pressure = Some(pressure);
        }

        if estimate_updated {
            debug!(
                "Sensors: O2={:?} P={:?}",
                self.smoother.estimate(),
                self.last_pressure
            );
        }

        SensorSnapshot {
            estimate_updated,
            pressure_rejected,
            ..self.snapshot()
        }
    }

    /// Current last-known values without ingesting anything.
    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            oxygen_estimate: self.smoother.estimate(),
            estimate_updated: false,
            pressure: self.last_pressure,
            pressure_rejected: false,
        }
    }

    /// Adopt calibration and band from a new config.  Smoothing state and
    /// last-known values survive.
    pub fn reconfigure(&mut self, config: &ReactorConfig) {
        self.calibration = config.calibration;
        self.pressure_min = config.pressure_min;
        self.pressure_max = config.pressure_max;
    }

    pub fn last_sample_at(&self) -> Option<f64> {
        self.last_sample_at
    }

    pub fn rejected_pressure_count(&self) -> u32 {
        self.rejected_pressure
    }

    fn pressure_plausible(&self, pressure: f64) -> bool {
        pressure.is_finite() && (self.pressure_min..=self.pressure_max).contains(&pressure)
    }
}
