//! Reactor configuration parameters
//!
//! All tunable parameters for the photoreactor controller.
//! Values can be overridden from a JSON file (see `adapters::config_file`)
//! or hot-swapped through `ReactorCommand::UpdateConfig`.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of capture-light channels (A..F).
pub const PICTURE_LIGHT_COUNT: usize = 6;

/// Maximum number of quench targets held by the detector.
pub const MAX_QUENCH_TARGETS: usize = 32;

/// Shortest accepted picture interval (0.5 minutes).
pub const MIN_PICTURE_INTERVAL_SECS: f64 = 30.0;
/// Longest accepted picture interval (100 minutes).
pub const MAX_PICTURE_INTERVAL_SECS: f64 = 6000.0;

const MAX_FOLDER_LEN: usize = 64;

/// Linear conversion from raw ADC counts to engineering units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorCalibration {
    /// Oxygen percent per raw count.
    pub oxygen_factor: f64,
    /// Pressure units per raw count above the zero point.
    pub pressure_factor: f64,
    /// Raw pressure count that reads as zero.
    pub pressure_zero: f64,
}

impl Default for SensorCalibration {
    fn default() -> Self {
        // Identity: readings already arrive in engineering units.
        Self {
            oxygen_factor: 1.0,
            pressure_factor: 1.0,
            pressure_zero: 0.0,
        }
    }
}

/// How long the quench detector waits between detecting a crossing and
/// triggering the capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HoldPolicy {
    /// Fixed hold in seconds.
    Fixed { secs: f64 },
    /// Hold for the next remaining target's value, read as minutes.
    NextTarget,
}

/// What a cycle program does after its last non-empty stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleEndPolicy {
    /// Stop stepping and report completion.
    Terminate,
    /// Start over from the first non-empty stage.
    Wrap,
}

/// Quenching experiment parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuenchConfig {
    /// Whether the detector is armed at startup.
    pub enabled: bool,
    /// Descending oxygen targets (percent).
    pub targets: Vec<f64>,
    pub hold: HoldPolicy,
    /// Sustained zero-pressure window before the one-shot final capture.
    pub final_hold_secs: f64,
    /// The final capture is only considered with fewer targets than this.
    pub final_hold_max_targets: usize,
}

impl Default for QuenchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            targets: vec![15.0, 10.0, 5.0, 2.0, 1.0, 0.5, 0.1, 0.05],
            hold: HoldPolicy::Fixed { secs: 120.0 },
            final_hold_secs: 300.0,
            final_hold_max_targets: 5,
        }
    }
}

/// Core reactor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    // --- Timing ---
    /// Control tick cadence (milliseconds)
    pub tick_interval_ms: u32,
    /// Seconds between scheduled capture batches
    pub picture_interval_secs: f64,
    /// Sensor poll cadence (milliseconds)
    pub sensor_poll_interval_ms: u32,
    /// Telemetry report interval (seconds)
    pub telemetry_interval_secs: u32,
    /// Seconds between re-reads of the persisted phase record
    pub phase_poll_secs: f64,

    // --- Capture ---
    /// Destination folder for artifacts
    pub folder: String,
    /// Which capture lights (A..F) take part in a batch
    pub picture_lights: [bool; PICTURE_LIGHT_COUNT],
    /// Keep the illumination dark while running
    pub no_light: bool,
    /// Number of illumination-role channels
    pub illumination_channels: usize,
    /// Consecutive capture failures before the error turns fatal
    pub max_capture_failures: u32,

    // --- Sensors ---
    pub calibration: SensorCalibration,
    /// Lowest plausible calibrated pressure
    pub pressure_min: f64,
    /// Highest plausible calibrated pressure
    pub pressure_max: f64,

    // --- Degas ---
    pub degas_enabled: bool,
    /// Valve opens while pressure is below this
    pub degas_threshold: f64,

    // --- Programs ---
    pub quench: QuenchConfig,
    pub cycle_end: CycleEndPolicy,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            // Timing
            tick_interval_ms: 100,        // 10 Hz
            picture_interval_secs: 60.0,  // 1/min
            sensor_poll_interval_ms: 150, // ADC conversion cadence
            telemetry_interval_secs: 60,
            phase_poll_secs: 10.0,

            // Capture
            folder: "pictures".into(),
            picture_lights: [true; PICTURE_LIGHT_COUNT],
            no_light: false,
            illumination_channels: 1,
            max_capture_failures: 3,

            // Sensors
            calibration: SensorCalibration::default(),
            pressure_min: -10.0,
            pressure_max: 650.0,

            // Degas
            degas_enabled: false,
            degas_threshold: 1.0,

            quench: QuenchConfig::default(),
            cycle_end: CycleEndPolicy::Terminate,
        }
    }
}

impl ReactorConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(10..=5000).contains(&self.tick_interval_ms) {
            return Err(ValidationError::Config("tick_interval_ms must be 10–5000"));
        }
        validate_interval(self.picture_interval_secs)?;
        if !(10..=60_000).contains(&self.sensor_poll_interval_ms) {
            return Err(ValidationError::Config(
                "sensor_poll_interval_ms must be 10–60000",
            ));
        }
        if !(1..=3600).contains(&self.telemetry_interval_secs) {
            return Err(ValidationError::Config(
                "telemetry_interval_secs must be 1–3600",
            ));
        }
        if !(self.phase_poll_secs.is_finite() && self.phase_poll_secs > 0.0) {
            return Err(ValidationError::Config("phase_poll_secs must be positive"));
        }
        validate_folder(&self.folder)?;
        if !(1..=4).contains(&self.illumination_channels) {
            return Err(ValidationError::Config("illumination_channels must be 1–4"));
        }
        if self.max_capture_failures == 0 {
            return Err(ValidationError::Config("max_capture_failures must be >= 1"));
        }
        let cal = &self.calibration;
        if !(cal.oxygen_factor.is_finite() && cal.oxygen_factor > 0.0) {
            return Err(ValidationError::Config("oxygen_factor must be positive"));
        }
        if !(cal.pressure_factor.is_finite() && cal.pressure_factor > 0.0) {
            return Err(ValidationError::Config("pressure_factor must be positive"));
        }
        if !cal.pressure_zero.is_finite() {
            return Err(ValidationError::Config("pressure_zero must be finite"));
        }
        if !(self.pressure_min.is_finite()
            && self.pressure_max.is_finite()
            && self.pressure_min < self.pressure_max)
        {
            return Err(ValidationError::Config(
                "pressure_min must be below pressure_max",
            ));
        }
        if !self.degas_threshold.is_finite() {
            return Err(ValidationError::Config("degas_threshold must be finite"));
        }
        validate_targets(&self.quench.targets)?;
        if let HoldPolicy::Fixed { secs } = self.quench.hold {
            if !(secs.is_finite() && secs >= 0.0) {
                return Err(ValidationError::Config("quench hold must be >= 0s"));
            }
        }
        if !(self.quench.final_hold_secs.is_finite() && self.quench.final_hold_secs > 0.0) {
            return Err(ValidationError::Config("final_hold_secs must be positive"));
        }
        Ok(())
    }

    /// Tick period in seconds.
    pub fn tick_secs(&self) -> f64 {
        f64::from(self.tick_interval_ms) / 1000.0
    }
}

/// Accept a picture interval in seconds if it lies within 0.5–100 minutes.
pub fn validate_interval(secs: f64) -> Result<f64, ValidationError> {
    if secs.is_finite() && (MIN_PICTURE_INTERVAL_SECS..=MAX_PICTURE_INTERVAL_SECS).contains(&secs) {
        Ok(secs)
    } else {
        Err(ValidationError::Interval { secs })
    }
}

/// Accept a destination folder: non-empty, bounded, relative-or-absolute
/// path without a trailing separator.
pub fn validate_folder(folder: &str) -> Result<(), ValidationError> {
    if folder.trim().is_empty() {
        return Err(ValidationError::Folder("must not be empty"));
    }
    if folder.len() > MAX_FOLDER_LEN {
        return Err(ValidationError::Folder("longer than 64 characters"));
    }
    if folder.ends_with('/') {
        return Err(ValidationError::Folder("must not end with '/'"));
    }
    Ok(())
}

/// Accept a quench target list: at most [`MAX_QUENCH_TARGETS`] finite,
/// non-negative, strictly descending values.
pub fn validate_targets(targets: &[f64]) -> Result<(), ValidationError> {
    if targets.len() > MAX_QUENCH_TARGETS {
        return Err(ValidationError::Targets("more than 32 targets"));
    }
    if targets.iter().any(|t| !t.is_finite() || *t < 0.0) {
        return Err(ValidationError::Targets("targets must be finite and >= 0"));
    }
    if targets.windows(2).any(|w| w[1] >= w[0]) {
        return Err(ValidationError::Targets("targets must be strictly descending"));
    }
    Ok(())
}
