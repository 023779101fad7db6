//! Port traits — the hexagonal boundary between the control core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ReactorRuntime (domain)
//! ```
//!
//! Driven adapters (relay board, camera, ADC, clock, event sinks, config
//! storage) implement these traits.  The
//! [`ReactorRuntime`](super::runtime::ReactorRuntime) consumes them via
//! generics, so the control core never touches hardware directly.
//!
//! ## Timing contract
//!
//! Every hardware call must return within a bounded time.  A stalled
//! device is reported as [`IoError::Timeout`], never as a hang.

use chrono::NaiveDateTime;

use crate::config::ReactorConfig;
use crate::error::{IoError, ValidationError};
use crate::illumination::ChannelId;
use crate::photoperiod::PhaseRecord;
use crate::sensors::SensorSample;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → relay board)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to switch outputs.
pub trait ActuatorPort {
    /// Energise or release one output channel.
    fn set_channel(&mut self, channel: ChannelId, on: bool);

    /// Open or close the degas valve.
    fn set_degas_valve(&mut self, open: bool);
}

// ───────────────────────────────────────────────────────────────
// Camera port (driven adapter: domain → image sensor)
// ───────────────────────────────────────────────────────────────

/// One capture request handed to the camera collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    /// Full destination path of the artifact.
    pub destination: String,
    /// Caption to stamp onto the image (illumination total).
    pub annotation: String,
}

/// A captured image as reported back by the camera collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Where the image was written.
    pub path: String,
}

pub trait CameraPort {
    /// Take one picture.  Synchronous; blocks for at most the collaborator's
    /// deadline.
    fn capture(&mut self, request: &CaptureRequest) -> Result<Artifact, IoError>;

    /// Make sure `folder` exists and is writable.
    fn prepare_destination(&mut self, folder: &str) -> Result<(), IoError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: ADC → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain pressure/oxygen data.
pub trait SensorPort {
    /// Read both analog channels once.
    fn poll_sensors(&mut self) -> Result<SensorSample, IoError>;

    /// Re-open a lost sensor link.  Called at most once per failed poll.
    fn reconnect(&mut self) -> Result<(), IoError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Local wall-clock time, used only for artifact names.
pub trait ClockPort {
    fn local_now(&self) -> NaiveDateTime;
}

/// Everything the runtime needs from the hardware side, in one bound.
///
/// Satisfied automatically by any adapter implementing all four ports,
/// which avoids a double mutable borrow at the call sites.
pub trait Hardware: ActuatorPort + CameraPort + SensorPort + ClockPort {}

impl<T: ActuatorPort + CameraPort + SensorPort + ClockPort> Hardware for T {}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`ReactorEvent`](super::events::ReactorEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ReactorEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration ports
// ───────────────────────────────────────────────────────────────

/// Loads and persists reactor configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ReactorConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ReactorConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &ReactorConfig) -> Result<(), ConfigError>;
}

/// Source of the persisted phase record (`on|off`, light, dark, picture
/// minutes).  The format belongs to the adapter; the runtime only polls.
pub trait PhaseSource {
    /// `Ok(None)` when no record exists yet.
    fn read_phase(&mut self) -> Result<Option<PhaseRecord>, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] and [`PhaseSource`] operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No config found in storage (first run).
    NotFound,
    /// Stored config failed to parse.
    Corrupted(String),
    /// A config field failed range validation.
    ValidationFailed(ValidationError),
    /// Generic I/O error from the storage backend.
    Io(String),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted(msg) => write!(f, "config corrupted: {}", msg),
            Self::ValidationFailed(e) => write!(f, "validation failed: {}", e),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ValidationError> for ConfigError {
    fn from(e: ValidationError) -> Self {
        Self::ValidationFailed(e)
    }
}
