//! Unified error types for the photoreactor controller.
//!
//! A single [`ReactorError`] that every command handler returns, keeping
//! the caller's error handling uniform.  Hardware faults are split into
//! transient (logged, stale values retained) and fatal (surfaced, caller
//! decides whether to stop the run).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible command funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactorError {
    /// Channel index outside the configured range.  Caller contract
    /// violation; fatal to the call, never to the process.
    InvalidChannel { index: usize, limit: usize },
    /// A numeric parameter or cycle stage failed range validation.
    /// No state was mutated.
    Validation(ValidationError),
    /// A sensor or camera call failed once; last-known-good values remain.
    IoTransient(IoError),
    /// Captures failed `consecutive` times in a row.  The run is left
    /// `Running`; stopping it is the caller's decision.
    IoFatal { consecutive: u32, last: IoError },
}

impl fmt::Display for ReactorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChannel { index, limit } => {
                write!(f, "invalid channel {index} (valid: 0..{limit})")
            }
            Self::Validation(e) => write!(f, "validation: {e}"),
            Self::IoTransient(e) => write!(f, "transient I/O: {e}"),
            Self::IoFatal { consecutive, last } => {
                write!(f, "{consecutive} consecutive capture failures (last: {last})")
            }
        }
    }
}

impl std::error::Error for ReactorError {}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Cycle stage in 1-based `slot` is partially specified or out of range.
    Stage { slot: usize, reason: &'static str },
    /// Picture interval outside 0.5–100 minutes.
    Interval { secs: f64 },
    /// Quench target list is not strictly descending, finite and non-negative.
    Targets(&'static str),
    /// Destination folder name rejected.
    Folder(&'static str),
    /// Calibration could not be computed from the given readings.
    Calibration(&'static str),
    /// A configuration field failed range validation.
    Config(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage { slot, reason } => write!(f, "cycle stage {slot}: {reason}"),
            Self::Interval { secs } => {
                write!(f, "picture interval {secs}s outside 0.5–100 minutes")
            }
            Self::Targets(msg) => write!(f, "quench targets: {msg}"),
            Self::Folder(msg) => write!(f, "folder: {msg}"),
            Self::Calibration(msg) => write!(f, "calibration: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ReactorError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware I/O errors
// ---------------------------------------------------------------------------

/// Failure reported by a hardware collaborator.  Collaborators must return
/// within a bounded time; a stall is reported as [`IoError::Timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// The call did not complete within the collaborator's deadline.
    Timeout,
    /// The device link is gone (unplugged, bus reset).
    Disconnected,
    /// The device answered with an error.
    Device(&'static str),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::Disconnected => write!(f, "device disconnected"),
            Self::Device(msg) => write!(f, "device error: {msg}"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<IoError> for ReactorError {
    fn from(e: IoError) -> Self {
        Self::IoTransient(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, ReactorError>;
