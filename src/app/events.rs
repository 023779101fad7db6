//! Outbound runtime events.
//!
//! The [`ReactorRuntime`](super::runtime::ReactorRuntime) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: log them, forward them to a
//! display, append them to an experiment record.

use crate::error::IoError;
use crate::quench::{QuenchPhase, QuenchTrigger};

/// Run state of the reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Stopped,
    Running,
}

/// Why an out-of-band picture was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureReason {
    Manual,
    Quench,
}

/// Structured events emitted by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactorEvent {
    /// A run began at the given runtime clock reading.
    Started { at: f64 },

    /// The run ended; every output is off.
    Stopped { elapsed_secs: f64 },

    /// A scheduled or manual batch finished.
    BatchCaptured {
        artifacts: usize,
        failures: u32,
        at: f64,
    },

    /// A single untagged picture was written.
    SingleCaptured { reason: CaptureReason, path: String },

    /// One or more captures failed.
    CaptureFault { consecutive: u32, fatal: bool },

    /// The sensor link failed a poll.  `recovered` reports the reconnect.
    SensorFault { error: IoError, recovered: bool },

    /// The capture interval changed.
    IntervalChanged { secs: f64 },

    /// The cycle program landed on a stage (1-based slot).
    CycleStageEntered { slot: usize, interval_secs: f64 },

    /// The cycle program ran out of stages.
    CycleCompleted,

    /// The quench detector moved between phases.
    QuenchPhaseChanged { from: QuenchPhase, to: QuenchPhase },

    /// The quench detector requested a capture.
    QuenchTriggered(QuenchTrigger),

    /// Photoperiod switched the illumination.
    IlluminationChanged { lit: bool },

    /// A new phase record was adopted.
    PhaseUpdated { phase_on: bool, picture_secs: f64 },

    /// The degas valve moved.
    DegasValve { open: bool },

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot suitable for logging or display.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub state: RuntimeState,
    /// Seconds since the run started (0 while stopped).
    pub elapsed_secs: f64,
    pub illumination_minutes: f64,
    pub interval_secs: f64,
    /// 1-based cycle slot when a program is stepping.
    pub cycle_slot: Option<usize>,
    pub oxygen: Option<f64>,
    pub pressure: Option<f64>,
    pub quench_phase: QuenchPhase,
    pub quench_targets_left: usize,
    pub degas_open: bool,
    pub capture_failures: u32,
}
