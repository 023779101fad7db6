//! Inbound commands to the runtime.
//!
//! These are the actions a front end (display, CLI, remote) can request.
//! The [`ReactorRuntime`](super::runtime::ReactorRuntime) interprets them
//! in [`handle_command`](super::runtime::ReactorRuntime::handle_command).

use crate::app::ports::Artifact;
use crate::capture::CaptureBatch;
use crate::config::ReactorConfig;
use crate::cycle::{CYCLE_SLOTS, StageInput};
use crate::illumination::ToggleOutcome;

/// Commands that external adapters can send into the runtime.
#[derive(Debug, Clone)]
pub enum ReactorCommand {
    Start,
    Stop,

    /// Validate and arm a cycle program.  Starts at once during a run.
    ArmCycle([StageInput; CYCLE_SLOTS]),

    /// Forget the armed cycle program.
    DisarmCycle,

    /// Picture interval in seconds.
    SetInterval(f64),

    SetQuenching(bool),

    /// Replace the quench target list (strictly descending).
    SetQuenchTargets(Vec<f64>),

    SetDegas(bool),

    /// Keep the illumination off during runs.
    SetNoLight(bool),

    /// Destination folder for artifacts.  Only while stopped.
    SetFolder(String),

    /// Manual illumination switch.  Refused during a run.
    SetIllumination(bool),

    /// Which illumination channel runs drive (0-based).
    SelectIllumination(usize),

    /// Manual capture light toggle (0 = A).  Refused during a run.
    ToggleCaptureLight(usize),

    TakeSingleCapture,
    TakeFullBatch,

    /// Hot-swap the configuration.
    UpdateConfig(Box<ReactorConfig>),
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    Done,
    Toggled(ToggleOutcome),
    Captured(Artifact),
    Batch(CaptureBatch),
}
