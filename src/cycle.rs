//! User-programmed capture-interval cycles.
//!
//! A program is up to six stages, each "take a picture every `interval`,
//! `repeat` times".  Empty slots are skipped.
//!
//! ```text
//!  INACTIVE ──start()──▶ STEPPING(slot) ──[repeats done]──▶ STEPPING(next)
//!     ▲                        │                               │
//!     └────────cancel()────────┤                  [no slot left]▼
//!                              └──────────────────────────▶ COMPLETED
//! ```
//!
//! Finding the next stage is a bounded scan: every slot is visited at
//! most once per advance, so an all-empty program completes immediately
//! even under [`CycleEndPolicy::Wrap`].

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::CycleEndPolicy;
use crate::error::ValidationError;

/// Number of stage slots in a program.
pub const CYCLE_SLOTS: usize = 6;

const MIN_STAGE_MINUTES: f64 = 0.5;
const MAX_STAGE_MINUTES: f64 = 100.0;

/// One row as entered by the user.  Either both fields or neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageInput {
    pub interval_minutes: Option<f64>,
    pub repeat_count: Option<u32>,
}

impl StageInput {
    pub const EMPTY: Self = Self {
        interval_minutes: None,
        repeat_count: None,
    };

    pub fn new(interval_minutes: f64, repeat_count: u32) -> Self {
        Self {
            interval_minutes: Some(interval_minutes),
            repeat_count: Some(repeat_count),
        }
    }
}

/// A validated, fully specified stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleStage {
    pub interval_secs: f64,
    pub repeat_count: u32,
}

/// Validated program: `None` marks an empty slot.
pub type StageTable = [Option<CycleStage>; CYCLE_SLOTS];

/// Accept a program only if every slot is fully empty or fully valid.
/// The error names the first offending slot (1-based).
pub fn validate(inputs: &[StageInput; CYCLE_SLOTS]) -> Result<StageTable, ValidationError> {
    let mut table: StageTable = [None; CYCLE_SLOTS];
    for (i, input) in inputs.iter().enumerate() {
        let slot = i + 1;
        table[i] = match (input.interval_minutes, input.repeat_count) {
            (None, None) => None,
            (Some(_), None) => {
                return Err(ValidationError::Stage {
                    slot,
                    reason: "interval set without repeat count",
                });
            }
            (None, Some(_)) => {
                return Err(ValidationError::Stage {
                    slot,
                    reason: "repeat count set without interval",
                });
            }
            (Some(minutes), Some(repeat_count)) => {
                if !(minutes.is_finite() && (MIN_STAGE_MINUTES..=MAX_STAGE_MINUTES).contains(&minutes)) {
                    return Err(ValidationError::Stage {
                        slot,
                        reason: "interval must be 0.5–100 minutes",
                    });
                }
                if repeat_count == 0 {
                    return Err(ValidationError::Stage {
                        slot,
                        reason: "repeat count must be positive",
                    });
                }
                Some(CycleStage {
                    interval_secs: minutes * 60.0,
                    repeat_count,
                })
            }
        };
    }
    Ok(table)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Inactive,
    /// Zero-based slot index of the current stage.
    Stepping(usize),
    Completed,
}

/// Progress within the current stage.  Exists only while stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleRunState {
    pub current_stage_index: usize,
    pub repetitions_done_in_stage: u32,
}

/// What the runtime must do after a program transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleStep {
    /// Nothing changed.
    Unchanged,
    /// A new stage began; apply its interval.  `slot` is 1-based.
    Entered { slot: usize, interval_secs: f64 },
    /// No stage remains.
    Completed,
}

pub struct CycleProgram {
    stages: StageTable,
    state: CycleState,
    run: Option<CycleRunState>,
    end_policy: CycleEndPolicy,
}

impl CycleProgram {
    pub fn new(stages: StageTable, end_policy: CycleEndPolicy) -> Self {
        Self {
            stages,
            state: CycleState::Inactive,
            run: None,
            end_policy,
        }
    }

    /// Validate raw rows and build an inactive program.
    pub fn from_inputs(
        inputs: &[StageInput; CYCLE_SLOTS],
        end_policy: CycleEndPolicy,
    ) -> Result<Self, ValidationError> {
        Ok(Self::new(validate(inputs)?, end_policy))
    }

    /// Begin stepping at the first non-empty stage.
    pub fn start(&mut self) -> CycleStep {
        info!("Cycle program started");
        self.state = CycleState::Stepping(0);
        self.run = None;
        self.scan_from(0, None)
    }

    /// Move to the next non-empty stage, or finish.
    pub fn advance(&mut self) -> CycleStep {
        match self.state {
            CycleState::Stepping(current) => self.scan_from(current + 1, Some(current)),
            CycleState::Inactive | CycleState::Completed => CycleStep::Unchanged,
        }
    }

    /// Count one scheduled capture toward the current stage.
    pub fn on_capture(&mut self) -> CycleStep {
        let CycleState::Stepping(slot) = self.state else {
            return CycleStep::Unchanged;
        };
        let (Some(run), Some(stage)) = (self.run.as_mut(), self.stages[slot]) else {
            return CycleStep::Unchanged;
        };
        run.repetitions_done_in_stage += 1;
        if run.repetitions_done_in_stage >= stage.repeat_count {
            self.advance()
        } else {
            CycleStep::Unchanged
        }
    }

    /// Drop back to `Inactive` from any state.
    pub fn cancel(&mut self) {
        if self.state != CycleState::Inactive {
            info!("Cycle program cancelled");
        }
        self.state = CycleState::Inactive;
        self.run = None;
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn run_state(&self) -> Option<CycleRunState> {
        self.run
    }

    pub fn is_stepping(&self) -> bool {
        matches!(self.state, CycleState::Stepping(_))
    }

    pub fn current_stage(&self) -> Option<CycleStage> {
        match self.state {
            CycleState::Stepping(slot) => self.stages[slot],
            _ => None,
        }
    }

    pub fn stages(&self) -> &StageTable {
        &self.stages
    }

    /// True when no slot holds a stage.
    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(Option::is_none)
    }

    // ── Internal ──────────────────────────────────────────────

    /// Visit slots `from..CYCLE_SLOTS`, then (when wrapping) `0..=wrap_to`,
    /// each at most once.
    fn scan_from(&mut self, from: usize, wrap_to: Option<usize>) -> CycleStep {
        let forward = from..CYCLE_SLOTS;
        let wrapped = match (self.end_policy, wrap_to) {
            (CycleEndPolicy::Wrap, Some(last)) => 0..(last + 1).min(from),
            (CycleEndPolicy::Wrap, None) => 0..0,
            (CycleEndPolicy::Terminate, _) => 0..0,
        };
        for slot in forward.chain(wrapped) {
            if let Some(stage) = self.stages[slot] {
                self.state = CycleState::Stepping(slot);
                self.run = Some(CycleRunState {
                    current_stage_index: slot,
                    repetitions_done_in_stage: 0,
                });
                info!(
                    "Cycle stage {} entered: every {:.0}s x{}",
                    slot + 1,
                    stage.interval_secs,
                    stage.repeat_count
                );
                return CycleStep::Entered {
                    slot: slot + 1,
                    interval_secs: stage.interval_secs,
                };
            }
        }
        info!("Cycle program completed");
        self.state = CycleState::Completed;
        self.run = None;
        CycleStep::Completed
    }
}
