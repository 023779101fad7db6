//! Oxygen quenching detector.
//!
//! Watches the smoothed oxygen estimate walk down a descending list of
//! targets and asks for a capture each time one is crossed, after a hold
//! that lets the readings settle.
//!
//! ```text
//!  IDLE ──[enabled, targets left]──▶ ARMED ──[O2 <= head - band(head)]──▶ HOLDING
//!   ▲                                  ▲                                     │
//!   └──[targets exhausted]─────────────┴───[hold elapsed: trigger, pop]──────┘
//! ```
//!
//! A separate one-shot final capture fires when few targets remain and
//! pressure has read zero for a sustained window, covering the case where
//! the band logic never fires at exactly zero oxygen.

pub mod smoothing;

use heapless::Vec;
use log::{debug, info};

use crate::config::{HoldPolicy, MAX_QUENCH_TARGETS, QuenchConfig, validate_targets};
use crate::error::ValidationError;

/// Detection band below a target.  Tighter near zero, where the sensor's
/// relative noise is largest.
pub fn band(target: f64) -> f64 {
    if target > 1.0 {
        0.7
    } else if target > 0.1 {
        0.3
    } else {
        0.08
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuenchPhase {
    /// Disabled, or no targets left.
    Idle,
    /// Waiting for the estimate to cross the head target.
    ArmedWaiting,
    /// Crossing seen; hold counting down.
    Holding,
}

/// Capture request raised by the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuenchTrigger {
    /// Hold completed after crossing `target`.
    Threshold { target: f64, oxygen: f64 },
    /// Sustained zero pressure with few targets left.
    Final,
}

/// Snapshot of the detector's state.
#[derive(Debug, Clone, PartialEq)]
pub struct QuenchState {
    pub targets: Vec<f64, MAX_QUENCH_TARGETS>,
    pub phase: QuenchPhase,
    pub hold_started_at: Option<f64>,
}

pub struct QuenchDetector {
    enabled: bool,
    targets: Vec<f64, MAX_QUENCH_TARGETS>,
    phase: QuenchPhase,
    hold_started_at: f64,
    hold: HoldPolicy,
    final_hold_secs: f64,
    final_hold_max_targets: usize,
    zero_pressure_since: Option<f64>,
    final_taken: bool,
}

impl QuenchDetector {
    /// Build a detector from config.  Targets beyond capacity are dropped;
    /// config validation rejects that case earlier.
    pub fn new(config: &QuenchConfig) -> Self {
        let mut detector = Self {
            enabled: config.enabled,
            targets: config.targets.iter().copied().take(MAX_QUENCH_TARGETS).collect(),
            phase: QuenchPhase::Idle,
            hold_started_at: 0.0,
            hold: config.hold,
            final_hold_secs: config.final_hold_secs,
            final_hold_max_targets: config.final_hold_max_targets,
            zero_pressure_since: None,
            final_taken: false,
        };
        detector.rearm();
        detector
    }

    /// Feed the current oxygen estimate.
    pub fn on_sample(&mut self, oxygen: f64, now: f64) -> Option<QuenchTrigger> {
        match self.phase {
            QuenchPhase::Idle => None,
            QuenchPhase::ArmedWaiting => {
                let head = *self.targets.first()?;
                if oxygen <= head - band(head) {
                    info!(
                        "Quench: O2 {:.2}% crossed target {:.2}% (band {:.2}), holding",
                        oxygen,
                        head,
                        band(head)
                    );
                    self.phase = QuenchPhase::Holding;
                    self.hold_started_at = now;
                }
                None
            }
            QuenchPhase::Holding => {
                if now - self.hold_started_at <= self.hold_secs() {
                    return None;
                }
                let target = self.targets.first().copied().unwrap_or(oxygen);
                self.pop_reached(oxygen);
                self.rearm();
                info!(
                    "Quench: hold complete at O2 {:.2}%, {} target(s) left",
                    oxygen,
                    self.targets.len()
                );
                Some(QuenchTrigger::Threshold { target, oxygen })
            }
        }
    }

    /// Feed the last-known pressure for the final-hold check.
    pub fn on_pressure(&mut self, pressure: f64, now: f64) -> Option<QuenchTrigger> {
        if !self.enabled || self.final_taken || self.targets.len() >= self.final_hold_max_targets {
            self.zero_pressure_since = None;
            return None;
        }
        if pressure.abs() > f64::EPSILON {
            self.zero_pressure_since = None;
            return None;
        }
        let since = *self.zero_pressure_since.get_or_insert(now);
        if now - since >= self.final_hold_secs {
            info!("Quench: pressure at zero for {:.0}s, final capture", now - since);
            self.final_taken = true;
            self.zero_pressure_since = None;
            return Some(QuenchTrigger::Final);
        }
        None
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.zero_pressure_since = None;
        self.rearm();
        info!("Quench detection {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Replace the target list and re-arm from scratch.
    pub fn set_targets(&mut self, targets: &[f64]) -> Result<(), ValidationError> {
        validate_targets(targets)?;
        self.targets = targets.iter().copied().collect();
        self.final_taken = false;
        self.zero_pressure_since = None;
        self.rearm();
        Ok(())
    }

    pub fn set_hold_policy(&mut self, hold: HoldPolicy) {
        self.hold = hold;
    }

    /// Drop any hold in progress and the zero-pressure window.  Targets
    /// already consumed stay consumed.
    pub fn reset_timers(&mut self) {
        if self.is_holding() {
            debug!("Quench: hold abandoned");
        }
        self.hold_started_at = 0.0;
        self.zero_pressure_since = None;
        self.rearm();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn phase(&self) -> QuenchPhase {
        self.phase
    }

    pub fn is_holding(&self) -> bool {
        self.phase == QuenchPhase::Holding
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    pub fn state(&self) -> QuenchState {
        QuenchState {
            targets: self.targets.clone(),
            phase: self.phase,
            hold_started_at: self.is_holding().then_some(self.hold_started_at),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn hold_secs(&self) -> f64 {
        match self.hold {
            HoldPolicy::Fixed { secs } => secs,
            HoldPolicy::NextTarget => {
                let next = self.targets.get(1).or_else(|| self.targets.first());
                next.map_or(0.0, |minutes| minutes * 60.0)
            }
        }
    }

    /// Remove the head, then every further target the estimate has
    /// already reached, so the next detection aims strictly lower.
    fn pop_reached(&mut self, oxygen: f64) {
        if !self.targets.is_empty() {
            self.targets.remove(0);
        }
        while self.targets.first().is_some_and(|t| *t >= oxygen) {
            self.targets.remove(0);
        }
    }

    fn rearm(&mut self) {
        self.phase = if self.enabled && !self.targets.is_empty() {
            QuenchPhase::ArmedWaiting
        } else {
            QuenchPhase::Idle
        };
    }
}
