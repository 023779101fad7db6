//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured runtime events to the
//! `log` facade, one pipe-separated record per event.  A display or
//! experiment-record adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::{ReactorEvent, RuntimeState};
use crate::app::ports::EventSink;
use crate::quench::QuenchTrigger;

/// Adapter that logs every [`ReactorEvent`].
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn opt(v: Option<f64>) -> String {
    v.map_or_else(|| "--".to_owned(), |v| format!("{:.2}", v))
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ReactorEvent) {
        match event {
            ReactorEvent::Telemetry(t) => {
                info!(
                    "TELEM | {} | t={:.0}s | illum={:.2}min | every {:.0}s | slot={} | \
                     O2={}% P={} | quench={:?} ({} left) | degas={} | cap_fail={}",
                    match t.state {
                        RuntimeState::Running => "RUN",
                        RuntimeState::Stopped => "STOP",
                    },
                    t.elapsed_secs,
                    t.illumination_minutes,
                    t.interval_secs,
                    t.cycle_slot.map_or_else(|| "-".to_owned(), |s| s.to_string()),
                    opt(t.oxygen),
                    opt(t.pressure),
                    t.quench_phase,
                    t.quench_targets_left,
                    if t.degas_open { "OPEN" } else { "closed" },
                    t.capture_failures,
                );
            }
            ReactorEvent::Started { at } => info!("RUN | started at {:.1}s", at),
            ReactorEvent::Stopped { elapsed_secs } => {
                info!("RUN | stopped after {:.1}s", elapsed_secs);
            }
            ReactorEvent::BatchCaptured {
                artifacts,
                failures,
                at,
            } => info!(
                "CAPTURE | batch at {:.1}s | {} artifact(s) | {} failed",
                at, artifacts, failures
            ),
            ReactorEvent::SingleCaptured { reason, path } => {
                info!("CAPTURE | single ({:?}) | {}", reason, path);
            }
            ReactorEvent::CaptureFault { consecutive, fatal } => {
                warn!(
                    "CAPTURE | fault | {} in a row{}",
                    consecutive,
                    if *fatal { " | FATAL" } else { "" }
                );
            }
            ReactorEvent::SensorFault { error, recovered } => warn!(
                "SENSOR | {} | reconnect {}",
                error,
                if *recovered { "ok" } else { "failed" }
            ),
            ReactorEvent::IntervalChanged { secs } => info!("SCHED | interval {:.1}s", secs),
            ReactorEvent::CycleStageEntered {
                slot,
                interval_secs,
            } => info!("CYCLE | stage {} | interval {:.1}s", slot, interval_secs),
            ReactorEvent::CycleCompleted => info!("CYCLE | completed"),
            ReactorEvent::QuenchPhaseChanged { from, to } => {
                info!("QUENCH | {:?} -> {:?}", from, to);
            }
            ReactorEvent::QuenchTriggered(QuenchTrigger::Threshold { target, oxygen }) => {
                info!("QUENCH | target {:.2}% reached at {:.2}%", target, oxygen);
            }
            ReactorEvent::QuenchTriggered(QuenchTrigger::Final) => {
                info!("QUENCH | final capture");
            }
            ReactorEvent::IlluminationChanged { lit } => {
                info!("LIGHT | illumination {}", if *lit { "on" } else { "off" });
            }
            ReactorEvent::PhaseUpdated {
                phase_on,
                picture_secs,
            } => info!(
                "PHASE | photoperiod {} | picture every {:.0}s",
                if *phase_on { "on" } else { "off" },
                picture_secs
            ),
            ReactorEvent::DegasValve { open } => {
                info!("DEGAS | valve {}", if *open { "open" } else { "closed" });
            }
        }
    }
}
