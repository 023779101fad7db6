//! Periodic picture capture.
//!
//! [`CaptureScheduler`] decides when a batch is due and runs it.  A batch
//! always follows the same sequence, because the image sensor and the
//! light driver share one bus:
//!
//! ```text
//!  all lights off ─▶ for each enabled capture light (A..F):
//!                       light on ─▶ capture ─▶ light off
//!                  ─▶ illumination restored (unless noLight / dark phase)
//! ```
//!
//! Captures are strictly sequential.  With no capture light enabled a
//! single untagged picture is taken instead.

use chrono::NaiveDateTime;
use log::{error, info, warn};

use crate::app::ports::{ActuatorPort, Artifact, CameraPort, CaptureRequest, ClockPort};
use crate::error::IoError;
use crate::illumination::{ChannelId, IlluminationController};

/// strftime pattern appended to every artifact name.
pub const TIMESTAMP_PATTERN: &str = ":y%ym%md%dH%HM%MS%S.jpg";

/// Build `<folder>/<folder tail><letter><timestamp>`.  The letter is
/// omitted when no capture light was lit.
pub fn artifact_name(folder: &str, letter: Option<char>, wall: NaiveDateTime) -> String {
    let tail = folder.rsplit('/').next().unwrap_or(folder);
    let mut name = String::with_capacity(folder.len() + tail.len() + 24);
    name.push_str(folder);
    name.push('/');
    name.push_str(tail);
    if let Some(letter) = letter {
        name.push(letter);
    }
    name.push_str(&wall.format(TIMESTAMP_PATTERN).to_string());
    name
}

/// Caption stamped onto every image.
pub fn illumination_caption(illumination_secs: f64) -> String {
    format!("Total Illumination: {:.2} minutes", illumination_secs / 60.0)
}

/// Per-batch parameters supplied by the runtime.
#[derive(Debug, Clone)]
pub struct CaptureJob<'a> {
    pub folder: &'a str,
    /// Accumulated illumination time for the caption.
    pub illumination_secs: f64,
    /// Switch the illumination back on after the batch.
    pub restore_illumination: bool,
}

/// Outcome of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureBatch {
    pub artifacts: Vec<Artifact>,
    /// Captures attempted but failed in this batch.
    pub failures: u32,
    /// Most recent failure in this batch.
    pub last_error: Option<IoError>,
    /// Run time at which the batch fired (the new `lastCaptureAt`).
    pub captured_at: f64,
}

impl CaptureBatch {
    pub fn count(&self) -> usize {
        self.artifacts.len()
    }
}

pub struct CaptureScheduler {
    interval_secs: f64,
    last_capture_at: f64,
    consecutive_failures: u32,
    max_failures: u32,
}

impl CaptureScheduler {
    pub fn new(interval_secs: f64, max_failures: u32) -> Self {
        Self {
            interval_secs,
            last_capture_at: 0.0,
            consecutive_failures: 0,
            max_failures: max_failures.max(1),
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval_secs
    }

    /// Change the interval.  Callers validate the range.
    pub fn set_interval(&mut self, secs: f64) {
        if (secs - self.interval_secs).abs() > f64::EPSILON {
            info!("Capture interval {:.1}s -> {:.1}s", self.interval_secs, secs);
        }
        self.interval_secs = secs;
    }

    pub fn last_capture_at(&self) -> f64 {
        self.last_capture_at
    }

    /// Restart the interval clock at `now` and forget past failures.
    pub fn reset(&mut self, now: f64) {
        self.last_capture_at = now;
        self.consecutive_failures = 0;
    }

    pub fn is_due(&self, now: f64) -> bool {
        now - self.last_capture_at >= self.interval_secs
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Failure streak has reached the configured limit.
    pub fn failure_limit_reached(&self) -> bool {
        self.consecutive_failures >= self.max_failures
    }

    /// Run a batch if one is due at `now`.
    pub fn maybe_capture(
        &mut self,
        now: f64,
        job: &CaptureJob<'_>,
        lights: &mut IlluminationController,
        hw: &mut (impl ActuatorPort + CameraPort + ClockPort),
    ) -> Option<CaptureBatch> {
        if !self.is_due(now) {
            return None;
        }
        self.last_capture_at = now;
        Some(self.run_batch(now, job, lights, hw))
    }

    /// Run a full batch unconditionally.  Does not touch `lastCaptureAt`.
    pub fn run_batch(
        &mut self,
        now: f64,
        job: &CaptureJob<'_>,
        lights: &mut IlluminationController,
        hw: &mut (impl ActuatorPort + CameraPort + ClockPort),
    ) -> CaptureBatch {
        let wall = hw.local_now();
        let annotation = illumination_caption(job.illumination_secs);
        let mut batch = CaptureBatch {
            artifacts: Vec::new(),
            failures: 0,
            last_error: None,
            captured_at: now,
        };

        lights.all_off(hw);

        let enabled: heapless::Vec<usize, 6> = lights.enabled_capture_lights().collect();
        if enabled.is_empty() {
            let request = CaptureRequest {
                destination: artifact_name(job.folder, None, wall),
                annotation: annotation.clone(),
            };
            self.record(hw.capture(&request), &request, &mut batch);
        } else {
            for index in enabled {
                let letter = ChannelId::CaptureLight(index as u8).letter();
                lights.capture_light_on(index, hw);
                let request = CaptureRequest {
                    destination: artifact_name(job.folder, letter, wall),
                    annotation: annotation.clone(),
                };
                let result = hw.capture(&request);
                lights.capture_light_off(index, hw);
                self.record(result, &request, &mut batch);
            }
        }

        if job.restore_illumination {
            lights.set_illumination(true, hw);
        }

        info!(
            "Capture batch at {:.1}s: {} artifact(s), {} failure(s)",
            now,
            batch.count(),
            batch.failures
        );
        batch
    }

    /// One untagged, out-of-band capture with all lights off around it.
    pub fn single_capture(
        &mut self,
        job: &CaptureJob<'_>,
        lights: &mut IlluminationController,
        hw: &mut (impl ActuatorPort + CameraPort + ClockPort),
    ) -> Result<Artifact, IoError> {
        lights.all_off(hw);
        let request = CaptureRequest {
            destination: artifact_name(job.folder, None, hw.local_now()),
            annotation: illumination_caption(job.illumination_secs),
        };
        let result = hw.capture(&request);
        if job.restore_illumination {
            lights.set_illumination(true, hw);
        }
        match result {
            Ok(artifact) => {
                self.consecutive_failures = 0;
                info!("Single capture: {}", artifact.path);
                Ok(artifact)
            }
            Err(e) => {
                self.note_failure(&request, e);
                Err(e)
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn record(
        &mut self,
        result: Result<Artifact, IoError>,
        request: &CaptureRequest,
        batch: &mut CaptureBatch,
    ) {
        match result {
            Ok(artifact) => {
                self.consecutive_failures = 0;
                batch.artifacts.push(artifact);
            }
            Err(e) => {
                batch.failures += 1;
                batch.last_error = Some(e);
                self.note_failure(request, e);
            }
        }
    }

    fn note_failure(&mut self, request: &CaptureRequest, e: IoError) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.failure_limit_reached() {
            error!(
                "Capture '{}' failed ({}), {} in a row",
                request.destination, e, self.consecutive_failures
            );
        } else {
            warn!("Capture '{}' failed: {}", request.destination, e);
        }
    }
}
