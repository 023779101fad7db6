//! Reactor runtime — the hexagonal core.
//!
//! [`ReactorRuntime`] owns every piece of mutable reactor state: the
//! light mirror, the capture schedule, the cycle program, the quench
//! detector and the sensor front end.  All hardware flows through port
//! traits injected at call sites, so the whole runtime is testable with
//! mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │        ReactorRuntime         │
//! ActuatorPort ◀──│ lights · capture · cycle ·    │
//!   CameraPort ◀──│ quench · sensors · photoperiod│
//!                 └──────────────────────────────┘
//! ```
//!
//! Nothing here blocks longer than one capture or one sensor read; the
//! tick driver decides the cadence.

use log::{debug, error, info, warn};

use crate::capture::{CaptureBatch, CaptureJob, CaptureScheduler};
use crate::config::{ReactorConfig, validate_folder, validate_interval};
use crate::cycle::{CYCLE_SLOTS, CycleProgram, CycleStep, StageInput};
use crate::error::{IoError, ReactorError, Result, ValidationError};
use crate::illumination::{IlluminationController, ToggleOutcome};
use crate::photoperiod::PhaseRecord;
use crate::quench::QuenchDetector;
use crate::sensors::SensorHub;

use super::commands::{CommandReply, ReactorCommand};
use super::events::{CaptureReason, ReactorEvent, RuntimeState, TelemetryData};
use super::ports::{ActuatorPort, Artifact, EventSink, Hardware, PhaseSource, SensorPort};

/// Per-run bookkeeping.  Exists only while running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunState {
    pub started_at: f64,
    /// Time the illumination has actually been lit during this run.
    pub elapsed_illumination: f64,
    last_tick_at: f64,
}

// ───────────────────────────────────────────────────────────────
// ReactorRuntime
// ───────────────────────────────────────────────────────────────

pub struct ReactorRuntime {
    config: ReactorConfig,
    lights: IlluminationController,
    scheduler: CaptureScheduler,
    cycle: CycleProgram,
    quench: QuenchDetector,
    sensors: SensorHub,
    phase: PhaseRecord,
    run: Option<RunState>,
    degas_open: bool,
    now: f64,
    last_sensor_poll: Option<f64>,
    last_phase_poll: Option<f64>,
    last_telemetry: f64,
    tick_count: u64,
}

impl ReactorRuntime {
    /// Build a stopped runtime.  The config is expected to be validated
    /// already (every [`ConfigPort`](super::ports::ConfigPort) does).
    pub fn new(config: ReactorConfig) -> Self {
        let lights = IlluminationController::new(config.illumination_channels, config.picture_lights);
        let scheduler =
            CaptureScheduler::new(config.picture_interval_secs, config.max_capture_failures);
        let cycle = CycleProgram::new([None; CYCLE_SLOTS], config.cycle_end);
        let quench = QuenchDetector::new(&config.quench);
        let sensors = SensorHub::new(&config);
        let phase = PhaseRecord::continuous(config.picture_interval_secs / 60.0);
        Self {
            config,
            lights,
            scheduler,
            cycle,
            quench,
            sensors,
            phase,
            run: None,
            degas_open: false,
            now: 0.0,
            last_sensor_poll: None,
            last_phase_poll: None,
            last_telemetry: 0.0,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// `Stopped -> Running`.  Prepares the destination, resets the run
    /// clocks and starts an armed cycle program.  A no-op while running.
    pub fn start(&mut self, now: f64, hw: &mut impl Hardware, sink: &mut impl EventSink) -> Result<()> {
        self.now = now;
        if self.run.is_some() {
            debug!("start ignored: already running");
            return Ok(());
        }
        hw.prepare_destination(&self.config.folder).map_err(|e| {
            warn!("Destination {} not usable: {}", self.config.folder, e);
            ReactorError::IoTransient(e)
        })?;

        self.lights.all_off(hw);
        self.run = Some(RunState {
            started_at: now,
            elapsed_illumination: 0.0,
            last_tick_at: now,
        });
        self.scheduler.reset(now);

        if self.cycle.is_empty() {
            self.restore_configured_interval(sink);
        } else {
            let step = self.cycle.start();
            self.apply_cycle_step(step, sink);
        }

        if self.illumination_wanted(0.0) {
            self.lights.set_illumination(true, hw);
        }

        info!("Run started at {:.1}s", now);
        sink.emit(&ReactorEvent::Started { at: now });
        Ok(())
    }

    /// `Running -> Stopped`.  Every output is released before this
    /// returns, whatever the prior state.  The armed cycle stages survive;
    /// quench holds and the zero-pressure window do not.
    pub fn stop(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.lights.all_off(hw);
        hw.set_degas_valve(false);
        if self.degas_open {
            self.degas_open = false;
            sink.emit(&ReactorEvent::DegasValve { open: false });
        }
        self.cycle.cancel();

        let before = self.quench.phase();
        self.quench.reset_timers();
        let after = self.quench.phase();
        if before != after {
            sink.emit(&ReactorEvent::QuenchPhaseChanged {
                from: before,
                to: after,
            });
        }

        if let Some(run) = self.run.take() {
            let elapsed_secs = self.now - run.started_at;
            info!("Run stopped after {:.1}s", elapsed_secs);
            sink.emit(&ReactorEvent::Stopped { elapsed_secs });
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control step at runtime clock `now` (seconds).
    ///
    /// Returns [`ReactorError::IoFatal`] when captures keep failing.  The
    /// run stays active; the caller decides whether to stop.
    pub fn tick(&mut self, now: f64, hw: &mut impl Hardware, sink: &mut impl EventSink) -> Result<()> {
        self.tick_count += 1;
        self.now = now;
        let mut fatal = None;

        // 1. Illumination accounting and photoperiod
        if let Some(run) = self.run.as_mut() {
            if self.lights.illumination_is_on() {
                run.elapsed_illumination += (now - run.last_tick_at).max(0.0);
            }
            run.last_tick_at = now;
            self.apply_photoperiod(hw, sink);
        }

        // 2. Scheduled capture batch
        if self.run.is_some() {
            if let Some(batch) = self.scheduled_batch(now, hw) {
                self.report_batch(&batch, sink);
                if let Some(last) = batch.last_error {
                    fatal = self.capture_fault(last, sink);
                }
                let step = self.cycle.on_capture();
                self.apply_cycle_step(step, sink);
            }
        }

        // 3. Sensors
        if self.sensor_poll_due(now) {
            self.last_sensor_poll = Some(now);
            self.poll_sensors(hw, sink);
        }

        // 4. Quench detection
        if self.run.is_some() {
            if let Some(err) = self.run_quench(now, hw, sink) {
                fatal = Some(err);
            }
        }

        // 5. Degas valve
        self.apply_degas(hw, sink);

        // 6. Telemetry
        let telemetry_secs = f64::from(self.config.telemetry_interval_secs);
        if telemetry_secs > 0.0 && now - self.last_telemetry >= telemetry_secs {
            self.last_telemetry = now;
            sink.emit(&ReactorEvent::Telemetry(self.build_telemetry()));
        }

        fatal.map_or(Ok(()), Err)
    }

    /// Re-read the phase record when `phase_poll_secs` have passed.
    /// Invalid records are logged and ignored.
    pub fn poll_phase(&mut self, now: f64, source: &mut impl PhaseSource, sink: &mut impl EventSink) {
        if self
            .last_phase_poll
            .is_some_and(|last| now - last < self.config.phase_poll_secs)
        {
            return;
        }
        self.last_phase_poll = Some(now);
        match source.read_phase() {
            Ok(Some(record)) => {
                if let Err(e) = self.apply_phase_record(record, sink) {
                    warn!("Phase record ignored: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Phase record unreadable: {}", e),
        }
    }

    /// Adopt a phase record.  Its picture interval is applied as
    /// [`set_interval`](Self::set_interval) unless a cycle is stepping.
    pub fn apply_phase_record(&mut self, record: PhaseRecord, sink: &mut impl EventSink) -> Result<()> {
        let picture_secs = record.validate()?;
        if record == self.phase {
            return Ok(());
        }
        self.phase = record;
        info!(
            "Phase record: phase {} light {}m dark {}m picture {}m",
            if record.phase_on { "on" } else { "off" },
            record.light_minutes,
            record.dark_minutes,
            record.picture_minutes
        );
        sink.emit(&ReactorEvent::PhaseUpdated {
            phase_on: record.phase_on,
            picture_secs,
        });
        if !self.cycle.is_stepping() {
            self.set_interval(picture_secs, sink)?;
        }
        Ok(())
    }

    // ── Commands ──────────────────────────────────────────────

    /// Validate and arm a cycle program.  While running it starts at once.
    pub fn arm_cycle(&mut self, stages: &[StageInput; CYCLE_SLOTS], sink: &mut impl EventSink) -> Result<()> {
        let program = CycleProgram::from_inputs(stages, self.config.cycle_end)?;
        self.cycle = program;
        info!("Cycle program armed");
        if self.run.is_some() && !self.cycle.is_empty() {
            let step = self.cycle.start();
            self.apply_cycle_step(step, sink);
        }
        Ok(())
    }

    pub fn disarm_cycle(&mut self) {
        self.cycle = CycleProgram::new([None; CYCLE_SLOTS], self.config.cycle_end);
        info!("Cycle program disarmed");
    }

    pub fn set_interval(&mut self, secs: f64, sink: &mut impl EventSink) -> Result<()> {
        let secs = validate_interval(secs)?;
        self.config.picture_interval_secs = secs;
        if (self.scheduler.interval() - secs).abs() > f64::EPSILON {
            self.scheduler.set_interval(secs);
            sink.emit(&ReactorEvent::IntervalChanged { secs });
        }
        Ok(())
    }

    /// A stage interval outlives its cycle only within the run that
    /// stepped it.
    fn restore_configured_interval(&mut self, sink: &mut impl EventSink) {
        let secs = self.config.picture_interval_secs;
        if (self.scheduler.interval() - secs).abs() > f64::EPSILON {
            self.scheduler.set_interval(secs);
            sink.emit(&ReactorEvent::IntervalChanged { secs });
        }
    }

    pub fn set_quenching(&mut self, enabled: bool) {
        self.config.quench.enabled = enabled;
        self.quench.set_enabled(enabled);
    }

    pub fn set_quench_targets(&mut self, targets: &[f64]) -> Result<()> {
        self.quench.set_targets(targets)?;
        self.config.quench.targets = targets.to_vec();
        Ok(())
    }

    /// Enable or disable the degas law.  The valve follows on the next tick.
    pub fn set_degas(&mut self, enabled: bool) {
        self.config.degas_enabled = enabled;
        info!("Degas {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn set_no_light(&mut self, no_light: bool, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.config.no_light = no_light;
        if self.run.is_some() {
            self.apply_photoperiod(hw, sink);
        }
    }

    pub fn set_folder(&mut self, folder: &str) -> Result<()> {
        if self.run.is_some() {
            return Err(ValidationError::Folder("cannot change during a run").into());
        }
        validate_folder(folder)?;
        self.config.folder = folder.to_owned();
        Ok(())
    }

    /// Manual illumination switch.  Refused while running.
    pub fn set_illumination(&mut self, on: bool, hw: &mut impl ActuatorPort) -> ToggleOutcome {
        if self.run.is_some() {
            warn!("Illumination switch rejected: run active");
            return ToggleOutcome::Rejected;
        }
        self.lights.set_illumination(on, hw);
        if on {
            ToggleOutcome::SwitchedOn
        } else {
            ToggleOutcome::SwitchedOff
        }
    }

    /// Choose the illumination channel runs drive.  Allowed during a run;
    /// a lit reactor moves to the new channel at once.
    pub fn select_illumination(&mut self, index: usize, hw: &mut impl ActuatorPort) -> Result<()> {
        self.lights.select_illumination(index, hw)?;
        info!("Illumination channel {} selected", index);
        Ok(())
    }

    pub fn toggle_capture_light(&mut self, index: usize, hw: &mut impl ActuatorPort) -> Result<ToggleOutcome> {
        self.lights
            .toggle_capture_light(index, self.run.is_some(), hw)
    }

    /// One untagged picture outside the schedule.
    pub fn take_single_capture(
        &mut self,
        hw: &mut impl Hardware,
        sink: &mut impl EventSink,
    ) -> Result<Artifact> {
        self.out_of_band_capture(CaptureReason::Manual, hw, sink)
    }

    /// A full batch outside the schedule.  Leaves `lastCaptureAt` alone.
    pub fn take_full_batch(&mut self, hw: &mut impl Hardware, sink: &mut impl EventSink) -> Result<CaptureBatch> {
        let restore = self.illumination_wanted(self.run_elapsed());
        let job = CaptureJob {
            folder: &self.config.folder,
            illumination_secs: self.illumination_secs(),
            restore_illumination: restore,
        };
        let batch = self.scheduler.run_batch(self.now, &job, &mut self.lights, hw);
        self.report_batch(&batch, sink);
        if let Some(last) = batch.last_error {
            if let Some(err) = self.capture_fault(last, sink) {
                return Err(err);
            }
        }
        Ok(batch)
    }

    /// Hot-swap the configuration.  The folder and the illumination
    /// channel count only change while stopped.
    pub fn update_config(
        &mut self,
        config: ReactorConfig,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        config.validate()?;
        let running = self.run.is_some();

        if !self.cycle.is_stepping() {
            self.set_interval(config.picture_interval_secs, sink)?;
        }
        self.lights.set_picture_lights(config.picture_lights);
        self.sensors.reconfigure(&config);
        if config.quench.targets.as_slice() != self.quench.targets() {
            self.quench.set_targets(&config.quench.targets)?;
        }
        self.quench.set_hold_policy(config.quench.hold);
        if config.quench.enabled != self.quench.is_enabled() {
            self.quench.set_enabled(config.quench.enabled);
        }

        let mut next = config;
        if running {
            next.folder = self.config.folder.clone();
            next.illumination_channels = self.config.illumination_channels;
            next.cycle_end = self.config.cycle_end;
        } else if next.illumination_channels != self.lights.illumination_channel_count() {
            self.lights.all_off(hw);
            self.lights = IlluminationController::new(next.illumination_channels, next.picture_lights);
        }
        let no_light_changed = next.no_light != self.config.no_light;
        self.config = next;
        if running && no_light_changed {
            self.apply_photoperiod(hw, sink);
        }
        info!("Configuration updated at runtime");
        Ok(())
    }

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: ReactorCommand,
        now: f64,
        hw: &mut impl Hardware,
        sink: &mut impl EventSink,
    ) -> Result<CommandReply> {
        self.now = now;
        let reply = match cmd {
            ReactorCommand::Start => {
                self.start(now, hw, sink)?;
                CommandReply::Done
            }
            ReactorCommand::Stop => {
                self.stop(hw, sink);
                CommandReply::Done
            }
            ReactorCommand::ArmCycle(stages) => {
                self.arm_cycle(&stages, sink)?;
                CommandReply::Done
            }
            ReactorCommand::DisarmCycle => {
                self.disarm_cycle();
                CommandReply::Done
            }
            ReactorCommand::SetInterval(secs) => {
                self.set_interval(secs, sink)?;
                CommandReply::Done
            }
            ReactorCommand::SetQuenching(enabled) => {
                self.set_quenching(enabled);
                CommandReply::Done
            }
            ReactorCommand::SetQuenchTargets(targets) => {
                self.set_quench_targets(&targets)?;
                CommandReply::Done
            }
            ReactorCommand::SetDegas(enabled) => {
                self.set_degas(enabled);
                CommandReply::Done
            }
            ReactorCommand::SetNoLight(no_light) => {
                self.set_no_light(no_light, hw, sink);
                CommandReply::Done
            }
            ReactorCommand::SetFolder(folder) => {
                self.set_folder(&folder)?;
                CommandReply::Done
            }
            ReactorCommand::SetIllumination(on) => {
                CommandReply::Toggled(self.set_illumination(on, hw))
            }
            ReactorCommand::SelectIllumination(index) => {
                self.select_illumination(index, hw)?;
                CommandReply::Done
            }
            ReactorCommand::ToggleCaptureLight(index) => {
                CommandReply::Toggled(self.toggle_capture_light(index, hw)?)
            }
            ReactorCommand::TakeSingleCapture => {
                CommandReply::Captured(self.take_single_capture(hw, sink)?)
            }
            ReactorCommand::TakeFullBatch => CommandReply::Batch(self.take_full_batch(hw, sink)?),
            ReactorCommand::UpdateConfig(config) => {
                self.update_config(*config, hw, sink)?;
                CommandReply::Done
            }
        };
        Ok(reply)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self) -> TelemetryData {
        let sensors = self.sensors.snapshot();
        TelemetryData {
            state: self.state(),
            elapsed_secs: self.run_elapsed(),
            illumination_minutes: self.illumination_secs() / 60.0,
            interval_secs: self.scheduler.interval(),
            cycle_slot: self.cycle.run_state().map(|r| r.current_stage_index + 1),
            oxygen: sensors.oxygen_estimate,
            pressure: sensors.pressure,
            quench_phase: self.quench.phase(),
            quench_targets_left: self.quench.targets().len(),
            degas_open: self.degas_open,
            capture_failures: self.scheduler.consecutive_failures(),
        }
    }

    pub fn state(&self) -> RuntimeState {
        if self.run.is_some() {
            RuntimeState::Running
        } else {
            RuntimeState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn run_state(&self) -> Option<RunState> {
        self.run
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    pub fn lights(&self) -> &IlluminationController {
        &self.lights
    }

    pub fn scheduler(&self) -> &CaptureScheduler {
        &self.scheduler
    }

    pub fn cycle(&self) -> &CycleProgram {
        &self.cycle
    }

    pub fn quench(&self) -> &QuenchDetector {
        &self.quench
    }

    pub fn phase_record(&self) -> PhaseRecord {
        self.phase
    }

    pub fn degas_open(&self) -> bool {
        self.degas_open
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn run_elapsed(&self) -> f64 {
        self.run.map_or(0.0, |r| (self.now - r.started_at).max(0.0))
    }

    fn illumination_secs(&self) -> f64 {
        self.run.map_or(0.0, |r| r.elapsed_illumination)
    }

    /// Illumination the run wants lit at `elapsed` seconds in.
    fn illumination_wanted(&self, elapsed: f64) -> bool {
        self.run.is_some() && !self.config.no_light && self.phase.light_on_at(elapsed)
    }

    fn apply_photoperiod(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        let wanted = self.illumination_wanted(self.run_elapsed());
        if wanted != self.lights.illumination_is_on() {
            self.lights.set_illumination(wanted, hw);
            debug!("Illumination {}", if wanted { "on" } else { "off" });
            sink.emit(&ReactorEvent::IlluminationChanged { lit: wanted });
        }
    }

    fn scheduled_batch(&mut self, now: f64, hw: &mut impl Hardware) -> Option<CaptureBatch> {
        let job = CaptureJob {
            folder: &self.config.folder,
            illumination_secs: self.illumination_secs(),
            restore_illumination: self.illumination_wanted(self.run_elapsed()),
        };
        self.scheduler.maybe_capture(now, &job, &mut self.lights, hw)
    }

    fn report_batch(&self, batch: &CaptureBatch, sink: &mut impl EventSink) {
        sink.emit(&ReactorEvent::BatchCaptured {
            artifacts: batch.count(),
            failures: batch.failures,
            at: batch.captured_at,
        });
    }

    /// Report a capture failure.  Returns the fatal error once the streak
    /// reaches the configured limit.
    fn capture_fault(&self, last: IoError, sink: &mut impl EventSink) -> Option<ReactorError> {
        let consecutive = self.scheduler.consecutive_failures();
        let fatal = self.scheduler.failure_limit_reached();
        sink.emit(&ReactorEvent::CaptureFault { consecutive, fatal });
        if !fatal {
            return None;
        }
        error!("{} consecutive capture failures", consecutive);
        Some(ReactorError::IoFatal { consecutive, last })
    }

    fn out_of_band_capture(
        &mut self,
        reason: CaptureReason,
        hw: &mut impl Hardware,
        sink: &mut impl EventSink,
    ) -> Result<Artifact> {
        let job = CaptureJob {
            folder: &self.config.folder,
            illumination_secs: self.illumination_secs(),
            restore_illumination: self.illumination_wanted(self.run_elapsed()),
        };
        match self.scheduler.single_capture(&job, &mut self.lights, hw) {
            Ok(artifact) => {
                sink.emit(&ReactorEvent::SingleCaptured {
                    reason,
                    path: artifact.path.clone(),
                });
                Ok(artifact)
            }
            Err(e) => Err(self
                .capture_fault(e, sink)
                .unwrap_or(ReactorError::IoTransient(e))),
        }
    }

    fn apply_cycle_step(&mut self, step: CycleStep, sink: &mut impl EventSink) {
        match step {
            CycleStep::Unchanged => {}
            CycleStep::Entered { slot, interval_secs } => {
                self.scheduler.set_interval(interval_secs);
                sink.emit(&ReactorEvent::CycleStageEntered { slot, interval_secs });
                sink.emit(&ReactorEvent::IntervalChanged { secs: interval_secs });
            }
            CycleStep::Completed => {
                info!(
                    "Cycle program complete, interval stays {:.1}s",
                    self.scheduler.interval()
                );
                sink.emit(&ReactorEvent::CycleCompleted);
            }
        }
    }

    fn sensor_poll_due(&self, now: f64) -> bool {
        let interval = f64::from(self.config.sensor_poll_interval_ms) / 1000.0;
        self.last_sensor_poll.is_none_or(|last| now - last >= interval)
    }

    /// One poll.  On failure one reconnect is attempted and the read is
    /// skipped for this tick; last-known values stay in place.
    fn poll_sensors(&mut self, hw: &mut impl SensorPort, sink: &mut impl EventSink) {
        match hw.poll_sensors() {
            Ok(sample) => {
                self.sensors.ingest(sample);
            }
            Err(error) => {
                warn!("Sensor poll failed: {}, reconnecting", error);
                let recovered = match hw.reconnect() {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Sensor reconnect failed: {}", e);
                        false
                    }
                };
                sink.emit(&ReactorEvent::SensorFault { error, recovered });
            }
        }
    }

    /// Feed the detector.  Returns a fatal error when the triggered
    /// capture tipped the failure streak over the limit.
    fn run_quench(&mut self, now: f64, hw: &mut impl Hardware, sink: &mut impl EventSink) -> Option<ReactorError> {
        let snapshot = self.sensors.snapshot();
        let before = self.quench.phase();

        let mut trigger = snapshot
            .oxygen_estimate
            .and_then(|oxygen| self.quench.on_sample(oxygen, now));
        // A pending final capture waits for the next tick.
        if trigger.is_none() {
            trigger = snapshot
                .pressure
                .and_then(|pressure| self.quench.on_pressure(pressure, now));
        }

        let after = self.quench.phase();
        if before != after {
            sink.emit(&ReactorEvent::QuenchPhaseChanged {
                from: before,
                to: after,
            });
        }

        let trigger = trigger?;
        sink.emit(&ReactorEvent::QuenchTriggered(trigger));
        match self.out_of_band_capture(CaptureReason::Quench, hw, sink) {
            Err(err @ ReactorError::IoFatal { .. }) => Some(err),
            _ => None,
        }
    }

    /// Open below the threshold unless a quench hold is counting down.
    /// Evaluated and written every tick.
    fn apply_degas(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        let open = self.run.is_some()
            && self.config.degas_enabled
            && !self.quench.is_holding()
            && self
                .sensors
                .snapshot()
                .pressure
                .is_some_and(|p| p < self.config.degas_threshold);
        hw.set_degas_valve(open);
        if open != self.degas_open {
            self.degas_open = open;
            info!("Degas valve {}", if open { "open" } else { "closed" });
            sink.emit(&ReactorEvent::DegasValve { open });
        }
    }
}
