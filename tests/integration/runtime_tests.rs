//! Integration tests for the ReactorRuntime → ports pipeline.
//!
//! Every test drives the runtime with explicit clock readings, so timing
//! is exact and nothing sleeps.

use crate::mock_hw::{HwCall, MockHardware, RecordingSink, ScriptedPhase};

use photoreactor::app::commands::{CommandReply, ReactorCommand};
use photoreactor::app::events::{ReactorEvent, RuntimeState};
use photoreactor::app::runtime::ReactorRuntime;
use photoreactor::config::ReactorConfig;
use photoreactor::error::{IoError, ReactorError, ValidationError};
use photoreactor::illumination::{ChannelId, ToggleOutcome};
use photoreactor::photoperiod::PhaseRecord;
use photoreactor::sensors::SensorSample;

const LAMP: ChannelId = ChannelId::Illumination(0);

fn quiet_config() -> ReactorConfig {
    ReactorConfig {
        telemetry_interval_secs: 3600,
        ..ReactorConfig::default()
    }
}

fn make_runtime(config: ReactorConfig) -> (ReactorRuntime, MockHardware, RecordingSink) {
    (ReactorRuntime::new(config), MockHardware::new(), RecordingSink::new())
}

/// Tick once per second over `from..=to`, failing on any error.
fn run_until(rt: &mut ReactorRuntime, hw: &mut MockHardware, sink: &mut RecordingSink, from: u32, to: u32) {
    for t in from..=to {
        rt.tick(f64::from(t), hw, sink).unwrap();
    }
}

// ── Lifecycle ────────────────────────────────────────────────

#[test]
fn start_prepares_folder_and_lights_illumination() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());

    rt.start(0.0, &mut hw, &mut sink).unwrap();

    assert_eq!(rt.state(), RuntimeState::Running);
    assert_eq!(hw.count(&HwCall::Prepare("pictures".into())), 1);
    assert!(hw.is_on(LAMP));
    assert!(sink.any(|e| matches!(e, ReactorEvent::Started { at } if *at == 0.0)));
}

#[test]
fn start_twice_is_a_no_op() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    rt.start(5.0, &mut hw, &mut sink).unwrap();

    assert_eq!(sink.count(|e| matches!(e, ReactorEvent::Started { .. })), 1);
    assert_eq!(rt.run_state().unwrap().started_at, 0.0);
}

#[test]
fn unusable_destination_keeps_reactor_stopped() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    hw.prepare_fails = true;

    let err = rt.start(0.0, &mut hw, &mut sink).unwrap_err();

    assert_eq!(err, ReactorError::IoTransient(IoError::Device("read-only")));
    assert_eq!(rt.state(), RuntimeState::Stopped);
    assert_eq!(hw.outputs_on(), 0);
    assert!(!sink.any(|e| matches!(e, ReactorEvent::Started { .. })));
}

#[test]
fn stop_releases_every_output() {
    let config = ReactorConfig {
        degas_enabled: true,
        ..quiet_config()
    };
    let (mut rt, mut hw, mut sink) = make_runtime(config);
    hw = hw.with_steady(0.5, 20.9);
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    rt.tick(1.0, &mut hw, &mut sink).unwrap();
    assert!(hw.is_on(LAMP));
    assert!(hw.degas_open);

    rt.stop(&mut hw, &mut sink);

    assert_eq!(hw.outputs_on(), 0);
    assert!(!hw.degas_open);
    assert!(!rt.degas_open());
    assert_eq!(rt.state(), RuntimeState::Stopped);
    assert!(sink.any(|e| matches!(e, ReactorEvent::Stopped { .. })));
}

#[test]
fn stop_while_stopped_still_forces_outputs_off() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    assert_eq!(
        rt.toggle_capture_light(1, &mut hw).unwrap(),
        ToggleOutcome::SwitchedOn
    );
    assert_eq!(hw.outputs_on(), 1);

    rt.stop(&mut hw, &mut sink);

    assert_eq!(hw.outputs_on(), 0);
    assert!(!sink.any(|e| matches!(e, ReactorEvent::Stopped { .. })));
}

// ── Scheduled capture ────────────────────────────────────────

#[test]
fn batch_fires_exactly_at_interval() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    rt.start(0.0, &mut hw, &mut sink).unwrap();

    rt.tick(59.9, &mut hw, &mut sink).unwrap();
    assert!(hw.captures().is_empty());

    rt.tick(60.0, &mut hw, &mut sink).unwrap();
    let captures = hw.captures();
    assert_eq!(captures.len(), 6);
    assert_eq!(captures[0], "pictures/picturesA:y24m05d01H09M30S00.jpg");
    assert_eq!(captures[5], "pictures/picturesF:y24m05d01H09M30S00.jpg");
    assert_eq!(rt.scheduler().last_capture_at(), 60.0);
    assert!(sink.any(|e| matches!(
        e,
        ReactorEvent::BatchCaptured { artifacts: 6, failures: 0, .. }
    )));
}

#[test]
fn batch_keeps_one_output_at_a_time_and_restores_illumination() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    rt.tick(60.0, &mut hw, &mut sink).unwrap();

    assert!(hw.max_on <= 1);
    assert!(hw.is_on(LAMP));
    assert_eq!(hw.outputs_on(), 1);
}

#[test]
fn disabled_capture_lights_are_skipped() {
    let mut lights = [false; 6];
    lights[1] = true;
    lights[4] = true;
    let config = ReactorConfig {
        picture_lights: lights,
        ..quiet_config()
    };
    let (mut rt, mut hw, mut sink) = make_runtime(config);
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    rt.tick(60.0, &mut hw, &mut sink).unwrap();

    let captures = hw.captures();
    assert_eq!(captures.len(), 2);
    assert!(captures[0].starts_with("pictures/picturesB:"));
    assert!(captures[1].starts_with("pictures/picturesE:"));
}

#[test]
fn no_light_keeps_illumination_dark_through_batches() {
    let config = ReactorConfig {
        no_light: true,
        ..quiet_config()
    };
    let (mut rt, mut hw, mut sink) = make_runtime(config);
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    assert!(!hw.is_on(LAMP));

    rt.tick(60.0, &mut hw, &mut sink).unwrap();

    assert_eq!(hw.captures().len(), 6);
    assert!(!hw.is_on(LAMP));
    assert!(!hw.calls.contains(&HwCall::Channel(LAMP, true)));
}

#[test]
fn set_no_light_mid_run_switches_illumination_off() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    assert!(hw.is_on(LAMP));

    rt.set_no_light(true, &mut hw, &mut sink);

    assert!(!hw.is_on(LAMP));
    assert!(sink.any(|e| matches!(e, ReactorEvent::IlluminationChanged { lit: false })));
}

#[test]
fn full_batch_leaves_schedule_alone() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    rt.tick(30.0, &mut hw, &mut sink).unwrap();

    let reply = rt
        .handle_command(ReactorCommand::TakeFullBatch, 30.0, &mut hw, &mut sink)
        .unwrap();
    match reply {
        CommandReply::Batch(batch) => assert_eq!(batch.count(), 6),
        other => panic!("expected batch, got {:?}", other),
    }
    assert_eq!(rt.scheduler().last_capture_at(), 0.0);

    rt.tick(60.0, &mut hw, &mut sink).unwrap();
    assert_eq!(hw.captures().len(), 12);
}

#[test]
fn single_capture_is_untagged() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());

    let reply = rt
        .handle_command(ReactorCommand::TakeSingleCapture, 0.0, &mut hw, &mut sink)
        .unwrap();

    match reply {
        CommandReply::Captured(artifact) => {
            assert_eq!(artifact.path, "pictures/pictures:y24m05d01H09M30S00.jpg")
        }
        other => panic!("expected artifact, got {:?}", other),
    }
    assert_eq!(hw.outputs_on(), 0);
}

// ── Capture failures ─────────────────────────────────────────

#[test]
fn repeated_capture_failures_turn_fatal_but_run_continues() {
    let mut lights = [false; 6];
    lights[0] = true;
    let config = ReactorConfig {
        picture_lights: lights,
        ..quiet_config()
    };
    let (mut rt, mut hw, mut sink) = make_runtime(config);
    hw.capture_failures = 10;
    rt.start(0.0, &mut hw, &mut sink).unwrap();

    assert!(rt.tick(60.0, &mut hw, &mut sink).is_ok());
    assert!(rt.tick(120.0, &mut hw, &mut sink).is_ok());
    let err = rt.tick(180.0, &mut hw, &mut sink).unwrap_err();

    assert_eq!(
        err,
        ReactorError::IoFatal {
            consecutive: 3,
            last: IoError::Timeout
        }
    );
    assert!(rt.is_running());
    assert!(sink.any(|e| matches!(
        e,
        ReactorEvent::CaptureFault { consecutive: 1, fatal: false }
    )));
    assert!(sink.any(|e| matches!(
        e,
        ReactorEvent::CaptureFault { consecutive: 3, fatal: true }
    )));
}

#[test]
fn single_capture_failure_is_transient() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    hw.capture_failures = 1;

    let err = rt.take_single_capture(&mut hw, &mut sink).unwrap_err();

    assert_eq!(err, ReactorError::IoTransient(IoError::Timeout));
    assert!(rt.take_single_capture(&mut hw, &mut sink).is_ok());
    assert_eq!(rt.scheduler().consecutive_failures(), 0);
}

// ── Sensors ──────────────────────────────────────────────────

#[test]
fn sensor_failure_reconnects_once_and_keeps_ticking() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    hw.samples.push_back(Err(IoError::Disconnected));
    rt.start(0.0, &mut hw, &mut sink).unwrap();

    rt.tick(1.0, &mut hw, &mut sink).unwrap();

    assert_eq!(hw.count(&HwCall::Poll), 1);
    assert_eq!(hw.count(&HwCall::Reconnect), 1);
    assert!(sink.any(|e| matches!(
        e,
        ReactorEvent::SensorFault { error: IoError::Disconnected, recovered: true }
    )));
    assert_eq!(rt.build_telemetry().pressure, None);

    rt.tick(2.0, &mut hw, &mut sink).unwrap();
    assert_eq!(hw.count(&HwCall::Reconnect), 1);
    assert_eq!(rt.build_telemetry().pressure, Some(100.0));
}

#[test]
fn failed_reconnect_is_reported() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    hw.samples.push_back(Err(IoError::Timeout));
    hw.reconnect_ok = false;

    rt.tick(1.0, &mut hw, &mut sink).unwrap();

    assert!(sink.any(|e| matches!(e, ReactorEvent::SensorFault { recovered: false, .. })));
}

#[test]
fn implausible_pressure_keeps_last_value() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    hw.samples.push_back(Ok(SensorSample {
        raw_pressure: 250.0,
        raw_oxygen: 20.9,
        timestamp: 1.0,
    }));
    hw.samples.push_back(Ok(SensorSample {
        raw_pressure: 9000.0,
        raw_oxygen: 20.9,
        timestamp: 2.0,
    }));

    rt.tick(1.0, &mut hw, &mut sink).unwrap();
    rt.tick(2.0, &mut hw, &mut sink).unwrap();

    assert_eq!(rt.build_telemetry().pressure, Some(250.0));
}

// ── Degas ────────────────────────────────────────────────────

#[test]
fn degas_opens_below_threshold_only_while_running() {
    let config = ReactorConfig {
        degas_enabled: true,
        ..quiet_config()
    };
    let (mut rt, mut hw, mut sink) = make_runtime(config);
    hw = hw.with_steady(0.5, 20.9);

    rt.tick(1.0, &mut hw, &mut sink).unwrap();
    assert!(!hw.degas_open);

    rt.start(1.0, &mut hw, &mut sink).unwrap();
    rt.tick(2.0, &mut hw, &mut sink).unwrap();
    assert!(hw.degas_open);
    assert!(sink.any(|e| matches!(e, ReactorEvent::DegasValve { open: true })));

    hw.steady.raw_pressure = 5.0;
    rt.tick(3.0, &mut hw, &mut sink).unwrap();
    assert!(!hw.degas_open);
}

#[test]
fn degas_valve_written_every_tick() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    run_until(&mut rt, &mut hw, &mut sink, 1, 4);
    assert_eq!(hw.count(&HwCall::Degas(false)), 4);
    assert!(!sink.any(|e| matches!(e, ReactorEvent::DegasValve { .. })));
}

#[test]
fn degas_stays_closed_during_quench_hold() {
    let mut config = ReactorConfig {
        degas_enabled: true,
        picture_interval_secs: 6000.0,
        ..quiet_config()
    };
    config.quench.enabled = true;
    config.quench.targets = vec![5.0];
    let (mut rt, mut hw, mut sink) = make_runtime(config);
    hw = hw.with_steady(0.5, 4.0);
    rt.start(0.0, &mut hw, &mut sink).unwrap();

    run_until(&mut rt, &mut hw, &mut sink, 1, 14);
    assert!(hw.degas_open);

    rt.tick(15.0, &mut hw, &mut sink).unwrap();
    assert!(rt.quench().is_holding());
    assert!(!hw.degas_open);
}

// ── Photoperiod ──────────────────────────────────────────────

#[test]
fn photoperiod_switches_illumination_and_counts_lit_time() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    let record = PhaseRecord {
        phase_on: true,
        light_minutes: 1.0,
        dark_minutes: 1.0,
        picture_minutes: 1.0,
    };
    rt.apply_phase_record(record, &mut sink).unwrap();
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    assert!(hw.is_on(LAMP));

    run_until(&mut rt, &mut hw, &mut sink, 1, 59);
    assert!(hw.is_on(LAMP));

    rt.tick(60.0, &mut hw, &mut sink).unwrap();
    assert!(!hw.is_on(LAMP));
    assert!(sink.any(|e| matches!(e, ReactorEvent::IlluminationChanged { lit: false })));

    run_until(&mut rt, &mut hw, &mut sink, 61, 120);
    assert!(hw.is_on(LAMP));
    assert_eq!(rt.run_state().unwrap().elapsed_illumination, 60.0);
}

#[test]
fn phase_source_is_rate_limited() {
    let (mut rt, _hw, mut sink) = make_runtime(quiet_config());
    let mut source = ScriptedPhase::new(Some(PhaseRecord::continuous(2.0)));

    rt.poll_phase(0.0, &mut source, &mut sink);
    assert_eq!(source.reads, 1);
    assert_eq!(rt.scheduler().interval(), 120.0);
    assert!(sink.any(|e| matches!(e, ReactorEvent::IntervalChanged { secs } if *secs == 120.0)));

    rt.poll_phase(5.0, &mut source, &mut sink);
    assert_eq!(source.reads, 1);

    rt.poll_phase(10.0, &mut source, &mut sink);
    assert_eq!(source.reads, 2);
    assert_eq!(sink.count(|e| matches!(e, ReactorEvent::PhaseUpdated { .. })), 1);
}

#[test]
fn invalid_phase_record_is_ignored() {
    let (mut rt, _hw, mut sink) = make_runtime(quiet_config());
    let mut source = ScriptedPhase::new(Some(PhaseRecord::continuous(0.1)));

    rt.poll_phase(0.0, &mut source, &mut sink);

    assert_eq!(rt.scheduler().interval(), 60.0);
    assert!(!sink.any(|e| matches!(e, ReactorEvent::PhaseUpdated { .. })));
}

// ── Commands ─────────────────────────────────────────────────

#[test]
fn illumination_switch_only_while_stopped() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());

    let reply = rt
        .handle_command(ReactorCommand::SetIllumination(true), 0.0, &mut hw, &mut sink)
        .unwrap();
    assert_eq!(reply, CommandReply::Toggled(ToggleOutcome::SwitchedOn));
    assert!(hw.is_on(LAMP));

    rt.handle_command(ReactorCommand::Start, 1.0, &mut hw, &mut sink)
        .unwrap();
    let reply = rt
        .handle_command(ReactorCommand::SetIllumination(false), 2.0, &mut hw, &mut sink)
        .unwrap();
    assert_eq!(reply, CommandReply::Toggled(ToggleOutcome::Rejected));
    assert!(hw.is_on(LAMP));
}

#[test]
fn selected_illumination_channel_drives_the_run() {
    let config = ReactorConfig {
        illumination_channels: 2,
        ..quiet_config()
    };
    let (mut rt, mut hw, mut sink) = make_runtime(config);
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    assert!(hw.is_on(LAMP));

    rt.handle_command(ReactorCommand::SelectIllumination(1), 1.0, &mut hw, &mut sink)
        .unwrap();
    assert!(!hw.is_on(LAMP));
    assert!(hw.is_on(ChannelId::Illumination(1)));

    run_until(&mut rt, &mut hw, &mut sink, 2, 60);
    assert_eq!(hw.captures().len(), 6);
    assert_eq!(hw.outputs_on(), 1);
    assert!(hw.is_on(ChannelId::Illumination(1)));
    assert!(hw.max_on <= 1);

    let err = rt
        .handle_command(ReactorCommand::SelectIllumination(2), 61.0, &mut hw, &mut sink)
        .unwrap_err();
    assert_eq!(err, ReactorError::InvalidChannel { index: 2, limit: 2 });
    assert!(hw.is_on(ChannelId::Illumination(1)));
}

#[test]
fn capture_light_toggle_rules() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());

    let err = rt
        .handle_command(ReactorCommand::ToggleCaptureLight(6), 0.0, &mut hw, &mut sink)
        .unwrap_err();
    assert_eq!(err, ReactorError::InvalidChannel { index: 6, limit: 6 });

    rt.start(0.0, &mut hw, &mut sink).unwrap();
    let reply = rt
        .handle_command(ReactorCommand::ToggleCaptureLight(0), 1.0, &mut hw, &mut sink)
        .unwrap();
    assert_eq!(reply, CommandReply::Toggled(ToggleOutcome::Rejected));
    assert!(!hw.is_on(ChannelId::CaptureLight(0)));
}

#[test]
fn invalid_interval_is_rejected_without_change() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());

    for secs in [29.0, 6001.0, f64::NAN] {
        let err = rt
            .handle_command(ReactorCommand::SetInterval(secs), 0.0, &mut hw, &mut sink)
            .unwrap_err();
        assert!(matches!(
            err,
            ReactorError::Validation(ValidationError::Interval { .. })
        ));
    }
    assert_eq!(rt.scheduler().interval(), 60.0);

    rt.handle_command(ReactorCommand::SetInterval(90.0), 0.0, &mut hw, &mut sink)
        .unwrap();
    assert_eq!(rt.scheduler().interval(), 90.0);
}

#[test]
fn invalid_quench_targets_are_rejected() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    let before = rt.quench().targets().to_vec();

    let err = rt
        .handle_command(
            ReactorCommand::SetQuenchTargets(vec![1.0, 5.0]),
            0.0,
            &mut hw,
            &mut sink,
        )
        .unwrap_err();

    assert!(matches!(err, ReactorError::Validation(ValidationError::Targets(_))));
    assert_eq!(rt.quench().targets(), before.as_slice());
}

#[test]
fn folder_is_fixed_during_a_run() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    rt.handle_command(ReactorCommand::SetFolder("runs/exp1".into()), 0.0, &mut hw, &mut sink)
        .unwrap();
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    assert_eq!(hw.count(&HwCall::Prepare("runs/exp1".into())), 1);

    let err = rt
        .handle_command(ReactorCommand::SetFolder("runs/exp2".into()), 1.0, &mut hw, &mut sink)
        .unwrap_err();
    assert!(matches!(err, ReactorError::Validation(ValidationError::Folder(_))));

    rt.tick(60.0, &mut hw, &mut sink).unwrap();
    assert!(hw.captures()[0].starts_with("runs/exp1/exp1A:"));
}

#[test]
fn update_config_while_running_keeps_folder() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    rt.start(0.0, &mut hw, &mut sink).unwrap();

    let next = ReactorConfig {
        folder: "elsewhere".into(),
        picture_interval_secs: 120.0,
        degas_enabled: true,
        ..quiet_config()
    };
    rt.handle_command(ReactorCommand::UpdateConfig(Box::new(next)), 1.0, &mut hw, &mut sink)
        .unwrap();

    assert_eq!(rt.config().folder, "pictures");
    assert!(rt.config().degas_enabled);
    assert_eq!(rt.scheduler().interval(), 120.0);
}

#[test]
fn update_config_rejects_out_of_range_values() {
    let (mut rt, mut hw, mut sink) = make_runtime(quiet_config());
    let next = ReactorConfig {
        illumination_channels: 9,
        ..quiet_config()
    };

    let err = rt
        .update_config(next, &mut hw, &mut sink)
        .unwrap_err();

    assert!(matches!(err, ReactorError::Validation(ValidationError::Config(_))));
    assert_eq!(rt.config().illumination_channels, 1);
}

// ── Telemetry ────────────────────────────────────────────────

#[test]
fn telemetry_reports_at_configured_interval() {
    let config = ReactorConfig {
        telemetry_interval_secs: 10,
        picture_interval_secs: 6000.0,
        ..ReactorConfig::default()
    };
    let (mut rt, mut hw, mut sink) = make_runtime(config);
    rt.start(0.0, &mut hw, &mut sink).unwrap();

    run_until(&mut rt, &mut hw, &mut sink, 1, 30);

    assert_eq!(sink.count(|e| matches!(e, ReactorEvent::Telemetry(_))), 3);
    let last = sink
        .events
        .iter()
        .rev()
        .find_map(|e| match e {
            ReactorEvent::Telemetry(t) => Some(t.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(last.state, RuntimeState::Running);
    assert_eq!(last.elapsed_secs, 30.0);
    assert_eq!(last.illumination_minutes, 0.5);
    assert_eq!(last.pressure, Some(100.0));
}
