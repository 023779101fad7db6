//! Cycle program flows driven through the runtime.

use crate::mock_hw::{MockHardware, RecordingSink};

use photoreactor::app::commands::ReactorCommand;
use photoreactor::app::events::ReactorEvent;
use photoreactor::app::runtime::ReactorRuntime;
use photoreactor::config::{CycleEndPolicy, ReactorConfig};
use photoreactor::cycle::{CycleState, StageInput};
use photoreactor::error::{ReactorError, ValidationError};

/// Slot 2: every minute, three times.  Slot 4: every two minutes, once.
fn two_stage_program() -> [StageInput; 6] {
    [
        StageInput::EMPTY,
        StageInput::new(1.0, 3),
        StageInput::EMPTY,
        StageInput::new(2.0, 1),
        StageInput::EMPTY,
        StageInput::EMPTY,
    ]
}

fn make_runtime(cycle_end: CycleEndPolicy) -> (ReactorRuntime, MockHardware, RecordingSink) {
    let config = ReactorConfig {
        telemetry_interval_secs: 3600,
        picture_interval_secs: 300.0,
        cycle_end,
        ..ReactorConfig::default()
    };
    (ReactorRuntime::new(config), MockHardware::new(), RecordingSink::new())
}

fn entered(sink: &RecordingSink) -> Vec<(usize, f64)> {
    sink.events
        .iter()
        .filter_map(|e| match e {
            ReactorEvent::CycleStageEntered { slot, interval_secs } => Some((*slot, *interval_secs)),
            _ => None,
        })
        .collect()
}

#[test]
fn armed_program_steps_through_stages_then_completes() {
    let (mut rt, mut hw, mut sink) = make_runtime(CycleEndPolicy::Terminate);
    rt.handle_command(ReactorCommand::ArmCycle(two_stage_program()), 0.0, &mut hw, &mut sink)
        .unwrap();
    assert!(entered(&sink).is_empty(), "arming while stopped must not step");

    rt.start(0.0, &mut hw, &mut sink).unwrap();
    assert_eq!(entered(&sink), vec![(2, 60.0)]);
    assert_eq!(rt.scheduler().interval(), 60.0);
    assert_eq!(rt.build_telemetry().cycle_slot, Some(2));

    for t in [60.0, 120.0] {
        rt.tick(t, &mut hw, &mut sink).unwrap();
        assert_eq!(rt.scheduler().interval(), 60.0);
    }
    rt.tick(180.0, &mut hw, &mut sink).unwrap();
    assert_eq!(entered(&sink), vec![(2, 60.0), (4, 120.0)]);
    assert_eq!(rt.scheduler().interval(), 120.0);

    rt.tick(299.0, &mut hw, &mut sink).unwrap();
    assert!(!sink.any(|e| matches!(e, ReactorEvent::CycleCompleted)));

    rt.tick(300.0, &mut hw, &mut sink).unwrap();
    assert!(sink.any(|e| matches!(e, ReactorEvent::CycleCompleted)));
    assert_eq!(rt.cycle().state(), CycleState::Completed);
    assert_eq!(rt.scheduler().interval(), 120.0);
    assert_eq!(rt.build_telemetry().cycle_slot, None);
    assert_eq!(hw.captures().len(), 4 * 6);
}

#[test]
fn wrapping_program_returns_to_first_stage() {
    let (mut rt, mut hw, mut sink) = make_runtime(CycleEndPolicy::Wrap);
    rt.arm_cycle(&two_stage_program(), &mut sink).unwrap();
    rt.start(0.0, &mut hw, &mut sink).unwrap();

    for t in [60.0, 120.0, 180.0, 300.0] {
        rt.tick(t, &mut hw, &mut sink).unwrap();
    }

    assert_eq!(entered(&sink), vec![(2, 60.0), (4, 120.0), (2, 60.0)]);
    assert!(!sink.any(|e| matches!(e, ReactorEvent::CycleCompleted)));
    assert_eq!(rt.scheduler().interval(), 60.0);
}

#[test]
fn arming_mid_run_starts_immediately() {
    let (mut rt, mut hw, mut sink) = make_runtime(CycleEndPolicy::Terminate);
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    assert_eq!(rt.scheduler().interval(), 300.0);

    rt.arm_cycle(&two_stage_program(), &mut sink).unwrap();

    assert_eq!(entered(&sink), vec![(2, 60.0)]);
    assert_eq!(rt.scheduler().interval(), 60.0);
}

#[test]
fn half_filled_stage_is_rejected_and_program_kept() {
    let (mut rt, mut hw, mut sink) = make_runtime(CycleEndPolicy::Terminate);
    rt.arm_cycle(&two_stage_program(), &mut sink).unwrap();

    let mut bad = two_stage_program();
    bad[2] = StageInput {
        interval_minutes: Some(1.0),
        repeat_count: None,
    };
    let err = rt
        .handle_command(ReactorCommand::ArmCycle(bad), 0.0, &mut hw, &mut sink)
        .unwrap_err();

    assert!(matches!(
        err,
        ReactorError::Validation(ValidationError::Stage { slot: 3, .. })
    ));
    assert_eq!(rt.cycle().stages()[1].map(|s| s.repeat_count), Some(3));
}

#[test]
fn stage_interval_out_of_range_is_rejected() {
    let (mut rt, _hw, mut sink) = make_runtime(CycleEndPolicy::Terminate);
    let mut bad = two_stage_program();
    bad[5] = StageInput::new(0.25, 2);

    let err = rt.arm_cycle(&bad, &mut sink).unwrap_err();

    assert!(matches!(
        err,
        ReactorError::Validation(ValidationError::Stage { slot: 6, .. })
    ));
    assert!(rt.cycle().is_empty());
}

#[test]
fn stop_cancels_stepping_but_keeps_stages() {
    let (mut rt, mut hw, mut sink) = make_runtime(CycleEndPolicy::Terminate);
    rt.arm_cycle(&two_stage_program(), &mut sink).unwrap();
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    rt.tick(60.0, &mut hw, &mut sink).unwrap();

    rt.stop(&mut hw, &mut sink);
    assert!(!rt.cycle().is_stepping());
    assert!(!rt.cycle().is_empty());

    rt.start(100.0, &mut hw, &mut sink).unwrap();
    let run = rt.cycle().run_state().unwrap();
    assert_eq!(run.current_stage_index, 1);
    assert_eq!(run.repetitions_done_in_stage, 0);
}

#[test]
fn disarmed_cycle_leaves_next_run_on_configured_interval() {
    let (mut rt, mut hw, mut sink) = make_runtime(CycleEndPolicy::Terminate);
    let mut stages = [StageInput::EMPTY; 6];
    stages[0] = StageInput::new(10.0, 5);
    rt.arm_cycle(&stages, &mut sink).unwrap();
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    assert_eq!(rt.scheduler().interval(), 600.0);

    rt.stop(&mut hw, &mut sink);
    rt.handle_command(ReactorCommand::DisarmCycle, 50.0, &mut hw, &mut sink)
        .unwrap();
    rt.start(100.0, &mut hw, &mut sink).unwrap();

    assert_eq!(rt.scheduler().interval(), rt.config().picture_interval_secs);
    assert_eq!(rt.scheduler().interval(), 300.0);
    assert!(sink.any(|e| matches!(e, ReactorEvent::IntervalChanged { secs } if *secs == 300.0)));

    rt.tick(399.0, &mut hw, &mut sink).unwrap();
    assert!(hw.captures().is_empty());
    rt.tick(400.0, &mut hw, &mut sink).unwrap();
    assert_eq!(hw.captures().len(), 6);
}

#[test]
fn restart_without_disarm_reenters_first_stage_interval() {
    let (mut rt, mut hw, mut sink) = make_runtime(CycleEndPolicy::Terminate);
    rt.arm_cycle(&two_stage_program(), &mut sink).unwrap();
    rt.start(0.0, &mut hw, &mut sink).unwrap();
    for t in [60.0, 120.0, 180.0] {
        rt.tick(t, &mut hw, &mut sink).unwrap();
    }
    assert_eq!(rt.scheduler().interval(), 120.0);

    rt.stop(&mut hw, &mut sink);
    rt.start(500.0, &mut hw, &mut sink).unwrap();

    assert_eq!(rt.scheduler().interval(), 60.0);
    assert_eq!(entered(&sink).last(), Some(&(2, 60.0)));
}

#[test]
fn phase_record_does_not_override_stepping_cycle() {
    use photoreactor::photoperiod::PhaseRecord;

    let (mut rt, mut hw, mut sink) = make_runtime(CycleEndPolicy::Terminate);
    rt.arm_cycle(&two_stage_program(), &mut sink).unwrap();
    rt.start(0.0, &mut hw, &mut sink).unwrap();

    rt.apply_phase_record(PhaseRecord::continuous(10.0), &mut sink)
        .unwrap();

    assert_eq!(rt.scheduler().interval(), 60.0);
    assert_eq!(rt.phase_record().picture_minutes, 10.0);
}
