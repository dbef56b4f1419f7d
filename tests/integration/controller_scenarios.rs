//! End-to-end session scenarios: AppService → MotionController → FSM →
//! ports, against the recording mocks.

use super::mock_hw::{FireBehaviour, MockDevice, MockNvs, RecordingSink};

use tamperwatch::app::commands::AppCommand;
use tamperwatch::app::events::AppEvent;
use tamperwatch::app::service::AppService;
use tamperwatch::error::ActionError;
use tamperwatch::fsm::StateId;
use tamperwatch::fsm::context::Mode;

const ALARM: Mode = Mode::Alarm;
const CAPTURE: Mode = Mode::Capture;

fn make_app() -> (AppService<MockNvs>, MockDevice, RecordingSink) {
    let mut app = AppService::new(MockNvs::new());
    let hw = MockDevice::default();
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    (app, hw, sink)
}

/// Service with passcode "1234" and the alarm session armed.
fn armed_with_passcode() -> (AppService<MockNvs>, MockDevice, RecordingSink) {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_command(AppCommand::SetPasscode("1234".into()), &mut hw, &mut sink);
    app.handle_command(AppCommand::Start(ALARM), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Armed);
    sink.clear();
    (app, hw, sink)
}

fn code(mode: Mode, attempt: &str) -> AppCommand {
    AppCommand::SubmitPasscode(mode, attempt.into())
}

// ── First use ─────────────────────────────────────────────────

#[test]
fn start_without_passcode_demands_setup_and_never_arms() {
    let (mut app, mut hw, mut sink) = make_app();

    app.handle_command(AppCommand::Start(ALARM), &mut hw, &mut sink);

    let status = app.status(ALARM);
    assert_eq!(status.state, StateId::Locked);
    assert!(status.setup_required);
    assert!(!status.active);
    assert_eq!(hw.alarm.starts, 0, "sensing must not start");
    assert_eq!(hw.alarm.acquired, 0);
}

#[test]
fn setup_prompt_stores_passcode_and_returns_to_idle() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_command(AppCommand::Start(ALARM), &mut hw, &mut sink);

    app.handle_command(code(ALARM, ""), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Locked);
    assert!(app.status(ALARM).passcode_error, "empty value is rejected");

    app.handle_command(code(ALARM, "1234"), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Idle);
    assert!(app.passcode_protection_enabled());
    assert!(app.gate().validate("1234"));
    assert!(sink.events.contains(&AppEvent::PasscodeSaved));
    assert_eq!(hw.alarm.starts, 0, "setup never arms");
}

#[test]
fn dismissing_setup_prompt_returns_to_idle() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_command(AppCommand::Start(ALARM), &mut hw, &mut sink);
    app.handle_command(AppCommand::DismissPrompt(ALARM), &mut hw, &mut sink);

    let status = app.status(ALARM);
    assert_eq!(status.state, StateId::Idle);
    assert!(!status.setup_required);
    assert!(!app.passcode_protection_enabled());
}

// ── Triggering ────────────────────────────────────────────────

#[test]
fn qualifying_sample_fires_action_once() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();

    hw.alarm.push_g(1.5);
    app.poll(0, &mut hw, &mut sink);

    assert_eq!(hw.alarm.fires, 1);
    let status = app.status(ALARM);
    assert_eq!(status.state, StateId::Triggering);
    assert!(status.action_in_progress);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::Triggered { mode: Mode::Alarm, .. })),
        1
    );
}

#[test]
fn no_second_fire_while_action_in_progress() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();

    hw.alarm.push_g(1.5);
    app.poll(0, &mut hw, &mut sink);
    hw.alarm.push_g(2.5);
    app.poll(200, &mut hw, &mut sink);
    hw.alarm.push_g(1.9);
    app.poll(400, &mut hw, &mut sink);

    assert_eq!(hw.alarm.fires, 1);
    assert_eq!(app.state(ALARM), StateId::Triggering);
}

#[test]
fn completion_rearms_and_allows_next_trigger() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();

    hw.alarm.push_g(1.5);
    app.poll(0, &mut hw, &mut sink);
    hw.alarm.finish_action();
    app.poll(3000, &mut hw, &mut sink);

    let status = app.status(ALARM);
    assert_eq!(status.state, StateId::Armed);
    assert!(!status.action_in_progress);

    hw.alarm.push_g(1.5);
    app.poll(3200, &mut hw, &mut sink);
    assert_eq!(hw.alarm.fires, 2);
}

#[test]
fn resting_samples_do_not_trigger() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();

    for (i, g) in [1.0, 1.1, 1.19, 0.2].into_iter().enumerate() {
        hw.alarm.push_g(g);
        app.poll(i as u64 * 200, &mut hw, &mut sink);
    }

    assert_eq!(hw.alarm.fires, 0);
    assert_eq!(app.state(ALARM), StateId::Armed);
}

#[test]
fn failed_action_is_logged_and_session_rearms() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();
    hw.alarm.behaviour = FireBehaviour::Fail(ActionError::ResourceMissing);

    hw.alarm.push_g(1.5);
    app.poll(0, &mut hw, &mut sink);

    assert!(sink.events.contains(&AppEvent::ActionFailed {
        mode: ALARM,
        error: ActionError::ResourceMissing,
    }));
    let status = app.status(ALARM);
    assert_eq!(status.state, StateId::Armed);
    assert!(!status.action_in_progress);
}

#[test]
fn detached_capture_retriggers_under_sustained_motion() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.capture.behaviour = FireBehaviour::Detach;
    app.handle_command(AppCommand::SetPasscode("1234".into()), &mut hw, &mut sink);
    app.handle_command(AppCommand::Start(CAPTURE), &mut hw, &mut sink);

    for i in 0..3 {
        hw.capture.push_g(1.6);
        app.poll(i * 200, &mut hw, &mut sink);
    }

    assert_eq!(hw.capture.fires, 3);
    assert_eq!(app.state(CAPTURE), StateId::Armed);
}

// ── Stopping ──────────────────────────────────────────────────

#[test]
fn stop_requires_correct_passcode() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();

    app.handle_command(AppCommand::Stop(ALARM), &mut hw, &mut sink);
    let status = app.status(ALARM);
    assert_eq!(status.state, StateId::Locked);
    assert!(status.pending_stop_confirmation);
    assert!(status.active);

    app.handle_command(code(ALARM, "0000"), &mut hw, &mut sink);
    let status = app.status(ALARM);
    assert_eq!(status.state, StateId::Locked);
    assert!(status.passcode_error);
    assert!(sink.events.contains(&AppEvent::PasscodeRejected { mode: ALARM }));

    app.handle_command(code(ALARM, "1234"), &mut hw, &mut sink);
    let status = app.status(ALARM);
    assert_eq!(status.state, StateId::Idle);
    assert!(!status.passcode_error);
    assert!(!hw.alarm.running, "sensing stopped");
    assert_eq!(hw.alarm.outstanding_keep_alive(), 0);
}

#[test]
fn accepted_stop_silences_running_action() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();
    hw.alarm.push_g(1.5);
    app.poll(0, &mut hw, &mut sink);
    assert!(hw.alarm.is_playing());

    app.handle_command(AppCommand::Stop(ALARM), &mut hw, &mut sink);
    assert!(hw.alarm.is_playing(), "prompt alone does not silence");

    app.handle_command(code(ALARM, "1234"), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Idle);
    assert_eq!(hw.alarm.cancels, 1);
    assert!(!hw.alarm.is_playing());
}

#[test]
fn start_while_triggering_takes_the_stop_path() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();
    hw.alarm.push_g(1.5);
    app.poll(0, &mut hw, &mut sink);

    app.handle_command(AppCommand::Start(ALARM), &mut hw, &mut sink);
    assert!(app.status(ALARM).pending_stop_confirmation);
}

#[test]
fn dismissing_stop_prompt_resumes_armed() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();
    app.handle_command(AppCommand::Stop(ALARM), &mut hw, &mut sink);
    app.handle_command(AppCommand::DismissPrompt(ALARM), &mut hw, &mut sink);

    assert_eq!(app.state(ALARM), StateId::Armed);
    assert!(hw.alarm.running);
    assert_eq!(hw.alarm.outstanding_keep_alive(), 1);
}

#[test]
fn session_keeps_sensing_behind_prompt() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();
    app.handle_command(AppCommand::Stop(ALARM), &mut hw, &mut sink);

    hw.alarm.push_g(1.5);
    app.poll(0, &mut hw, &mut sink);
    assert_eq!(hw.alarm.fires, 1);
    assert_eq!(app.state(ALARM), StateId::Locked);
    assert!(app.status(ALARM).action_in_progress);

    app.handle_command(AppCommand::DismissPrompt(ALARM), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Triggering);
}

#[test]
fn completion_behind_prompt_resumes_to_armed() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();
    hw.alarm.push_g(1.5);
    app.poll(0, &mut hw, &mut sink);
    app.handle_command(AppCommand::Stop(ALARM), &mut hw, &mut sink);

    hw.alarm.finish_action();
    app.poll(3000, &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Locked);
    assert!(!app.status(ALARM).action_in_progress);

    app.handle_command(AppCommand::DismissPrompt(ALARM), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Armed);
}

#[test]
fn passcode_cleared_under_open_prompt_leaves_it_open() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();
    app.handle_command(AppCommand::Stop(ALARM), &mut hw, &mut sink);
    app.handle_command(AppCommand::DisablePasscode, &mut hw, &mut sink);
    sink.clear();

    app.handle_command(code(ALARM, "1234"), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Locked);
    assert!(sink.events.is_empty());

    app.handle_command(AppCommand::DismissPrompt(ALARM), &mut hw, &mut sink);
    app.handle_command(AppCommand::Stop(ALARM), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Idle, "opted out: stop is immediate");
}

#[test]
fn attempt_without_prompt_is_ignored() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();
    app.handle_command(code(ALARM, "1234"), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Armed);
    assert!(sink.events.is_empty());
}

#[test]
fn teardown_stops_without_passcode() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();
    hw.alarm.push_g(1.5);
    app.poll(0, &mut hw, &mut sink);
    app.handle_command(AppCommand::Stop(ALARM), &mut hw, &mut sink);

    app.handle_command(AppCommand::Teardown(ALARM), &mut hw, &mut sink);

    let status = app.status(ALARM);
    assert_eq!(status.state, StateId::Idle);
    assert!(!status.pending_stop_confirmation);
    assert!(!hw.alarm.running);
    assert_eq!(hw.alarm.cancels, 1);
    assert_eq!(hw.alarm.outstanding_keep_alive(), 0);
}

// ── Opt-out ───────────────────────────────────────────────────

#[test]
fn disabled_passcode_arms_directly() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_command(AppCommand::DisablePasscode, &mut hw, &mut sink);
    assert!(!app.passcode_protection_enabled());

    app.handle_command(AppCommand::Start(ALARM), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Armed);
    assert_eq!(hw.alarm.starts, 1);

    app.handle_command(AppCommand::Stop(ALARM), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Idle);
}

// ── Toggle ────────────────────────────────────────────────────

#[test]
fn toggle_starts_stops_and_ignores_prompt() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_command(AppCommand::SetPasscode("42".into()), &mut hw, &mut sink);

    app.handle_command(AppCommand::Toggle(ALARM), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Armed);

    app.handle_command(AppCommand::Toggle(ALARM), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Locked);

    app.handle_command(AppCommand::Toggle(ALARM), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Locked);
    assert!(app.status(ALARM).pending_stop_confirmation);
}

// ── Keep-alive ────────────────────────────────────────────────

#[test]
fn keep_alive_released_exactly_once_per_arming() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();
    assert_eq!(hw.alarm.acquired, 1);
    assert!(app.status(ALARM).keep_alive_held);

    hw.alarm.push_g(1.5);
    app.poll(0, &mut hw, &mut sink);
    hw.alarm.finish_action();
    app.poll(3000, &mut hw, &mut sink);
    assert_eq!(hw.alarm.acquired, 1, "no re-acquire while armed");

    app.handle_command(AppCommand::Stop(ALARM), &mut hw, &mut sink);
    app.handle_command(code(ALARM, "1234"), &mut hw, &mut sink);
    app.handle_command(AppCommand::Teardown(ALARM), &mut hw, &mut sink);

    assert_eq!(hw.alarm.acquired, 1);
    assert_eq!(hw.alarm.released, 1);
    assert!(!app.status(ALARM).keep_alive_held);
}

#[test]
fn expired_keep_alive_is_released_once_and_not_reacquired() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();

    hw.alarm.revoke_keep_alive = true;
    app.poll(0, &mut hw, &mut sink);
    app.poll(200, &mut hw, &mut sink);
    assert_eq!(hw.alarm.released, 1);
    assert_eq!(app.state(ALARM), StateId::Armed, "expiry does not disarm");
    assert!(!app.status(ALARM).keep_alive_held);
    hw.alarm.revoke_keep_alive = false;

    hw.alarm.push_g(1.0);
    app.poll(400, &mut hw, &mut sink);
    assert_eq!(hw.alarm.acquired, 1);

    app.handle_command(AppCommand::Stop(ALARM), &mut hw, &mut sink);
    app.handle_command(code(ALARM, "1234"), &mut hw, &mut sink);
    assert_eq!(hw.alarm.released, 1);

    app.handle_command(AppCommand::Start(ALARM), &mut hw, &mut sink);
    assert_eq!(hw.alarm.acquired, 2, "next arming acquires again");
}

#[test]
fn refused_keep_alive_still_arms() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.alarm.refuse_keep_alive = true;
    app.handle_command(AppCommand::DisablePasscode, &mut hw, &mut sink);
    app.handle_command(AppCommand::Start(ALARM), &mut hw, &mut sink);

    let status = app.status(ALARM);
    assert_eq!(status.state, StateId::Armed);
    assert!(!status.keep_alive_held);

    app.handle_command(AppCommand::Stop(ALARM), &mut hw, &mut sink);
    assert_eq!(hw.alarm.released, 0);
}

// ── Sessions ──────────────────────────────────────────────────

#[test]
fn sessions_are_independent() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();

    assert_eq!(app.state(CAPTURE), StateId::Idle);
    assert_eq!(hw.capture.starts, 0);

    hw.alarm.push_g(1.5);
    hw.capture.push_g(1.5);
    app.poll(0, &mut hw, &mut sink);
    assert_eq!(hw.alarm.fires, 1);
    assert_eq!(hw.capture.fires, 0, "idle session ignores motion");
}

#[test]
fn missing_accelerometer_keeps_session_idle() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.alarm.available = false;
    app.handle_command(AppCommand::SetPasscode("1234".into()), &mut hw, &mut sink);

    app.handle_command(AppCommand::Start(ALARM), &mut hw, &mut sink);
    assert_eq!(app.state(ALARM), StateId::Idle);
    assert_eq!(hw.alarm.starts, 0);
}

#[test]
fn transitions_are_reported() {
    let (mut app, mut hw, mut sink) = armed_with_passcode();
    hw.alarm.push_g(1.5);
    app.poll(0, &mut hw, &mut sink);

    assert!(sink.events.contains(&AppEvent::StateChanged {
        mode: ALARM,
        from: StateId::Armed,
        to: StateId::Triggering,
    }));
}
