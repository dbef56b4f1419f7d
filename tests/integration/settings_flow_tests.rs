//! Settings surface: passcode set / enable / disable, status queries and
//! storage failures.

use super::mock_hw::{MockDevice, MockNvs, RecordingSink};

use tamperwatch::app::commands::AppCommand;
use tamperwatch::app::events::AppEvent;
use tamperwatch::app::ports::StorageError;
use tamperwatch::app::service::AppService;
use tamperwatch::fsm::StateId;
use tamperwatch::fsm::context::Mode;
use tamperwatch::passcode::GateError;

fn make_app(store: MockNvs) -> (AppService<MockNvs>, MockDevice, RecordingSink) {
    let mut app = AppService::new(store);
    let hw = MockDevice::default();
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    sink.clear();
    (app, hw, sink)
}

#[test]
fn enable_without_passcode_asks_for_one() {
    let (mut app, mut hw, mut sink) = make_app(MockNvs::new());
    app.handle_command(AppCommand::EnablePasscode, &mut hw, &mut sink);
    assert_eq!(sink.events, vec![AppEvent::PasscodeRequired]);
    assert!(!app.passcode_protection_enabled());
}

#[test]
fn enable_with_passcode_is_a_no_op() {
    let (mut app, mut hw, mut sink) = make_app(MockNvs::new());
    app.handle_command(AppCommand::SetPasscode("1234".into()), &mut hw, &mut sink);
    sink.clear();

    app.handle_command(AppCommand::EnablePasscode, &mut hw, &mut sink);
    assert!(sink.events.is_empty());
    assert!(app.passcode_protection_enabled());
}

#[test]
fn set_passcode_overwrites_previous_value() {
    let (mut app, mut hw, mut sink) = make_app(MockNvs::new());
    app.handle_command(AppCommand::SetPasscode("1234".into()), &mut hw, &mut sink);
    app.handle_command(AppCommand::SetPasscode("5678".into()), &mut hw, &mut sink);

    assert_eq!(sink.count(|e| *e == AppEvent::PasscodeSaved), 2);
    assert!(!app.gate().validate("1234"));
    assert!(app.gate().validate("5678"));
}

#[test]
fn empty_passcode_reads_as_unset() {
    let (mut app, mut hw, mut sink) = make_app(MockNvs::new());
    app.handle_command(AppCommand::SetPasscode(String::new()), &mut hw, &mut sink);
    assert!(!app.passcode_protection_enabled());

    app.handle_command(AppCommand::Start(Mode::Alarm), &mut hw, &mut sink);
    assert!(app.status(Mode::Alarm).setup_required);
}

#[test]
fn disable_clears_passcode_and_records_opt_out() {
    let (mut app, mut hw, mut sink) = make_app(MockNvs::new());
    app.handle_command(AppCommand::SetPasscode("1234".into()), &mut hw, &mut sink);
    app.handle_command(AppCommand::DisablePasscode, &mut hw, &mut sink);

    assert!(sink.events.contains(&AppEvent::PasscodeCleared));
    assert!(!app.passcode_protection_enabled());
    assert!(app.gate().is_opted_out());
    assert!(!app.gate().requires_setup());
}

#[test]
fn setting_a_passcode_withdraws_the_opt_out() {
    let (mut app, mut hw, mut sink) = make_app(MockNvs::new());
    app.handle_command(AppCommand::DisablePasscode, &mut hw, &mut sink);
    app.handle_command(AppCommand::SetPasscode("77".into()), &mut hw, &mut sink);

    assert!(!app.gate().is_opted_out());
    app.handle_command(AppCommand::Start(Mode::Capture), &mut hw, &mut sink);
    app.handle_command(AppCommand::Stop(Mode::Capture), &mut hw, &mut sink);
    assert!(app.status(Mode::Capture).pending_stop_confirmation);
}

#[test]
fn passcode_is_shared_between_sessions() {
    let (mut app, mut hw, mut sink) = make_app(MockNvs::new());
    app.handle_command(AppCommand::Start(Mode::Alarm), &mut hw, &mut sink);
    app.handle_command(
        AppCommand::SubmitPasscode(Mode::Alarm, "2468".into()),
        &mut hw,
        &mut sink,
    );

    app.handle_command(AppCommand::Start(Mode::Capture), &mut hw, &mut sink);
    assert_eq!(app.state(Mode::Capture), StateId::Armed);
}

#[test]
fn status_command_reports_snapshot() {
    let (mut app, mut hw, mut sink) = make_app(MockNvs::new());
    app.handle_command(AppCommand::Status(Mode::Capture), &mut hw, &mut sink);

    match sink.events.as_slice() {
        [AppEvent::Status(status)] => {
            assert_eq!(status.mode, Mode::Capture);
            assert_eq!(status.state, StateId::Idle);
            assert!(!status.active);
        }
        other => panic!("expected one status event, got {:?}", other),
    }
}

// ── Storage failures ──────────────────────────────────────────

#[test]
fn set_passcode_reports_store_failure() {
    let (mut app, mut hw, mut sink) = make_app(MockNvs::read_only());
    app.handle_command(AppCommand::SetPasscode("1234".into()), &mut hw, &mut sink);

    assert_eq!(
        sink.events,
        vec![AppEvent::PasscodeStoreFailed(GateError::Storage(
            StorageError::Full
        ))]
    );
    assert!(!app.passcode_protection_enabled());
}

#[test]
fn disable_reports_store_failure() {
    let (mut app, mut hw, mut sink) = make_app(MockNvs::read_only());
    app.handle_command(AppCommand::DisablePasscode, &mut hw, &mut sink);

    assert!(matches!(
        sink.events.as_slice(),
        [AppEvent::PasscodeStoreFailed(_)]
    ));
    assert!(app.gate().requires_setup());
}

#[test]
fn setup_prompt_stays_open_when_store_fails() {
    let (mut app, mut hw, mut sink) = make_app(MockNvs::read_only());
    app.handle_command(AppCommand::Start(Mode::Alarm), &mut hw, &mut sink);
    app.handle_command(
        AppCommand::SubmitPasscode(Mode::Alarm, "1234".into()),
        &mut hw,
        &mut sink,
    );

    let status = app.status(Mode::Alarm);
    assert_eq!(status.state, StateId::Locked);
    assert!(status.setup_required);
    assert!(status.passcode_error);
}

#[test]
fn oversized_passcode_is_refused() {
    let (mut app, mut hw, mut sink) = make_app(MockNvs::new());
    let long = "9".repeat(tamperwatch::passcode::MAX_PASSCODE_BYTES + 1);
    app.handle_command(AppCommand::SetPasscode(long), &mut hw, &mut sink);

    assert_eq!(
        sink.events,
        vec![AppEvent::PasscodeStoreFailed(GateError::TooLong)]
    );
}
