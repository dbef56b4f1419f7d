//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (serial
//! console, push-button) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.

use crate::fsm::context::Mode;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// The Start/Stop button of a session.
    Toggle(Mode),

    /// Arm a session.
    Start(Mode),

    /// Disarm a session (may raise the passcode prompt).
    Stop(Mode),

    /// Answer the passcode prompt of a session.
    SubmitPasscode(Mode, String),

    /// Close the passcode prompt without answering.
    DismissPrompt(Mode),

    /// The session's view went away.
    Teardown(Mode),

    /// Settings: store a new passcode.
    SetPasscode(String),

    /// Settings: switch passcode protection on.
    EnablePasscode,

    /// Settings: switch passcode protection off and clear the passcode.
    DisablePasscode,

    /// Report a session's status.
    Status(Mode),
}
