//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the per-mode
//! [`MotionController`](super::controller::MotionController)s emit these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: log to serial, print on
//! the console, record in a test.

use crate::error::ActionError;
use crate::fsm::StateId;
use crate::fsm::context::Mode;
use crate::passcode::GateError;

use super::controller::SessionStatus;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started; both sessions are idle.
    Started,

    /// A session's FSM transitioned between states.
    StateChanged {
        mode: Mode,
        from: StateId,
        to: StateId,
    },

    /// A qualifying sample fired the session's trigger action.
    Triggered { mode: Mode, magnitude: f32 },

    /// The trigger action could not run; the session re-arms.
    ActionFailed { mode: Mode, error: ActionError },

    /// Correct passcode on the stop prompt.
    PasscodeAccepted { mode: Mode },

    /// Wrong passcode on the stop prompt.
    PasscodeRejected { mode: Mode },

    /// A new passcode was stored (settings or setup prompt).
    PasscodeSaved,

    /// Passcode protection was switched off.
    PasscodeCleared,

    /// Protection was switched on without a passcode; one must be set.
    PasscodeRequired,

    /// Writing the passcode record failed.
    PasscodeStoreFailed(GateError),

    /// Answer to a status query.
    Status(SessionStatus),
}
