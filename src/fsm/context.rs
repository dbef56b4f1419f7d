//! Shared mutable context threaded through every FSM handler.
//!
//! `SessionContext` is the single struct that state handlers read from and
//! write to.  It holds one detection session's flags, a snapshot of the
//! passcode gate taken before each input, and the desired-state command
//! block the controller reconciles against the ports afterwards.

use serde::Serialize;

use super::StateId;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Which trigger action a session drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Audible alarm through the buzzer.
    Alarm,
    /// Silent front-camera photo capture.
    Capture,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Alarm, Mode::Capture];

    pub fn name(self) -> &'static str {
        match self {
            Self::Alarm => "alarm",
            Self::Capture => "capture",
        }
    }
}

// ---------------------------------------------------------------------------
// Locked overlay
// ---------------------------------------------------------------------------

/// Why the passcode prompt is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    /// First use: a passcode must be chosen before anything else.
    SetupRequired,
    /// Leaving an active session needs the stored passcode.
    StopConfirmation,
}

/// The overlay state: what the prompt is for and which state sits under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lock {
    pub reason: LockReason,
    /// State to return to if the prompt is dismissed.
    pub resume: StateId,
}

// ---------------------------------------------------------------------------
// Desired-state commands (written by handlers; reconciled by the controller)
// ---------------------------------------------------------------------------

/// What the session wants from its ports.  `sensing` and `keep_alive` are
/// levels; `fire_action` and `stop_action` are one-shot requests the
/// controller clears once served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCommands {
    pub sensing: bool,
    pub keep_alive: bool,
    pub fire_action: bool,
    pub stop_action: bool,
}

impl SessionCommands {
    /// Sensor off, keep-alive released.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct SessionContext {
    pub mode: Mode,

    // -- Environment snapshot (refreshed before each input) --
    pub passcode_set: bool,
    pub opted_out: bool,
    pub sensor_available: bool,

    // -- Session flags --
    pub action_in_progress: bool,
    pub lock: Option<Lock>,
    /// Visible error indicator on the prompt after a wrong passcode.
    pub passcode_error: bool,
    /// Magnitude of the sample that fired the action, until reported.
    pub triggered: Option<f32>,

    // -- Outputs --
    pub commands: SessionCommands,
}

impl SessionContext {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            passcode_set: false,
            opted_out: false,
            sensor_available: true,
            action_in_progress: false,
            lock: None,
            passcode_error: false,
            triggered: None,
            commands: SessionCommands::all_off(),
        }
    }

    /// First use: no passcode and protection was never switched off.
    pub fn requires_setup(&self) -> bool {
        !self.passcode_set && !self.opted_out
    }

    /// The state the session is really in, looking through the overlay.
    pub fn underlying(&self, current: StateId) -> StateId {
        match (current, self.lock) {
            (StateId::Locked, Some(lock)) => lock.resume,
            (state, _) => state,
        }
    }

    pub fn pending_stop_confirmation(&self) -> bool {
        matches!(
            self.lock,
            Some(Lock {
                reason: LockReason::StopConfirmation,
                ..
            })
        )
    }
}
