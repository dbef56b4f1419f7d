//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the passcode gate and one [`MotionController`] per
//! mode.  All I/O flows through port traits injected at call sites.
//!
//! ```text
//!  AppCommand ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │        AppService         │
//!   DeviceIo ◀──▶ │  Gate · Alarm · Capture   │
//!                 └──────────────────────────┘
//! ```

use log::{info, warn};

use crate::fsm::StateId;
use crate::fsm::context::Mode;
use crate::passcode::PasscodeGate;

use super::commands::AppCommand;
use super::controller::{MotionController, SessionStatus};
use super::events::AppEvent;
use super::ports::{DeviceIo, EventSink, StoragePort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// Route a call to the controller and I/O bundle of `mode`.  The two
/// bundles have different types, so each arm is expanded separately.
macro_rules! on_session {
    ($svc:ident, $mode:expr, $io:ident, |$c:ident, $s:ident| $body:expr) => {
        match $mode {
            Mode::Alarm => {
                let $c = &mut $svc.alarm;
                let $s = $io.alarm();
                $body
            }
            Mode::Capture => {
                let $c = &mut $svc.capture;
                let $s = $io.capture();
                $body
            }
        }
    };
}

/// The application service orchestrates all domain logic.
pub struct AppService<S: StoragePort> {
    gate: PasscodeGate<S>,
    alarm: MotionController,
    capture: MotionController,
}

impl<S: StoragePort> AppService<S> {
    /// Construct the service over `store` (the passcode record lives there).
    ///
    /// Does **not** start the sessions; call [`start`](Self::start) next.
    pub fn new(store: S) -> Self {
        Self {
            gate: PasscodeGate::new(store),
            alarm: MotionController::new(Mode::Alarm),
            capture: MotionController::new(Mode::Capture),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.alarm.start();
        self.capture.start();
        sink.emit(&AppEvent::Started);
        info!(
            "AppService started (passcode {})",
            if self.gate.is_passcode_set() {
                "set"
            } else if self.gate.is_opted_out() {
                "off"
            } else {
                "not configured"
            }
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Poll both sessions: sensor samples and action completion.
    pub fn poll(&mut self, now_ms: u64, io: &mut impl DeviceIo, sink: &mut impl EventSink) {
        self.alarm.poll(now_ms, io.alarm(), &self.gate, sink);
        self.capture.poll(now_ms, io.capture(), &self.gate, sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (console, button).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        io: &mut impl DeviceIo,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::Toggle(mode) => {
                on_session!(self, mode, io, |c, s| c.toggle(s, &self.gate, sink));
            }
            AppCommand::Start(mode) => {
                on_session!(self, mode, io, |c, s| c.request_start(s, &self.gate, sink));
            }
            AppCommand::Stop(mode) => {
                on_session!(self, mode, io, |c, s| c.request_stop(s, &self.gate, sink));
            }
            AppCommand::SubmitPasscode(mode, attempt) => {
                on_session!(self, mode, io, |c, s| {
                    c.submit_passcode_attempt(&attempt, s, &mut self.gate, sink);
                });
            }
            AppCommand::DismissPrompt(mode) => {
                on_session!(self, mode, io, |c, s| c.dismiss_prompt(s, sink));
            }
            AppCommand::Teardown(mode) => {
                on_session!(self, mode, io, |c, s| c.teardown(s, sink));
            }
            AppCommand::SetPasscode(value) => self.set_passcode(&value, sink),
            AppCommand::EnablePasscode => self.enable_passcode(sink),
            AppCommand::DisablePasscode => self.disable_passcode(sink),
            AppCommand::Status(mode) => sink.emit(&AppEvent::Status(self.status(mode))),
        }
    }

    // ── Settings ──────────────────────────────────────────────

    fn set_passcode(&mut self, value: &str, sink: &mut impl EventSink) {
        match self.gate.set_and_enable(value) {
            Ok(()) => sink.emit(&AppEvent::PasscodeSaved),
            Err(e) => {
                warn!("Settings: passcode not stored: {}", e);
                sink.emit(&AppEvent::PasscodeStoreFailed(e));
            }
        }
    }

    fn enable_passcode(&mut self, sink: &mut impl EventSink) {
        if self.gate.is_passcode_set() {
            info!("Settings: passcode protection already on");
            return;
        }
        sink.emit(&AppEvent::PasscodeRequired);
    }

    fn disable_passcode(&mut self, sink: &mut impl EventSink) {
        let result = self
            .gate
            .clear()
            .and_then(|()| self.gate.set_opted_out(true));
        match result {
            Ok(()) => sink.emit(&AppEvent::PasscodeCleared),
            Err(e) => {
                warn!("Settings: could not disable passcode: {}", e);
                sink.emit(&AppEvent::PasscodeStoreFailed(e));
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self, mode: Mode) -> SessionStatus {
        self.session(mode).status()
    }

    pub fn state(&self, mode: Mode) -> StateId {
        self.session(mode).state()
    }

    /// Mirrors the Settings toggle.
    pub fn passcode_protection_enabled(&self) -> bool {
        self.gate.is_passcode_set()
    }

    pub fn gate(&self) -> &PasscodeGate<S> {
        &self.gate
    }

    fn session(&self, mode: Mode) -> &MotionController {
        match mode {
            Mode::Alarm => &self.alarm,
            Mode::Capture => &self.capture,
        }
    }
}
