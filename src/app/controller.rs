//! Motion-triggered action controller for one detection session.
//!
//! [`MotionController`] owns a session FSM and its context.  Every
//! request, sensor sample and action completion becomes an [`Input`];
//! after each dispatch the controller reconciles the handlers'
//! [`SessionCommands`](crate::fsm::context::SessionCommands) against the
//! injected [`SessionIo`] ports.
//!
//! ```text
//!  request / sample ──▶ Fsm::dispatch ──▶ SessionCommands
//!                                              │
//!             follow-up input ◀── reconcile ◀──┘──▶ sensor · action · keep-alive
//! ```
//!
//! The keep-alive token lives here, not in the FSM, so every path that
//! lowers the `keep_alive` level funnels through one `Option::take`.

use log::{debug, info, warn};
use serde::Serialize;

use crate::fsm::context::{LockReason, Mode, SessionContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, Input, StateId};
use crate::motion::SAMPLE_INTERVAL_MS;
use crate::passcode::PasscodeGate;

use super::events::AppEvent;
use super::ports::{ActionPoll, ActionProgress, EventSink, KeepAliveToken, SessionIo, StoragePort};

/// Upper bound on follow-up inputs produced by one request.
const MAX_FOLLOW_UPS: usize = 4;

/// Serialisable snapshot of one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionStatus {
    pub mode: Mode,
    pub state: StateId,
    /// The session is sensing (armed, triggering, or locked over either).
    pub active: bool,
    pub action_in_progress: bool,
    pub pending_stop_confirmation: bool,
    /// The prompt is asking for a new passcode.
    pub setup_required: bool,
    /// The prompt shows the wrong-passcode indicator.
    pub passcode_error: bool,
    pub keep_alive_held: bool,
}

/// One detection session (alarm or capture).
pub struct MotionController {
    fsm: Fsm,
    ctx: SessionContext,
    keep_alive: Option<KeepAliveToken>,
    /// The platform revoked keep-alive for the current arming.
    keep_alive_revoked: bool,
    now_ms: u64,
}

impl MotionController {
    /// Construct an idle session.  Call [`start`](Self::start) next.
    pub fn new(mode: Mode) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), StateId::Idle),
            ctx: SessionContext::new(mode),
            keep_alive: None,
            keep_alive_revoked: false,
            now_ms: 0,
        }
    }

    /// Run the initial state's `on_enter`.
    pub fn start(&mut self) {
        self.fsm.start(&mut self.ctx);
    }

    // ── Requests ──────────────────────────────────────────────

    pub fn request_start<S: StoragePort>(
        &mut self,
        io: &mut impl SessionIo,
        gate: &PasscodeGate<S>,
        sink: &mut impl EventSink,
    ) {
        self.refresh(io, gate);
        self.dispatch(Input::StartRequested, io, sink);
    }

    pub fn request_stop<S: StoragePort>(
        &mut self,
        io: &mut impl SessionIo,
        gate: &PasscodeGate<S>,
        sink: &mut impl EventSink,
    ) {
        self.refresh(io, gate);
        self.dispatch(Input::StopRequested, io, sink);
    }

    /// The single Start/Stop button: start when idle, stop when active,
    /// ignored while the prompt is showing.
    pub fn toggle<S: StoragePort>(
        &mut self,
        io: &mut impl SessionIo,
        gate: &PasscodeGate<S>,
        sink: &mut impl EventSink,
    ) {
        match self.fsm.current_state() {
            StateId::Idle => self.request_start(io, gate, sink),
            StateId::Armed | StateId::Triggering => self.request_stop(io, gate, sink),
            StateId::Locked => debug!("{}: toggle ignored while prompting", self.mode().name()),
        }
    }

    /// Answer the passcode prompt.
    ///
    /// Setup prompt: a non-empty value becomes the new passcode and the
    /// session returns to idle.  Stop prompt: exact comparison against the
    /// stored passcode.
    pub fn submit_passcode_attempt<S: StoragePort>(
        &mut self,
        attempt: &str,
        io: &mut impl SessionIo,
        gate: &mut PasscodeGate<S>,
        sink: &mut impl EventSink,
    ) {
        let Some(lock) = self.ctx.lock else {
            debug!("{}: no prompt open, attempt ignored", self.mode().name());
            return;
        };
        let mode = self.mode();

        let input = match lock.reason {
            LockReason::SetupRequired => {
                if attempt.is_empty() {
                    Input::PasscodeRejected
                } else {
                    match gate.set_and_enable(attempt) {
                        Ok(()) => {
                            sink.emit(&AppEvent::PasscodeSaved);
                            Input::PasscodeAccepted
                        }
                        Err(e) => {
                            warn!("{}: could not store passcode: {}", mode.name(), e);
                            sink.emit(&AppEvent::PasscodeStoreFailed(e));
                            Input::PasscodeRejected
                        }
                    }
                }
            }
            LockReason::StopConfirmation => {
                if !gate.is_passcode_set() {
                    debug!("{}: no stored passcode, prompt left open", mode.name());
                    return;
                }
                if gate.validate(attempt) {
                    sink.emit(&AppEvent::PasscodeAccepted { mode });
                    Input::PasscodeAccepted
                } else {
                    sink.emit(&AppEvent::PasscodeRejected { mode });
                    Input::PasscodeRejected
                }
            }
        };

        self.refresh(io, gate);
        self.dispatch(input, io, sink);
    }

    /// Close the prompt without answering it.
    pub fn dismiss_prompt(&mut self, io: &mut impl SessionIo, sink: &mut impl EventSink) {
        self.dispatch(Input::Dismissed, io, sink);
    }

    /// The owning view went away: stop unconditionally.
    pub fn teardown(&mut self, io: &mut impl SessionIo, sink: &mut impl EventSink) {
        let from = self.fsm.current_state();
        info!("{}: teardown from {:?}", self.mode().name(), from);
        self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        if from != StateId::Idle {
            sink.emit(&AppEvent::StateChanged {
                mode: self.mode(),
                from,
                to: StateId::Idle,
            });
        }
        self.reconcile_and_follow(io, sink);
    }

    /// The platform revoked the keep-alive resource.
    fn keep_alive_expired(&mut self, io: &mut impl SessionIo) {
        if let Some(token) = self.keep_alive.take() {
            warn!(
                "{}: keep-alive expired, releasing token {}",
                self.mode().name(),
                token.id()
            );
            io.release(token);
        }
        if self.ctx.commands.keep_alive {
            self.keep_alive_revoked = true;
        }
    }

    // ── Periodic ──────────────────────────────────────────────

    /// Pull the next due sample and check the action for completion.
    pub fn poll<S: StoragePort>(
        &mut self,
        now_ms: u64,
        io: &mut impl SessionIo,
        gate: &PasscodeGate<S>,
        sink: &mut impl EventSink,
    ) {
        self.now_ms = now_ms;

        if self.keep_alive.is_some() && io.lease_expired(now_ms) {
            self.keep_alive_expired(io);
        }

        if let Some(sample) = io.next_sample(now_ms) {
            self.refresh(io, gate);
            self.dispatch(Input::Sample(sample), io, sink);
        }

        if io.poll_action(now_ms) == ActionPoll::Completed {
            self.dispatch(Input::ActionCompleted, io, sink);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.ctx.mode
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_active(&self) -> bool {
        self.ctx.underlying(self.fsm.current_state()) != StateId::Idle
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            mode: self.ctx.mode,
            state: self.fsm.current_state(),
            active: self.is_active(),
            action_in_progress: self.ctx.action_in_progress,
            pending_stop_confirmation: self.ctx.pending_stop_confirmation(),
            setup_required: matches!(
                self.ctx.lock.map(|l| l.reason),
                Some(LockReason::SetupRequired)
            ),
            passcode_error: self.ctx.passcode_error,
            keep_alive_held: self.keep_alive.is_some(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn refresh<S: StoragePort>(&mut self, io: &impl SessionIo, gate: &PasscodeGate<S>) {
        self.ctx.passcode_set = gate.is_passcode_set();
        self.ctx.opted_out = gate.is_opted_out();
        self.ctx.sensor_available = io.is_available();
    }

    fn dispatch(&mut self, input: Input, io: &mut impl SessionIo, sink: &mut impl EventSink) {
        let from = self.fsm.current_state();
        self.fsm.dispatch(input, &mut self.ctx);
        let to = self.fsm.current_state();

        if from != to {
            sink.emit(&AppEvent::StateChanged {
                mode: self.mode(),
                from,
                to,
            });
        }
        if let Some(magnitude) = self.ctx.triggered.take() {
            sink.emit(&AppEvent::Triggered {
                mode: self.mode(),
                magnitude,
            });
        }

        self.reconcile_and_follow(io, sink);
    }

    fn reconcile_and_follow(&mut self, io: &mut impl SessionIo, sink: &mut impl EventSink) {
        let mut follow_ups = 0;
        while let Some(next) = self.reconcile(io, sink) {
            follow_ups += 1;
            if follow_ups > MAX_FOLLOW_UPS {
                warn!("{}: follow-up limit reached", self.mode().name());
                break;
            }
            let from = self.fsm.current_state();
            self.fsm.dispatch(next, &mut self.ctx);
            let to = self.fsm.current_state();
            if from != to {
                sink.emit(&AppEvent::StateChanged {
                    mode: self.mode(),
                    from,
                    to,
                });
            }
        }
    }

    /// Apply the desired-state block to the ports.  Returns an input to
    /// feed back when an action finished synchronously.
    fn reconcile(&mut self, io: &mut impl SessionIo, sink: &mut impl EventSink) -> Option<Input> {
        let mode = self.mode();
        let cmds = &mut self.ctx.commands;

        // ── Action stop ──────────────────────────────────────
        if cmds.stop_action {
            cmds.stop_action = false;
            io.cancel();
        }

        // ── Sensor ───────────────────────────────────────────
        if cmds.sensing && !io.is_running() {
            io.start(SAMPLE_INTERVAL_MS);
        } else if !cmds.sensing && io.is_running() {
            io.stop();
        }

        // ── Keep-alive ───────────────────────────────────────
        if cmds.keep_alive {
            if self.keep_alive.is_none() && !self.keep_alive_revoked {
                self.keep_alive = io.acquire();
                if self.keep_alive.is_none() {
                    warn!("{}: keep-alive refused by platform", mode.name());
                    self.keep_alive_revoked = true;
                }
            }
        } else {
            self.keep_alive_revoked = false;
            if let Some(token) = self.keep_alive.take() {
                io.release(token);
            }
        }

        // ── Action fire ──────────────────────────────────────
        if cmds.fire_action {
            cmds.fire_action = false;
            match io.fire(self.now_ms) {
                Ok(ActionProgress::Running) => {}
                Ok(ActionProgress::Detached) => return Some(Input::ActionCompleted),
                Err(e) => {
                    warn!("{}: trigger action failed: {}", mode.name(), e);
                    sink.emit(&AppEvent::ActionFailed { mode, error: e });
                    return Some(Input::ActionCompleted);
                }
            }
        }

        None
    }
}

impl core::fmt::Debug for MotionController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotionController")
            .field("mode", &self.ctx.mode)
            .field("state", &self.fsm.current_name())
            .field("keep_alive", &self.keep_alive)
            .finish()
    }
}
