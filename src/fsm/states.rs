//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  IDLE ──[start]──▶ ARMED ──[sample > threshold]──▶ TRIGGERING
//!   ▲  │               ▲                                  │
//!   │  │               └────────[action completed]────────┘
//!   │  │
//!   │  └─[start, first use]──▶ LOCKED (setup)
//!   │
//!   └──[passcode ok]── LOCKED (stop) ◀──[stop]── ARMED / TRIGGERING
//!                        │
//!                    [dismiss] ──▶ state underneath
//! ```
//!
//! `Locked` is an overlay: the session under it keeps sensing, and the
//! state it hides is kept in [`Lock::resume`].

use super::context::{Lock, LockReason, SessionContext};
use super::{Input, StateDescriptor, StateId};
use crate::motion::{MOTION_THRESHOLD_G, MotionSample, SAMPLE_INTERVAL_MS};
use log::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per session.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_input: idle_input,
        },
        // 1: Armed
        StateDescriptor {
            id: StateId::Armed,
            name: "Armed",
            on_enter: Some(armed_enter),
            on_exit: None,
            on_input: armed_input,
        },
        // 2: Triggering
        StateDescriptor {
            id: StateId::Triggering,
            name: "Triggering",
            on_enter: Some(triggering_enter),
            on_exit: None,
            on_input: triggering_input,
        },
        // 3: Locked
        StateDescriptor {
            id: StateId::Locked,
            name: "Locked",
            on_enter: Some(locked_enter),
            on_exit: Some(locked_exit),
            on_input: locked_input,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Fire the action if `sample` qualifies.  Returns whether it fired.
fn try_fire(ctx: &mut SessionContext, sample: MotionSample) -> bool {
    if ctx.action_in_progress || !sample.exceeds(MOTION_THRESHOLD_G) {
        return false;
    }
    let magnitude = sample.magnitude();
    ctx.action_in_progress = true;
    ctx.commands.fire_action = true;
    ctx.triggered = Some(magnitude);
    info!(
        "{}: motion {:.2} g > {:.2} g, firing",
        ctx.mode.name(),
        magnitude,
        MOTION_THRESHOLD_G
    );
    true
}

/// Leaving an active session: confirm with the passcode when one exists.
fn stop_or_confirm(ctx: &mut SessionContext, from: StateId) -> Option<StateId> {
    let reason = if ctx.passcode_set {
        LockReason::StopConfirmation
    } else if ctx.requires_setup() {
        LockReason::SetupRequired
    } else {
        return Some(StateId::Idle);
    };
    ctx.lock = Some(Lock {
        reason,
        resume: from,
    });
    Some(StateId::Locked)
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut SessionContext) {
    ctx.commands.sensing = false;
    ctx.commands.keep_alive = false;
    ctx.commands.fire_action = false;
    if ctx.action_in_progress {
        ctx.commands.stop_action = true;
    }
    ctx.action_in_progress = false;
    ctx.lock = None;
    ctx.passcode_error = false;
    info!("IDLE[{}]: sensing off", ctx.mode.name());
}

fn idle_input(ctx: &mut SessionContext, input: Input) -> Option<StateId> {
    match input {
        Input::StartRequested => {
            if ctx.requires_setup() {
                info!("IDLE[{}]: no passcode yet, setup required", ctx.mode.name());
                ctx.lock = Some(Lock {
                    reason: LockReason::SetupRequired,
                    resume: StateId::Idle,
                });
                return Some(StateId::Locked);
            }
            if !ctx.sensor_available {
                warn!(
                    "IDLE[{}]: accelerometer unavailable, not arming",
                    ctx.mode.name()
                );
                return None;
            }
            Some(StateId::Armed)
        }
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ARMED state: sensing, waiting for a qualifying sample
// ═══════════════════════════════════════════════════════════════════════════

fn armed_enter(ctx: &mut SessionContext) {
    ctx.commands.sensing = true;
    ctx.commands.keep_alive = true;
    info!(
        "ARMED[{}]: sampling every {} ms, threshold {:.2} g",
        ctx.mode.name(),
        SAMPLE_INTERVAL_MS,
        MOTION_THRESHOLD_G
    );
}

fn armed_input(ctx: &mut SessionContext, input: Input) -> Option<StateId> {
    match input {
        Input::Sample(sample) => try_fire(ctx, sample).then_some(StateId::Triggering),
        Input::StopRequested => stop_or_confirm(ctx, StateId::Armed),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  TRIGGERING state: the action is running
// ═══════════════════════════════════════════════════════════════════════════

fn triggering_enter(ctx: &mut SessionContext) {
    debug!("TRIGGERING[{}]: action in progress", ctx.mode.name());
}

fn triggering_input(ctx: &mut SessionContext, input: Input) -> Option<StateId> {
    match input {
        Input::ActionCompleted => {
            ctx.action_in_progress = false;
            Some(StateId::Armed)
        }
        // Start while the action fires is the stop path.
        Input::StopRequested | Input::StartRequested => {
            stop_or_confirm(ctx, StateId::Triggering)
        }
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  LOCKED overlay: passcode prompt
// ═══════════════════════════════════════════════════════════════════════════

fn locked_enter(ctx: &mut SessionContext) {
    ctx.passcode_error = false;
    if let Some(lock) = ctx.lock {
        info!(
            "LOCKED[{}]: {:?} (over {:?})",
            ctx.mode.name(),
            lock.reason,
            lock.resume
        );
    }
}

fn locked_exit(ctx: &mut SessionContext) {
    ctx.lock = None;
    ctx.passcode_error = false;
}

fn locked_input(ctx: &mut SessionContext, input: Input) -> Option<StateId> {
    let Some(mut lock) = ctx.lock else {
        warn!("LOCKED[{}]: no prompt context, releasing", ctx.mode.name());
        return Some(StateId::Idle);
    };

    match input {
        Input::PasscodeAccepted => Some(StateId::Idle),
        Input::PasscodeRejected => {
            ctx.passcode_error = true;
            None
        }
        Input::Dismissed => Some(lock.resume),
        Input::Sample(sample) => {
            if lock.resume == StateId::Armed && try_fire(ctx, sample) {
                lock.resume = StateId::Triggering;
                ctx.lock = Some(lock);
            }
            None
        }
        Input::ActionCompleted => {
            ctx.action_in_progress = false;
            if lock.resume == StateId::Triggering {
                lock.resume = StateId::Armed;
                ctx.lock = Some(lock);
            }
            None
        }
        Input::StartRequested | Input::StopRequested => None,
    }
}
