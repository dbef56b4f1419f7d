//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern, driven by discrete inputs rather than a
//! periodic tick:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                    │
//! │  ┌────────────┬───────────┬──────────┬────────────────────────┐│
//! │  │ StateId    │ on_enter  │ on_exit  │ on_input               ││
//! │  ├────────────┼───────────┼──────────┼────────────────────────┤│
//! │  │ Idle       │ fn(ctx)   │ fn(ctx)  │ fn(ctx, in)->Option<>  ││
//! │  │ Armed      │ fn(ctx)   │ fn(ctx)  │ fn(ctx, in)->Option<>  ││
//! │  │ Triggering │ fn(ctx)   │ fn(ctx)  │ fn(ctx, in)->Option<>  ││
//! │  │ Locked     │ fn(ctx)   │ fn(ctx)  │ fn(ctx, in)->Option<>  ││
//! │  └────────────┴───────────┴──────────┴────────────────────────┘│
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each input is handed to `on_input` for the **current** state.  If it
//! returns `Some(next_id)`, the engine runs `on_exit` for the current
//! state, then `on_enter` for the next, and updates the current pointer.
//! All functions receive `&mut SessionContext`.

pub mod context;
pub mod states;

use context::SessionContext;
use log::info;
use serde::Serialize;

use crate::motion::MotionSample;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all possible session states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Armed = 1,
    Triggering = 2,
    Locked = 3,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert a `u8` index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Idle` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Armed,
            2 => Self::Triggering,
            3 => Self::Locked,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Everything that can happen to a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    /// User asked to arm.
    StartRequested,
    /// User asked to disarm.
    StopRequested,
    /// The sensor delivered a reading.
    Sample(MotionSample),
    /// The trigger action finished (or failed, or was fire-and-forget).
    ActionCompleted,
    /// The prompt was satisfied (correct passcode, or a new one saved).
    PasscodeAccepted,
    /// The prompt got a wrong or empty passcode.
    PasscodeRejected,
    /// The prompt was closed without an answer.
    Dismissed,
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut SessionContext);

/// Signature for the input handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateInputFn = fn(&mut SessionContext, Input) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array, no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_input: StateInputFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `dispatch()`.
    pub fn start(&mut self, ctx: &mut SessionContext) {
        info!(
            "FSM[{}] starting in state: {}",
            ctx.mode.name(),
            self.table[self.current].name
        );
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Feed one input to the current state.
    ///
    /// Returns the state transitioned to, if any.
    pub fn dispatch(&mut self, input: Input, ctx: &mut SessionContext) -> Option<StateId> {
        let next = (self.table[self.current].on_input)(ctx, input);

        if let Some(next_id) = next {
            if next_id as usize != self.current {
                self.transition(next_id, ctx);
                return Some(next_id);
            }
        }
        None
    }

    /// Force an immediate transition regardless of what `on_input` would
    /// decide (view teardown).
    pub fn force_transition(&mut self, next: StateId, ctx: &mut SessionContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// Human-readable name of the current state.
    pub fn current_name(&self) -> &'static str {
        self.table[self.current].name
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut SessionContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM[{}] transition: {} -> {}",
            ctx.mode.name(),
            self.table[self.current].name,
            self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
