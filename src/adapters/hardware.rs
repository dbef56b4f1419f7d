//! Hardware adapter: bundles the peripherals each session drives.
//!
//! [`SessionHardware`] joins a motion sensor, a trigger action and a
//! keep-alive lock into one [`SessionIo`](crate::app::ports::SessionIo);
//! [`DeviceHardware`] pairs the alarm and capture bundles into a
//! [`DeviceIo`].  Neither touches registers: the drivers underneath are
//! cfg-gated per target, so the same bundle runs on host and device.

use crate::app::ports::{
    ActionPoll, ActionProgress, DeviceIo, KeepAlivePort, KeepAliveToken, MotionSensorPort,
    SessionIo, TriggerAction,
};
use crate::error::ActionError;
use crate::motion::MotionSample;

/// One session's sensor, action and keep-alive lock.
pub struct SessionHardware<M, T, K> {
    pub sensor: M,
    pub action: T,
    pub keep_alive: K,
}

impl<M, T, K> SessionHardware<M, T, K> {
    pub fn new(sensor: M, action: T, keep_alive: K) -> Self {
        Self {
            sensor,
            action,
            keep_alive,
        }
    }
}

// ── MotionSensorPort ──────────────────────────────────────────

impl<M: MotionSensorPort, T, K> MotionSensorPort for SessionHardware<M, T, K> {
    fn is_available(&self) -> bool {
        self.sensor.is_available()
    }

    fn start(&mut self, interval_ms: u32) {
        self.sensor.start(interval_ms);
    }

    fn stop(&mut self) {
        self.sensor.stop();
    }

    fn is_running(&self) -> bool {
        self.sensor.is_running()
    }

    fn next_sample(&mut self, now_ms: u64) -> Option<MotionSample> {
        self.sensor.next_sample(now_ms)
    }
}

// ── TriggerAction ─────────────────────────────────────────────

impl<M, T: TriggerAction, K> TriggerAction for SessionHardware<M, T, K> {
    fn fire(&mut self, now_ms: u64) -> Result<ActionProgress, ActionError> {
        self.action.fire(now_ms)
    }

    fn poll_action(&mut self, now_ms: u64) -> ActionPoll {
        self.action.poll_action(now_ms)
    }

    fn cancel(&mut self) {
        self.action.cancel();
    }
}

// ── KeepAlivePort ─────────────────────────────────────────────

impl<M, T, K: KeepAlivePort> KeepAlivePort for SessionHardware<M, T, K> {
    fn acquire(&mut self) -> Option<KeepAliveToken> {
        self.keep_alive.acquire()
    }

    fn release(&mut self, token: KeepAliveToken) {
        self.keep_alive.release(token);
    }

    fn lease_expired(&mut self, now_ms: u64) -> bool {
        self.keep_alive.lease_expired(now_ms)
    }
}

/// Both sessions' hardware.
pub struct DeviceHardware<A, C> {
    pub alarm: A,
    pub capture: C,
}

impl<A: SessionIo, C: SessionIo> DeviceHardware<A, C> {
    pub fn new(alarm: A, capture: C) -> Self {
        Self { alarm, capture }
    }
}

impl<A: SessionIo, C: SessionIo> DeviceIo for DeviceHardware<A, C> {
    type Alarm = A;
    type Capture = C;

    fn alarm(&mut self) -> &mut A {
        &mut self.alarm
    }

    fn capture(&mut self) -> &mut C {
        &mut self.capture
    }
}
