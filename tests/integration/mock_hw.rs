//! Mock hardware for integration tests.
//!
//! Records every port call so tests can assert on the full history
//! without touching real I2C/PWM registers.

use std::collections::{HashMap, VecDeque};

use tamperwatch::app::events::AppEvent;
use tamperwatch::app::ports::{
    ActionPoll, ActionProgress, DeviceIo, EventSink, KeepAlivePort, KeepAliveToken,
    MotionSensorPort, StorageError, StoragePort, TriggerAction,
};
use tamperwatch::error::ActionError;
use tamperwatch::motion::MotionSample;

// ── MockSession ───────────────────────────────────────────────

/// How the mock action answers `fire`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireBehaviour {
    Run,
    Detach,
    Fail(ActionError),
}

/// One session's sensor + action + keep-alive, fully scripted.
pub struct MockSession {
    pub available: bool,
    pub running: bool,
    pub starts: u32,
    pub stops: u32,
    samples: VecDeque<MotionSample>,

    pub behaviour: FireBehaviour,
    pub fires: u32,
    pub cancels: u32,
    playing: bool,
    finish_pending: bool,

    pub refuse_keep_alive: bool,
    /// Report the held token as revoked on every poll.
    pub revoke_keep_alive: bool,
    pub acquired: u32,
    pub released: u32,
    next_token: u32,
}

#[allow(dead_code)]
impl MockSession {
    pub fn new() -> Self {
        Self {
            available: true,
            running: false,
            starts: 0,
            stops: 0,
            samples: VecDeque::new(),
            behaviour: FireBehaviour::Run,
            fires: 0,
            cancels: 0,
            playing: false,
            finish_pending: false,
            refuse_keep_alive: false,
            revoke_keep_alive: false,
            acquired: 0,
            released: 0,
            next_token: 1,
        }
    }

    /// Queue a reading with magnitude `g` on the Z axis.
    pub fn push_g(&mut self, g: f32) {
        self.samples.push_back(MotionSample::new(0.0, 0.0, g));
    }

    /// Make the running action report completion on the next poll.
    pub fn finish_action(&mut self) {
        self.finish_pending = true;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn outstanding_keep_alive(&self) -> u32 {
        self.acquired - self.released
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionSensorPort for MockSession {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&mut self, _interval_ms: u32) {
        self.running = true;
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.running = false;
        self.stops += 1;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn next_sample(&mut self, _now_ms: u64) -> Option<MotionSample> {
        if !self.running {
            return None;
        }
        self.samples.pop_front()
    }
}

impl TriggerAction for MockSession {
    fn fire(&mut self, _now_ms: u64) -> Result<ActionProgress, ActionError> {
        self.fires += 1;
        match self.behaviour {
            FireBehaviour::Run => {
                self.playing = true;
                Ok(ActionProgress::Running)
            }
            FireBehaviour::Detach => Ok(ActionProgress::Detached),
            FireBehaviour::Fail(e) => Err(e),
        }
    }

    fn poll_action(&mut self, _now_ms: u64) -> ActionPoll {
        if !self.playing {
            return ActionPoll::Idle;
        }
        if self.finish_pending {
            self.finish_pending = false;
            self.playing = false;
            return ActionPoll::Completed;
        }
        ActionPoll::Running
    }

    fn cancel(&mut self) {
        self.cancels += 1;
        self.playing = false;
        self.finish_pending = false;
    }
}

impl KeepAlivePort for MockSession {
    fn acquire(&mut self) -> Option<KeepAliveToken> {
        if self.refuse_keep_alive {
            return None;
        }
        self.acquired += 1;
        let id = self.next_token;
        self.next_token += 1;
        Some(KeepAliveToken::new(id))
    }

    fn release(&mut self, _token: KeepAliveToken) {
        self.released += 1;
    }

    fn lease_expired(&mut self, _now_ms: u64) -> bool {
        self.revoke_keep_alive
    }
}

// ── MockDevice ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockDevice {
    pub alarm: MockSession,
    pub capture: MockSession,
}

impl DeviceIo for MockDevice {
    type Alarm = MockSession;
    type Capture = MockSession;

    fn alarm(&mut self) -> &mut MockSession {
        &mut self.alarm
    }

    fn capture(&mut self) -> &mut MockSession {
        &mut self.capture
    }
}

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    store: HashMap<String, Vec<u8>>,
    /// Fail every write with `Full`.
    pub read_only: bool,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let k = format!("{}::{}", namespace, key);
        match self.store.get(&k) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::Full);
        }
        self.store
            .insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
