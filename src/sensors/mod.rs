//! Sensor subsystem: the accelerometer driver and the [`MotionSampler`]
//! that turns it into a restartable sample stream.
//!
//! One physical accelerometer is shared by both sessions: each session
//! owns a sampler with its own cadence over an `Rc<RefCell<_>>` handle.
//! Everything runs on the main loop, so the `RefCell` is never contended.

pub mod accelerometer;

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::app::ports::MotionSensorPort;
use crate::error::SensorError;
use crate::motion::MotionSample;

/// Anything that yields one 3-axis reading on demand.
pub trait AccelerometerRead {
    fn read_g(&mut self) -> Result<MotionSample, SensorError>;
}

/// Shared handle to the board's accelerometer, `None` when it was not detected.
pub type SharedAccelerometer<A> = Option<Rc<RefCell<A>>>;

/// Pull-based sampler: at most one sample per interval, never a burst.
///
/// If the main loop falls behind, missed slots are dropped rather than
/// replayed; the next sample is due one interval after the late one.
pub struct MotionSampler<A: AccelerometerRead> {
    accel: SharedAccelerometer<A>,
    interval_ms: u32,
    running: bool,
    /// Time the next sample is due; `None` = due on the next poll.
    next_due_ms: Option<u64>,
    read_errors: u32,
}

impl<A: AccelerometerRead> MotionSampler<A> {
    pub fn new(accel: SharedAccelerometer<A>) -> Self {
        Self {
            accel,
            interval_ms: 0,
            running: false,
            next_due_ms: None,
            read_errors: 0,
        }
    }

    /// Consecutive failed reads since the last good one.
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }
}

impl<A: AccelerometerRead> MotionSensorPort for MotionSampler<A> {
    fn is_available(&self) -> bool {
        self.accel.is_some()
    }

    fn start(&mut self, interval_ms: u32) {
        if self.accel.is_none() {
            warn!("MotionSampler: no accelerometer, start ignored");
            return;
        }
        self.interval_ms = interval_ms.max(1);
        self.running = true;
        self.next_due_ms = None;
        info!("MotionSampler: started at {} ms", self.interval_ms);
    }

    fn stop(&mut self) {
        if self.running {
            info!("MotionSampler: stopped");
        }
        self.running = false;
        self.next_due_ms = None;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn next_sample(&mut self, now_ms: u64) -> Option<MotionSample> {
        if !self.running {
            return None;
        }
        if self.next_due_ms.is_some_and(|due| now_ms < due) {
            return None;
        }
        self.next_due_ms = Some(now_ms + u64::from(self.interval_ms));

        let accel = self.accel.as_ref()?;
        match accel.borrow_mut().read_g() {
            Ok(sample) => {
                self.read_errors = 0;
                debug!("MotionSampler: |a|={:.3} g", sample.magnitude());
                Some(sample)
            }
            Err(e) => {
                self.read_errors += 1;
                if self.read_errors == 1 || self.read_errors % 50 == 0 {
                    warn!("MotionSampler: read failed ({}), x{}", e, self.read_errors);
                }
                None
            }
        }
    }
}
