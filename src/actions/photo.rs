//! Silent photo capture action.
//!
//! Each trigger spawns a short-lived worker thread that grabs one frame
//! from the front camera and posts the result back over an embassy-sync
//! channel.  The main loop drains that channel in
//! [`poll_action`](TriggerAction::poll_action) and hands successful
//! captures to the photo library.
//!
//! ```text
//!  fire() ──spawn──▶ worker: camera.capture() ──try_send──▶ OUTCOMES
//!                                                             │
//!  poll_action() ◀──────────────try_receive───────────────────┘──▶ library.save()
//! ```
//!
//! The action is fire-and-forget: `fire` returns
//! [`ActionProgress::Detached`], so a session may re-trigger while an
//! earlier capture is still in its worker.  At most [`MAX_IN_FLIGHT`]
//! workers exist at once; further triggers are refused with
//! [`ActionError::WorkerUnavailable`].  Captures already in flight are
//! not cancellable.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, info, warn};

use crate::app::ports::{
    ActionPoll, ActionProgress, CameraPort, Photo, PhotoLibraryPort, TriggerAction,
};
use crate::error::ActionError;

/// Worker → main loop queue depth.  Outcomes beyond this are counted as lost.
const OUTCOME_DEPTH: usize = 4;

/// Capture workers allowed to run at the same time.
pub const MAX_IN_FLIGHT: usize = OUTCOME_DEPTH;

/// Worker thread stack (frame buffer lives on the heap).
const WORKER_STACK_BYTES: usize = 8 * 1024;

/// What a capture worker reports back.
#[derive(Debug)]
pub enum CaptureOutcome {
    Captured(Photo),
    Failed { sequence: u32, error: ActionError },
}

type OutcomeChannel = Channel<CriticalSectionRawMutex, CaptureOutcome, OUTCOME_DEPTH>;

pub struct PhotoCapture<C: CameraPort + 'static, L: PhotoLibraryPort> {
    camera: Arc<Mutex<C>>,
    camera_available: bool,
    library: L,
    outcomes: Arc<OutcomeChannel>,
    in_flight: Arc<AtomicUsize>,
    lost: Arc<AtomicU32>,
    next_sequence: u32,
    saved: u32,
    dropped: u32,
}

impl<C: CameraPort + 'static, L: PhotoLibraryPort> PhotoCapture<C, L> {
    pub fn new(camera: C, library: L) -> Self {
        let camera_available = camera.is_available();
        if !camera_available {
            warn!("PhotoCapture: no camera, captures will be skipped");
        }
        Self {
            camera: Arc::new(Mutex::new(camera)),
            camera_available,
            library,
            outcomes: Arc::new(Channel::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            lost: Arc::new(AtomicU32::new(0)),
            next_sequence: 0,
            saved: 0,
            dropped: 0,
        }
    }

    /// Photos handed to the library successfully.
    pub fn saved(&self) -> u32 {
        self.saved
    }

    /// Captures lost to errors, denial or a full queue.
    pub fn dropped(&self) -> u32 {
        self.dropped + self.lost.load(Ordering::Relaxed)
    }

    /// Workers that have not posted their outcome yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn library(&self) -> &L {
        &self.library
    }

    fn handle(&mut self, outcome: CaptureOutcome) {
        match outcome {
            CaptureOutcome::Captured(photo) => match self.library.save(&photo) {
                Ok(()) => {
                    self.saved += 1;
                    info!(
                        "PhotoCapture: #{} saved ({} bytes)",
                        photo.sequence,
                        photo.jpeg.len()
                    );
                }
                Err(ActionError::AuthorizationDenied) => {
                    self.dropped += 1;
                    warn!(
                        "PhotoCapture: library denied #{}, image dropped",
                        photo.sequence
                    );
                }
                Err(e) => {
                    self.dropped += 1;
                    warn!("PhotoCapture: saving #{} failed: {}", photo.sequence, e);
                }
            },
            CaptureOutcome::Failed { sequence, error } => {
                self.dropped += 1;
                warn!("PhotoCapture: capture #{} failed: {}", sequence, error);
            }
        }
    }
}

impl<C: CameraPort + 'static, L: PhotoLibraryPort> TriggerAction for PhotoCapture<C, L> {
    fn fire(&mut self, now_ms: u64) -> Result<ActionProgress, ActionError> {
        if !self.camera_available {
            return Err(ActionError::HardwareUnavailable);
        }

        // Only this thread increments, so load-then-add cannot overshoot.
        if self.in_flight.load(Ordering::Acquire) >= MAX_IN_FLIGHT {
            warn!("PhotoCapture: {} captures in flight, trigger refused", MAX_IN_FLIGHT);
            return Err(ActionError::WorkerUnavailable);
        }
        self.in_flight.fetch_add(1, Ordering::AcqRel);

        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        let camera = Arc::clone(&self.camera);
        let outcomes = Arc::clone(&self.outcomes);
        let in_flight = Arc::clone(&self.in_flight);
        let lost = Arc::clone(&self.lost);
        let spawned = std::thread::Builder::new()
            .name("capture".into())
            .stack_size(WORKER_STACK_BYTES)
            .spawn(move || {
                let result = match camera.lock() {
                    Ok(mut cam) => cam.capture(),
                    Err(_) => Err(ActionError::HardwareUnavailable),
                };
                let outcome = match result {
                    Ok(jpeg) => CaptureOutcome::Captured(Photo {
                        sequence,
                        requested_at_ms: now_ms,
                        jpeg,
                    }),
                    Err(error) => CaptureOutcome::Failed { sequence, error },
                };
                if outcomes.try_send(outcome).is_err() {
                    lost.fetch_add(1, Ordering::Relaxed);
                    warn!("PhotoCapture: outcome queue full, #{} lost", sequence);
                }
                in_flight.fetch_sub(1, Ordering::AcqRel);
            });
        if spawned.is_err() {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            return Err(ActionError::WorkerUnavailable);
        }

        debug!("PhotoCapture: #{} dispatched", sequence);
        Ok(ActionProgress::Detached)
    }

    fn poll_action(&mut self, _now_ms: u64) -> ActionPoll {
        while let Ok(outcome) = self.outcomes.try_receive() {
            self.handle(outcome);
        }
        ActionPoll::Idle
    }

    fn cancel(&mut self) {
        debug!("PhotoCapture: in-flight captures run to completion");
    }
}
