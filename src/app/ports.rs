//! Port traits, the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService / MotionController (domain)
//! ```
//!
//! Driven adapters (accelerometer sampler, buzzer alarm, camera capture,
//! keep-alive lock, event sinks, storage) implement these traits.  The
//! domain consumes them via generics, so the controller never touches
//! hardware directly.
//!
//! ## Security notes
//!
//! - The passcode is stored and compared in plaintext; see `passcode`.
//! - **ConfigPort** implementations MUST validate before persisting.
//! - All port errors are typed; callers must handle every variant explicitly.

use crate::config::SystemConfig;
use crate::error::ActionError;
use crate::motion::MotionSample;

// ───────────────────────────────────────────────────────────────
// Motion sensor port (driven adapter: accelerometer → domain)
// ───────────────────────────────────────────────────────────────

/// A restartable, pull-based stream of motion samples.
///
/// Once started, the adapter yields at most one sample per interval from
/// [`next_sample`](Self::next_sample); it never buffers readings that the
/// caller did not pull in time.
pub trait MotionSensorPort {
    /// Whether accelerometer hardware is present and responded to probing.
    fn is_available(&self) -> bool;

    /// Begin sampling at `interval_ms`.  Restarting an active stream resets
    /// its cadence.
    fn start(&mut self, interval_ms: u32);

    /// Stop sampling.  Synchronous: no sample is yielded after this returns.
    fn stop(&mut self);

    /// Whether the stream is currently running.
    fn is_running(&self) -> bool;

    /// The next due sample at `now_ms`, if any.
    fn next_sample(&mut self, now_ms: u64) -> Option<MotionSample>;
}

// ───────────────────────────────────────────────────────────────
// Trigger action port (driven adapter: domain → alarm / camera)
// ───────────────────────────────────────────────────────────────

/// What a successfully fired action does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionProgress {
    /// The action runs until [`TriggerAction::poll_action`] reports completion.
    Running,
    /// Fire-and-forget: the work continues elsewhere and no completion
    /// signal will follow.
    Detached,
}

/// Result of polling an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPoll {
    /// Nothing is playing or pending.
    Idle,
    /// Still running.
    Running,
    /// Finished naturally since the last poll.
    Completed,
}

/// The effect invoked when a qualifying motion sample arrives.
pub trait TriggerAction {
    /// Start the action.
    fn fire(&mut self, now_ms: u64) -> Result<ActionProgress, ActionError>;

    /// Advance the action; reports natural completion exactly once.
    fn poll_action(&mut self, now_ms: u64) -> ActionPoll;

    /// Stop whatever part of the action is still interruptible.
    fn cancel(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Keep-alive port (driven adapter: domain → power management)
// ───────────────────────────────────────────────────────────────

/// Proof that a keep-alive resource is held.
///
/// Neither `Clone` nor `Copy`: releasing consumes it, so a
/// token cannot be handed back twice.
#[derive(Debug, PartialEq, Eq)]
pub struct KeepAliveToken(u32);

impl KeepAliveToken {
    /// Adapters mint tokens; the id is theirs to interpret.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Keeps the device processing while the session is armed (no light
/// sleep, no backgrounding).
pub trait KeepAlivePort {
    /// Acquire the resource.  `None` if the platform refused.
    fn acquire(&mut self) -> Option<KeepAliveToken>;

    /// Release a previously acquired token.
    fn release(&mut self, token: KeepAliveToken);

    /// Whether the platform has revoked the outstanding token.  Polled on
    /// every loop iteration while a token is held.
    fn lease_expired(&mut self, _now_ms: u64) -> bool {
        false
    }
}

// ───────────────────────────────────────────────────────────────
// Camera + photo library ports (used by the capture action)
// ───────────────────────────────────────────────────────────────

/// One captured frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// Monotonic capture counter since boot.
    pub sequence: u32,
    /// Uptime at the moment the capture was requested.
    pub requested_at_ms: u64,
    /// Encoded image (JPEG).
    pub jpeg: Vec<u8>,
}

/// Front camera.  `capture` may block for the sensor's exposure time, so
/// it is only ever called from the capture worker.
pub trait CameraPort: Send {
    fn is_available(&self) -> bool;

    /// Grab and encode a single frame.
    fn capture(&mut self) -> Result<Vec<u8>, ActionError>;
}

/// Destination for captured photos.
pub trait PhotoLibraryPort {
    /// Persist `photo`.  [`ActionError::AuthorizationDenied`] when the
    /// library refuses writes; the caller drops the image.
    fn save(&mut self, photo: &Photo) -> Result<(), ActionError>;
}

/// Everything one detection session drives.
pub trait SessionIo: MotionSensorPort + TriggerAction + KeepAlivePort {}

impl<T: MotionSensorPort + TriggerAction + KeepAlivePort> SessionIo for T {}

/// The two sessions' I/O bundles, handed to the service together so a
/// single `&mut` reaches either without a double borrow.
pub trait DeviceIo {
    type Alarm: SessionIo;
    type Capture: SessionIo;

    fn alarm(&mut self) -> &mut Self::Alarm;
    fn capture(&mut self) -> &mut Self::Capture;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// console, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// # Security
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges should be rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage (passcode record, settings markers).
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic: no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
