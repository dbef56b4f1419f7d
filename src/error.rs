//! Typed errors for the TamperWatch subsystems.
//!
//! Each subsystem returns its own error; `main` lifts them into
//! `anyhow::Error` during bring-up.  All variants are `Copy` so they can be
//! logged, emitted as events and stored without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I2C bus reported an error during a transfer.
    Bus(embedded_hal::i2c::ErrorKind),
    /// WHO_AM_I returned something other than the expected device id.
    WrongDevice(u8),
    /// No accelerometer fitted, or detection never succeeded.
    Unavailable,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(kind) => write!(f, "I2C bus error ({kind:?})"),
            Self::WrongDevice(id) => write!(f, "unexpected device id 0x{id:02x}"),
            Self::Unavailable => write!(f, "accelerometer unavailable"),
        }
    }
}

impl core::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Trigger action errors
// ---------------------------------------------------------------------------

/// Failures of a trigger action.  None of these propagate past the
/// controller: they are logged, emitted as an event, and the session
/// returns to a re-triggerable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    /// A bundled resource (sound asset) could not be resolved.
    ResourceMissing,
    /// The hardware the action needs (camera, buzzer) is not present.
    HardwareUnavailable,
    /// The output collaborator refused the result (photo library denied).
    AuthorizationDenied,
    /// A driver write failed mid-action.
    DriverFault,
    /// The capture worker could not be started.
    WorkerUnavailable,
    /// Generic I/O failure while persisting a result.
    Io,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceMissing => write!(f, "bundled resource not found"),
            Self::HardwareUnavailable => write!(f, "hardware unavailable"),
            Self::AuthorizationDenied => write!(f, "authorization denied"),
            Self::DriverFault => write!(f, "driver fault"),
            Self::WorkerUnavailable => write!(f, "worker unavailable"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ActionError {}
