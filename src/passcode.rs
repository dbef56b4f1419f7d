//! Passcode gate.
//!
//! The single piece of persisted user state: a plaintext passcode string
//! stored under key `"passcode"`.  An absent record and an empty string
//! both mean "no passcode configured".
//!
//! ## Security note
//!
//! Comparison is exact, case-sensitive string equality against the stored
//! value.  There is no hashing, no attempt counter and no backoff.  Do not
//! reuse this gate anywhere a real credential is involved.
//!
//! ## Opt-out marker
//!
//! Disabling protection in Settings clears the passcode *and* records an
//! opt-out marker.  That marker is what distinguishes "the user turned
//! passcodes off" (arm freely) from "first use" (demand setup first).

use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};

/// NVS namespace holding user settings.
pub const SETTINGS_NAMESPACE: &str = "tamperwatch";
/// Key of the passcode record.
pub const PASSCODE_KEY: &str = "passcode";
/// Key of the "protection explicitly disabled" marker.
pub const OPT_OUT_KEY: &str = "passcode_off";

/// Longest passcode the gate will store, in bytes.
pub const MAX_PASSCODE_BYTES: usize = 64;

/// Errors from [`PasscodeGate`] writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    /// The value does not fit in [`MAX_PASSCODE_BYTES`].
    TooLong,
    /// The backing store failed.
    Storage(StorageError),
}

impl core::fmt::Display for GateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooLong => write!(f, "passcode longer than {} bytes", MAX_PASSCODE_BYTES),
            Self::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl From<StorageError> for GateError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

/// Passcode gate over an injected key-value store.
pub struct PasscodeGate<S: StoragePort> {
    store: S,
}

impl<S: StoragePort> PasscodeGate<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// True iff a non-empty passcode is stored.
    pub fn is_passcode_set(&self) -> bool {
        self.stored().is_some_and(|p| !p.is_empty())
    }

    /// Exact equality against the stored value.  Never writes.
    pub fn validate(&self, attempt: &str) -> bool {
        self.stored().is_some_and(|p| p.as_str() == attempt)
    }

    /// Overwrite the stored passcode unconditionally.
    pub fn set(&mut self, value: &str) -> Result<(), GateError> {
        if value.len() > MAX_PASSCODE_BYTES {
            return Err(GateError::TooLong);
        }
        self.store
            .write(SETTINGS_NAMESPACE, PASSCODE_KEY, value.as_bytes())?;
        info!("Passcode: stored ({} bytes)", value.len());
        Ok(())
    }

    /// Store `value` and withdraw any earlier opt-out (the Settings
    /// "Set Passcode" path).
    pub fn set_and_enable(&mut self, value: &str) -> Result<(), GateError> {
        self.set(value)?;
        self.set_opted_out(false)
    }

    /// Remove the passcode record.
    pub fn clear(&mut self) -> Result<(), GateError> {
        self.store.delete(SETTINGS_NAMESPACE, PASSCODE_KEY)?;
        info!("Passcode: cleared");
        Ok(())
    }

    /// Whether the user explicitly switched passcode protection off.
    pub fn is_opted_out(&self) -> bool {
        self.store.exists(SETTINGS_NAMESPACE, OPT_OUT_KEY)
    }

    /// Record (or withdraw) the explicit opt-out.
    pub fn set_opted_out(&mut self, opted_out: bool) -> Result<(), GateError> {
        if opted_out {
            self.store.write(SETTINGS_NAMESPACE, OPT_OUT_KEY, &[1])?;
        } else {
            self.store.delete(SETTINGS_NAMESPACE, OPT_OUT_KEY)?;
        }
        Ok(())
    }

    /// First use: no passcode and no explicit opt-out.
    pub fn requires_setup(&self) -> bool {
        !self.is_passcode_set() && !self.is_opted_out()
    }

    /// Borrow the backing store (diagnostics, tests).
    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Internal ──────────────────────────────────────────────

    fn stored(&self) -> Option<heapless::String<MAX_PASSCODE_BYTES>> {
        let mut buf = [0u8; MAX_PASSCODE_BYTES];
        let len = match self.store.read(SETTINGS_NAMESPACE, PASSCODE_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return None,
            Err(e) => {
                warn!("Passcode: read failed ({}), treating as unset", e);
                return None;
            }
        };
        let Ok(text) = core::str::from_utf8(&buf[..len]) else {
            warn!("Passcode: stored value is not UTF-8, treating as unset");
            return None;
        };
        let mut out = heapless::String::new();
        out.push_str(text).ok()?;
        Some(out)
    }
}
