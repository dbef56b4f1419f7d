//! System configuration parameters
//!
//! All tunable parameters for the TamperWatch system.
//! Values can be overridden via NVS (non-volatile storage).  The motion
//! threshold and sampling cadence are fixed in [`crate::motion`] and are
//! not part of the stored config.

use serde::{Deserialize, Serialize};

use crate::actions::assets::ALARM_ASSET;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Actions ---
    /// Logical name of the bundled alarm sound
    pub alarm_asset: heapless::String<16>,
    /// Directory captured photos are written to
    pub photo_dir: heapless::String<32>,

    // --- Timing ---
    /// Main loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Longest an armed session may hold off light sleep before the lock is
    /// revoked (milliseconds, 0 = no limit)
    pub keep_alive_lease_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut alarm_asset = heapless::String::new();
        let _ = alarm_asset.push_str(ALARM_ASSET);
        let mut photo_dir = heapless::String::new();
        let _ = photo_dir.push_str("/sdcard/DCIM");

        Self {
            // Actions
            alarm_asset,
            photo_dir,

            // Timing
            control_loop_interval_ms: 20, // 50 Hz
            keep_alive_lease_ms: 30 * 60 * 1000,
        }
    }
}
