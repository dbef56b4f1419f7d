//! Keep-alive adapter.
//!
//! Implements [`KeepAlivePort`] with an ESP-IDF power-management lock of
//! type `ESP_PM_NO_LIGHT_SLEEP`: while a token is out, automatic light
//! sleep cannot suspend the main loop, so sampling continues unattended.
//!
//! If the firmware is built without `CONFIG_PM_ENABLE`, lock creation
//! fails; the chip then never light-sleeps anyway and tokens are handed
//! out without a backing lock.
//!
//! With a lease set, a token held longer than the lease is reported as
//! revoked, so an armed session stops blocking light sleep indefinitely.
//! The clock starts at the first [`lease_expired`](KeepAlivePort::lease_expired)
//! poll after acquisition.
//!
//! On the host the adapter only counts outstanding tokens.

use log::{debug, warn};

use crate::app::ports::{KeepAlivePort, KeepAliveToken};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    ESP_OK, esp_pm_lock_acquire, esp_pm_lock_create, esp_pm_lock_handle_t, esp_pm_lock_release,
    esp_pm_lock_type_t_ESP_PM_NO_LIGHT_SLEEP,
};

pub struct PmKeepAlive {
    name: &'static core::ffi::CStr,
    next_id: u32,
    outstanding: u32,
    lease_ms: Option<u64>,
    held_since_ms: Option<u64>,
    #[cfg(target_os = "espidf")]
    handle: Option<esp_pm_lock_handle_t>,
}

impl PmKeepAlive {
    /// `name` shows up in `esp_pm_dump_locks()`.
    pub fn new(name: &'static core::ffi::CStr) -> Self {
        #[cfg(target_os = "espidf")]
        let handle = {
            let mut handle: esp_pm_lock_handle_t = core::ptr::null_mut();
            // SAFETY: `name` is 'static and NUL-terminated; `handle` is a
            // valid out-pointer for the duration of the call.
            let ret = unsafe {
                esp_pm_lock_create(
                    esp_pm_lock_type_t_ESP_PM_NO_LIGHT_SLEEP,
                    0,
                    name.as_ptr(),
                    &mut handle,
                )
            };
            if ret == ESP_OK {
                Some(handle)
            } else {
                warn!(
                    "PmKeepAlive: lock create failed ({}), power management disabled?",
                    ret
                );
                None
            }
        };

        Self {
            name,
            next_id: 1,
            outstanding: 0,
            lease_ms: None,
            held_since_ms: None,
            #[cfg(target_os = "espidf")]
            handle,
        }
    }

    /// Revoke tokens held for `lease_ms`; 0 means never.
    pub fn with_lease_ms(mut self, lease_ms: u32) -> Self {
        self.lease_ms = (lease_ms > 0).then_some(u64::from(lease_ms));
        self
    }

    /// Tokens handed out and not yet released.
    pub fn outstanding(&self) -> u32 {
        self.outstanding
    }
}

impl KeepAlivePort for PmKeepAlive {
    fn acquire(&mut self) -> Option<KeepAliveToken> {
        #[cfg(target_os = "espidf")]
        if let Some(handle) = self.handle {
            // SAFETY: `handle` came from esp_pm_lock_create and is never deleted.
            let ret = unsafe { esp_pm_lock_acquire(handle) };
            if ret != ESP_OK {
                warn!("PmKeepAlive: acquire failed ({})", ret);
                return None;
            }
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.outstanding += 1;
        debug!("PmKeepAlive[{:?}]: acquired #{}", self.name, id);
        Some(KeepAliveToken::new(id))
    }

    fn release(&mut self, token: KeepAliveToken) {
        if self.outstanding == 0 {
            warn!(
                "PmKeepAlive[{:?}]: release of #{} with nothing held",
                self.name,
                token.id()
            );
            return;
        }

        #[cfg(target_os = "espidf")]
        if let Some(handle) = self.handle {
            // SAFETY: `handle` came from esp_pm_lock_create; the outstanding
            // count guarantees a matching acquire.
            let ret = unsafe { esp_pm_lock_release(handle) };
            if ret != ESP_OK {
                warn!("PmKeepAlive: release failed ({})", ret);
            }
        }

        self.outstanding -= 1;
        if self.outstanding == 0 {
            self.held_since_ms = None;
        }
        debug!("PmKeepAlive[{:?}]: released #{}", self.name, token.id());
    }

    fn lease_expired(&mut self, now_ms: u64) -> bool {
        let Some(lease_ms) = self.lease_ms else {
            return false;
        };
        if self.outstanding == 0 {
            return false;
        }
        let since = *self.held_since_ms.get_or_insert(now_ms);
        now_ms.saturating_sub(since) >= lease_ms
    }
}
