//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] for TamperWatch.
//!
//! - `SystemConfig` is a postcard blob under `tamperwatch/syscfg`,
//!   range-checked before it is written.
//! - The passcode record is a plain blob in the settings namespace; it is
//!   not encrypted (see `passcode`).
//! - Namespace and key names follow NVS rules on both targets: at most
//!   15 bytes, longer names are truncated.
//! - On device every write is followed by `nvs_commit`.

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;
use crate::motion::SAMPLE_INTERVAL_MS;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "tamperwatch";
const CONFIG_KEY: &str = "syscfg";

/// NVS limit for namespace and key names, excluding the NUL.
const NVS_NAME_MAX: usize = 15;

/// Shortest keep-alive lease worth configuring.
const MIN_LEASE_MS: u32 = 60_000;

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 4000;

/// `name` cut to what NVS stores, on a char boundary.
fn nvs_name(name: &str) -> &str {
    let mut end = name.len().min(NVS_NAME_MAX);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// NUL-terminated copy of [`nvs_name`] for the C API.
#[cfg(target_os = "espidf")]
fn key_buf(name: &str) -> [u8; NVS_NAME_MAX + 1] {
    let mut buf = [0u8; NVS_NAME_MAX + 1];
    let name = nvs_name(name).as_bytes();
    buf[..name.len()].copy_from_slice(name);
    buf
}

/// An open NVS namespace, closed on drop.
#[cfg(target_os = "espidf")]
struct NvsHandle(nvs_handle_t);

#[cfg(target_os = "espidf")]
impl NvsHandle {
    fn open(namespace: &str, write: bool) -> Result<Self, esp_err_t> {
        let ns = key_buf(namespace);
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut raw: nvs_handle_t = 0;
        // SAFETY: `ns` is NUL-terminated and `raw` is a valid out-pointer.
        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut raw) };
        if ret != ESP_OK {
            return Err(ret);
        }
        Ok(Self(raw))
    }

    /// Size of the blob under `key`.
    fn blob_len(&self, key: &str) -> Result<usize, esp_err_t> {
        let key = key_buf(key);
        let mut size = 0usize;
        // SAFETY: a null output buffer asks NVS for the length only.
        let ret = unsafe {
            nvs_get_blob(self.0, key.as_ptr().cast(), core::ptr::null_mut(), &mut size)
        };
        if ret != ESP_OK {
            return Err(ret);
        }
        Ok(size)
    }

    /// Read into `buf`; returns the bytes written.
    fn get_blob(&self, key: &str, buf: &mut [u8]) -> Result<usize, esp_err_t> {
        let key = key_buf(key);
        let mut size = buf.len();
        // SAFETY: `size` is the capacity of `buf`; NVS never writes past it.
        let ret = unsafe {
            nvs_get_blob(self.0, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
        };
        if ret != ESP_OK {
            return Err(ret);
        }
        Ok(size)
    }

    fn set_blob(&self, key: &str, data: &[u8]) -> Result<(), esp_err_t> {
        let key = key_buf(key);
        // SAFETY: `data` is valid for `data.len()` bytes for the call.
        let ret = unsafe {
            nvs_set_blob(self.0, key.as_ptr().cast(), data.as_ptr().cast(), data.len())
        };
        if ret != ESP_OK {
            return Err(ret);
        }
        self.commit()
    }

    /// Erase `key`; a missing key is not an error.
    fn erase(&self, key: &str) -> Result<(), esp_err_t> {
        let key = key_buf(key);
        // SAFETY: `key` is NUL-terminated.
        let ret = unsafe { nvs_erase_key(self.0, key.as_ptr().cast()) };
        if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
            return Err(ret);
        }
        self.commit()
    }

    fn contains(&self, key: &str) -> bool {
        let key = key_buf(key);
        // SAFETY: `key` is NUL-terminated; the type out-pointer may be null.
        unsafe { nvs_find_key(self.0, key.as_ptr().cast(), core::ptr::null_mut()) == ESP_OK }
    }

    fn commit(&self) -> Result<(), esp_err_t> {
        // SAFETY: the handle is open for writing.
        let ret = unsafe { nvs_commit(self.0) };
        if ret != ESP_OK {
            return Err(ret);
        }
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl Drop for NvsHandle {
    fn drop(&mut self) {
        // SAFETY: the handle came from a successful nvs_open.
        unsafe { nvs_close(self.0) }
    }
}

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the partition is erased and
    /// re-initialised.  `Err(ConfigError::IoError)` if that fails too.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called from the main task before any other NVS access.
            let mut ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                // SAFETY: as above.
                ret = unsafe { nvs_flash_erase() };
                if ret == ESP_OK {
                    // SAFETY: as above.
                    ret = unsafe { nvs_flash_init() };
                }
            }
            if ret != ESP_OK {
                warn!("NVS: init failed ({})", ret);
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", nvs_name(namespace), nvs_name(key))
    }

    /// The stored config blob, `None` when nothing was ever saved.
    #[cfg(not(target_os = "espidf"))]
    fn config_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        Ok(self.store.borrow().get(&key).cloned())
    }

    #[cfg(target_os = "espidf")]
    fn config_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let read = NvsHandle::open(CONFIG_NAMESPACE, false).and_then(|nvs| {
            let size = nvs.blob_len(CONFIG_KEY)?;
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH);
            }
            let mut buf = vec![0u8; size];
            let len = nvs.get_blob(CONFIG_KEY, &mut buf)?;
            buf.truncate(len);
            Ok(buf)
        });
        match read {
            Ok(bytes) => Ok(Some(bytes)),
            // A fresh partition has no namespace yet either.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn put_config_blob(&self, bytes: Vec<u8>) -> Result<(), ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        self.store.borrow_mut().insert(key, bytes);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn put_config_blob(&self, bytes: Vec<u8>) -> Result<(), ConfigError> {
        NvsHandle::open(CONFIG_NAMESPACE, true)
            .and_then(|nvs| nvs.set_blob(CONFIG_KEY, &bytes))
            .map_err(|e| {
                warn!("NvsAdapter: NVS write error {}", e);
                ConfigError::IoError
            })
    }
}

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(5..=500).contains(&cfg.control_loop_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "control_loop_interval_ms must be 5-500",
        ));
    }
    if cfg.control_loop_interval_ms >= SAMPLE_INTERVAL_MS {
        return Err(ConfigError::ValidationFailed(
            "control_loop_interval_ms must be shorter than the sampling interval",
        ));
    }
    if cfg.keep_alive_lease_ms != 0 && cfg.keep_alive_lease_ms < MIN_LEASE_MS {
        return Err(ConfigError::ValidationFailed(
            "keep_alive_lease_ms must be 0 or at least one minute",
        ));
    }
    if cfg.alarm_asset.is_empty() {
        return Err(ConfigError::ValidationFailed("alarm_asset must not be empty"));
    }
    if !cfg.photo_dir.starts_with('/') {
        return Err(ConfigError::ValidationFailed(
            "photo_dir must be an absolute path",
        ));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        match self.config_blob() {
            Ok(Some(bytes)) => {
                let cfg: SystemConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            Ok(None) => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
            Err(e) => {
                warn!("NvsAdapter: config unreadable ({}), using defaults", e);
                Ok(SystemConfig::default())
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        let len = bytes.len();
        self.put_config_blob(bytes)?;
        info!("NvsAdapter: config saved ({} bytes)", len);
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let store = self.store.borrow();
        let data = store
            .get(&Self::composite_key(namespace, key))
            .ok_or(StorageError::NotFound)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store
            .borrow_mut()
            .insert(Self::composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store
            .borrow_mut()
            .remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store
            .borrow()
            .contains_key(&Self::composite_key(namespace, key))
    }
}

#[cfg(target_os = "espidf")]
impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        NvsHandle::open(namespace, false)
            .and_then(|nvs| nvs.get_blob(key, buf))
            .map_err(|e| {
                if e == ESP_ERR_NVS_NOT_FOUND {
                    StorageError::NotFound
                } else {
                    StorageError::IoError
                }
            })
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        NvsHandle::open(namespace, true)
            .and_then(|nvs| nvs.set_blob(key, data))
            .map_err(|e| {
                warn!("NvsAdapter: write {}/{} failed ({})", namespace, key, e);
                StorageError::IoError
            })
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        match NvsHandle::open(namespace, true) {
            Ok(nvs) => nvs.erase(key).map_err(|_| StorageError::IoError),
            // Nothing was ever written to this namespace.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(()),
            Err(_) => Err(StorageError::IoError),
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        NvsHandle::open(namespace, false).is_ok_and(|nvs| nvs.contains(key))
    }
}
