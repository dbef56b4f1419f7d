//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Status answers are rendered as one JSON line so the serial console can
//! be scripted.

use log::{info, warn};

use crate::adapters::console::render_status;
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | sessions idle");
            }
            AppEvent::StateChanged { mode, from, to } => {
                info!("STATE | {} | {:?} -> {:?}", mode.name(), from, to);
            }
            AppEvent::Triggered { mode, magnitude } => {
                info!("TRIG  | {} | |a|={:.2}g", mode.name(), magnitude);
            }
            AppEvent::ActionFailed { mode, error } => {
                warn!("TRIG  | {} | action failed: {}", mode.name(), error);
            }
            AppEvent::PasscodeAccepted { mode } => {
                info!("CODE  | {} | accepted", mode.name());
            }
            AppEvent::PasscodeRejected { mode } => {
                info!("CODE  | {} | incorrect passcode", mode.name());
            }
            AppEvent::PasscodeSaved => {
                info!("CODE  | passcode saved");
            }
            AppEvent::PasscodeCleared => {
                info!("CODE  | passcode protection off");
            }
            AppEvent::PasscodeRequired => {
                info!("CODE  | set a passcode to enable protection: passcode set <code>");
            }
            AppEvent::PasscodeStoreFailed(e) => {
                warn!("CODE  | store failed: {}", e);
            }
            AppEvent::Status(status) => match render_status(status) {
                Ok(json) => info!("STATUS| {}", json),
                Err(e) => warn!("STATUS| render failed: {}", e),
            },
        }
    }
}
