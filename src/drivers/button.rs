//! Polled, debounced push-button driver with short and long press detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up, read through any
//! `embedded_hal::digital::InputPin`.  `tick()` is called from the main
//! loop at control-tick rate and runs the debounce + gesture state machine.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition                   | Event        |
//! |-------------|-----------------------------|--------------|
//! | Short press | Release before 2 s          | `ShortPress` |
//! | Long press  | Hold >= 2 s (fires on hold) | `LongPress`  |

use embedded_hal::digital::InputPin;
use log::warn;

const DEBOUNCE_MS: u64 = 50;
const LONG_PRESS_MS: u64 = 2000;

/// Button events emitted after gesture classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    ShortPress,
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Released,
    DebounceWait { since_ms: u64 },
    Pressed { since_ms: u64 },
    /// Long press already reported; wait for release.
    Held,
}

pub struct ButtonDriver<P: InputPin> {
    pin: P,
    state: GestureState,
}

impl<P: InputPin> ButtonDriver<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            state: GestureState::Released,
        }
    }

    /// Call from the main loop at each control tick.
    /// Returns a classified gesture event, if any.
    pub fn tick(&mut self, now_ms: u64) -> Option<ButtonEvent> {
        let pressed = match self.pin.is_low() {
            Ok(low) => low,
            Err(_) => {
                warn!("Button: GPIO read failed");
                return None;
            }
        };

        match self.state {
            GestureState::Released => {
                if pressed {
                    self.state = GestureState::DebounceWait { since_ms: now_ms };
                }
                None
            }

            GestureState::DebounceWait { since_ms } => {
                if !pressed {
                    self.state = GestureState::Released;
                } else if now_ms.saturating_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = GestureState::Pressed { since_ms };
                }
                None
            }

            GestureState::Pressed { since_ms } => {
                if !pressed {
                    self.state = GestureState::Released;
                    return Some(ButtonEvent::ShortPress);
                }
                if now_ms.saturating_sub(since_ms) >= LONG_PRESS_MS {
                    self.state = GestureState::Held;
                    return Some(ButtonEvent::LongPress);
                }
                None
            }

            GestureState::Held => {
                if !pressed {
                    self.state = GestureState::Released;
                }
                None
            }
        }
    }
}
