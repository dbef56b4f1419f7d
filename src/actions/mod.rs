//! Trigger actions: what a session does when motion qualifies.
//!
//! | Action          | Mode    | Completion                         |
//! |-----------------|---------|------------------------------------|
//! | `AudioAlarm`    | Alarm   | after the sound asset's duration   |
//! | `PhotoCapture`  | Capture | detached (fire-and-forget)         |

pub mod alarm;
pub mod assets;
pub mod photo;
