//! Actuator and input drivers.

pub mod button;
pub mod buzzer;
