//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for TamperWatch: the two
//! detection sessions, their passcode-gated stop flow, and the settings
//! commands.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod controller;
pub mod events;
pub mod ports;
pub mod service;
