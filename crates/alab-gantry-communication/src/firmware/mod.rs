//! Firmware dialects
//!
//! Command rendering and response parsing for the controllers found on the
//! lab's gantries. Only Marlin is spoken today.

pub mod marlin;
