//! # ALab Gantry Core
//!
//! Core types and error taxonomy shared by the gantry crates.
//! Provides the position and target data model, the immutable machine
//! profile that describes a concrete gantry, and the layered error types.

pub mod data;
pub mod error;

pub use data::{
    profile::{MachineProfile, DEFAULT_SPEED_FRACTION},
    waypoint::WaypointLookup,
    Axis, Position, TargetPosition,
};

pub use error::{ConnectionError, Error, MotionError, Result};
