//! ALab Gantry Settings Crate
//!
//! Loads the connection settings and machine profile of a gantry, and the
//! named waypoint tables used by lab procedures.

pub mod config;
pub mod error;
pub mod waypoints;

pub use config::{ConnectionSettings, GantryConfig};
pub use error::{SettingsError, SettingsResult};
pub use waypoints::WaypointTable;
