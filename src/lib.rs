//! # ALab Gantry
//!
//! Motion control for the 3D-printer-derived XYZ gantries of the ALab
//! materials-synthesis lab. A gantry speaks Marlin G-code over a USB serial
//! line; this crate homes it, validates targets against the machine's axis
//! limits, plans z-hops over fixtures and confirms every move against the
//! position the firmware reports.
//!
//! ## Architecture
//!
//! The workspace is organized as:
//!
//! 1. **alab-gantry-core** - Positions, machine profiles, error taxonomy
//! 2. **alab-gantry-communication** - Serial line channel, Marlin commands and responses, simulator
//! 3. **alab-gantry-motion** - Position tracker, z-hop planner, the `Gantry` session
//! 4. **alab-gantry-settings** - Configuration files and named waypoint tables
//! 5. **alab-gantry** - Re-exports, logging setup and the command line front end

pub mod cli;

pub use alab_gantry_communication::{
    list_ports, prompt_for_port, select_port, ConnectionParams, LineChannel, MarlinCommand,
    SerialPortInfo, SimulatedGcodeDevice, SimulatorHandle,
};
pub use alab_gantry_core::{
    Axis, ConnectionError, Error, MachineProfile, MotionError, Position, Result, TargetPosition,
    WaypointLookup,
};
pub use alab_gantry_motion::{Gantry, GantryState};
pub use alab_gantry_settings::{
    ConnectionSettings, GantryConfig, SettingsError, SettingsResult, WaypointTable,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr, leaving stdout to command results
/// - RUST_LOG environment variable support, `info` when unset
pub fn init_logging() -> anyhow::Result<()> {
    init_logging_with_default("info")
}

/// Initialize logging, using `default_directive` when RUST_LOG is unset
pub fn init_logging_with_default(default_directive: &str) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
