//! Command line front end
//!
//! Every motion command homes the gantry first, since a fresh session has
//! no trusted position.

use crate::{
    list_ports, prompt_for_port, Gantry, GantryConfig, LineChannel, SimulatedGcodeDevice,
    TargetPosition, WaypointTable,
};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Motion control for G-code XYZ gantries
#[derive(Parser, Debug)]
#[command(name = "alab-gantry")]
#[command(about = "Home, move and query a Marlin-driven XYZ gantry")]
#[command(version)]
pub struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Serial port, overriding the configured one
    #[arg(long, global = true)]
    pub port: Option<String>,

    /// Drive an in-memory simulated gantry instead of a serial device
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Log at debug level when RUST_LOG is unset
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports that may host a gantry
    Ports,

    /// Home all axes and print the position
    Home,

    /// Home, then move to a target
    Move {
        /// Target X (mm), or X offset with --relative
        #[arg(long, allow_hyphen_values = true)]
        x: Option<f64>,

        /// Target Y (mm), or Y offset with --relative
        #[arg(long, allow_hyphen_values = true)]
        y: Option<f64>,

        /// Target Z (mm), or Z offset with --relative
        #[arg(long, allow_hyphen_values = true)]
        z: Option<f64>,

        /// Treat the coordinates as offsets from the homed position
        #[arg(long)]
        relative: bool,

        /// Lift Z before travelling laterally
        #[arg(long)]
        zhop: bool,
    },

    /// Home, then move to a named waypoint
    Goto {
        /// Waypoint name
        name: String,

        /// Waypoint table (.csv or .toml); defaults to the configured one
        #[arg(long)]
        waypoints: Option<PathBuf>,

        /// Lift Z before travelling laterally
        #[arg(long)]
        zhop: bool,
    },

    /// Home and print the position reported by the device
    Position,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<GantryConfig> {
    if let Some(path) = path {
        return GantryConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    match GantryConfig::default_path() {
        Ok(path) => Ok(GantryConfig::load_or_default(&path)?),
        Err(e) => {
            tracing::debug!("{}; using defaults", e);
            Ok(GantryConfig::default())
        }
    }
}

fn open_session(cli: &Cli, config: &GantryConfig) -> anyhow::Result<Gantry> {
    let profile = config.machine.clone();

    if cli.simulate {
        tracing::info!("Using a simulated {}", profile.name);
        let device = SimulatedGcodeDevice::for_profile(&profile);
        let channel = LineChannel::new(Box::new(device), profile.polling_delay());
        return Ok(Gantry::connect(channel, profile)?);
    }

    let port = match cli.port.clone().or_else(|| config.connection.port.clone()) {
        Some(port) => port,
        None => prompt_for_port()?,
    };
    let params = config.connection.params_for(port);
    Ok(Gantry::open(&params, profile)?)
}

fn home(gantry: &mut Gantry) -> anyhow::Result<()> {
    gantry.home()?;
    if !gantry.is_homed() {
        bail!("Gantry still reports its power-on position after homing");
    }
    Ok(())
}

fn print_position<W: Write>(gantry: &Gantry, out: &mut W) -> anyhow::Result<()> {
    match gantry.position() {
        Some(position) => writeln!(out, "Position: {}", position)?,
        None => writeln!(out, "Position: unknown (not homed)")?,
    }
    Ok(())
}

/// Execute a parsed command line, writing results to `out`
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> anyhow::Result<()> {
    if let Command::Ports = cli.command {
        let ports = list_ports()?;
        if ports.is_empty() {
            writeln!(out, "No serial ports found")?;
        }
        for (i, port) in ports.iter().enumerate() {
            writeln!(
                out,
                "[{}] {} - {}, {}",
                i,
                port.port_name,
                port.description,
                port.hardware_id()
            )?;
        }
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let mut gantry = open_session(cli, &config)?;
    home(&mut gantry)?;

    match &cli.command {
        Command::Ports | Command::Home | Command::Position => {}
        Command::Move {
            x,
            y,
            z,
            relative,
            zhop,
        } => {
            if *relative {
                gantry.move_relative(
                    x.unwrap_or(0.0),
                    y.unwrap_or(0.0),
                    z.unwrap_or(0.0),
                    *zhop,
                )?;
            } else {
                gantry.move_to(TargetPosition::new(*x, *y, *z), *zhop)?;
            }
        }
        Command::Goto {
            name,
            waypoints,
            zhop,
        } => {
            let table = match waypoints {
                Some(path) => WaypointTable::load(path)
                    .with_context(|| format!("Failed to load waypoints {}", path.display()))?,
                None => config.load_waypoints()?,
            };
            gantry.move_to_waypoint(&table, name, *zhop)?;
        }
    }

    if let Command::Position = cli.command {
        let reported = gantry.refresh_position()?;
        writeln!(out, "Position: {}", reported)?;
    } else {
        print_position(&gantry, out)?;
    }

    gantry.disconnect()?;
    Ok(())
}
