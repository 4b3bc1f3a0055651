//! Marlin command creator
//!
//! Renders the motion commands understood by Marlin as text lines.
//! Numbers use Rust's shortest round-trip formatting, so `10.0` is sent as
//! `10` and `12.5` as `12.5`.

use alab_gantry_core::{Axis, MachineProfile, Position};
use std::fmt;

/// A single Marlin command line
#[derive(Debug, Clone, PartialEq)]
pub enum MarlinCommand {
    /// `G0 X.. Y.. Z..` absolute rapid move
    RapidMove {
        /// Target X (mm)
        x: f64,
        /// Target Y (mm)
        y: f64,
        /// Target Z (mm)
        z: f64,
    },
    /// `G0 F..` modal feed rate for subsequent moves
    SetFeedRate {
        /// Feed rate (mm/min)
        mm_per_min: f64,
    },
    /// `M114` position report
    ReportPosition,
    /// `M400` wait for the planner queue to empty
    FinishMoves,
    /// `M118 E1 <tag>` echo a tag once reached in the queue
    Echo {
        /// The text echoed back as `echo:<tag>`
        tag: String,
    },
    /// `G28 [axes]` home the listed axes (all when empty)
    Home {
        /// Axes to home
        axes: Vec<Axis>,
    },
    /// `M203 X.. Y.. Z..` maximum feed rates
    MaxFeedRate {
        /// X limit (mm/s)
        x: f64,
        /// Y limit (mm/s)
        y: f64,
        /// Z limit (mm/s)
        z: f64,
    },
    /// `M17` energise steppers
    EnableSteppers,
    /// `M18` release steppers
    DisableSteppers,
}

/// Round to `places` decimals
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

impl MarlinCommand {
    /// Absolute move to a position
    pub fn rapid_move(target: &Position) -> Self {
        Self::RapidMove {
            x: target.x,
            y: target.y,
            z: target.z,
        }
    }

    /// `M203` for a profile; Marlin takes mm/s, profiles hold mm/min
    pub fn max_feed_rate_for(profile: &MachineProfile) -> Self {
        let xy = round_to(profile.max_xy_feed_rate / 60.0, 2);
        Self::MaxFeedRate {
            x: xy,
            y: xy,
            z: round_to(profile.z_feed_rate() / 60.0, 2),
        }
    }

    /// Home a single axis
    pub fn home_axis(axis: Axis) -> Self {
        Self::Home { axes: vec![axis] }
    }

    /// Home every axis
    pub fn home_all() -> Self {
        Self::Home {
            axes: Axis::ALL.to_vec(),
        }
    }
}

impl fmt::Display for MarlinCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RapidMove { x, y, z } => write!(f, "G0 X{} Y{} Z{}", x, y, z),
            Self::SetFeedRate { mm_per_min } => write!(f, "G0 F{}", mm_per_min),
            Self::ReportPosition => write!(f, "M114"),
            Self::FinishMoves => write!(f, "M400"),
            Self::Echo { tag } => write!(f, "M118 E1 {}", tag),
            Self::Home { axes } => {
                write!(f, "G28")?;
                for axis in axes {
                    write!(f, " {}", axis)?;
                }
                Ok(())
            }
            Self::MaxFeedRate { x, y, z } => write!(f, "M203 X{} Y{} Z{}", x, y, z),
            Self::EnableSteppers => write!(f, "M17"),
            Self::DisableSteppers => write!(f, "M18"),
        }
    }
}
