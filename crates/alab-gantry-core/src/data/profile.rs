//! Machine profiles
//!
//! A [`MachineProfile`] carries the constants that describe one concrete
//! gantry model: axis limits, feed rates, z-hop height, confirmation
//! tolerance and the polling/timeout discipline of its serial link.
//! Profiles are plain values handed to the motion controller; they are
//! never mutated after construction.

use crate::data::{Axis, Position};
use crate::error::{Error, MotionError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Speed fraction applied when a session is opened
pub const DEFAULT_SPEED_FRACTION: f64 = 0.8;

fn default_homing_timeout() -> f64 {
    60.0
}

fn default_unhomed_at_limits() -> bool {
    true
}

fn default_speed() -> f64 {
    DEFAULT_SPEED_FRACTION
}

/// Immutable per-model gantry constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineProfile {
    /// Human readable model name
    pub name: String,
    /// Upper bound of the X axis (mm)
    pub x_limit: f64,
    /// Upper bound of the Y axis (mm)
    pub y_limit: f64,
    /// Upper bound of the Z axis (mm)
    pub z_limit: f64,
    /// Maximum X/Y feed rate (mm/min)
    pub max_xy_feed_rate: f64,
    /// Maximum Z feed rate (mm/min); the X/Y rate when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_z_feed_rate: Option<f64>,
    /// Height added above the higher endpoint before lateral travel (mm)
    pub z_hop_height: f64,
    /// Distance below which a reported position counts as arrived (mm)
    pub position_tolerance: f64,
    /// Delay between a write and polling for replies (s)
    pub polling_delay: f64,
    /// Bound on a move confirmation and a position query (s)
    pub timeout: f64,
    /// Bound on the position query that follows a homing command (s)
    #[serde(default = "default_homing_timeout")]
    pub homing_timeout: f64,
    /// Treat a position equal to the axis-limit corner as "not homed".
    ///
    /// Marlin on the Ender 3 reports the limits as its power-on position.
    /// Other firmware may not, so this is a per-model switch.
    #[serde(default = "default_unhomed_at_limits")]
    pub unhomed_at_limits: bool,
    /// Speed fraction applied on connect
    #[serde(default = "default_speed")]
    pub default_speed: f64,
}

impl MachineProfile {
    /// Creality Ender 3 running stock Marlin
    pub fn ender3() -> Self {
        Self {
            name: "Ender 3".to_string(),
            x_limit: 235.0,
            y_limit: 235.0,
            z_limit: 150.0,
            max_xy_feed_rate: 10_000.0,
            max_z_feed_rate: Some(25.0 * 60.0),
            z_hop_height: 5.0,
            position_tolerance: 0.1,
            polling_delay: 0.001,
            timeout: 5.0,
            homing_timeout: default_homing_timeout(),
            unhomed_at_limits: true,
            default_speed: DEFAULT_SPEED_FRACTION,
        }
    }

    /// Upper bound of one axis
    pub fn limit(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x_limit,
            Axis::Y => self.y_limit,
            Axis::Z => self.z_limit,
        }
    }

    /// The far corner of the work volume
    pub fn limits_corner(&self) -> Position {
        Position::new(self.x_limit, self.y_limit, self.z_limit)
    }

    /// Maximum Z feed rate (mm/min)
    pub fn z_feed_rate(&self) -> f64 {
        self.max_z_feed_rate.unwrap_or(self.max_xy_feed_rate)
    }

    /// Polling delay as a duration
    pub fn polling_delay(&self) -> Duration {
        Duration::from_secs_f64(self.polling_delay)
    }

    /// Move confirmation timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }

    /// Post-homing query timeout as a duration
    pub fn homing_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.homing_timeout)
    }

    /// Check a resolved target against `[0, limit]` on every axis.
    ///
    /// Axes are checked in X, Y, Z order and the first violation is returned.
    pub fn check_within_limits(&self, target: &Position) -> std::result::Result<(), MotionError> {
        for axis in Axis::ALL {
            let value = target.get(axis);
            let limit = self.limit(axis);
            // NaN fails both comparisons and is rejected here too
            if !(0.0..=limit).contains(&value) {
                return Err(MotionError::OutOfRange { axis, value, limit });
            }
        }
        Ok(())
    }

    /// Whether a reported position is the firmware's "never homed" marker
    pub fn is_unhomed_marker(&self, reported: &Position) -> bool {
        self.unhomed_at_limits && *reported == self.limits_corner()
    }

    /// Validate the profile
    pub fn validate(&self) -> Result<()> {
        if !self.limits_corner().is_finite() {
            return Err(Error::other("Axis limits must be finite"));
        }

        let scalars = [
            ("max_xy_feed_rate", self.max_xy_feed_rate),
            ("max_z_feed_rate", self.z_feed_rate()),
            ("z_hop_height", self.z_hop_height),
            ("position_tolerance", self.position_tolerance),
            ("polling_delay", self.polling_delay),
            ("timeout", self.timeout),
            ("homing_timeout", self.homing_timeout),
            ("default_speed", self.default_speed),
        ];
        if let Some((name, value)) = scalars.iter().find(|(_, value)| !value.is_finite()) {
            return Err(Error::other(format!("{} must be finite, got {}", name, value)));
        }

        if self.x_limit <= 0.0 || self.y_limit <= 0.0 || self.z_limit <= 0.0 {
            return Err(Error::other("Axis limits must be > 0"));
        }

        if self.max_xy_feed_rate <= 0.0 || self.z_feed_rate() <= 0.0 {
            return Err(Error::other("Feed rates must be > 0"));
        }

        if self.z_hop_height < 0.0 {
            return Err(Error::other("Z-hop height must be >= 0"));
        }

        if self.position_tolerance <= 0.0 {
            return Err(Error::other("Position tolerance must be > 0"));
        }

        if self.polling_delay < 0.0 {
            return Err(Error::other("Polling delay must be >= 0"));
        }

        if self.timeout <= 0.0 || self.homing_timeout <= 0.0 {
            return Err(Error::other("Timeouts must be > 0"));
        }

        if self.default_speed <= 0.0 || self.default_speed > 1.0 {
            return Err(Error::other("Default speed must be in (0, 1]"));
        }

        Ok(())
    }
}

impl Default for MachineProfile {
    fn default() -> Self {
        Self::ender3()
    }
}
