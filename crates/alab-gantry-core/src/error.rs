//! Error handling for the gantry crates
//!
//! Provides error types for the two layers of gantry control:
//! - Connection errors (serial link, port discovery, device silence)
//! - Motion errors (homing gate, axis limits, move confirmation, speed)
//!
//! All error types use `thiserror` for ergonomic error handling.

use crate::data::{Axis, Position};
use thiserror::Error;

/// Connection error type
///
/// Represents errors related to the serial link with a gantry,
/// including port discovery and unresponsive devices.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// Port not found
    #[error("Port not found: {port}")]
    PortNotFound {
        /// The name of the port that was not found.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// No serial ports are available for selection
    #[error("No serial ports available")]
    NoPortsAvailable,

    /// The interactive port selection could not be used
    #[error("Invalid port selection: {input}")]
    InvalidSelection {
        /// The raw selection entered by the user.
        input: String,
    },

    /// The channel has been closed
    #[error("Not connected")]
    NotConnected,

    /// I/O error on the link
    #[error("I/O error: {reason}")]
    Io {
        /// The reason for the I/O error.
        reason: String,
    },

    /// The firmware answered with an `Error:` line
    #[error("Firmware error: {message}")]
    Firmware {
        /// The message following the `Error:` prefix.
        message: String,
    },

    /// The device never produced a complete position report
    #[error("No position report received within {timeout_ms}ms")]
    PositionQueryTimeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },
}

/// Motion error type
///
/// Represents failures of the motion API. Validation failures are raised
/// before any command reaches the device.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// A move was requested before the gantry was homed
    #[error("Gantry has not been homed; call home() before moving")]
    NotHomed,

    /// A target coordinate lies outside `[0, limit]`
    #[error("{axis} coordinate {value} is out of range [0, {limit}]")]
    OutOfRange {
        /// The offending axis.
        axis: Axis,
        /// The requested coordinate.
        value: f64,
        /// The upper bound of the axis.
        limit: f64,
    },

    /// The move was not confirmed before the timeout elapsed
    #[error("Move to {target} not confirmed within {timeout_ms}ms")]
    MoveTimeout {
        /// The target of the unconfirmed move.
        target: Position,
        /// Position reported after the timeout, if the device answered.
        last_position: Option<Position>,
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Speed outside the accepted range
    #[error("Speed {value} must be in ({min}, {max}]")]
    InvalidSpeed {
        /// The rejected value.
        value: f64,
        /// Exclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// A named waypoint does not exist
    #[error("Unknown waypoint: {name}")]
    UnknownWaypoint {
        /// The requested waypoint name.
        name: String,
    },
}

/// Main error type for gantry control
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Motion error
    #[error(transparent)]
    Motion(#[from] MotionError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Motion(MotionError::MoveTimeout { .. })
                | Error::Connection(ConnectionError::PositionQueryTimeout { .. })
        )
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a motion error
    pub fn is_motion_error(&self) -> bool {
        matches!(self, Error::Motion(_))
    }

    /// Whether the session stays usable after this error.
    ///
    /// Motion errors never invalidate the session; a move timeout leaves the
    /// tracker refreshed and an unhomed gantry can be homed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Motion(_) => true,
            Error::Connection(ConnectionError::PositionQueryTimeout { .. }) => true,
            _ => false,
        }
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
