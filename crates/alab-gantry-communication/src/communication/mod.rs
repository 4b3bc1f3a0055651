//! Communication layer
//!
//! The [`SerialPort`] trait is the seam between the request/response
//! channel and whatever carries the bytes: a real serial port or the
//! in-memory simulator.

pub mod channel;
pub mod serial;
pub mod simulated;

use serde::{Deserialize, Serialize};
use std::io;

/// Default baud rate of printer-derived gantries
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default blocking read timeout for one line (ms)
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1_000;

/// Parameters for opening a serial link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout for a single line in milliseconds
    pub read_timeout_ms: u64,
}

impl ConnectionParams {
    /// Parameters for `port` with the default baud rate and read timeout
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }

    /// Override the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the per-line read timeout
    pub fn with_read_timeout_ms(mut self, read_timeout_ms: u64) -> Self {
        self.read_timeout_ms = read_timeout_ms;
        self
    }
}

/// Low-level line link to a device
pub trait SerialPort: Send {
    /// Write raw bytes to the device
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Whether any input is waiting to be read
    fn has_pending(&mut self) -> io::Result<bool>;

    /// Read one line; the terminator may still be attached.
    ///
    /// Returns `None` if nothing arrived within the link's read timeout.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Get the port name
    fn name(&self) -> String;

    /// Close the port
    fn close(&mut self) -> io::Result<()>;
}
