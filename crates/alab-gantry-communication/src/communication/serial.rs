//! Serial port communication implementation
//!
//! Provides the hardware side of the channel for gantries attached over
//! USB serial:
//! - Port enumeration and discovery
//! - Interactive port selection
//! - A line-buffered [`SerialPort`] backed by the `serialport` crate

use crate::communication::{ConnectionParams, SerialPort};
use alab_gantry_core::{ConnectionError, Result};
use std::io::{self, BufRead, Read, Write};
use std::time::{Duration, Instant};

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// Serial number if available
    pub serial_number: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
            serial_number: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set serial number
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }

    /// Hardware id in the `USB VID:PID=xxxx:xxxx SER=...` form
    pub fn hardware_id(&self) -> String {
        match (self.vid, self.pid) {
            (Some(vid), Some(pid)) => {
                let mut hwid = format!("USB VID:PID={:04X}:{:04X}", vid, pid);
                if let Some(ref serial) = self.serial_number {
                    hwid.push_str(&format!(" SER={}", serial));
                }
                hwid
            }
            _ => "n/a".to_string(),
        }
    }
}

/// List serial ports that can host a gantry controller
///
/// Filters to USB serial patterns:
/// - Windows: COM* (e.g., COM1, COM3)
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        ConnectionError::Io {
            reason: format!("Failed to enumerate ports: {}", e),
        }
    })?;

    Ok(ports
        .iter()
        .filter(|port| is_gantry_port(&port.port_name))
        .map(|port| {
            let info = SerialPortInfo::new(&port.port_name, get_port_description(port));

            match &port.port_type {
                serialport::SerialPortType::UsbPort(usb_info) => {
                    let mut info = info.with_usb_ids(usb_info.vid, usb_info.pid);
                    if let Some(ref mfg) = usb_info.manufacturer {
                        info = info.with_manufacturer(mfg);
                    }
                    if let Some(ref serial) = usb_info.serial_number {
                        info = info.with_serial_number(serial);
                    }
                    info
                }
                _ => info,
            }
        })
        .collect())
}

/// Check if a port name matches a USB serial pattern
fn is_gantry_port(port_name: &str) -> bool {
    if let Some(number) = port_name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    }

    if port_name.starts_with("/dev/ttyUSB") || port_name.starts_with("/dev/ttyACM") {
        return true;
    }

    port_name.starts_with("/dev/cu.usbserial-") || port_name.starts_with("/dev/cu.usbmodem")
}

/// Get a user-friendly description for a port
fn get_port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb_info) => {
            format!(
                "USB {} {}",
                usb_info.manufacturer.as_deref().unwrap_or("Device"),
                usb_info.product.as_deref().unwrap_or("Serial Port")
            )
        }
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// Print an indexed port list to `output` and read the chosen index from `input`
pub fn select_port<R: BufRead, W: Write>(
    ports: &[SerialPortInfo],
    mut input: R,
    mut output: W,
) -> Result<String> {
    if ports.is_empty() {
        return Err(ConnectionError::NoPortsAvailable.into());
    }

    for (i, port) in ports.iter().enumerate() {
        writeln!(
            output,
            "[{}] {} - {}, {}",
            i,
            port.port_name,
            port.description,
            port.hardware_id()
        )?;
    }
    write!(output, "Select a port: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let selection = line.trim();

    selection
        .parse::<usize>()
        .ok()
        .and_then(|index| ports.get(index))
        .map(|port| port.port_name.clone())
        .ok_or_else(|| {
            ConnectionError::InvalidSelection {
                input: selection.to_string(),
            }
            .into()
        })
}

/// Enumerate ports and let the user pick one on the terminal
pub fn prompt_for_port() -> Result<String> {
    let ports = list_ports()?;
    let stdin = io::stdin();
    select_port(&ports, stdin.lock(), io::stdout())
}

/// Real serial port implementation using the serialport crate
pub struct RealSerialPort {
    port: Box<dyn serialport::SerialPort>,
    name: String,
    pending: Vec<u8>,
    read_timeout: Duration,
}

impl RealSerialPort {
    /// Open a serial port (8N1, no flow control) with the given parameters
    pub fn open(params: &ConnectionParams) -> Result<Self> {
        let read_timeout = Duration::from_millis(params.read_timeout_ms);

        let port = serialport::new(&params.port, params.baud_rate)
            // Short timeout so line assembly can poll the deadline
            .timeout(Duration::from_millis(10))
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                match e.kind() {
                    serialport::ErrorKind::NoDevice => ConnectionError::PortNotFound {
                        port: params.port.clone(),
                    },
                    _ => ConnectionError::FailedToOpen {
                        port: params.port.clone(),
                        reason: e.to_string(),
                    },
                }
            })?;

        tracing::info!("Opened {} at {} baud", params.port, params.baud_rate);

        Ok(Self {
            port,
            name: params.port.clone(),
            pending: Vec::new(),
            read_timeout,
        })
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl SerialPort for RealSerialPort {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn has_pending(&mut self) -> io::Result<bool> {
        if self.pending.contains(&b'\n') {
            return Ok(true);
        }
        Ok(self.port.bytes_to_read()? > 0)
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let deadline = Instant::now() + self.read_timeout;
        let mut buf = [0u8; 256];

        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }

            match self.port.read(&mut buf) {
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                // Hand back a partial line rather than losing it
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let rest = std::mem::take(&mut self.pending);
                return Ok(Some(String::from_utf8_lossy(&rest).into_owned()));
            }
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn close(&mut self) -> io::Result<()> {
        self.pending.clear();
        Ok(())
    }
}
