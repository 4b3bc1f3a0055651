//! # ALab Gantry Communication
//!
//! Line-oriented serial transport and the Marlin G-code dialect spoken by
//! the lab's printer-derived gantries. Includes a simulated device for dry
//! runs and tests.

pub mod communication;
pub mod firmware;

pub use communication::{
    channel::{LineChannel, ACKNOWLEDGEMENT},
    serial::{list_ports, prompt_for_port, select_port, RealSerialPort, SerialPortInfo},
    simulated::{SimulatedGcodeDevice, SimulatorHandle},
    ConnectionParams, SerialPort,
};

pub use firmware::marlin::{
    command_creator::MarlinCommand,
    response_parser::{
        find_position, is_echo_of, new_echo_tag, parse_position, MarlinResponse,
        MarlinResponseParser,
    },
};
