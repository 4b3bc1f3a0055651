//! Marlin firmware support
//!
//! The subset of Marlin G-code used for gantry motion: rapid moves,
//! homing, position reports, queue barriers and tagged echoes.

pub mod command_creator;
pub mod response_parser;

pub use command_creator::MarlinCommand;
pub use response_parser::{
    find_position, is_echo_of, new_echo_tag, parse_position, MarlinResponse, MarlinResponseParser,
};
