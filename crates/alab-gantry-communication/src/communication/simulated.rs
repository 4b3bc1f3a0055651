//! Simulated Marlin gantry
//!
//! An in-memory device that speaks enough of the Marlin dialect to drive
//! the motion controller without hardware: moves complete instantly,
//! `M114` reports the current position and `M118` echoes its tag.
//! A [`SimulatorHandle`] stays usable after the device is boxed into a
//! channel, for inspecting the command log and injecting faults.

use crate::communication::SerialPort;
use alab_gantry_core::{Axis, MachineProfile, Position};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

/// Steps per millimeter reported in the `Count` section of `M114`
const STEPS_PER_MM: [f64; 3] = [80.0, 80.0, 400.0];

/// Split a G-code word such as `X10.5` into its letter and value
fn split_word(word: &str) -> Option<(char, f64)> {
    let mut chars = word.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let value = chars.as_str().parse::<f64>().ok()?;
    Some((letter, value))
}

#[derive(Debug)]
struct SimState {
    position: Position,
    feed_rate: Option<f64>,
    max_feed_rates: Option<(f64, f64, f64)>,
    steppers_enabled: bool,
    input: Vec<u8>,
    output: VecDeque<String>,
    commands: Vec<String>,
    echo_replies: bool,
    position_replies: bool,
    report_offset: Position,
    closed: bool,
}

impl SimState {
    fn reply(&mut self, line: impl Into<String>) {
        self.output.push_back(line.into());
    }

    fn execute(&mut self, line: &str) {
        self.commands.push(line.to_string());

        let mut words = line.split_whitespace();
        let Some(code) = words.next() else {
            return;
        };

        match code.to_ascii_uppercase().as_str() {
            "G0" | "G1" => {
                let mut target = self.position;
                for (letter, value) in words.filter_map(split_word) {
                    match letter {
                        'X' => target.x = value,
                        'Y' => target.y = value,
                        'Z' => target.z = value,
                        'F' => self.feed_rate = Some(value),
                        _ => {}
                    }
                }
                self.position = target;
            }
            "G28" => {
                let axes: Vec<Axis> = words
                    .filter_map(|w| match w.to_ascii_uppercase().as_str() {
                        "X" => Some(Axis::X),
                        "Y" => Some(Axis::Y),
                        "Z" => Some(Axis::Z),
                        _ => None,
                    })
                    .collect();
                let axes = if axes.is_empty() {
                    Axis::ALL.to_vec()
                } else {
                    axes
                };
                for axis in axes {
                    self.position = self.position.with(axis, 0.0);
                }
            }
            "M114" => {
                if self.position_replies {
                    let p = self.position.offset(
                        self.report_offset.x,
                        self.report_offset.y,
                        self.report_offset.z,
                    );
                    let report = format!(
                        "X:{:.2} Y:{:.2} Z:{:.2} E:0.00 Count X:{} Y:{} Z:{}",
                        p.x,
                        p.y,
                        p.z,
                        (p.x * STEPS_PER_MM[0]).round() as i64,
                        (p.y * STEPS_PER_MM[1]).round() as i64,
                        (p.z * STEPS_PER_MM[2]).round() as i64,
                    );
                    self.reply(report);
                }
            }
            "M118" => {
                if self.echo_replies {
                    let rest: Vec<&str> = words.filter(|w| *w != "E1").collect();
                    self.reply(format!("echo:{}", rest.join(" ")));
                }
            }
            "M203" => {
                let mut rates = (0.0, 0.0, 0.0);
                for (letter, value) in words.filter_map(split_word) {
                    match letter {
                        'X' => rates.0 = value,
                        'Y' => rates.1 = value,
                        'Z' => rates.2 = value,
                        _ => {}
                    }
                }
                self.max_feed_rates = Some(rates);
            }
            "M17" => self.steppers_enabled = true,
            "M18" | "M84" => self.steppers_enabled = false,
            "M400" => {}
            _ => {
                self.reply(format!("echo:Unknown command: \"{}\"", line));
            }
        }

        self.reply("ok");
    }
}

/// In-memory Marlin-like device
#[derive(Debug)]
pub struct SimulatedGcodeDevice {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedGcodeDevice {
    /// Create a device that powers on at `power_on`
    pub fn new(power_on: Position) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                position: power_on,
                feed_rate: None,
                max_feed_rates: None,
                steppers_enabled: true,
                input: Vec::new(),
                output: VecDeque::new(),
                commands: Vec::new(),
                echo_replies: true,
                position_replies: true,
                report_offset: Position::default(),
                closed: false,
            })),
        }
    }

    /// Create a device that powers on at the profile's limit corner
    pub fn for_profile(profile: &MachineProfile) -> Self {
        Self::new(profile.limits_corner())
    }

    /// Handle for inspection and fault injection
    pub fn handle(&self) -> SimulatorHandle {
        SimulatorHandle {
            state: self.state.clone(),
        }
    }
}

impl SerialPort for SimulatedGcodeDevice {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "port closed"));
        }

        state.input.extend_from_slice(data);
        while let Some(end) = state.input.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = state.input.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                state.execute(&line);
            }
        }
        Ok(())
    }

    fn has_pending(&mut self) -> io::Result<bool> {
        Ok(!self.state.lock().output.is_empty())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.state.lock().output.pop_front())
    }

    fn name(&self) -> String {
        "simulated".to_string()
    }

    fn close(&mut self) -> io::Result<()> {
        self.state.lock().closed = true;
        Ok(())
    }
}

/// Shared view onto a [`SimulatedGcodeDevice`]
#[derive(Debug, Clone)]
pub struct SimulatorHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimulatorHandle {
    /// Every command line received, in order
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().commands.clone()
    }

    /// Number of received commands starting with `prefix`
    pub fn count_commands(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .commands
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Forget the command log
    pub fn clear_commands(&self) {
        self.state.lock().commands.clear();
    }

    /// Actual position of the simulated carriage
    pub fn position(&self) -> Position {
        self.state.lock().position
    }

    /// Teleport the carriage
    pub fn set_position(&self, position: Position) {
        self.state.lock().position = position;
    }

    /// Last modal feed rate received (mm/min)
    pub fn feed_rate(&self) -> Option<f64> {
        self.state.lock().feed_rate
    }

    /// Last `M203` limits received (mm/s)
    pub fn max_feed_rates(&self) -> Option<(f64, f64, f64)> {
        self.state.lock().max_feed_rates
    }

    /// Whether the steppers are energised
    pub fn steppers_enabled(&self) -> bool {
        self.state.lock().steppers_enabled
    }

    /// Whether the port has been closed
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Enable or suppress `M118` echo replies
    pub fn set_echo_replies(&self, enabled: bool) {
        self.state.lock().echo_replies = enabled;
    }

    /// Enable or suppress `M114` position replies
    pub fn set_position_replies(&self, enabled: bool) {
        self.state.lock().position_replies = enabled;
    }

    /// Report positions shifted by `offset`
    pub fn set_report_offset(&self, offset: Position) {
        self.state.lock().report_offset = offset;
    }

    /// Queue an unsolicited line, as firmware does for busy/status chatter
    pub fn push_output(&self, line: impl Into<String>) {
        self.state.lock().reply(line);
    }
}
