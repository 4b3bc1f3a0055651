//! Blocking request/response channel
//!
//! Wraps a [`SerialPort`] with the polling discipline of printer firmware:
//! write a command, sleep one polling delay, then drain whatever lines are
//! buffered, sleeping the polling delay again after each line. Bare `ok`
//! acknowledgements are dropped from what callers see.

use crate::communication::{serial::RealSerialPort, ConnectionParams, SerialPort};
use alab_gantry_core::{ConnectionError, Result};
use std::thread;
use std::time::Duration;

/// The acknowledgement token filtered out of every drained batch
pub const ACKNOWLEDGEMENT: &str = "ok";

/// Line-oriented channel owning one device link
pub struct LineChannel {
    port: Option<Box<dyn SerialPort>>,
    polling_delay: Duration,
}

impl LineChannel {
    /// Wrap an already opened link
    pub fn new(port: Box<dyn SerialPort>, polling_delay: Duration) -> Self {
        Self {
            port: Some(port),
            polling_delay,
        }
    }

    /// Open a real serial port
    pub fn open(params: &ConnectionParams, polling_delay: Duration) -> Result<Self> {
        let port = RealSerialPort::open(params)?;
        Ok(Self::new(Box::new(port), polling_delay))
    }

    /// Whether the link is still open
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Name of the underlying port, if open
    pub fn port_name(&self) -> Option<String> {
        self.port.as_ref().map(|p| p.name())
    }

    /// Delay applied between writes and polls
    pub fn polling_delay(&self) -> Duration {
        self.polling_delay
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| ConnectionError::NotConnected.into())
    }

    /// Write one command line without waiting for replies
    pub fn send(&mut self, command: &str) -> Result<()> {
        tracing::debug!(">> {}", command);
        let port = self.port_mut()?;
        port.write(format!("{}\n", command).as_bytes())?;
        Ok(())
    }

    /// Collect every line currently buffered, minus acknowledgements.
    ///
    /// Returns an empty batch when nothing is waiting; never blocks beyond
    /// one read timeout per pending line.
    pub fn drain(&mut self) -> Result<Vec<String>> {
        let delay = self.polling_delay;
        let port = self.port_mut()?;
        let mut lines = Vec::new();

        while port.has_pending()? {
            if let Some(raw) = port.read_line()? {
                let line = raw.trim();
                tracing::trace!("<< {}", line);
                if line != ACKNOWLEDGEMENT {
                    lines.push(line.to_string());
                }
            }
            thread::sleep(delay);
        }

        Ok(lines)
    }

    /// Send a command, wait one polling delay and return the drained reply
    pub fn write_line(&mut self, command: &str) -> Result<Vec<String>> {
        self.send(command)?;
        thread::sleep(self.polling_delay);
        self.drain()
    }

    /// Release the link; closing twice is a no-op
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            let name = port.name();
            port.close()?;
            tracing::info!("Closed {}", name);
        }
        Ok(())
    }
}

impl std::fmt::Debug for LineChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineChannel")
            .field("port", &self.port_name())
            .field("polling_delay", &self.polling_delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::{Arc, Mutex};

    // Replays canned replies for every written line
    struct ScriptedPort {
        written: Arc<Mutex<Vec<String>>>,
        replies: VecDeque<Vec<&'static str>>,
        buffered: VecDeque<String>,
        closes: Arc<Mutex<u32>>,
    }

    impl ScriptedPort {
        fn new(replies: Vec<Vec<&'static str>>) -> Self {
            Self {
                written: Arc::new(Mutex::new(Vec::new())),
                replies: replies.into(),
                buffered: VecDeque::new(),
                closes: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl SerialPort for ScriptedPort {
        fn write(&mut self, data: &[u8]) -> io::Result<()> {
            self.written
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(data).to_string());
            if let Some(reply) = self.replies.pop_front() {
                self.buffered
                    .extend(reply.into_iter().map(|l| format!("{}\r\n", l)));
            }
            Ok(())
        }

        fn has_pending(&mut self) -> io::Result<bool> {
            Ok(!self.buffered.is_empty())
        }

        fn read_line(&mut self) -> io::Result<Option<String>> {
            Ok(self.buffered.pop_front())
        }

        fn name(&self) -> String {
            "scripted".to_string()
        }

        fn close(&mut self) -> io::Result<()> {
            *self.closes.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn test_write_line_appends_terminator_and_filters_ok() {
        let port = ScriptedPort::new(vec![vec!["X:1.00 Y:2.00 Z:3.00 E:0.00", "ok"]]);
        let written = port.written.clone();
        let mut channel = LineChannel::new(Box::new(port), Duration::ZERO);

        let lines = channel.write_line("M114").unwrap();
        assert_eq!(lines, vec!["X:1.00 Y:2.00 Z:3.00 E:0.00".to_string()]);
        assert_eq!(*written.lock().unwrap(), vec!["M114\n".to_string()]);
    }

    #[test]
    fn test_only_exact_ok_is_filtered() {
        let port = ScriptedPort::new(vec![vec!["ok", "ok T:20", "okay", "echo:ok"]]);
        let mut channel = LineChannel::new(Box::new(port), Duration::ZERO);
        let lines = channel.write_line("M400").unwrap();
        assert_eq!(lines, vec!["ok T:20", "okay", "echo:ok"]);
    }

    #[test]
    fn test_silent_device_returns_empty_batch() {
        let port = ScriptedPort::new(vec![]);
        let mut channel = LineChannel::new(Box::new(port), Duration::ZERO);
        assert!(channel.write_line("G28").unwrap().is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let port = ScriptedPort::new(vec![]);
        let closes = port.closes.clone();
        let mut channel = LineChannel::new(Box::new(port), Duration::ZERO);

        channel.close().unwrap();
        channel.close().unwrap();
        assert_eq!(*closes.lock().unwrap(), 1);
        assert!(!channel.is_open());

        let err = channel.write_line("M114").unwrap_err();
        assert!(matches!(
            err,
            alab_gantry_core::Error::Connection(ConnectionError::NotConnected)
        ));
    }
}
