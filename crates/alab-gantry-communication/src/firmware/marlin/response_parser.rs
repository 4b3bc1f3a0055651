//! Marlin response parser
//!
//! Classifies the lines Marlin sends back: acknowledgements, echoes,
//! `M114` position reports, errors and busy notices.

use alab_gantry_core::Position;
use regex::Regex;
use std::sync::OnceLock;

/// Prefix Marlin puts in front of `M118 E1` output and informational text
pub const ECHO_PREFIX: &str = "echo:";

/// Stem of the tags used to confirm that a move has finished
pub const ECHO_TAG_STEM: &str = "FinishedMoving";

/// Parsed Marlin response
#[derive(Debug, Clone, PartialEq)]
pub enum MarlinResponse {
    /// Command acknowledged (ok)
    Ok,
    /// Echoed text, without the `echo:` prefix
    Echo(String),
    /// `M114` position report
    Position(Position),
    /// Error reported by the firmware
    Error(String),
    /// The firmware is busy (`echo:busy: processing`)
    Busy(String),
    /// Anything else
    Raw(String),
}

/// Parser for Marlin protocol responses
#[derive(Debug, Clone, Default)]
pub struct MarlinResponseParser;

fn axis_regex(axis: char) -> &'static Regex {
    static X: OnceLock<Regex> = OnceLock::new();
    static Y: OnceLock<Regex> = OnceLock::new();
    static Z: OnceLock<Regex> = OnceLock::new();

    let (cell, pattern) = match axis {
        'X' => (&X, r"X:(\S*)"),
        'Y' => (&Y, r"Y:(\S*)"),
        _ => (&Z, r"Z:(\S*)"),
    };
    cell.get_or_init(|| Regex::new(pattern).expect("invalid regex pattern"))
}

fn capture_axis(line: &str, axis: char) -> Option<f64> {
    axis_regex(axis)
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Extract `X:`, `Y:` and `Z:` from an `M114` report line.
///
/// Only lines starting with `X:` are reports; the first occurrence of each
/// field wins, so the trailing `Count` section is ignored.
pub fn parse_position(line: &str) -> Option<Position> {
    if !line.starts_with("X:") {
        return None;
    }
    Some(Position::new(
        capture_axis(line, 'X')?,
        capture_axis(line, 'Y')?,
        capture_axis(line, 'Z')?,
    ))
}

/// First complete position report in a batch of lines
pub fn find_position<S: AsRef<str>>(lines: &[S]) -> Option<Position> {
    lines.iter().find_map(|line| parse_position(line.as_ref()))
}

/// Whether `line` is the echo of `tag`
pub fn is_echo_of(line: &str, tag: &str) -> bool {
    line.strip_prefix(ECHO_PREFIX)
        .is_some_and(|rest| rest == tag)
}

/// A tag that no earlier confirmation request can have used
pub fn new_echo_tag() -> String {
    format!("{}-{}", ECHO_TAG_STEM, uuid::Uuid::new_v4().simple())
}

impl MarlinResponseParser {
    /// Create a new response parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a single line from Marlin
    pub fn parse_line(&self, line: &str) -> Option<MarlinResponse> {
        let line = line.trim();

        if line.is_empty() {
            return None;
        }

        if line == "ok" {
            return Some(MarlinResponse::Ok);
        }

        if let Some(rest) = line.strip_prefix(ECHO_PREFIX) {
            if let Some(busy) = rest.strip_prefix("busy:") {
                return Some(MarlinResponse::Busy(busy.trim().to_string()));
            }
            return Some(MarlinResponse::Echo(rest.to_string()));
        }

        if let Some(rest) = line.strip_prefix("Error:") {
            return Some(MarlinResponse::Error(rest.trim().to_string()));
        }

        if let Some(position) = parse_position(line) {
            return Some(MarlinResponse::Position(position));
        }

        Some(MarlinResponse::Raw(line.to_string()))
    }

    /// Parse a batch, logging anything unexpected
    pub fn parse_lines<S: AsRef<str>>(&self, lines: &[S]) -> Vec<MarlinResponse> {
        lines
            .iter()
            .filter_map(|line| self.parse_line(line.as_ref()))
            .inspect(|response| match response {
                MarlinResponse::Error(msg) => tracing::warn!("Firmware error: {}", msg),
                MarlinResponse::Raw(raw) => tracing::debug!("Unrecognised response: {}", raw),
                _ => {}
            })
            .collect()
    }
}
