//! Gantry session state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Motion state of a gantry session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GantryState {
    /// No trusted position yet; every move is refused
    #[default]
    Unhomed,
    /// Homed and waiting for a command
    Idle,
    /// A move has been issued and is awaiting confirmation
    Moving,
}

impl fmt::Display for GantryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unhomed => write!(f, "Unhomed"),
            Self::Idle => write!(f, "Idle"),
            Self::Moving => write!(f, "Moving"),
        }
    }
}
