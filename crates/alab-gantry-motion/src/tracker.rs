//! Position tracker
//!
//! Holds the single believed position of the gantry. `None` means the
//! gantry has not been homed and no coordinate can be trusted.

use alab_gantry_core::Position;

/// Believed gantry position
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionTracker {
    position: Option<Position>,
}

impl PositionTracker {
    /// A tracker in the unhomed state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current believed position, `None` while unhomed
    pub fn get(&self) -> Option<Position> {
        self.position
    }

    /// Record a confirmed or queried position
    pub fn set(&mut self, position: Position) {
        tracing::trace!("Tracked position {}", position);
        self.position = Some(position);
    }

    /// Forget the position and fall back to unhomed
    pub fn clear(&mut self) {
        self.position = None;
    }

    /// True iff a position is held
    pub fn is_homed(&self) -> bool {
        self.position.is_some()
    }
}
