//! Named waypoint lookup
//!
//! Motion code resolves waypoint names through [`WaypointLookup`], so tables
//! can come from configuration files or plain maps built in code.

use crate::data::TargetPosition;
use std::collections::{BTreeMap, HashMap};

/// Source of named targets
pub trait WaypointLookup {
    /// The target registered under `name`, if any
    fn waypoint(&self, name: &str) -> Option<TargetPosition>;
}

impl WaypointLookup for BTreeMap<String, TargetPosition> {
    fn waypoint(&self, name: &str) -> Option<TargetPosition> {
        self.get(name).copied()
    }
}

impl WaypointLookup for HashMap<String, TargetPosition> {
    fn waypoint(&self, name: &str) -> Option<TargetPosition> {
        self.get(name).copied()
    }
}

impl<T: WaypointLookup + ?Sized> WaypointLookup for &T {
    fn waypoint(&self, name: &str) -> Option<TargetPosition> {
        (**self).waypoint(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_lookup() {
        let mut table = BTreeMap::new();
        table.insert("vial".to_string(), TargetPosition::new(Some(50.0), None, Some(3.0)));

        assert_eq!(
            table.waypoint("vial"),
            Some(TargetPosition::new(Some(50.0), None, Some(3.0)))
        );
        assert_eq!(table.waypoint("missing"), None);
    }
}
