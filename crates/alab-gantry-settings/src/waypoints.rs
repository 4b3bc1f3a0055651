//! Named waypoint tables
//!
//! Lab procedures refer to fixed stations ("vial_rack", "balance", ...)
//! by name. A [`WaypointTable`] maps those names to partial targets and is
//! read from either a headerless CSV file with rows `name,x,y,z` or a TOML
//! file with one `[waypoints.NAME]` table per station.
//!
//! In CSV, a coordinate written as `None` (or left empty) keeps the
//! gantry's current value for that axis.

use crate::error::{SettingsError, SettingsResult};
use alab_gantry_core::{TargetPosition, WaypointLookup};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Ordered map of waypoint names to targets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaypointTable {
    #[serde(default)]
    waypoints: BTreeMap<String, TargetPosition>,
}

fn parse_coordinate(field: &str, line: u64) -> SettingsResult<Option<f64>> {
    if field.is_empty() || field == "None" {
        return Ok(None);
    }
    field
        .parse::<f64>()
        .map(Some)
        .map_err(|_| SettingsError::InvalidWaypoint {
            line,
            reason: format!("'{}' is not a number", field),
        })
}

impl WaypointTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table, choosing the format by extension (`.csv` or `.toml`)
    pub fn load(path: &Path) -> SettingsResult<Self> {
        let table = match path.extension().and_then(|ext| ext.to_str()) {
            Some("csv") => Self::from_csv_reader(std::fs::File::open(path)?)?,
            Some("toml") => Self::from_toml_str(&std::fs::read_to_string(path)?)?,
            other => {
                return Err(SettingsError::UnsupportedFormat {
                    extension: other.unwrap_or_default().to_string(),
                    expected: ".csv, .toml".to_string(),
                })
            }
        };
        tracing::debug!("Loaded {} waypoints from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parse headerless `name,x,y,z` rows
    pub fn from_csv_reader<R: Read>(reader: R) -> SettingsResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .flexible(true)
            .from_reader(reader);

        let mut table = Self::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());

            if record.len() != 4 {
                return Err(SettingsError::InvalidWaypoint {
                    line,
                    reason: format!("expected 4 fields, found {}", record.len()),
                });
            }

            let name = &record[0];
            if name.is_empty() {
                return Err(SettingsError::InvalidWaypoint {
                    line,
                    reason: "missing name".to_string(),
                });
            }

            let target = TargetPosition::new(
                parse_coordinate(&record[1], line)?,
                parse_coordinate(&record[2], line)?,
                parse_coordinate(&record[3], line)?,
            );
            table.insert(name, target);
        }
        Ok(table)
    }

    /// Parse a TOML document of `[waypoints.NAME]` tables
    pub fn from_toml_str(content: &str) -> SettingsResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> SettingsResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Add or replace a waypoint
    pub fn insert(&mut self, name: impl Into<String>, target: TargetPosition) {
        self.waypoints.insert(name.into(), target);
    }

    /// Look up a waypoint
    pub fn get(&self, name: &str) -> Option<&TargetPosition> {
        self.waypoints.get(name)
    }

    /// Waypoint names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.waypoints.keys().map(String::as_str)
    }

    /// Iterate over `(name, target)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TargetPosition)> {
        self.waypoints.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Merge `other` into this table; entries in `other` win
    pub fn merge(&mut self, other: WaypointTable) {
        self.waypoints.extend(other.waypoints);
    }
}

impl WaypointLookup for WaypointTable {
    fn waypoint(&self, name: &str) -> Option<TargetPosition> {
        self.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_rows_with_none() {
        let csv = "\
vial_rack, 120.5, 80, 10
balance,None,40,None
# parked out of the way
park,,,150
";
        let table = WaypointTable::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get("vial_rack"),
            Some(&TargetPosition::xyz(120.5, 80.0, 10.0))
        );
        assert_eq!(
            table.get("balance"),
            Some(&TargetPosition::new(None, Some(40.0), None))
        );
        assert_eq!(
            table.get("park"),
            Some(&TargetPosition::new(None, None, Some(150.0)))
        );
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["balance", "park", "vial_rack"]);
    }

    #[test]
    fn test_csv_rejects_bad_rows() {
        let err = WaypointTable::from_csv_reader("a,1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidWaypoint { line: 1, .. }));

        let err = WaypointTable::from_csv_reader("a,1,2,3\nb,x,2,3\n".as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid waypoint on line 2: 'x' is not a number");

        let err = WaypointTable::from_csv_reader(",1,2,3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidWaypoint { .. }));
    }

    #[test]
    fn test_toml_tables() {
        let table = WaypointTable::from_toml_str(
            r#"
            [waypoints.vial_rack]
            x = 120.5
            y = 80.0
            z = 10.0

            [waypoints.balance]
            y = 40.0
            "#,
        )
        .unwrap();

        assert_eq!(
            table.waypoint("vial_rack"),
            Some(TargetPosition::xyz(120.5, 80.0, 10.0))
        );
        assert_eq!(
            table.waypoint("balance"),
            Some(TargetPosition::new(None, Some(40.0), None))
        );
        assert_eq!(table.waypoint("furnace"), None);
    }

    #[test]
    fn test_merge_later_wins() {
        let mut base = WaypointTable::new();
        base.insert("a", TargetPosition::xyz(1.0, 1.0, 1.0));
        base.insert("b", TargetPosition::xyz(2.0, 2.0, 2.0));

        let mut overrides = WaypointTable::new();
        overrides.insert("b", TargetPosition::xyz(3.0, 3.0, 3.0));
        overrides.insert("c", TargetPosition::xyz(4.0, 4.0, 4.0));

        base.merge(overrides);
        assert_eq!(base.len(), 3);
        assert_eq!(base.get("b"), Some(&TargetPosition::xyz(3.0, 3.0, 3.0)));
    }
}
