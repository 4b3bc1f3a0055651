use alab_gantry_core::{MachineProfile, TargetPosition, WaypointLookup};
use alab_gantry_settings::{GantryConfig, SettingsError, WaypointTable};
use std::path::PathBuf;
use tempfile::TempDir;

fn sample_config() -> GantryConfig {
    let mut config = GantryConfig::new();
    config.connection.port = Some("/dev/ttyUSB0".to_string());
    config.machine = MachineProfile {
        name: "Sample prep Ender 3".to_string(),
        z_hop_height: 12.0,
        ..MachineProfile::ender3()
    };
    config.waypoints = Some(PathBuf::from("stations.csv"));
    config
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gantry").join("config.toml");

    let config = sample_config();
    config.save_to_file(&path).unwrap();

    let loaded = GantryConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let config = sample_config();
    config.save_to_file(&path).unwrap();

    let loaded = GantryConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_invalid_file_is_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[connection]\nbaud_rate = 0\n").unwrap();

    assert!(matches!(
        GantryConfig::load_from_file(&path),
        Err(SettingsError::InvalidSetting { .. })
    ));
}

#[test]
fn test_infinite_homing_timeout_is_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let mut content = toml::to_string_pretty(&GantryConfig::new()).unwrap();
    content = content.replace("homing_timeout = 60.0", "homing_timeout = inf");
    assert!(content.contains("homing_timeout = inf"));
    std::fs::write(&path, content).unwrap();

    let err = GantryConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::Core(_)));
    assert!(err.to_string().contains("homing_timeout must be finite"));
}

#[test]
fn test_load_or_default_without_file() {
    let dir = TempDir::new().unwrap();
    let config = GantryConfig::load_or_default(&dir.path().join("missing.toml")).unwrap();
    assert_eq!(config, GantryConfig::default());
}

#[test]
fn test_config_loads_its_waypoints() {
    let dir = TempDir::new().unwrap();
    let stations = dir.path().join("stations.csv");
    std::fs::write(&stations, "vial_rack,120,80,None\nbalance,30,200,15\n").unwrap();

    let mut config = GantryConfig::new();
    config.waypoints = Some(stations);

    let table = config.load_waypoints().unwrap();
    assert_eq!(
        table.waypoint("vial_rack"),
        Some(TargetPosition::new(Some(120.0), Some(80.0), None))
    );
    assert_eq!(table.len(), 2);

    assert!(GantryConfig::new().load_waypoints().unwrap().is_empty());
}

#[test]
fn test_waypoint_files_merge() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("base.csv");
    let toml_path = dir.path().join("overrides.toml");

    std::fs::write(&csv_path, "home,0,0,0\nrack,100,100,20\n").unwrap();

    let mut overrides = WaypointTable::new();
    overrides.insert("rack", TargetPosition::xyz(110.0, 100.0, 20.0));
    std::fs::write(&toml_path, overrides.to_toml_string().unwrap()).unwrap();

    let mut table = WaypointTable::load(&csv_path).unwrap();
    table.merge(WaypointTable::load(&toml_path).unwrap());

    assert_eq!(
        table.waypoint("rack"),
        Some(TargetPosition::xyz(110.0, 100.0, 20.0))
    );
    assert_eq!(table.waypoint("home"), Some(TargetPosition::xyz(0.0, 0.0, 0.0)));
}

#[test]
fn test_waypoint_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stations.xlsx");
    std::fs::write(&path, "").unwrap();

    assert!(matches!(
        WaypointTable::load(&path),
        Err(SettingsError::UnsupportedFormat { .. })
    ));
}
