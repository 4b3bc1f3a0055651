use alab_gantry::cli::{run, Cli};
use alab_gantry::GantryConfig;
use clap::Parser;
use std::path::Path;
use tempfile::TempDir;

fn write_config(dir: &Path) -> String {
    let path = dir.join("config.toml");
    GantryConfig::default().save_to_file(&path).unwrap();
    path.to_string_lossy().into_owned()
}

fn run_args(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(args)?;
    let mut out = Vec::new();
    run(&cli, &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn test_home_on_simulator() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    let out = run_args(&["alab-gantry", "--config", &config, "--simulate", "home"]).unwrap();
    assert_eq!(out, "Position: (0, 0, 0)\n");
}

#[test]
fn test_absolute_and_relative_moves() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    let out = run_args(&[
        "alab-gantry", "--config", &config, "--simulate", "move", "--x", "100", "--y", "50",
        "--zhop",
    ])
    .unwrap();
    assert_eq!(out, "Position: (100, 50, 0)\n");

    let out = run_args(&[
        "alab-gantry", "--config", &config, "--simulate", "move", "--relative", "--z", "12.5",
    ])
    .unwrap();
    assert_eq!(out, "Position: (0, 0, 12.5)\n");
}

#[test]
fn test_out_of_range_move_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    let err = run_args(&[
        "alab-gantry", "--config", &config, "--simulate", "move", "--x", "-1",
    ])
    .unwrap_err();
    assert_eq!(err.to_string(), "X coordinate -1 is out of range [0, 235]");
}

#[test]
fn test_goto_waypoint() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    let stations = dir.path().join("stations.csv");
    std::fs::write(&stations, "vial_rack,120,80,None\n").unwrap();

    let out = run_args(&[
        "alab-gantry",
        "--config",
        &config,
        "--simulate",
        "goto",
        "vial_rack",
        "--waypoints",
        &stations.to_string_lossy(),
    ])
    .unwrap();
    assert_eq!(out, "Position: (120, 80, 0)\n");

    let err = run_args(&[
        "alab-gantry",
        "--config",
        &config,
        "--simulate",
        "goto",
        "furnace",
        "--waypoints",
        &stations.to_string_lossy(),
    ])
    .unwrap_err();
    assert_eq!(err.to_string(), "Unknown waypoint: furnace");
}

#[test]
fn test_position_reports_device_position() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    let out = run_args(&["alab-gantry", "--config", &config, "--simulate", "position"]).unwrap();
    assert_eq!(out, "Position: (0, 0, 0)\n");
}

#[test]
fn test_missing_config_file_is_an_error() {
    let err = run_args(&[
        "alab-gantry",
        "--config",
        "/nonexistent/alab-gantry.toml",
        "--simulate",
        "home",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("Failed to load config"));
}
