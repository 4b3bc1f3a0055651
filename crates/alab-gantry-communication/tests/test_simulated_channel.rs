use alab_gantry_communication::{
    find_position, is_echo_of, new_echo_tag, LineChannel, MarlinCommand, MarlinResponse,
    MarlinResponseParser, SimulatedGcodeDevice,
};
use alab_gantry_core::{MachineProfile, Position};
use proptest::prelude::*;
use std::time::Duration;

fn channel_for(device: SimulatedGcodeDevice) -> LineChannel {
    LineChannel::new(Box::new(device), Duration::ZERO)
}

#[test]
fn test_position_report_round_trip() {
    let device = SimulatedGcodeDevice::new(Position::new(12.0, 34.5, 6.0));
    let mut channel = channel_for(device);

    let lines = channel
        .write_line(&MarlinCommand::ReportPosition.to_string())
        .unwrap();
    assert_eq!(find_position(&lines), Some(Position::new(12.0, 34.5, 6.0)));
}

#[test]
fn test_move_then_tagged_echo() {
    let device = SimulatedGcodeDevice::for_profile(&MachineProfile::ender3());
    let handle = device.handle();
    let mut channel = channel_for(device);

    let target = Position::new(100.0, 50.0, 10.0);
    assert!(channel
        .write_line(&MarlinCommand::rapid_move(&target).to_string())
        .unwrap()
        .is_empty());
    assert_eq!(handle.position(), target);

    let tag = new_echo_tag();
    channel.send(&MarlinCommand::FinishMoves.to_string()).unwrap();
    let lines = channel
        .write_line(&MarlinCommand::Echo { tag: tag.clone() }.to_string())
        .unwrap();
    assert!(lines.iter().any(|l| is_echo_of(l, &tag)));
}

#[test]
fn test_unsolicited_lines_are_classified() {
    let device = SimulatedGcodeDevice::new(Position::default());
    let handle = device.handle();
    let mut channel = channel_for(device);

    handle.push_output("echo:busy: processing");
    handle.push_output("Error:Printer halted. kill() called!");
    let lines = channel.drain().unwrap();

    let parser = MarlinResponseParser::new();
    assert_eq!(
        parser.parse_lines(&lines),
        vec![
            MarlinResponse::Busy("processing".to_string()),
            MarlinResponse::Error("Printer halted. kill() called!".to_string()),
        ]
    );
}

#[test]
fn test_closed_channel_closes_device() {
    let device = SimulatedGcodeDevice::new(Position::default());
    let handle = device.handle();
    let mut channel = channel_for(device);

    channel.close().unwrap();
    assert!(handle.is_closed());
    assert!(channel.send("M114").is_err());
}

#[test]
fn test_speed_and_limits_reach_device() {
    let device = SimulatedGcodeDevice::new(Position::default());
    let handle = device.handle();
    let mut channel = channel_for(device);

    channel
        .write_line(&MarlinCommand::max_feed_rate_for(&MachineProfile::ender3()).to_string())
        .unwrap();
    channel
        .write_line(&MarlinCommand::SetFeedRate { mm_per_min: 8000.0 }.to_string())
        .unwrap();

    assert_eq!(handle.max_feed_rates(), Some((166.67, 166.67, 25.0)));
    assert_eq!(handle.feed_rate(), Some(8000.0));
}

proptest! {
    #[test]
    fn prop_reported_positions_parse_to_two_decimals(
        x in 0u32..23_500,
        y in 0u32..23_500,
        z in 0u32..15_000,
    ) {
        let expected = Position::new(x as f64 / 100.0, y as f64 / 100.0, z as f64 / 100.0);
        let device = SimulatedGcodeDevice::new(expected);
        let mut channel = channel_for(device);

        let lines = channel.write_line("M114").unwrap();
        let reported = find_position(&lines).unwrap();
        prop_assert!(reported.distance_to(&expected) < 1e-9);
    }
}
