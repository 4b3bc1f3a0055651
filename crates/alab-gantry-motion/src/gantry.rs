//! Gantry motion controller
//!
//! A [`Gantry`] is one device session: it owns the line channel, the
//! position tracker and the speed setting of a single physical gantry.
//! Every operation blocks until the device has confirmed it, the timeout
//! of the machine profile has elapsed, or an error occurred.
//!
//! Moves follow the move-and-confirm protocol:
//! 1. send `G0` to the target,
//! 2. send `M400` and `M118 E1 <tag>` with a tag unique to this wait,
//! 3. poll until `echo:<tag>` arrives, then query `M114` and accept the
//!    move once the reported position is strictly within tolerance.
//!
//! The tracker is refreshed from the device even when a move times out.

use crate::planner::plan_move;
use crate::speed::SpeedSetting;
use crate::state::GantryState;
use crate::tracker::PositionTracker;
use alab_gantry_communication::{
    find_position, is_echo_of, new_echo_tag, ConnectionParams, LineChannel, MarlinCommand,
    MarlinResponse, MarlinResponseParser,
};
use alab_gantry_core::{
    Axis, ConnectionError, MachineProfile, MotionError, Position, Result, TargetPosition,
    WaypointLookup,
};
use std::thread;
use std::time::{Duration, Instant};

/// A connected gantry session
#[derive(Debug)]
pub struct Gantry {
    channel: LineChannel,
    profile: MachineProfile,
    tracker: PositionTracker,
    speed: SpeedSetting,
    state: GantryState,
    parser: MarlinResponseParser,
}

impl Gantry {
    /// Start a session on an open channel.
    ///
    /// Sends the profile's feed-rate limits and default speed. The session
    /// starts unhomed whatever the device reports.
    pub fn connect(channel: LineChannel, profile: MachineProfile) -> Result<Self> {
        profile.validate()?;
        let speed = SpeedSetting::from_fraction(profile.default_speed, profile.max_xy_feed_rate)?;

        let mut gantry = Self {
            channel,
            profile,
            tracker: PositionTracker::new(),
            speed,
            state: GantryState::Unhomed,
            parser: MarlinResponseParser::new(),
        };

        gantry.command(&MarlinCommand::max_feed_rate_for(&gantry.profile))?;
        gantry.set_speed(gantry.profile.default_speed)?;

        tracing::info!(
            "Connected to {} on {}",
            gantry.profile.name,
            gantry.channel.port_name().unwrap_or_default()
        );
        Ok(gantry)
    }

    /// Open a serial port and start a session on it
    pub fn open(params: &ConnectionParams, profile: MachineProfile) -> Result<Self> {
        let channel = LineChannel::open(params, profile.polling_delay())?;
        Self::connect(channel, profile)
    }

    /// Close the link; later commands fail with `NotConnected`
    pub fn disconnect(&mut self) -> Result<()> {
        if self.channel.is_open() {
            tracing::info!("Disconnecting from {}", self.profile.name);
        }
        self.channel.close()
    }

    /// Whether the link is still open
    pub fn is_connected(&self) -> bool {
        self.channel.is_open()
    }

    /// The machine profile of this session
    pub fn profile(&self) -> &MachineProfile {
        &self.profile
    }

    /// Current motion state
    pub fn state(&self) -> GantryState {
        self.state
    }

    /// Believed position; `None` until homed
    pub fn position(&self) -> Option<Position> {
        self.tracker.get()
    }

    /// Whether the gantry has been homed
    pub fn is_homed(&self) -> bool {
        self.tracker.is_homed()
    }

    /// Speed as a fraction of the maximum X/Y feed rate
    pub fn speed(&self) -> f64 {
        self.speed.fraction()
    }

    /// Speed in mm/min, rounded to 3 decimals
    pub fn speed_mm_per_min(&self) -> f64 {
        self.speed.mm_per_min()
    }

    /// Set the speed as a fraction in `(0, 1]` and send it to the device
    pub fn set_speed(&mut self, fraction: f64) -> Result<()> {
        let speed = SpeedSetting::from_fraction(fraction, self.profile.max_xy_feed_rate)?;
        self.apply_speed(speed)
    }

    /// Set the speed in mm/min, in `(0, max_xy_feed_rate]`
    pub fn set_speed_mm_per_min(&mut self, mm_per_min: f64) -> Result<()> {
        let speed = SpeedSetting::from_mm_per_min(mm_per_min, self.profile.max_xy_feed_rate)?;
        self.apply_speed(speed)
    }

    fn apply_speed(&mut self, speed: SpeedSetting) -> Result<()> {
        self.command(&speed.command())?;
        self.speed = speed;
        tracing::debug!("Speed set to {} mm/min", speed.mm_per_min());
        Ok(())
    }

    /// Home Z first, then all axes, then read back the position.
    ///
    /// When the profile flags it, a report equal to the limit corner means
    /// the firmware never actually homed; the session then stays unhomed.
    pub fn home(&mut self) -> Result<()> {
        tracing::info!("Homing {}", self.profile.name);
        self.command(&MarlinCommand::home_axis(Axis::Z))?;
        self.command(&MarlinCommand::home_all())?;

        let reported = self.query_position(self.profile.homing_timeout())?;
        if self.profile.is_unhomed_marker(&reported) {
            tracing::warn!(
                "Device reports the limit corner {} after homing; still unhomed",
                reported
            );
            self.tracker.clear();
            self.state = GantryState::Unhomed;
            return Ok(());
        }

        self.tracker.set(reported);
        self.state = GantryState::Idle;
        tracing::info!("Homed at {}", reported);
        Ok(())
    }

    /// Home a single axis.
    ///
    /// The position is only taken over when the gantry was already homed;
    /// one axis alone never establishes a trusted position.
    pub fn home_axis(&mut self, axis: Axis) -> Result<()> {
        tracing::info!("Homing {} axis", axis);
        self.command(&MarlinCommand::home_axis(axis))?;

        let reported = self.query_position(self.profile.homing_timeout())?;
        if self.tracker.is_homed() {
            self.tracker.set(reported);
        }
        Ok(())
    }

    /// Energise the steppers (`M17`)
    pub fn enable_steppers(&mut self) -> Result<()> {
        self.command(&MarlinCommand::EnableSteppers).map(|_| ())
    }

    /// Release the steppers (`M18`)
    pub fn disable_steppers(&mut self) -> Result<()> {
        self.command(&MarlinCommand::DisableSteppers).map(|_| ())
    }

    /// Ask the device where it is.
    ///
    /// The tracker is updated only when the gantry is homed; the reported
    /// position is returned either way.
    pub fn refresh_position(&mut self) -> Result<Position> {
        let reported = self.query_position(self.profile.timeout())?;
        if self.tracker.is_homed() {
            self.tracker.set(reported);
        }
        Ok(reported)
    }

    /// Resolve a partial target and check it against the axis limits.
    ///
    /// Performs no I/O and changes no state.
    pub fn validate_target(&self, target: impl Into<TargetPosition>) -> Result<Position> {
        let current = self.tracker.get().ok_or(MotionError::NotHomed)?;
        let resolved = target.into().resolve(&current);
        self.profile.check_within_limits(&resolved)?;
        Ok(resolved)
    }

    /// Move to an absolute target, optionally hopping over obstacles
    pub fn move_to(&mut self, target: impl Into<TargetPosition>, z_hop: bool) -> Result<()> {
        let target = self.validate_target(target)?;
        let current = self.tracker.get().ok_or(MotionError::NotHomed)?;

        let legs = plan_move(&current, &target, z_hop, &self.profile);
        tracing::debug!("Moving to {} in {} leg(s)", target, legs.len());
        for leg in legs {
            self.move_and_confirm(leg)?;
        }
        Ok(())
    }

    /// Move by an offset from the current position
    pub fn move_relative(&mut self, dx: f64, dy: f64, dz: f64, z_hop: bool) -> Result<()> {
        let current = self.tracker.get().ok_or(MotionError::NotHomed)?;
        self.move_to(current.offset(dx, dy, dz), z_hop)
    }

    /// Move through pre-planned targets without hopping.
    ///
    /// Every target is validated before the first command is sent. Unset
    /// components resolve against the position at the time each leg runs.
    pub fn move_sequence(&mut self, targets: &[TargetPosition]) -> Result<()> {
        for target in targets {
            self.validate_target(*target)?;
        }

        let mut last = None;
        for target in targets {
            let resolved = self.validate_target(*target)?;
            self.move_and_confirm(resolved)?;
            last = Some(resolved);
        }

        match last {
            Some(target) => self.wait_for_movement(target),
            None => Ok(()),
        }
    }

    /// Move to a named waypoint
    pub fn move_to_waypoint<W: WaypointLookup + ?Sized>(
        &mut self,
        waypoints: &W,
        name: &str,
        z_hop: bool,
    ) -> Result<()> {
        let target = waypoints
            .waypoint(name)
            .ok_or_else(|| MotionError::UnknownWaypoint {
                name: name.to_string(),
            })?;
        tracing::info!("Moving to waypoint {}", name);
        self.move_to(target, z_hop)
    }

    /// Send one command and return its non-acknowledgement replies
    fn command(&mut self, command: &MarlinCommand) -> Result<Vec<String>> {
        let lines = self.channel.write_line(&command.to_string())?;
        self.check_firmware(&lines)?;
        Ok(lines)
    }

    /// Fail on the first `Error:` line among `lines`
    fn check_firmware(&self, lines: &[String]) -> Result<()> {
        let error = self
            .parser
            .parse_lines(lines)
            .into_iter()
            .find_map(|response| match response {
                MarlinResponse::Error(message) => Some(message),
                _ => None,
            });
        match error {
            Some(message) => Err(ConnectionError::Firmware { message }.into()),
            None => Ok(()),
        }
    }

    /// Repeat `M114` until a complete report arrives or `limit` elapses
    fn query_position(&mut self, limit: Duration) -> Result<Position> {
        let start = Instant::now();
        loop {
            let lines = self.command(&MarlinCommand::ReportPosition)?;
            if let Some(position) = find_position(&lines) {
                return Ok(position);
            }
            if start.elapsed() >= limit {
                tracing::warn!("No position report within {:?}", limit);
                return Err(ConnectionError::PositionQueryTimeout {
                    timeout_ms: limit.as_millis() as u64,
                }
                .into());
            }
        }
    }

    /// Issue one absolute move and wait for its confirmation
    fn move_and_confirm(&mut self, target: Position) -> Result<()> {
        if self.tracker.get() == Some(target) {
            tracing::trace!("Already at {}", target);
            return Ok(());
        }

        self.command(&MarlinCommand::rapid_move(&target))?;
        self.wait_for_movement(target)
    }

    /// Flush the motion queue and poll until the device confirms `target`
    fn wait_for_movement(&mut self, target: Position) -> Result<()> {
        let timeout = self.profile.timeout();
        let polling_delay = self.profile.polling_delay();
        let tag = new_echo_tag();

        self.state = GantryState::Moving;
        self.channel.send(&MarlinCommand::FinishMoves.to_string())?;
        self.channel.send(&MarlinCommand::Echo { tag: tag.clone() }.to_string())?;

        let start = Instant::now();
        while start.elapsed() < timeout {
            thread::sleep(polling_delay);
            let lines = self.channel.drain()?;
            if let Err(e) = self.check_firmware(&lines) {
                return self.settle(Err(e));
            }
            if !lines.iter().any(|line| is_echo_of(line, &tag)) {
                continue;
            }

            let reported = match self.query_position(timeout) {
                Ok(position) => position,
                Err(e) if e.is_timeout() => {
                    tracing::warn!("Echo {} seen but position unavailable: {}", tag, e);
                    continue;
                }
                Err(e) => return self.settle(Err(e)),
            };

            self.tracker.set(reported);
            if reported.distance_to(&target) < self.profile.position_tolerance {
                return self.settle(Ok(()));
            }
            tracing::debug!("Reported {} is not within tolerance of {}", reported, target);
        }

        let last_position = match self.query_position(timeout) {
            Ok(position) => {
                self.tracker.set(position);
                Some(position)
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!("Could not refresh position after timeout: {}", e);
                None
            }
            Err(e) => return self.settle(Err(e)),
        };

        tracing::warn!(
            "Move to {} not confirmed within {:?} (last position {:?})",
            target,
            timeout,
            last_position
        );
        self.settle(Err(MotionError::MoveTimeout {
            target,
            last_position,
            timeout_ms: timeout.as_millis() as u64,
        }
        .into()))
    }

    /// Leave the moving state whatever the outcome
    fn settle(&mut self, outcome: Result<()>) -> Result<()> {
        self.state = if self.tracker.is_homed() {
            GantryState::Idle
        } else {
            GantryState::Unhomed
        };
        outcome
    }
}

impl Drop for Gantry {
    fn drop(&mut self) {
        if let Err(e) = self.channel.close() {
            tracing::debug!("Error closing channel on drop: {}", e);
        }
    }
}
