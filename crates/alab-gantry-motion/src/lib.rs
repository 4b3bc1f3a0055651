//! # ALab Gantry Motion
//!
//! The motion controller of a G-code gantry: target validation against the
//! machine profile, z-hop waypoint planning, speed control and the blocking
//! move-and-confirm protocol that keeps the position tracker honest.

pub mod gantry;
pub mod planner;
pub mod speed;
pub mod state;
pub mod tracker;

pub use gantry::Gantry;
pub use planner::{hop_ceiling, plan_move};
pub use speed::SpeedSetting;
pub use state::GantryState;
pub use tracker::PositionTracker;
