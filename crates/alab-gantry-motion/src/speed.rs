//! Speed settings
//!
//! Speed is held as a fraction of the profile's maximum X/Y feed rate and
//! sent to the firmware as a modal `G0 F<mm/min>` word.

use alab_gantry_communication::MarlinCommand;
use alab_gantry_core::MotionError;

fn round_to_thousandths(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A validated speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSetting {
    fraction: f64,
    max_feed_rate: f64,
}

impl SpeedSetting {
    /// Speed as a fraction of `max_feed_rate`, which must be in `(0, 1]`
    pub fn from_fraction(fraction: f64, max_feed_rate: f64) -> Result<Self, MotionError> {
        // Written so NaN falls through to the error
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(MotionError::InvalidSpeed {
                value: fraction,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self {
            fraction,
            max_feed_rate,
        })
    }

    /// Speed in mm/min, which must be in `(0, max_feed_rate]`
    pub fn from_mm_per_min(mm_per_min: f64, max_feed_rate: f64) -> Result<Self, MotionError> {
        if !(mm_per_min > 0.0 && mm_per_min <= max_feed_rate) {
            return Err(MotionError::InvalidSpeed {
                value: mm_per_min,
                min: 0.0,
                max: max_feed_rate,
            });
        }
        Self::from_fraction(mm_per_min / max_feed_rate, max_feed_rate)
    }

    /// Fraction of the maximum feed rate
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Feed rate in mm/min, rounded to 3 decimals
    pub fn mm_per_min(&self) -> f64 {
        round_to_thousandths(self.fraction * self.max_feed_rate)
    }

    /// The feed-rate command for this speed
    pub fn command(&self) -> MarlinCommand {
        MarlinCommand::SetFeedRate {
            mm_per_min: self.mm_per_min(),
        }
    }
}
