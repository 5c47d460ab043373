//! Scheduler configuration and timeline construction options.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Position value meaning "no initial position requested".
pub const UNSET_POSITION: f64 = -1.0;

/// Configuration shared by every tween and timeline a scheduler creates.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Width of one interpolation step, in the clock's time unit.
    /// Ticks that quantize to the step already applied skip interpolation.
    pub step_resolution: f64,

    /// Easing used by keyframes that do not name one.
    pub default_ease: Easing,

    /// Maximum events retained per timeline before older ones are dropped.
    pub max_events: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            step_resolution: 1.0,
            default_ease: Easing::Linear,
            max_events: 256,
        }
    }
}

impl Config {
    /// Quantize a position into an interpolation step index.
    #[inline]
    pub fn step_of(&self, position: f64) -> i64 {
        if self.step_resolution > 0.0 {
            (position / self.step_resolution).floor() as i64
        } else {
            position.to_bits() as i64
        }
    }
}

/// Options recognized when constructing a timeline.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimelineOptions {
    /// Restart at 0 when the end position is reached.
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Initial play state.
    pub paused: bool,
    /// Initial seek offset; negative means unset.
    pub position: f64,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            looping: false,
            paused: false,
            position: UNSET_POSITION,
        }
    }
}

impl TimelineOptions {
    /// Initial position if one was requested.
    #[inline]
    pub fn initial_position(&self) -> Option<f64> {
        (self.position >= 0.0).then_some(self.position)
    }
}
