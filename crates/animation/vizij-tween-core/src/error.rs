//! Error types for the tween scheduler

use serde::{Deserialize, Serialize};

/// Recoverable errors raised by timeline and loader operations.
///
/// Programmer errors (adding zero tweens, locking a list twice) are debug
/// assertions instead; per-frame glitches such as a dropped target are logged
/// and skipped so that a running timeline never stops on them.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TweenError {
    /// Label not present in the timeline's label table
    #[error("Unknown label: {name}")]
    UnknownLabel { name: String },

    /// Position is negative or not finite
    #[error("Invalid position: {position}")]
    InvalidPosition { position: f64 },

    /// Keyframe duration is negative or not finite
    #[error("Invalid duration: {duration}")]
    InvalidDuration { duration: f64 },

    /// Property pair whose endpoints are of different kinds
    #[error("Property type mismatch: start is {start}, end is {end}")]
    PropertyMismatch { start: String, end: String },

    /// The target a tween animates has been dropped
    #[error("Target dropped for tween {tween}")]
    TargetDropped { tween: u32 },

    /// Target key could not be resolved while building a stored timeline
    #[error("Unresolved target: {key}")]
    UnresolvedTarget { key: String },

    /// Malformed stored timeline document
    #[error("Parse error: {reason}")]
    Parse { reason: String },

    /// Generic scheduler error
    #[error("Tween error: {message}")]
    Generic { message: String },
}

impl TweenError {
    /// Create a new generic error
    pub fn new(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownLabel { .. } | Self::InvalidPosition { .. } => "seek",
            Self::InvalidDuration { .. } | Self::PropertyMismatch { .. } => "validation",
            Self::TargetDropped { .. } | Self::UnresolvedTarget { .. } => "target",
            Self::Parse { .. } => "serialization",
            Self::Generic { .. } => "generic",
        }
    }
}

impl From<serde_json::Error> for TweenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}

/// Tween scheduler result type
pub type Result<T> = core::result::Result<T, TweenError>;
