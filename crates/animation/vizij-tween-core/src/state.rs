//! State segments: every motion changed during one keyframe interval.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::motion::TweenMotion;

/// One keyframe interval of a tween.
///
/// The segment owns `[start, end)`: the instant `end` belongs to the next
/// segment. Allocated once when a tween is built and re-keyed in place with
/// [`TweenState::initialize`] / [`TweenState::copy_from`]; never resized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TweenState {
    motions: Vec<TweenMotion>,
    start: f64,
    end: f64,
}

impl TweenState {
    pub fn new(motions: Vec<TweenMotion>) -> Self {
        Self {
            motions,
            start: 0.0,
            end: 0.0,
        }
    }

    /// Key the segment at `time` for `duration`, re-keying every motion with the same window.
    pub fn initialize(&mut self, time: f64, duration: f64, ease: Easing) {
        self.start = time;
        self.end = time + duration;
        for motion in &mut self.motions {
            motion.initialize(time, duration, ease);
        }
    }

    /// `time < end`.
    #[inline]
    pub fn contain(&self, time: f64) -> bool {
        time < self.end
    }

    /// Index access; callers guarantee `index < len()`.
    #[inline]
    pub fn get(&self, index: usize) -> &TweenMotion {
        &self.motions[index]
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut TweenMotion {
        &mut self.motions[index]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.motions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }

    #[inline]
    pub fn motions(&self) -> &[TweenMotion] {
        &self.motions
    }

    #[inline]
    pub fn motions_mut(&mut self) -> &mut [TweenMotion] {
        &mut self.motions
    }

    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Deep copy of `other` into this segment's existing motions.
    pub fn copy_from(&mut self, other: &TweenState) {
        debug_assert_eq!(self.motions.len(), other.motions.len(), "state segments are never resized");
        for (dst, src) in self.motions.iter_mut().zip(other.motions.iter()) {
            dst.copy_from(src);
        }
        self.start = other.start;
        self.end = other.end;
    }

    /// Escalate `seek` when `position` lands exactly on this segment's boundary.
    #[inline]
    pub fn rewrite_seek(&self, seek: bool, position: f64) -> bool {
        seek || position == self.start || position == self.end
    }

    /// False only when the step is unchanged and nothing forces a seek.
    #[inline]
    pub fn need_interpolate(&self, seek: bool, step: i64, previous: i64) -> bool {
        seek || step != previous
    }
}
