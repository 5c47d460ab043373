//! Easing curves applied to a segment's normalized time before interpolation.
//!
//! Every curve maps 0 to 0 and 1 to 1 exactly, so step-valued properties
//! still switch only at full completion.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "points", rename_all = "camelCase")]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    /// Holds 0 until completion.
    Step,
    /// CSS-style cubic bezier with control points (x1, y1, x2, y2).
    Bezier([f64; 4]),
}

impl Easing {
    /// Apply the curve to a normalized time.
    pub fn apply(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::Step => 0.0,
            Easing::Bezier([x1, y1, x2, y2]) => bezier_ease_t(t, *x1, *y1, *x2, *y2),
        }
    }
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
fn bezier_ease_t(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    // Bezier(0,0,1,1) is exactly linear
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    // Monotonic X in [0,1] assumed for x1/x2 in [0,1]
    let mut lo = 0.0f64;
    let mut hi = 1.0f64;
    let mut mid = t;
    for _ in 0..40 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-9 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}
