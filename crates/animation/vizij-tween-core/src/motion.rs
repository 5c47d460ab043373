//! Motion snapshots: the interpolation endpoints of one named property set
//! over one keyframe interval.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::value::{GraphicsHandle, PropertyValue, TweenProperty};

/// Property indices of a [`MotionKind::Transform`] motion.
pub const TRANSFORM_X: usize = 0;
pub const TRANSFORM_Y: usize = 1;
pub const TRANSFORM_SCALE_X: usize = 2;
pub const TRANSFORM_SCALE_Y: usize = 3;
pub const TRANSFORM_ROTATION: usize = 4;
pub const TRANSFORM_LEN: usize = 5;

/// Named property set a motion animates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MotionKind {
    /// x, y, scale x, scale y, rotation
    Transform,
    Alpha,
    Visible,
    Text,
    Graphics,
    /// Host-defined property set; interpretation is up to the target.
    Custom(String),
}

/// Bit set selecting which properties of a motion to apply.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyMask(pub u32);

impl PropertyMask {
    pub const NONE: PropertyMask = PropertyMask(0);
    pub const ALL: PropertyMask = PropertyMask(u32::MAX);

    /// Largest number of properties a mask can address.
    pub const CAPACITY: usize = 32;

    #[inline]
    pub fn bit(index: usize) -> Self {
        debug_assert!(index < Self::CAPACITY, "property index {index} out of mask range");
        PropertyMask(1u32 << index)
    }

    #[inline]
    pub fn contains(self, index: usize) -> bool {
        index < Self::CAPACITY && self.0 & (1u32 << index) != 0
    }

    #[inline]
    pub fn insert(&mut self, index: usize) {
        self.0 |= Self::bit(index).0;
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A fixed-length bundle of property pairs with its time window and easing.
///
/// The owning tween stores the eased ratio of the current position in the
/// motion before handing it to a target, so targets read interpolated values
/// through [`TweenMotion::number`] and friends without knowing the clock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TweenMotion {
    kind: MotionKind,
    properties: Vec<TweenProperty>,
    start: f64,
    end: f64,
    ease: Easing,
    #[serde(skip)]
    ratio: f64,
}

impl TweenMotion {
    pub fn new(kind: MotionKind, properties: Vec<TweenProperty>) -> Self {
        debug_assert!(
            properties.len() <= PropertyMask::CAPACITY,
            "a motion holds at most {} properties",
            PropertyMask::CAPACITY
        );
        Self {
            kind,
            properties,
            start: 0.0,
            end: 0.0,
            ease: Easing::Linear,
            ratio: 0.0,
        }
    }

    /// Transform motion from (x, y, scale x, scale y, rotation) start and end tuples.
    pub fn transform(from: [f64; TRANSFORM_LEN], to: [f64; TRANSFORM_LEN]) -> Self {
        let properties = from
            .iter()
            .zip(to.iter())
            .map(|(s, e)| TweenProperty::number(*s, *e))
            .collect();
        Self::new(MotionKind::Transform, properties)
    }

    pub fn alpha(from: f64, to: f64) -> Self {
        Self::new(MotionKind::Alpha, vec![TweenProperty::number(from, to)])
    }

    pub fn visible(from: bool, to: bool) -> Self {
        Self::new(MotionKind::Visible, vec![TweenProperty::binary(from, to)])
    }

    pub fn text(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(MotionKind::Text, vec![TweenProperty::text(from, to)])
    }

    pub fn graphics(from: Option<GraphicsHandle>, to: Option<GraphicsHandle>) -> Self {
        Self::new(MotionKind::Graphics, vec![TweenProperty::graphics(from, to)])
    }

    /// Re-key the motion's window. Properties are left untouched.
    pub fn initialize(&mut self, time: f64, duration: f64, ease: Easing) {
        self.start = time;
        self.end = time + duration;
        self.ease = ease;
        self.ratio = 0.0;
    }

    /// Copy every property pair, window and easing from `other` in place.
    pub fn copy_from(&mut self, other: &TweenMotion) {
        debug_assert_eq!(
            self.properties.len(),
            other.properties.len(),
            "motion snapshots are never resized"
        );
        self.kind.clone_from(&other.kind);
        for (dst, src) in self.properties.iter_mut().zip(other.properties.iter()) {
            dst.clone_from(src);
        }
        self.start = other.start;
        self.end = other.end;
        self.ease = other.ease;
        self.ratio = other.ratio;
    }

    #[inline]
    pub fn kind(&self) -> &MotionKind {
        &self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    #[inline]
    pub fn property(&self, index: usize) -> &TweenProperty {
        &self.properties[index]
    }

    #[inline]
    pub fn property_mut(&mut self, index: usize) -> &mut TweenProperty {
        &mut self.properties[index]
    }

    #[inline]
    pub fn properties(&self) -> &[TweenProperty] {
        &self.properties
    }

    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.end
    }

    #[inline]
    pub fn ease(&self) -> Easing {
        self.ease
    }

    /// Eased ratio stored by the last [`TweenMotion::update`].
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Eased ratio of `position` within the window, without storing it.
    pub fn compute_ratio(&self, position: f64) -> f64 {
        let span = self.end - self.start;
        if span <= 0.0 {
            return if position >= self.end { 1.0 } else { 0.0 };
        }
        self.ease.apply((position - self.start) / span)
    }

    /// Store the eased ratio for `position` and return it.
    pub fn update(&mut self, position: f64) -> f64 {
        self.ratio = self.compute_ratio(position);
        self.ratio
    }

    /// Mask of the properties whose endpoints differ.
    pub fn animated_mask(&self) -> PropertyMask {
        let mut mask = PropertyMask::NONE;
        for (i, p) in self.properties.iter().enumerate() {
            if p.is_animated() {
                mask.insert(i);
            }
        }
        mask
    }

    #[inline]
    pub fn value(&self, index: usize) -> PropertyValue {
        self.properties[index].value(self.ratio)
    }

    #[inline]
    pub fn number(&self, index: usize) -> Option<f64> {
        self.properties.get(index)?.get_number(self.ratio)
    }

    #[inline]
    pub fn binary(&self, index: usize) -> Option<bool> {
        self.properties.get(index)?.get_binary(self.ratio)
    }

    #[inline]
    pub fn text_value(&self, index: usize) -> Option<&str> {
        self.properties.get(index)?.get_text(self.ratio)
    }

    #[inline]
    pub fn graphics_value(&self, index: usize) -> Option<Option<GraphicsHandle>> {
        self.properties.get(index)?.get_graphics(self.ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_follows_window_and_ease() {
        let mut m = TweenMotion::alpha(0.0, 1.0);
        m.initialize(100.0, 200.0, Easing::Linear);
        assert_eq!(m.compute_ratio(100.0), 0.0);
        assert_eq!(m.update(200.0), 0.5);
        assert_eq!(m.number(0), Some(0.5));
        assert_eq!(m.compute_ratio(400.0), 1.0);
    }

    #[test]
    fn zero_length_window_jumps_at_end() {
        let mut m = TweenMotion::visible(false, true);
        m.initialize(50.0, 0.0, Easing::Linear);
        assert_eq!(m.compute_ratio(49.0), 0.0);
        m.update(50.0);
        assert_eq!(m.binary(0), Some(true));
    }

    #[test]
    fn copy_from_keeps_length_and_takes_values() {
        let mut a = TweenMotion::transform([0.0; 5], [1.0; 5]);
        let mut b = TweenMotion::transform([10.0; 5], [20.0, 10.0, 10.0, 10.0, 10.0]);
        b.initialize(0.0, 100.0, Easing::QuadIn);
        a.copy_from(&b);
        assert_eq!(a.len(), TRANSFORM_LEN);
        assert_eq!(a, b);
        assert_eq!(a.animated_mask(), PropertyMask::bit(TRANSFORM_X));
    }

    #[test]
    fn mask_bits() {
        let mut mask = PropertyMask::NONE;
        assert!(mask.is_empty());
        mask.insert(3);
        assert!(mask.contains(3));
        assert!(!mask.contains(2));
        assert!(PropertyMask::ALL.contains(31));
        assert!(!PropertyMask::ALL.contains(32));
    }
}
