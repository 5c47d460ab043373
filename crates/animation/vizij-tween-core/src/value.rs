//! Interpolation values: one start/end pair per animated property.
//!
//! Numbers interpolate linearly. Booleans, strings and graphics are step
//! values: they report `end` only at ratio exactly 1 and `start` before, so a
//! toggled property (visibility, label text) never flickers mid-tween.

use serde::{Deserialize, Serialize};

/// Opaque reference to a composite graphics object owned by the renderer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct GraphicsHandle(pub u32);

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropertyKind {
    Number,
    Binary,
    Text,
    Graphics,
}

/// A resolved property value at some ratio.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum PropertyValue {
    Number(f64),
    Binary(bool),
    Text(String),
    Graphics(Option<GraphicsHandle>),
}

impl PropertyValue {
    #[inline]
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Number(_) => PropertyKind::Number,
            PropertyValue::Binary(_) => PropertyKind::Binary,
            PropertyValue::Text(_) => PropertyKind::Text,
            PropertyValue::Graphics(_) => PropertyKind::Graphics,
        }
    }
}

#[inline]
fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Start/end pair for a single property.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TweenProperty {
    Number { start: f64, end: f64, step: f64 },
    /// Booleans stored as 0/1.
    Binary { start: f64, end: f64 },
    Text { start: String, end: String },
    Graphics {
        start: Option<GraphicsHandle>,
        end: Option<GraphicsHandle>,
    },
}

impl Default for TweenProperty {
    fn default() -> Self {
        Self::number(0.0, 0.0)
    }
}

impl TweenProperty {
    pub fn number(start: f64, end: f64) -> Self {
        Self::Number {
            start,
            end,
            step: end - start,
        }
    }

    pub fn binary(start: bool, end: bool) -> Self {
        Self::Binary {
            start: flag(start),
            end: flag(end),
        }
    }

    pub fn text(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self::Text {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn graphics(start: Option<GraphicsHandle>, end: Option<GraphicsHandle>) -> Self {
        Self::Graphics { start, end }
    }

    /// Build a pair from two resolved values of the same kind.
    pub fn from_values(start: PropertyValue, end: PropertyValue) -> Option<Self> {
        match (start, end) {
            (PropertyValue::Number(s), PropertyValue::Number(e)) => Some(Self::number(s, e)),
            (PropertyValue::Binary(s), PropertyValue::Binary(e)) => Some(Self::binary(s, e)),
            (PropertyValue::Text(s), PropertyValue::Text(e)) => Some(Self::text(s, e)),
            (PropertyValue::Graphics(s), PropertyValue::Graphics(e)) => Some(Self::graphics(s, e)),
            _ => None,
        }
    }

    #[inline]
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Number { .. } => PropertyKind::Number,
            Self::Binary { .. } => PropertyKind::Binary,
            Self::Text { .. } => PropertyKind::Text,
            Self::Graphics { .. } => PropertyKind::Graphics,
        }
    }

    /// Whether start and end differ.
    pub fn is_animated(&self) -> bool {
        match self {
            Self::Number { step, .. } => *step != 0.0,
            Self::Binary { start, end } => start != end,
            Self::Text { start, end } => start != end,
            Self::Graphics { start, end } => start != end,
        }
    }

    pub fn set_number(&mut self, start: f64, end: f64) {
        *self = Self::number(start, end);
    }

    /// `start + ratio * (end - start)`; `None` for non-numeric pairs.
    #[inline]
    pub fn get_number(&self, ratio: f64) -> Option<f64> {
        match self {
            Self::Number { start, step, .. } => Some(start + ratio * step),
            _ => None,
        }
    }

    pub fn set_binary(&mut self, start: bool, end: bool) {
        *self = Self::binary(start, end);
    }

    #[inline]
    pub fn get_binary(&self, ratio: f64) -> Option<bool> {
        match self {
            Self::Binary { start, end } => {
                let v = if ratio == 1.0 { *end } else { *start };
                Some(v != 0.0)
            }
            _ => None,
        }
    }

    pub fn set_text(&mut self, start: impl Into<String>, end: impl Into<String>) {
        *self = Self::text(start, end);
    }

    #[inline]
    pub fn get_text(&self, ratio: f64) -> Option<&str> {
        match self {
            Self::Text { start, end } => Some(if ratio == 1.0 { end } else { start }),
            _ => None,
        }
    }

    pub fn set_graphics(&mut self, start: Option<GraphicsHandle>, end: Option<GraphicsHandle>) {
        *self = Self::graphics(start, end);
    }

    #[inline]
    pub fn get_graphics(&self, ratio: f64) -> Option<Option<GraphicsHandle>> {
        match self {
            Self::Graphics { start, end } => Some(if ratio == 1.0 { *end } else { *start }),
            _ => None,
        }
    }

    /// Evaluate the pair at `ratio` whatever its kind.
    pub fn value(&self, ratio: f64) -> PropertyValue {
        match self {
            Self::Number { start, step, .. } => PropertyValue::Number(start + ratio * step),
            Self::Binary { start, end } => {
                let v = if ratio == 1.0 { *end } else { *start };
                PropertyValue::Binary(v != 0.0)
            }
            Self::Text { start, end } => {
                PropertyValue::Text(if ratio == 1.0 { end.clone() } else { start.clone() })
            }
            Self::Graphics { start, end } => {
                PropertyValue::Graphics(if ratio == 1.0 { *end } else { *start })
            }
        }
    }

    /// Overwrite the start endpoint, keeping the end. Returns false on a kind mismatch.
    pub fn set_start_from(&mut self, value: &PropertyValue) -> bool {
        match (self, value) {
            (Self::Number { start, end, step }, PropertyValue::Number(v)) => {
                *start = *v;
                *step = *end - *v;
                true
            }
            (Self::Binary { start, .. }, PropertyValue::Binary(v)) => {
                *start = flag(*v);
                true
            }
            (Self::Text { start, .. }, PropertyValue::Text(v)) => {
                start.clone_from(v);
                true
            }
            (Self::Graphics { start, .. }, PropertyValue::Graphics(v)) => {
                *start = *v;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_is_linear() {
        let p = TweenProperty::number(10.0, 30.0);
        assert_eq!(p.get_number(0.0), Some(10.0));
        assert_eq!(p.get_number(0.25), Some(15.0));
        assert_eq!(p.get_number(1.0), Some(30.0));
        assert_eq!(p.get_binary(0.5), None);
    }

    #[test]
    fn step_kinds_switch_only_at_one() {
        let b = TweenProperty::binary(false, true);
        assert_eq!(b.get_binary(0.0), Some(false));
        assert_eq!(b.get_binary(0.999_999), Some(false));
        assert_eq!(b.get_binary(1.0), Some(true));

        let t = TweenProperty::text("A", "B");
        assert_eq!(t.get_text(0.5), Some("A"));
        assert_eq!(t.get_text(1.0), Some("B"));

        let g = TweenProperty::graphics(None, Some(GraphicsHandle(4)));
        assert_eq!(g.get_graphics(0.9), Some(None));
        assert_eq!(g.get_graphics(1.0), Some(Some(GraphicsHandle(4))));
    }

    #[test]
    fn set_start_from_keeps_end() {
        let mut p = TweenProperty::number(0.0, 100.0);
        assert!(p.set_start_from(&PropertyValue::Number(50.0)));
        assert_eq!(p.get_number(0.5), Some(75.0));
        assert!(!p.set_start_from(&PropertyValue::Binary(true)));
    }

    #[test]
    fn from_values_rejects_mixed_kinds() {
        assert!(TweenProperty::from_values(
            PropertyValue::Number(1.0),
            PropertyValue::Text("x".into())
        )
        .is_none());
        let p = TweenProperty::from_values(PropertyValue::Binary(true), PropertyValue::Binary(false))
            .unwrap();
        assert_eq!(p.kind(), PropertyKind::Binary);
        assert!(p.is_animated());
    }
}
