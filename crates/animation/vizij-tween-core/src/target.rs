//! Tween capability contract.
//!
//! Anything animatable implements [`TweenTarget`]. The scheduler only ever
//! sees targets through this trait (as `Rc<RefCell<dyn TweenTarget>>`), so
//! concrete renderable types depend on this module and never the other way
//! around.
//!
//! Operations that hand the target itself to its tweens (`play_tweens`,
//! `update_tweens`, ...) are free functions over `&mut dyn TweenTarget` so
//! that they work on trait objects.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::ids::TargetId;
use crate::list::CowList;
use crate::motion::{
    MotionKind, PropertyMask, TweenMotion, TRANSFORM_ROTATION, TRANSFORM_SCALE_X,
    TRANSFORM_SCALE_Y, TRANSFORM_X, TRANSFORM_Y,
};
use crate::tween::TweenHandle;
use crate::value::{GraphicsHandle, PropertyValue};

/// Shared, externally owned target.
pub type TargetRef = Rc<RefCell<dyn TweenTarget>>;
/// Non-owning reference held by tweens and timelines.
pub type WeakTarget = Weak<RefCell<dyn TweenTarget>>;

/// How a tween derives its position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum PlayMode {
    /// Advances from its own base time.
    #[default]
    Independent = 0,
    /// Holds a single position and never advances.
    Single = 1,
    /// Mirrors the position of a leader tween.
    Synched = 2,
}

/// Identity of a (possibly dangling) target reference.
#[inline]
pub(crate) fn target_addr(target: &WeakTarget) -> *const () {
    Weak::as_ptr(target) as *const ()
}

/// Drawable properties a target can attach; the default property sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawableProps {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub alpha: f64,
    pub visible: bool,
    pub text: String,
    pub graphics: Option<GraphicsHandle>,
}

impl Default for DrawableProps {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            alpha: 1.0,
            visible: true,
            text: String::new(),
            graphics: None,
        }
    }
}

impl DrawableProps {
    fn transform_fields(&mut self) -> [(usize, &mut f64); 5] {
        [
            (TRANSFORM_X, &mut self.x),
            (TRANSFORM_Y, &mut self.y),
            (TRANSFORM_SCALE_X, &mut self.scale_x),
            (TRANSFORM_SCALE_Y, &mut self.scale_y),
            (TRANSFORM_ROTATION, &mut self.rotation),
        ]
    }

    /// Write the masked properties of `motion` at its current ratio.
    pub fn apply_motion(&mut self, motion: &TweenMotion, mask: PropertyMask) {
        match motion.kind() {
            MotionKind::Transform => {
                for (index, field) in self.transform_fields() {
                    if mask.contains(index) {
                        if let Some(v) = motion.number(index) {
                            *field = v;
                        }
                    }
                }
            }
            MotionKind::Alpha => {
                if let Some(v) = motion.number(0).filter(|_| mask.contains(0)) {
                    self.alpha = v;
                }
            }
            MotionKind::Visible => {
                if let Some(v) = motion.binary(0).filter(|_| mask.contains(0)) {
                    self.visible = v;
                }
            }
            MotionKind::Text => {
                if let Some(v) = motion.text_value(0).filter(|_| mask.contains(0)) {
                    self.text.clear();
                    self.text.push_str(v);
                }
            }
            MotionKind::Graphics => {
                if let Some(v) = motion.graphics_value(0).filter(|_| mask.contains(0)) {
                    self.graphics = v;
                }
            }
            MotionKind::Custom(name) => {
                log::trace!("drawable ignores custom motion '{name}'");
            }
        }
    }

    /// Copy the current property values into the start endpoints of `motion`.
    pub fn capture_motion(&self, motion: &mut TweenMotion) {
        let values: Vec<PropertyValue> = match motion.kind() {
            MotionKind::Transform => vec![
                PropertyValue::Number(self.x),
                PropertyValue::Number(self.y),
                PropertyValue::Number(self.scale_x),
                PropertyValue::Number(self.scale_y),
                PropertyValue::Number(self.rotation),
            ],
            MotionKind::Alpha => vec![PropertyValue::Number(self.alpha)],
            MotionKind::Visible => vec![PropertyValue::Binary(self.visible)],
            MotionKind::Text => vec![PropertyValue::Text(self.text.clone())],
            MotionKind::Graphics => vec![PropertyValue::Graphics(self.graphics)],
            MotionKind::Custom(_) => Vec::new(),
        };
        for (index, value) in values.iter().enumerate().take(motion.len()) {
            motion.property_mut(index).set_start_from(value);
        }
    }
}

/// Tween bookkeeping every target embeds.
#[derive(Debug, Default)]
pub struct TweenTargetState {
    tweens: CowList<TweenHandle>,
    play_mode: PlayMode,
    off: bool,
    drawable: Option<DrawableProps>,
}

impl TweenTargetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered tweens, in registration order.
    #[inline]
    pub fn tweens(&self) -> &[TweenHandle] {
        self.tweens.as_slice()
    }

    #[inline]
    pub fn drawable(&self) -> Option<&DrawableProps> {
        self.drawable.as_ref()
    }

    #[inline]
    pub fn drawable_mut(&mut self) -> Option<&mut DrawableProps> {
        self.drawable.as_mut()
    }

    /// Attached drawable, attaching default properties first if there is none.
    pub fn drawable_or_default(&mut self) -> &mut DrawableProps {
        self.drawable.get_or_insert_with(DrawableProps::default)
    }
}

/// The capability set of an animatable object.
pub trait TweenTarget {
    /// Stable numeric identity.
    fn target_id(&self) -> TargetId;

    fn tween_state(&self) -> &TweenTargetState;

    fn tween_state_mut(&mut self) -> &mut TweenTargetState;

    /// Copy the target's current property values into `motion`.
    fn get_tween_motion(&self, motion: &mut TweenMotion) {
        if let Some(drawable) = self.tween_state().drawable.as_ref() {
            drawable.capture_motion(motion);
        }
    }

    /// Apply the masked properties of `motion` at its current ratio.
    fn set_tween_motion(&mut self, motion: &TweenMotion, mask: PropertyMask) {
        if let Some(drawable) = self.tween_state_mut().drawable.as_mut() {
            drawable.apply_motion(motion, mask);
        }
    }

    /// Register a tween; returns false if it was already registered.
    fn register_tween(&mut self, tween: TweenHandle) -> bool {
        let state = self.tween_state_mut();
        if state.tweens.iter().any(|t| Rc::ptr_eq(t, &tween)) {
            return false;
        }
        state.tweens.push(tween);
        true
    }

    fn unregister_tween(&mut self, tween: &TweenHandle) -> bool {
        self.tween_state_mut()
            .tweens
            .remove_first(|t| Rc::ptr_eq(t, tween))
            .is_some()
    }

    /// Detach every registered tween.
    fn reset_tweens(&mut self) {
        self.tween_state_mut().tweens.clear();
    }

    /// Whether any registered tween is still playing.
    fn has_active_tweens(&self) -> bool {
        self.tween_state().tweens.iter().any(|t| match t.try_borrow() {
            Ok(t) => t.is_playing() && !t.is_ended(),
            // Borrowed elsewhere means it is being updated right now.
            Err(_) => true,
        })
    }

    fn play_mode(&self) -> PlayMode {
        self.tween_state().play_mode
    }

    /// Set the play mode of the target and every registered tween.
    fn set_play_mode(&mut self, mode: PlayMode) {
        let state = self.tween_state_mut();
        state.play_mode = mode;
        for tween in state.tweens.iter() {
            match tween.try_borrow_mut() {
                Ok(mut t) => t.set_play_mode(mode),
                Err(_) => log::warn!("play mode change skipped a tween that is being updated"),
            }
        }
    }

    /// A target that is off keeps its tweens' clocks but receives no property writes.
    fn is_off(&self) -> bool {
        self.tween_state().off
    }

    fn set_off(&mut self, off: bool) {
        self.tween_state_mut().off = off;
    }

    fn attach_drawable(&mut self, drawable: DrawableProps) {
        self.tween_state_mut().drawable = Some(drawable);
    }

    fn detach_drawable(&mut self) -> Option<DrawableProps> {
        self.tween_state_mut().drawable.take()
    }

    fn drawable(&self) -> Option<&DrawableProps> {
        self.tween_state().drawable.as_ref()
    }
}

/// Start every registered tween at `time`.
pub fn play_tweens(target: &mut dyn TweenTarget, time: f64) {
    for tween in target.tween_state().tweens.snapshot().iter() {
        match tween.try_borrow_mut() {
            Ok(mut t) => t.play_tween(time),
            Err(_) => log::warn!("{}: play skipped a tween that is being updated", target.target_id()),
        }
    }
}

/// Stop every registered tween at `time`.
pub fn stop_tweens(target: &mut dyn TweenTarget, time: f64) {
    for tween in target.tween_state().tweens.snapshot().iter() {
        match tween.try_borrow_mut() {
            Ok(mut t) => t.stop_tween(time),
            Err(_) => log::warn!("{}: stop skipped a tween that is being updated", target.target_id()),
        }
    }
}

/// Advance every registered tween to `time`; returns whether any is still active.
pub fn update_tweens(target: &mut dyn TweenTarget, time: f64) -> bool {
    let snapshot = target.tween_state_mut().tweens.lock();
    let mut active = false;
    for tween in snapshot.iter() {
        match tween.try_borrow_mut() {
            Ok(mut t) => active |= t.update_on(time, PlayMode::Independent, -1.0, target),
            Err(_) => {
                log::warn!("{}: update skipped a tween that is being updated", target.target_id());
                active = true;
            }
        }
    }
    target.tween_state_mut().tweens.unlock();
    active
}

/// Seek every registered tween to the absolute `position`.
pub fn set_tween_position(target: &mut dyn TweenTarget, position: f64) {
    let snapshot = target.tween_state().tweens.snapshot();
    for tween in snapshot.iter() {
        match tween.try_borrow_mut() {
            Ok(mut t) => {
                t.update_on(0.0, PlayMode::Independent, position.max(0.0), target);
            }
            Err(_) => log::warn!("{}: seek skipped a tween that is being updated", target.target_id()),
        }
    }
}

/// Make every tween of `target` follow the first tween of `leader`, shifted by `offset`.
///
/// Returns false when the leader has no tween to follow.
pub fn synchronize(target: &mut dyn TweenTarget, leader: &dyn TweenTarget, offset: f64) -> bool {
    let Some(lead) = leader.tween_state().tweens().first().cloned() else {
        return false;
    };
    for tween in target.tween_state().tweens.snapshot().iter() {
        if Rc::ptr_eq(tween, &lead) {
            continue;
        }
        match tween.try_borrow_mut() {
            Ok(mut t) => t.synchronize(&lead, offset),
            Err(_) => log::warn!("{}: synchronize skipped a tween that is being updated", target.target_id()),
        }
    }
    target.tween_state_mut().play_mode = PlayMode::Synched;
    log::debug!("{} synchronized to {}", target.target_id(), leader.target_id());
    true
}
