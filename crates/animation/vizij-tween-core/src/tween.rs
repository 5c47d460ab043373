//! Tween controller: drives one target through chronological state segments.
//!
//! Methods:
//! - push_state (build), play_tween / stop_tween (clock), update / update_on (advance + apply),
//!   set_position (seek), synchronize (follow a leader), capture_start (pull target values)

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::{Config, UNSET_POSITION};
use crate::easing::Easing;
use crate::error::{Result, TweenError};
use crate::ids::{TargetId, TweenId};
use crate::motion::PropertyMask;
use crate::state::TweenState;
use crate::target::{PlayMode, TargetRef, TweenTarget, WeakTarget};

/// Shared tween, owned by timelines and registered on targets.
pub type TweenHandle = Rc<RefCell<Tween>>;

pub(crate) fn fmod(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Segment selected by an advance, and whether it must be applied in full.
#[derive(Copy, Clone, Debug)]
struct Frame {
    state: usize,
    seek: bool,
}

#[derive(Debug)]
pub struct Tween {
    id: TweenId,
    target: WeakTarget,
    target_id: TargetId,
    proxy: Option<WeakTarget>,
    states: Vec<TweenState>,
    duration: f64,
    cfg: Config,

    looping: bool,
    initial_position: f64,
    position: f64,
    base_time: Option<f64>,
    playing: bool,
    ended: bool,
    play_mode: PlayMode,

    // Synched mode
    leader: Option<Weak<RefCell<Tween>>>,
    sync_offset: f64,

    // Interpolation gate
    previous_step: Option<i64>,
    current_state: Option<usize>,
    single_applied: bool,
}

impl Tween {
    pub fn new(id: TweenId, target: &TargetRef, cfg: Config) -> Self {
        let target_id = target.borrow().target_id();
        Self {
            id,
            target: Rc::downgrade(target),
            target_id,
            proxy: None,
            states: Vec::new(),
            duration: 0.0,
            cfg,
            looping: false,
            initial_position: UNSET_POSITION,
            position: 0.0,
            base_time: None,
            playing: false,
            ended: false,
            play_mode: PlayMode::Independent,
            leader: None,
            sync_offset: 0.0,
            previous_step: None,
            current_state: None,
            single_applied: false,
        }
    }

    /// Wrap into a shared handle.
    pub fn into_handle(self) -> TweenHandle {
        Rc::new(RefCell::new(self))
    }

    /// Append a segment lasting `duration`, keyed at the current end of the tween.
    pub fn push_state(&mut self, duration: f64, ease: Easing, mut state: TweenState) -> Result<()> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(TweenError::InvalidDuration { duration });
        }
        state.initialize(self.duration, duration, ease);
        self.duration += duration;
        self.states.push(state);
        Ok(())
    }

    #[inline]
    pub fn id(&self) -> TweenId {
        self.id
    }

    #[inline]
    pub fn target_id(&self) -> TargetId {
        self.target_id
    }

    /// The driving target, if it is still alive.
    pub fn target(&self) -> Option<TargetRef> {
        self.target.upgrade()
    }

    pub(crate) fn weak_target(&self) -> &WeakTarget {
        &self.target
    }

    #[inline]
    pub fn states(&self) -> &[TweenState] {
        &self.states
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    #[inline]
    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Initial position, or `None` when unset.
    pub fn initial_position(&self) -> Option<f64> {
        (self.initial_position >= 0.0).then_some(self.initial_position)
    }

    /// Set the position playback starts from. Negative values unset it.
    pub fn set_initial_position(&mut self, position: f64) {
        if position >= 0.0 {
            self.initial_position = position;
            self.position = position;
            self.base_time = None;
        } else {
            self.initial_position = UNSET_POSITION;
        }
        self.single_applied = false;
    }

    #[inline]
    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        if self.play_mode != mode {
            log::debug!("{} play mode {:?} -> {:?}", self.id, self.play_mode, mode);
            self.play_mode = mode;
            self.single_applied = false;
            self.base_time = None;
        }
    }

    /// Route motions to `proxy` instead of the driving target; `None` clears it.
    pub fn set_proxy(&mut self, proxy: Option<&TargetRef>) {
        self.proxy = proxy.map(Rc::downgrade);
    }

    pub fn has_proxy(&self) -> bool {
        self.proxy.is_some()
    }

    /// Follow `leader`'s position minus `offset` and switch to synched mode.
    pub fn synchronize(&mut self, leader: &TweenHandle, offset: f64) {
        self.leader = Some(Rc::downgrade(leader));
        self.sync_offset = offset;
        self.set_play_mode(PlayMode::Synched);
    }

    pub fn leader(&self) -> Option<TweenHandle> {
        self.leader.as_ref().and_then(Weak::upgrade)
    }

    /// Start the clock at `time`, resuming from the current position.
    pub fn play_tween(&mut self, time: f64) {
        self.playing = true;
        self.base_time = Some(time - self.position);
        log::trace!("{} play at {time} from {}", self.id, self.position);
    }

    /// Stop the clock, keeping the position reached at `time`.
    pub fn stop_tween(&mut self, time: f64) {
        if self.playing && self.play_mode == PlayMode::Independent {
            if let Some(base) = self.base_time {
                self.position = self.wrap(time - base).0;
            }
        }
        self.playing = false;
        self.base_time = None;
        log::trace!("{} stop at {time} on {}", self.id, self.position);
    }

    /// Seek to the absolute `position` and apply it.
    pub fn set_position(&mut self, position: f64) -> Result<bool> {
        if !position.is_finite() || position < 0.0 {
            return Err(TweenError::InvalidPosition { position });
        }
        Ok(self.update(0.0, PlayMode::Independent, position))
    }

    /// Whether the tween still needs clock ticks.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.ended
    }

    /// Advance to `time` (or seek when `position >= 0`) and apply the result to
    /// the proxy or the driving target. Returns whether the tween is still active.
    pub fn update(&mut self, time: f64, mode: PlayMode, position: f64) -> bool {
        let Some(frame) = self.advance(time, mode, position) else {
            return self.is_active();
        };
        let sink = match self.proxy.as_ref() {
            Some(proxy) => match proxy.upgrade() {
                Some(proxy) => proxy,
                None => {
                    log::warn!("{}: proxy was dropped; skipped application", self.id);
                    return self.is_active();
                }
            },
            None => match self.target.upgrade() {
                Some(target) => target,
                None => {
                    log::warn!("{}: target {} was dropped; ending tween", self.id, self.target_id);
                    self.ended = true;
                    self.playing = false;
                    return self.is_active();
                }
            },
        };
        match sink.try_borrow_mut() {
            Ok(mut sink) => self.apply(frame, &mut *sink),
            Err(_) => log::warn!("{}: target {} is busy; skipped application", self.id, self.target_id),
        }
        self.is_active()
    }

    /// Like [`Tween::update`], applying to the already borrowed `target` unless a proxy is set.
    pub fn update_on(&mut self, time: f64, mode: PlayMode, position: f64, target: &mut dyn TweenTarget) -> bool {
        let Some(frame) = self.advance(time, mode, position) else {
            return self.is_active();
        };
        match self.proxy.as_ref() {
            Some(proxy) => match proxy.upgrade() {
                Some(proxy) => match proxy.try_borrow_mut() {
                    Ok(mut proxy) => self.apply(frame, &mut *proxy),
                    Err(_) => log::warn!("{}: proxy is busy; skipped application", self.id),
                },
                None => log::warn!("{}: proxy was dropped; skipped application", self.id),
            },
            None => self.apply(frame, target),
        }
        self.is_active()
    }

    /// Copy the driving target's current values into the start of the first segment.
    pub fn capture_start(&mut self) -> Result<()> {
        let target = self
            .target
            .upgrade()
            .ok_or(TweenError::TargetDropped { tween: self.id.0 })?;
        let target = target
            .try_borrow()
            .map_err(|_| TweenError::new(format!("{} is busy", self.target_id)))?;
        if let Some(first) = self.states.first_mut() {
            for motion in first.motions_mut() {
                target.get_tween_motion(motion);
            }
        }
        Ok(())
    }

    /// Where a playing independent tween stands at `time`, without updating it.
    /// `None` when the tween is not running on its own clock.
    fn clock_position(&self, time: f64) -> Option<(f64, bool)> {
        if !self.playing || self.play_mode != PlayMode::Independent || self.states.is_empty() {
            return None;
        }
        self.base_time.map(|base| self.wrap(time - base))
    }

    /// Loop-wrap or clamp a raw position; the flag reports reaching the end.
    fn wrap(&self, raw: f64) -> (f64, bool) {
        let raw = raw.max(0.0);
        if self.looping && self.duration > 0.0 {
            (fmod(raw, self.duration), false)
        } else if raw >= self.duration {
            (self.duration, true)
        } else {
            (raw, false)
        }
    }

    /// Resolve the new position and update motion ratios. `None` means nothing to apply.
    fn advance(&mut self, time: f64, mode: PlayMode, position: f64) -> Option<Frame> {
        if self.states.is_empty() {
            self.ended = true;
            self.playing = false;
            return None;
        }

        let (raw, mut seek) = if position >= 0.0 {
            if self.playing {
                self.base_time = None;
            }
            (position, true)
        } else {
            match self.play_mode {
                PlayMode::Independent if mode == PlayMode::Single => (self.position, false),
                PlayMode::Independent => {
                    if !self.playing {
                        return None;
                    }
                    let start = self.position;
                    let base = *self.base_time.get_or_insert(time - start);
                    (time - base, false)
                }
                PlayMode::Synched => {
                    let leader = self.leader.as_ref().and_then(Weak::upgrade);
                    let Some(leader) = leader else {
                        log::warn!("{}: synched without a live leader", self.id);
                        self.ended = true;
                        return None;
                    };
                    let Ok(leader) = leader.try_borrow() else {
                        return None;
                    };
                    // Leader's clock when it runs one; independent of update order.
                    let (leader_pos, leader_ended) = match leader.clock_position(time) {
                        Some(clock) if mode != PlayMode::Single => clock,
                        _ => (leader.position(), leader.is_ended()),
                    };
                    drop(leader);
                    let raw = leader_pos - self.sync_offset;
                    let (pos, _) = self.wrap(raw);
                    self.ended = leader_ended;
                    return self.select(pos, false);
                }
                PlayMode::Single => {
                    if self.single_applied {
                        return None;
                    }
                    self.single_applied = true;
                    (self.initial_position.max(0.0), true)
                }
            }
        };

        let (pos, reached_end) = self.wrap(raw);
        match self.play_mode {
            PlayMode::Single => self.ended = true,
            PlayMode::Synched => {}
            PlayMode::Independent => {
                if reached_end && !self.ended {
                    log::debug!("{} ended at {pos}", self.id);
                }
                self.ended = reached_end;
                if reached_end {
                    self.playing = false;
                }
            }
        }
        if mode == PlayMode::Single && position < 0.0 {
            seek = true;
        }
        self.select(pos, seek)
    }

    fn select(&mut self, pos: f64, mut seek: bool) -> Option<Frame> {
        self.position = pos;
        let index = self
            .states
            .iter()
            .position(|s| s.contain(pos))
            .unwrap_or(self.states.len() - 1);
        if self.current_state != Some(index) {
            seek = true;
        }
        let state = &mut self.states[index];
        seek = state.rewrite_seek(seek, pos);
        let step = self.cfg.step_of(pos);
        let previous = self.previous_step.unwrap_or(i64::MIN);
        if !state.need_interpolate(seek, step, previous) {
            return None;
        }
        for motion in state.motions_mut() {
            motion.update(pos);
        }
        self.previous_step = Some(step);
        self.current_state = Some(index);
        Some(Frame { state: index, seek })
    }

    fn apply(&self, frame: Frame, sink: &mut dyn TweenTarget) {
        if sink.is_off() {
            log::trace!("{}: {} is off; skipped application", self.id, sink.target_id());
            return;
        }
        let state = &self.states[frame.state];
        for motion in state.motions() {
            let mask = if frame.seek {
                PropertyMask::ALL
            } else {
                motion.animated_mask()
            };
            if mask.is_empty() {
                continue;
            }
            sink.set_tween_motion(motion, mask);
        }
        log::trace!(
            "{} applied segment {} at {} (seek: {})",
            self.id,
            frame.state,
            self.position,
            frame.seek
        );
    }
}
