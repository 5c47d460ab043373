//! Timeline: a group of tweens driven together by the ticker.
//!
//! State machine:
//! - `Unattached` until first played, `Playing` while subscribed to the ticker,
//!   `Paused` after `set_paused(true)`, `Exhausted` once a tick finds no active tween.
//! - `Exhausted` is left again by adding a tween, `goto_and_play` or a pause/resume cycle.
//!
//! [`Timeline`] is a cheap handle; clones share the same timeline. Every
//! operation takes `&self` so tweens and targets may call back into their
//! timeline while it is dispatching a tick.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::{Config, TimelineOptions};
use crate::error::{Result, TweenError};
use crate::ids::{TimelineId, TweenId};
use crate::list::CowList;
use crate::target::{target_addr, PlayMode, TargetRef, WeakTarget};
use crate::ticker::{TickEvent, TickListener, Ticker};
use crate::tween::{fmod, TweenHandle};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelineState {
    Unattached,
    Playing,
    Paused,
    Exhausted,
}

/// Discrete signals recorded while the timeline runs. Drained by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TimelineEvent {
    Subscribed {
        timeline: TimelineId,
        run_time: f64,
    },
    Paused {
        timeline: TimelineId,
        position: f64,
    },
    Resumed {
        timeline: TimelineId,
        position: f64,
    },
    Exhausted {
        timeline: TimelineId,
        run_time: f64,
    },
    LabelReached {
        timeline: TimelineId,
        label: String,
        position: f64,
    },
    TweenEnded {
        timeline: TimelineId,
        tween: TweenId,
    },
}

/// A named position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub position: f64,
}

/// Where a goto lands: a label name or an absolute position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    At(f64),
    Label(String),
}

impl From<f64> for Position {
    fn from(value: f64) -> Self {
        Position::At(value)
    }
}

impl From<&str> for Position {
    fn from(value: &str) -> Self {
        Position::Label(value.to_string())
    }
}

impl From<String> for Position {
    fn from(value: String) -> Self {
        Position::Label(value)
    }
}

fn check_position(position: f64) -> Result<f64> {
    if position.is_finite() && position >= 0.0 {
        Ok(position)
    } else {
        Err(TweenError::InvalidPosition { position })
    }
}

struct TimelineInner {
    id: TimelineId,
    cfg: Config,
    ticker: Rc<Ticker>,
    me: Weak<TimelineInner>,

    tweens: RefCell<CowList<TweenHandle>>,
    targets: RefCell<Vec<WeakTarget>>,
    labels: RefCell<HashMap<String, f64>>,
    events: RefCell<VecDeque<TimelineEvent>>,

    looping: Cell<bool>,
    initial_position: Option<f64>,
    paused: Cell<bool>,
    state: Cell<TimelineState>,
    position: Cell<f64>,
    base_time: Cell<Option<f64>>,
    duration: Cell<f64>,
}

impl TickListener for TimelineInner {
    fn handle_tick(&self, event: &TickEvent) {
        if let Some(inner) = self.me.upgrade() {
            Timeline { inner }.handle_tick(event);
        }
    }
}

#[derive(Clone)]
pub struct Timeline {
    inner: Rc<TimelineInner>,
}

impl std::fmt::Debug for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timeline")
            .field("id", &self.inner.id)
            .field("state", &self.inner.state.get())
            .field("position", &self.inner.position.get())
            .field("duration", &self.inner.duration.get())
            .field("tweens", &self.len())
            .finish()
    }
}

impl Timeline {
    /// Build a timeline over `tweens` and `labels`. Unless `options.paused`
    /// is set it subscribes to `ticker` right away.
    pub fn new<S: Into<String>>(
        ticker: Rc<Ticker>,
        id: TimelineId,
        cfg: Config,
        tweens: Vec<TweenHandle>,
        labels: impl IntoIterator<Item = (S, f64)>,
        options: TimelineOptions,
    ) -> Result<Self> {
        let initial_position = options.initial_position();
        let inner = Rc::new_cyclic(|me| TimelineInner {
            id,
            cfg,
            ticker,
            me: me.clone(),
            tweens: RefCell::new(CowList::new()),
            targets: RefCell::new(Vec::new()),
            labels: RefCell::new(HashMap::new()),
            events: RefCell::new(VecDeque::new()),
            looping: Cell::new(options.looping),
            initial_position,
            paused: Cell::new(true),
            state: Cell::new(TimelineState::Unattached),
            position: Cell::new(initial_position.unwrap_or(0.0)),
            base_time: Cell::new(None),
            duration: Cell::new(0.0),
        });
        let timeline = Timeline { inner };
        timeline.set_labels(labels)?;
        if !tweens.is_empty() {
            timeline.add_tweens(tweens);
        }
        log::debug!(
            "{} created: {} tweens, duration {}",
            id,
            timeline.len(),
            timeline.duration()
        );
        if !options.paused {
            timeline.set_paused(false);
        }
        Ok(timeline)
    }

    #[inline]
    pub fn id(&self) -> TimelineId {
        self.inner.id
    }

    #[inline]
    pub fn ticker(&self) -> &Rc<Ticker> {
        &self.inner.ticker
    }

    /// Max over the owned tweens' durations; 0 when empty.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.inner.duration.get()
    }

    /// Position reached by the last tick or seek.
    #[inline]
    pub fn position(&self) -> f64 {
        self.inner.position.get()
    }

    #[inline]
    pub fn state(&self) -> TimelineState {
        self.inner.state.get()
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.inner.paused.get()
    }

    #[inline]
    pub fn looping(&self) -> bool {
        self.inner.looping.get()
    }

    /// Set the loop flag on the timeline and every owned tween.
    ///
    /// Each tween wraps on its own duration, so a tween shorter than the
    /// timeline repeats within one timeline period. [`Timeline::position`] and
    /// the labels wrap on the timeline duration.
    pub fn set_loop(&self, looping: bool) {
        self.inner.looping.set(looping);
        for tween in self.snapshot().iter() {
            if let Ok(mut t) = tween.try_borrow_mut() {
                t.set_loop(looping);
            }
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner.ticker.has_listener(&self.listener())
    }

    pub fn len(&self) -> usize {
        self.inner.tweens.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.tweens.borrow().is_empty()
    }

    /// Owned tweens in insertion order.
    pub fn tweens(&self) -> Vec<TweenHandle> {
        self.inner.tweens.borrow().as_slice().to_vec()
    }

    pub fn contains(&self, tween: &TweenHandle) -> bool {
        self.inner.tweens.borrow().iter().any(|t| Rc::ptr_eq(t, tween))
    }

    /// Distinct live targets of the owned tweens, in first-seen order.
    pub fn targets(&self) -> Vec<TargetRef> {
        self.inner
            .targets
            .borrow()
            .iter()
            .filter_map(|t| t.upgrade())
            .collect()
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&self) -> Vec<TimelineEvent> {
        self.inner.events.borrow_mut().drain(..).collect()
    }

    pub fn add_tween(&self, tween: TweenHandle) -> bool {
        self.add_tweens([tween]) == 1
    }

    /// Merge `tweens`, skipping ones already owned. Returns how many were added.
    ///
    /// Added tweens take the timeline's loop flag and initial position, start
    /// playing if the timeline is, and revive an exhausted timeline. A looping
    /// tween keeps its own period (see [`Timeline::set_loop`]).
    pub fn add_tweens(&self, tweens: impl IntoIterator<Item = TweenHandle>) -> usize {
        let tweens: Vec<TweenHandle> = tweens.into_iter().collect();
        debug_assert!(!tweens.is_empty(), "add_tweens needs at least one tween");

        let inner = &self.inner;
        let playing = !inner.paused.get();
        let run_time = inner.ticker.run_time();
        let mut added = 0;
        for tween in tweens {
            if self.contains(&tween) {
                continue;
            }
            {
                let Ok(mut t) = tween.try_borrow_mut() else {
                    log::warn!("{}: cannot add a tween that is being updated", inner.id);
                    continue;
                };
                t.set_loop(inner.looping.get());
                if let Some(position) = inner.initial_position {
                    t.set_initial_position(position);
                }
                if !matches!(t.play_mode(), PlayMode::Single | PlayMode::Synched) {
                    t.set_play_mode(PlayMode::Independent);
                }
                if playing {
                    t.play_tween(run_time);
                }
                inner.duration.set(inner.duration.get().max(t.duration()));
                self.track_target(t.weak_target());
            }
            inner.tweens.borrow_mut().push(tween);
            added += 1;
        }
        if added > 0 && playing && inner.state.get() == TimelineState::Exhausted {
            log::debug!("{} revived by {added} new tweens", inner.id);
            self.subscribe();
        }
        added
    }

    /// Remove `tween`; the duration is recomputed from the remaining tweens.
    pub fn remove_tween(&self, tween: &TweenHandle) -> bool {
        let removed = self
            .inner
            .tweens
            .borrow_mut()
            .remove_first(|t| Rc::ptr_eq(t, tween))
            .is_some();
        if removed {
            self.rebuild_aggregates();
            log::debug!("{} removed a tween; duration {}", self.inner.id, self.duration());
        }
        removed
    }

    pub fn add_label(&self, name: impl Into<String>, position: f64) -> Result<()> {
        let position = check_position(position)?;
        self.inner.labels.borrow_mut().insert(name.into(), position);
        Ok(())
    }

    /// Replace the label table. Nothing changes if any position is invalid.
    pub fn set_labels<S: Into<String>>(&self, labels: impl IntoIterator<Item = (S, f64)>) -> Result<()> {
        let mut table = HashMap::new();
        for (name, position) in labels {
            table.insert(name.into(), check_position(position)?);
        }
        *self.inner.labels.borrow_mut() = table;
        Ok(())
    }

    /// Labels sorted ascending by position.
    pub fn labels(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = self
            .inner
            .labels
            .borrow()
            .iter()
            .map(|(name, position)| Label {
                name: name.clone(),
                position: *position,
            })
            .collect();
        labels.sort_by(|a, b| a.position.total_cmp(&b.position).then_with(|| a.name.cmp(&b.name)));
        labels
    }

    /// Name of the last label at or before the current position.
    pub fn current_label(&self) -> Option<String> {
        let position = self.position();
        self.labels()
            .into_iter()
            .take_while(|l| l.position <= position)
            .last()
            .map(|l| l.name)
    }

    /// Pause or resume. Setting the current value again does nothing.
    pub fn set_paused(&self, paused: bool) {
        let inner = &self.inner;
        if inner.paused.get() == paused {
            return;
        }
        inner.paused.set(paused);
        let run_time = inner.ticker.run_time();
        let tweens = self.snapshot();
        if paused {
            for tween in tweens.iter() {
                match tween.try_borrow_mut() {
                    Ok(mut t) => t.stop_tween(run_time),
                    Err(_) => log::warn!("{}: stop skipped a tween that is being updated", inner.id),
                }
            }
            let position = self.position_at(run_time);
            inner.position.set(position);
            inner.base_time.set(None);
            self.unsubscribe();
            inner.state.set(TimelineState::Paused);
            self.push_event(TimelineEvent::Paused {
                timeline: inner.id,
                position,
            });
            log::debug!("{} paused at {position}", inner.id);
        } else {
            for tween in tweens.iter() {
                match tween.try_borrow_mut() {
                    Ok(mut t) => t.play_tween(run_time),
                    Err(_) => log::warn!("{}: play skipped a tween that is being updated", inner.id),
                }
            }
            let position = inner.position.get();
            inner.base_time.set(Some(run_time - position));
            self.push_event(TimelineEvent::Resumed {
                timeline: inner.id,
                position,
            });
            log::debug!("{} resumed at {position}", inner.id);
            self.subscribe();
        }
    }

    /// Seek every tween to `to` and play from there.
    pub fn goto_and_play(&self, to: impl Into<Position>) -> Result<()> {
        let position = self.resolve(to.into())?;
        let inner = &self.inner;
        self.seek_tweens(position);
        inner.position.set(position);
        if inner.paused.get() {
            self.set_paused(false);
        } else {
            let run_time = inner.ticker.run_time();
            for tween in self.snapshot().iter() {
                if let Ok(mut t) = tween.try_borrow_mut() {
                    t.play_tween(run_time);
                }
            }
            inner.base_time.set(Some(run_time - position));
            self.subscribe();
        }
        log::debug!("{} goto_and_play {position}", inner.id);
        Ok(())
    }

    /// Pause and seek every tween to `to`.
    pub fn goto_and_stop(&self, to: impl Into<Position>) -> Result<()> {
        let position = self.resolve(to.into())?;
        self.set_paused(true);
        self.seek_tweens(position);
        self.inner.position.set(position);
        log::debug!("{} goto_and_stop {position}", self.inner.id);
        Ok(())
    }

    /// Advance every tween to the tick's run time; unsubscribe once none is active.
    pub fn handle_tick(&self, event: &TickEvent) {
        let inner = &self.inner;
        if inner.state.get() != TimelineState::Playing {
            return;
        }

        let snapshot = inner.tweens.borrow_mut().lock();
        let mut active = false;
        let mut ended = Vec::new();
        for tween in snapshot.iter() {
            match tween.try_borrow_mut() {
                Ok(mut t) => {
                    let was_active = t.is_active();
                    let now_active = t.update(event.run_time, PlayMode::Independent, -1.0);
                    if was_active && !now_active {
                        ended.push(t.id());
                    }
                    active |= now_active;
                }
                Err(_) => {
                    log::warn!("{}: tick skipped a tween that is being updated", inner.id);
                    active = true;
                }
            }
        }
        inner.tweens.borrow_mut().unlock();
        drop(snapshot);

        for tween in ended {
            self.push_event(TimelineEvent::TweenEnded {
                timeline: inner.id,
                tween,
            });
        }

        let previous = inner.position.get();
        let position = self.position_at(event.run_time);
        inner.position.set(position);
        self.emit_labels(previous, position);

        // A callback may have paused us mid-tick.
        if !active && inner.state.get() == TimelineState::Playing {
            self.unsubscribe();
            inner.state.set(TimelineState::Exhausted);
            self.push_event(TimelineEvent::Exhausted {
                timeline: inner.id,
                run_time: event.run_time,
            });
            log::debug!("{} exhausted at run time {}", inner.id, event.run_time);
        }
    }

    fn listener(&self) -> Rc<dyn TickListener> {
        self.inner.clone()
    }

    fn subscribe(&self) {
        let inner = &self.inner;
        if inner.ticker.add_listener(&self.listener()) {
            let run_time = inner.ticker.run_time();
            self.push_event(TimelineEvent::Subscribed {
                timeline: inner.id,
                run_time,
            });
            log::debug!("{} subscribed at run time {run_time}", inner.id);
        }
        inner.state.set(TimelineState::Playing);
    }

    fn unsubscribe(&self) {
        if self.inner.ticker.remove_listener(&self.listener()) {
            log::debug!("{} unsubscribed", self.inner.id);
        }
    }

    fn snapshot(&self) -> Rc<Vec<TweenHandle>> {
        self.inner.tweens.borrow().snapshot()
    }

    fn track_target(&self, target: &WeakTarget) {
        let mut targets = self.inner.targets.borrow_mut();
        let addr = target_addr(target);
        if !targets.iter().any(|t| target_addr(t) == addr) {
            targets.push(target.clone());
        }
    }

    fn rebuild_aggregates(&self) {
        let previous = self.duration();
        let mut duration = 0.0_f64;
        self.inner.targets.borrow_mut().clear();
        for tween in self.snapshot().iter() {
            match tween.try_borrow() {
                Ok(t) => {
                    duration = duration.max(t.duration());
                    self.track_target(t.weak_target());
                }
                Err(_) => duration = duration.max(previous),
            }
        }
        self.inner.duration.set(duration);
    }

    fn position_at(&self, run_time: f64) -> f64 {
        let inner = &self.inner;
        let Some(base) = inner.base_time.get() else {
            return inner.position.get();
        };
        let raw = (run_time - base).max(0.0);
        let duration = inner.duration.get();
        if inner.looping.get() && duration > 0.0 {
            fmod(raw, duration)
        } else {
            raw.min(duration)
        }
    }

    fn resolve(&self, to: Position) -> Result<f64> {
        match to {
            Position::At(position) => check_position(position),
            Position::Label(name) => {
                let found = self.inner.labels.borrow().get(name.as_str()).copied();
                found.ok_or_else(|| {
                    log::warn!("{}: unknown label '{name}'", self.inner.id);
                    TweenError::UnknownLabel { name }
                })
            }
        }
    }

    fn seek_tweens(&self, position: f64) {
        let run_time = self.inner.ticker.run_time();
        for tween in self.snapshot().iter() {
            match tween.try_borrow_mut() {
                Ok(mut t) => {
                    t.update(run_time, PlayMode::Independent, position);
                }
                Err(_) => log::warn!("{}: seek skipped a tween that is being updated", self.inner.id),
            }
        }
    }

    fn emit_labels(&self, previous: f64, position: f64) {
        if previous == position {
            return;
        }
        let wrapped = position < previous;
        for label in self.labels() {
            let crossed = if wrapped {
                label.position > previous || label.position <= position
            } else {
                label.position > previous && label.position <= position
            };
            if crossed {
                self.push_event(TimelineEvent::LabelReached {
                    timeline: self.inner.id,
                    label: label.name,
                    position: label.position,
                });
            }
        }
    }

    fn push_event(&self, event: TimelineEvent) {
        let max = self.inner.cfg.max_events;
        if max == 0 {
            return;
        }
        let mut events = self.inner.events.borrow_mut();
        while events.len() >= max {
            events.pop_front();
        }
        events.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::ids::TargetId;
    use crate::motion::TweenMotion;
    use crate::node::TweenNode;
    use crate::state::TweenState;
    use crate::tween::Tween;

    fn tween(target: &TargetRef, id: u32, duration: f64) -> TweenHandle {
        let mut t = Tween::new(TweenId(id), target, Config::default());
        t.push_state(duration, Easing::Linear, TweenState::new(vec![TweenMotion::alpha(0.0, 1.0)]))
            .unwrap();
        t.into_handle()
    }

    fn paused() -> TimelineOptions {
        TimelineOptions {
            paused: true,
            ..TimelineOptions::default()
        }
    }

    #[test]
    fn unpaused_construction_subscribes() {
        let ticker = Rc::new(Ticker::new());
        let target: TargetRef = TweenNode::new(TargetId(1), "a").into_ref();
        let tl = Timeline::new(
            ticker.clone(),
            TimelineId(0),
            Config::default(),
            vec![tween(&target, 1, 100.0)],
            Vec::<(String, f64)>::new(),
            TimelineOptions::default(),
        )
        .unwrap();
        assert_eq!(tl.state(), TimelineState::Playing);
        assert!(tl.is_subscribed());
        assert_eq!(ticker.listener_count(), 1);
        let events = tl.drain_events();
        assert!(matches!(
            events.as_slice(),
            [TimelineEvent::Resumed { .. }, TimelineEvent::Subscribed { .. }]
        ));
    }

    #[test]
    fn paused_construction_stays_unattached() {
        let ticker = Rc::new(Ticker::new());
        let tl = Timeline::new(
            ticker.clone(),
            TimelineId(0),
            Config::default(),
            Vec::new(),
            Vec::<(String, f64)>::new(),
            paused(),
        )
        .unwrap();
        assert_eq!(tl.state(), TimelineState::Unattached);
        assert_eq!(tl.duration(), 0.0);
        assert!(!tl.is_subscribed());
    }

    #[test]
    fn current_label_follows_position() {
        let ticker = Rc::new(Ticker::new());
        let tl = Timeline::new(
            ticker,
            TimelineId(0),
            Config::default(),
            Vec::new(),
            [("a", 0.0), ("b", 200.0)],
            paused(),
        )
        .unwrap();
        assert_eq!(tl.current_label().as_deref(), Some("a"));
        tl.goto_and_stop(250.0).unwrap();
        assert_eq!(tl.current_label().as_deref(), Some("b"));
        assert!(tl.add_label("bad", -3.0).is_err());
    }

    #[test]
    fn event_buffer_is_capped() {
        let ticker = Rc::new(Ticker::new());
        let cfg = Config {
            max_events: 2,
            ..Config::default()
        };
        let tl = Timeline::new(ticker, TimelineId(0), cfg, Vec::new(), Vec::<(String, f64)>::new(), paused())
            .unwrap();
        for _ in 0..3 {
            tl.set_paused(false);
            tl.set_paused(true);
        }
        assert_eq!(tl.drain_events().len(), 2);
        assert!(tl.drain_events().is_empty());
    }
}
