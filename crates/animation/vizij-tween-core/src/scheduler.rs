//! Scheduler: owns the clock and id allocation, builds tweens and timelines.
//!
//! Methods:
//! - new, create_target_id, create_tween, attach_tween, create_timeline, load_timeline_json, advance

use std::rc::Rc;

use crate::config::{Config, TimelineOptions};
use crate::error::Result;
use crate::ids::{IdAllocator, TargetId};
use crate::stored_timeline::{parse_stored_timeline_json, TargetResolver};
use crate::target::TargetRef;
use crate::ticker::Ticker;
use crate::timeline::Timeline;
use crate::tween::{Tween, TweenHandle};

#[derive(Debug)]
pub struct Scheduler {
    cfg: Config,
    ids: IdAllocator,
    ticker: Rc<Ticker>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Scheduler {
    /// Create a scheduler with its own clock.
    pub fn new(cfg: Config) -> Self {
        Self::with_ticker(cfg, Rc::new(Ticker::new()))
    }

    /// Create a scheduler around a clock shared with other subsystems.
    pub fn with_ticker(cfg: Config, ticker: Rc<Ticker>) -> Self {
        Self {
            cfg,
            ids: IdAllocator::new(),
            ticker,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    #[inline]
    pub fn ticker(&self) -> &Rc<Ticker> {
        &self.ticker
    }

    #[inline]
    pub fn run_time(&self) -> f64 {
        self.ticker.run_time()
    }

    /// Allocate an identity for a new target.
    pub fn create_target_id(&mut self) -> TargetId {
        self.ids.alloc_target()
    }

    /// New, empty tween for `target`. Push its segments, then [`Scheduler::attach_tween`] it.
    pub fn create_tween(&mut self, target: &TargetRef) -> Tween {
        let id = self.ids.alloc_tween();
        Tween::new(id, target, self.cfg.clone())
    }

    /// Share `tween` and register it on its target.
    pub fn attach_tween(&self, tween: Tween) -> TweenHandle {
        let target = tween.target();
        let handle = tween.into_handle();
        match target {
            Some(target) => match target.try_borrow_mut() {
                Ok(mut t) => {
                    t.register_tween(handle.clone());
                }
                Err(_) => log::warn!("target is busy; tween left unregistered"),
            },
            None => log::warn!("target dropped before its tween was attached"),
        }
        handle
    }

    /// Build a timeline on this scheduler's clock.
    pub fn create_timeline<S: Into<String>>(
        &mut self,
        tweens: Vec<TweenHandle>,
        labels: impl IntoIterator<Item = (S, f64)>,
        options: TimelineOptions,
    ) -> Result<Timeline> {
        let id = self.ids.alloc_timeline();
        Timeline::new(self.ticker.clone(), id, self.cfg.clone(), tweens, labels, options)
    }

    /// Parse a stored timeline document and build it against `resolver`.
    pub fn load_timeline_json(&mut self, json: &str, resolver: &mut dyn TargetResolver) -> Result<Timeline> {
        let stored = parse_stored_timeline_json(json)?;
        stored.build(self, resolver)
    }

    /// Advance the clock by `delta`, ticking every subscribed timeline.
    pub fn advance(&self, delta: f64) {
        self.ticker.tick(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TweenNode;
    use crate::target::TweenTarget;

    #[test]
    fn attach_registers_on_target() {
        let mut s = Scheduler::default();
        let id = s.create_target_id();
        let node = TweenNode::new(id, "n").into_ref();
        let target: TargetRef = node.clone();
        let tween = s.create_tween(&target);
        let handle = s.attach_tween(tween);
        assert_eq!(node.borrow().tween_state().tweens().len(), 1);
        assert!(Rc::ptr_eq(&node.borrow().tween_state().tweens()[0], &handle));
    }

    #[test]
    fn ids_are_unique_per_kind() {
        let mut s = Scheduler::default();
        let a = s.create_target_id();
        let b = s.create_target_id();
        assert_ne!(a, b);
        let t1 = s
            .create_timeline(Vec::new(), Vec::<(String, f64)>::new(), TimelineOptions::default())
            .unwrap();
        let t2 = s
            .create_timeline(Vec::new(), Vec::<(String, f64)>::new(), TimelineOptions::default())
            .unwrap();
        assert_ne!(t1.id(), t2.id());
    }
}
