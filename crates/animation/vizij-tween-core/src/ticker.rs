//! Injected periodic clock.
//!
//! The host calls [`Ticker::tick`] once per frame. Subscription keeps a
//! listener alive: a timeline nobody else references keeps playing until it
//! unsubscribes itself. Listeners are compared by reference identity.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::list::CowList;

/// Payload delivered to every listener on a tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickEvent {
    /// Time elapsed since the previous tick.
    pub delta: f64,
    /// Accumulated clock time after this tick.
    pub run_time: f64,
}

/// Something the clock can notify.
pub trait TickListener {
    fn handle_tick(&self, event: &TickEvent);
}

#[inline]
fn listener_addr(listener: &Rc<dyn TickListener>) -> *const () {
    Rc::as_ptr(listener) as *const ()
}

#[derive(Default)]
pub struct Ticker {
    listeners: RefCell<CowList<Rc<dyn TickListener>>>,
    run_time: Cell<f64>,
    ticks: Cell<u64>,
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker")
            .field("listeners", &self.listener_count())
            .field("run_time", &self.run_time.get())
            .field("ticks", &self.ticks.get())
            .finish()
    }
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated clock time.
    #[inline]
    pub fn run_time(&self) -> f64 {
        self.run_time.get()
    }

    /// Number of ticks dispatched so far.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks.get()
    }

    /// Subscribe `listener`; returns false if it is already subscribed.
    pub fn add_listener(&self, listener: &Rc<dyn TickListener>) -> bool {
        if self.has_listener(listener) {
            return false;
        }
        self.listeners.borrow_mut().push(Rc::clone(listener));
        true
    }

    /// Unsubscribe by reference identity; returns whether it was subscribed.
    pub fn remove_listener(&self, listener: &Rc<dyn TickListener>) -> bool {
        let addr = listener_addr(listener);
        self.listeners
            .borrow_mut()
            .remove_first(|l| listener_addr(l) == addr)
            .is_some()
    }

    pub fn has_listener(&self, listener: &Rc<dyn TickListener>) -> bool {
        let addr = listener_addr(listener);
        self.listeners.borrow().iter().any(|l| listener_addr(l) == addr)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Advance the clock by `delta` and notify every listener subscribed when the tick began.
    pub fn tick(&self, delta: f64) {
        let run_time = self.run_time.get() + delta;
        self.run_time.set(run_time);
        self.ticks.set(self.ticks.get() + 1);
        let event = TickEvent { delta, run_time };

        let snapshot = self.listeners.borrow_mut().lock();
        for listener in snapshot.iter() {
            listener.handle_tick(&event);
        }
        self.listeners.borrow_mut().unlock();
    }

    /// Advance the clock to the absolute `run_time`.
    pub fn tick_to(&self, run_time: f64) {
        self.tick(run_time - self.run_time.get());
    }
}
