//! Dense numeric ids for tweens, timelines and targets.
//!
//! Ids carry no meaning beyond identity; their `Display` form (`tween#3`) is
//! what log lines and error messages print.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

entity_id!(TweenId, "tween");
entity_id!(TimelineId, "timeline");
entity_id!(
    /// Stable numeric identity of an animatable target.
    TargetId,
    "target"
);

/// Hands out ids per entity kind, starting at 0 for each.
#[derive(Default, Debug)]
pub struct IdAllocator {
    tweens: u32,
    timelines: u32,
    targets: u32,
}

fn bump(counter: &mut u32) -> u32 {
    let id = *counter;
    *counter = counter.wrapping_add(1);
    id
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_tween(&mut self) -> TweenId {
        TweenId(bump(&mut self.tweens))
    }

    pub fn alloc_timeline(&mut self) -> TimelineId {
        TimelineId(bump(&mut self.timelines))
    }

    pub fn alloc_target(&mut self) -> TargetId {
        TargetId(bump(&mut self.targets))
    }
}
