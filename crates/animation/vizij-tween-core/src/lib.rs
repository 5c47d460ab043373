//! Vizij Tween Core (engine-agnostic)
//!
//! Clock-driven tween and timeline scheduler. Tweens interpolate property
//! motions of animatable targets through chronological state segments;
//! timelines group tweens, map labels to positions and subscribe to an
//! injected [`Ticker`] only while something is still playing.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). Targets are owned by
//! the host and reached through the [`TweenTarget`] trait.

pub mod config;
pub mod easing;
pub mod error;
pub mod ids;
pub mod list;
pub mod motion;
pub mod node;
pub mod scheduler;
pub mod state;
pub mod stored_timeline;
pub mod target;
pub mod ticker;
pub mod timeline;
pub mod tween;
pub mod value;

// Re-exports for consumers (adapters)
pub use config::{Config, TimelineOptions, UNSET_POSITION};
pub use easing::Easing;
pub use error::{Result, TweenError};
pub use ids::{IdAllocator, TargetId, TimelineId, TweenId};
pub use list::CowList;
pub use motion::{MotionKind, PropertyMask, TweenMotion};
pub use node::TweenNode;
pub use scheduler::Scheduler;
pub use state::TweenState;
pub use stored_timeline::{parse_stored_timeline_json, StoredTimeline, TargetResolver};
pub use target::{
    play_tweens, set_tween_position, stop_tweens, synchronize, update_tweens, DrawableProps, PlayMode,
    TargetRef, TweenTarget, TweenTargetState, WeakTarget,
};
pub use ticker::{TickEvent, TickListener, Ticker};
pub use timeline::{Label, Position, Timeline, TimelineEvent, TimelineState};
pub use tween::{Tween, TweenHandle};
pub use value::{GraphicsHandle, PropertyKind, PropertyValue, TweenProperty};
