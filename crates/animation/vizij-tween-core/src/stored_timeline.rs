//! Stored timeline documents: JSON descriptions of tweens, labels and options.
//!
//! Parsing converts the loose JSON shapes into typed keyframes up front, so
//! [`StoredTimeline::build`] only has to resolve targets. Target keys are
//! resolved through a [`TargetResolver`] supplied by the host.
//!
//! ```json
//! {
//!   "name": "intro",
//!   "options": { "loop": false, "paused": true },
//!   "labels": { "start": 0, "fadeIn": 500 },
//!   "tweens": [
//!     {
//!       "target": "hero",
//!       "keyframes": [
//!         { "duration": 500, "ease": { "type": "quadOut" },
//!           "motions": [ { "kind": "alpha", "properties": [ { "from": 0, "to": 1 } ] } ] }
//!       ]
//!     }
//!   ]
//! }
//! ```

use hashbrown::HashMap;
use serde::Deserialize;

use crate::config::TimelineOptions;
use crate::easing::Easing;
use crate::error::{Result, TweenError};
use crate::motion::{MotionKind, PropertyMask, TweenMotion};
use crate::scheduler::Scheduler;
use crate::state::TweenState;
use crate::target::{PlayMode, TargetRef};
use crate::timeline::Timeline;
use crate::value::{GraphicsHandle, PropertyValue, TweenProperty};

/// Maps target keys used in stored documents to live targets.
pub trait TargetResolver {
    fn resolve(&mut self, key: &str) -> Option<TargetRef>;
}

impl TargetResolver for HashMap<String, TargetRef> {
    fn resolve(&mut self, key: &str) -> Option<TargetRef> {
        self.get(key).cloned()
    }
}

impl TargetResolver for std::collections::HashMap<String, TargetRef> {
    fn resolve(&mut self, key: &str) -> Option<TargetRef> {
        self.get(key).cloned()
    }
}

/// Parsed, validated timeline document.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredTimeline {
    pub name: Option<String>,
    pub options: TimelineOptions,
    pub labels: HashMap<String, f64>,
    pub tweens: Vec<StoredTween>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredTween {
    pub target: String,
    pub proxy: Option<String>,
    pub mode: PlayMode,
    /// Index of the leader tween in the same document.
    pub sync_with: Option<usize>,
    pub sync_offset: f64,
    /// Replace the first keyframe's start values with the target's current ones.
    pub capture_start: bool,
    pub keyframes: Vec<StoredKeyframe>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredKeyframe {
    pub duration: f64,
    /// `None` uses the scheduler's default ease.
    pub ease: Option<Easing>,
    pub motions: Vec<TweenMotion>,
}

/// Parse a stored timeline document.
pub fn parse_stored_timeline_json(s: &str) -> Result<StoredTimeline> {
    let raw: RawTimeline = serde_json::from_str(s)?;
    let count = raw.tweens.len();

    let mut tweens = Vec::with_capacity(count);
    for (index, rt) in raw.tweens.into_iter().enumerate() {
        if rt.keyframes.is_empty() {
            return Err(parse_error(format!("tween {index} ({}) has no keyframes", rt.target)));
        }
        match rt.sync_with {
            Some(leader) if leader >= count || leader == index => {
                return Err(parse_error(format!("tween {index} syncs with invalid tween {leader}")));
            }
            None if rt.mode == PlayMode::Synched => {
                return Err(parse_error(format!("tween {index} is synched without syncWith")));
            }
            _ => {}
        }

        let mut keyframes = Vec::with_capacity(rt.keyframes.len());
        for kf in rt.keyframes {
            if !kf.duration.is_finite() || kf.duration < 0.0 {
                return Err(TweenError::InvalidDuration {
                    duration: kf.duration,
                });
            }
            let motions = kf
                .motions
                .into_iter()
                .map(to_motion)
                .collect::<Result<Vec<_>>>()?;
            keyframes.push(StoredKeyframe {
                duration: kf.duration,
                ease: kf.ease,
                motions,
            });
        }

        tweens.push(StoredTween {
            target: rt.target,
            proxy: rt.proxy,
            mode: rt.mode,
            sync_with: rt.sync_with,
            sync_offset: rt.sync_offset,
            capture_start: rt.capture_start,
            keyframes,
        });
    }

    for (name, position) in &raw.labels {
        if !position.is_finite() || *position < 0.0 {
            return Err(parse_error(format!("label '{name}' has invalid position {position}")));
        }
    }

    Ok(StoredTimeline {
        name: raw.name,
        options: raw.options,
        labels: raw.labels,
        tweens,
    })
}

impl StoredTimeline {
    /// Instantiate tweens for resolved targets and wrap them in a timeline on `scheduler`'s clock.
    ///
    /// Targets and proxies are held weakly by the tweens; keep them alive on the host side.
    pub fn build(&self, scheduler: &mut Scheduler, resolver: &mut dyn TargetResolver) -> Result<Timeline> {
        let default_ease = scheduler.config().default_ease;
        let mut handles = Vec::with_capacity(self.tweens.len());
        for st in &self.tweens {
            let target = resolve(resolver, &st.target)?;
            let mut tween = scheduler.create_tween(&target);
            for kf in &st.keyframes {
                let state = TweenState::new(kf.motions.clone());
                tween.push_state(kf.duration, kf.ease.unwrap_or(default_ease), state)?;
            }
            if let Some(key) = &st.proxy {
                let proxy = resolve(resolver, key)?;
                tween.set_proxy(Some(&proxy));
            }
            if st.mode != PlayMode::Synched {
                tween.set_play_mode(st.mode);
            }
            if st.capture_start {
                tween.capture_start()?;
            }
            handles.push(scheduler.attach_tween(tween));
        }

        for (st, handle) in self.tweens.iter().zip(handles.iter()) {
            if let Some(leader) = st.sync_with.and_then(|i| handles.get(i)) {
                handle.borrow_mut().synchronize(leader, st.sync_offset);
            }
        }

        log::debug!(
            "built stored timeline {:?}: {} tweens, {} labels",
            self.name,
            handles.len(),
            self.labels.len()
        );
        scheduler.create_timeline(
            handles,
            self.labels.iter().map(|(k, v)| (k.clone(), *v)),
            self.options,
        )
    }
}

fn resolve(resolver: &mut dyn TargetResolver, key: &str) -> Result<TargetRef> {
    resolver.resolve(key).ok_or_else(|| {
        log::warn!("stored timeline: unresolved target '{key}'");
        TweenError::UnresolvedTarget { key: key.to_string() }
    })
}

fn parse_error(reason: String) -> TweenError {
    TweenError::Parse { reason }
}

fn to_motion(raw: RawMotion) -> Result<TweenMotion> {
    if raw.properties.len() > PropertyMask::CAPACITY {
        return Err(parse_error(format!(
            "motion {:?} has {} properties; at most {} are supported",
            raw.kind,
            raw.properties.len(),
            PropertyMask::CAPACITY
        )));
    }
    let properties = raw
        .properties
        .into_iter()
        .map(|p| {
            let start = to_value(p.from);
            let end = to_value(p.to);
            let (start_kind, end_kind) = (start.kind(), end.kind());
            TweenProperty::from_values(start, end).ok_or_else(|| TweenError::PropertyMismatch {
                start: format!("{start_kind:?}"),
                end: format!("{end_kind:?}"),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TweenMotion::new(raw.kind, properties))
}

fn to_value(v: RawValue) -> PropertyValue {
    match v {
        RawValue::Boolean(b) => PropertyValue::Binary(b),
        RawValue::Number(n) => PropertyValue::Number(n),
        RawValue::String(s) => PropertyValue::Text(s),
        RawValue::Graphics { graphics } => PropertyValue::Graphics(graphics.map(GraphicsHandle)),
    }
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct RawTimeline {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: TimelineOptions,
    #[serde(default)]
    pub labels: HashMap<String, f64>,
    pub tweens: Vec<RawTween>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTween {
    pub target: String,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub mode: PlayMode,
    #[serde(default)]
    pub sync_with: Option<usize>,
    #[serde(default)]
    pub sync_offset: f64,
    #[serde(default)]
    pub capture_start: bool,
    pub keyframes: Vec<RawKeyframe>,
}

#[derive(Debug, Deserialize)]
struct RawKeyframe {
    pub duration: f64,
    #[serde(default)]
    pub ease: Option<Easing>,
    #[serde(default)]
    pub motions: Vec<RawMotion>,
}

#[derive(Debug, Deserialize)]
struct RawMotion {
    pub kind: MotionKind,
    pub properties: Vec<RawProperty>,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    pub from: RawValue,
    pub to: RawValue,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Boolean(bool),
    Number(f64),
    String(String),
    Graphics { graphics: Option<u32> },
}
