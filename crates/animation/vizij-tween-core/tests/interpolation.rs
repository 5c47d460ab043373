use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use vizij_tween_core::{
    config::{Config, TimelineOptions},
    easing::Easing,
    ids::TargetId,
    motion::{MotionKind, PropertyMask, TweenMotion, TRANSFORM_X},
    node::TweenNode,
    scheduler::Scheduler,
    state::TweenState,
    target::{TargetRef, TweenTarget, TweenTargetState},
};

/// Target that records every application it receives.
struct Recorder {
    id: TargetId,
    state: TweenTargetState,
    applied: Vec<(MotionKind, PropertyMask)>,
}

impl Recorder {
    fn new(id: TargetId) -> Rc<RefCell<Recorder>> {
        Rc::new(RefCell::new(Recorder {
            id,
            state: TweenTargetState::new(),
            applied: Vec::new(),
        }))
    }

    fn count(&self, kind: &MotionKind) -> usize {
        self.applied.iter().filter(|(k, _)| k == kind).count()
    }
}

impl TweenTarget for Recorder {
    fn target_id(&self) -> TargetId {
        self.id
    }

    fn tween_state(&self) -> &TweenTargetState {
        &self.state
    }

    fn tween_state_mut(&mut self) -> &mut TweenTargetState {
        &mut self.state
    }

    fn set_tween_motion(&mut self, motion: &TweenMotion, mask: PropertyMask) {
        self.applied.push((motion.kind().clone(), mask));
    }
}

fn no_labels() -> Vec<(String, f64)> {
    Vec::new()
}

#[test]
fn numeric_properties_interpolate_linearly() {
    let mut s = Scheduler::default();
    let node = TweenNode::new(s.create_target_id(), "n").into_ref();
    let target: TargetRef = node.clone();
    let mut t = s.create_tween(&target);
    t.push_state(
        1000.0,
        Easing::Linear,
        TweenState::new(vec![TweenMotion::transform(
            [0.0, 10.0, 1.0, 1.0, 0.0],
            [200.0, 10.0, 2.0, 1.0, 360.0],
        )]),
    )
    .unwrap();
    let tween = s.attach_tween(t);
    let _tl = s
        .create_timeline(vec![tween], no_labels(), TimelineOptions::default())
        .unwrap();

    for run_time in [0.0, 250.0, 500.0, 750.0, 1000.0] {
        s.ticker().tick_to(run_time);
        let props = node.borrow().props().clone();
        let ratio = run_time / 1000.0;
        assert_abs_diff_eq!(props.x, 200.0 * ratio, epsilon = 1e-9);
        assert_abs_diff_eq!(props.y, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(props.scale_x, 1.0 + ratio, epsilon = 1e-9);
        assert_abs_diff_eq!(props.rotation, 360.0 * ratio, epsilon = 1e-9);
    }
}

#[test]
fn step_values_switch_only_at_completion() {
    let mut s = Scheduler::default();
    let node = TweenNode::new(s.create_target_id(), "n").into_ref();
    node.borrow_mut().props_mut().visible = false;
    let target: TargetRef = node.clone();
    let mut t = s.create_tween(&target);
    t.push_state(
        1000.0,
        Easing::QuadIn,
        TweenState::new(vec![TweenMotion::visible(false, true), TweenMotion::text("A", "B")]),
    )
    .unwrap();
    let tween = s.attach_tween(t);
    let _tl = s
        .create_timeline(vec![tween], no_labels(), TimelineOptions::default())
        .unwrap();

    for run_time in [0.0, 1.0, 500.0, 999.0] {
        s.ticker().tick_to(run_time);
        assert!(!node.borrow().props().visible, "visible too early at {run_time}");
        assert_eq!(node.borrow().props().text, "A");
    }
    s.ticker().tick_to(1000.0);
    assert!(node.borrow().props().visible);
    assert_eq!(node.borrow().props().text, "B");
}

#[test]
fn segment_boundaries_apply_every_property() {
    let mut s = Scheduler::default();
    let rec = Recorder::new(s.create_target_id());
    let target: TargetRef = rec.clone();
    let mut t = s.create_tween(&target);
    let still = || TweenMotion::visible(true, true);
    t.push_state(500.0, Easing::Linear, TweenState::new(vec![TweenMotion::alpha(0.0, 1.0), still()]))
        .unwrap();
    t.push_state(500.0, Easing::Linear, TweenState::new(vec![TweenMotion::alpha(1.0, 0.0), still()]))
        .unwrap();
    let tween = s.attach_tween(t);
    let _tl = s
        .create_timeline(vec![tween], no_labels(), TimelineOptions::default())
        .unwrap();

    s.ticker().tick_to(0.0);
    s.ticker().tick_to(250.0);
    assert_eq!(rec.borrow().count(&MotionKind::Visible), 1);
    assert_eq!(rec.borrow().count(&MotionKind::Alpha), 2);

    // Entering the second segment is a seek: all properties, all motions.
    s.ticker().tick_to(500.0);
    assert_eq!(rec.borrow().count(&MotionKind::Visible), 2);
    assert_eq!(rec.borrow().applied.last().map(|(_, m)| *m), Some(PropertyMask::ALL));

    s.ticker().tick_to(750.0);
    assert_eq!(rec.borrow().count(&MotionKind::Visible), 2);
    let (_, mask) = rec.borrow().applied.last().cloned().unwrap();
    assert_eq!(mask, PropertyMask::bit(0));

    // The final instant lands on the segment end and is forced too.
    s.ticker().tick_to(1000.0);
    assert_eq!(rec.borrow().count(&MotionKind::Visible), 3);
}

#[test]
fn ticks_within_one_step_skip_interpolation() {
    let cfg = Config {
        step_resolution: 100.0,
        ..Config::default()
    };
    let mut s = Scheduler::new(cfg);
    let rec = Recorder::new(s.create_target_id());
    let target: TargetRef = rec.clone();
    let mut t = s.create_tween(&target);
    t.push_state(1000.0, Easing::Linear, TweenState::new(vec![TweenMotion::alpha(0.0, 1.0)]))
        .unwrap();
    let tween = s.attach_tween(t);
    let _tl = s
        .create_timeline(vec![tween.clone()], no_labels(), TimelineOptions::default())
        .unwrap();

    for run_time in [0.0, 10.0, 20.0, 99.0] {
        s.ticker().tick_to(run_time);
    }
    assert_eq!(rec.borrow().count(&MotionKind::Alpha), 1);
    assert_eq!(tween.borrow().position(), 99.0);

    s.ticker().tick_to(150.0);
    assert_eq!(rec.borrow().count(&MotionKind::Alpha), 2);

    // An explicit seek is applied even within the same step.
    tween.borrow_mut().set_position(160.0).unwrap();
    assert_eq!(rec.borrow().count(&MotionKind::Alpha), 3);
}

#[test]
fn seeking_is_idempotent() {
    let mut s = Scheduler::default();
    let node = TweenNode::new(s.create_target_id(), "n").into_ref();
    let target: TargetRef = node.clone();
    let mut t = s.create_tween(&target);
    t.push_state(400.0, Easing::CubicInOut, TweenState::new(vec![TweenMotion::alpha(0.0, 1.0)]))
        .unwrap();
    t.push_state(
        600.0,
        Easing::Linear,
        TweenState::new(vec![TweenMotion::transform([0.0; 5], [60.0, 0.0, 1.0, 1.0, 0.0])]),
    )
    .unwrap();
    let tween = s.attach_tween(t);

    tween.borrow_mut().set_position(100.0).unwrap();
    tween.borrow_mut().set_position(700.0).unwrap();
    let first = node.borrow().props().clone();
    tween.borrow_mut().set_position(100.0).unwrap();
    tween.borrow_mut().set_position(700.0).unwrap();
    tween.borrow_mut().set_position(700.0).unwrap();
    assert_eq!(node.borrow().props(), &first);
    assert_abs_diff_eq!(first.x, 30.0, epsilon = 1e-9);
    assert!(tween.borrow_mut().set_position(-1.0).is_err());
}

#[test]
fn masked_application_touches_only_selected_properties() {
    let mut node = TweenNode::new(TargetId(9), "n");
    let mut motion = TweenMotion::transform([0.0; 5], [10.0, 10.0, 10.0, 10.0, 10.0]);
    motion.initialize(0.0, 10.0, Easing::Linear);
    motion.update(10.0);
    node.set_tween_motion(&motion, PropertyMask::bit(TRANSFORM_X));
    assert_eq!(node.props().x, 10.0);
    assert_eq!(node.props().y, 0.0);
    assert_eq!(node.props().scale_x, 1.0);
}
