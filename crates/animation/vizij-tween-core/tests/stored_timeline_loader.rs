use std::collections::HashMap;

use approx::assert_abs_diff_eq;
use serde_json::json;
use vizij_tween_core::{
    error::TweenError,
    node::TweenNode,
    scheduler::Scheduler,
    stored_timeline::parse_stored_timeline_json,
    target::{PlayMode, TargetRef, TweenTarget},
    timeline::{Label, TimelineState},
};

fn intro_doc() -> String {
    json!({
        "name": "intro",
        "options": { "loop": false, "paused": true },
        "labels": { "fadeIn": 500, "start": 0 },
        "tweens": [
            {
                "target": "hero",
                "keyframes": [
                    { "duration": 500, "ease": { "type": "linear" },
                      "motions": [ { "kind": "alpha", "properties": [ { "from": 0, "to": 1 } ] } ] },
                    { "duration": 500,
                      "motions": [ { "kind": "alpha", "properties": [ { "from": 1, "to": 0.5 } ] } ] }
                ]
            },
            {
                "target": "shadow",
                "mode": "synched",
                "syncWith": 0,
                "keyframes": [
                    { "duration": 1000,
                      "motions": [ { "kind": "alpha", "properties": [ { "from": 0, "to": 1 } ] } ] }
                ]
            }
        ]
    })
    .to_string()
}

#[test]
fn loads_tweens_labels_and_options() {
    let mut s = Scheduler::default();
    let hero = TweenNode::new(s.create_target_id(), "hero").into_ref();
    let shadow = TweenNode::new(s.create_target_id(), "shadow").into_ref();
    let mut targets: HashMap<String, TargetRef> = HashMap::new();
    targets.insert("hero".into(), hero.clone());
    targets.insert("shadow".into(), shadow.clone());

    let tl = s.load_timeline_json(&intro_doc(), &mut targets).unwrap();
    assert_eq!(tl.len(), 2);
    assert_eq!(tl.duration(), 1000.0);
    assert_eq!(tl.state(), TimelineState::Unattached);
    assert_eq!(tl.targets().len(), 2);
    assert_eq!(
        tl.labels(),
        vec![
            Label {
                name: "start".into(),
                position: 0.0
            },
            Label {
                name: "fadeIn".into(),
                position: 500.0
            },
        ]
    );
    let tweens = tl.tweens();
    assert_eq!(tweens[1].borrow().play_mode(), PlayMode::Synched);
    assert_eq!(hero.borrow().tween_state().tweens().len(), 1);

    tl.goto_and_play("fadeIn").unwrap();
    assert_eq!(tl.state(), TimelineState::Playing);
    assert_abs_diff_eq!(hero.borrow().props().alpha, 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(shadow.borrow().props().alpha, 0.5, epsilon = 1e-9);

    s.advance(250.0);
    assert_eq!(tweens[0].borrow().position(), 750.0);
    assert_eq!(tweens[1].borrow().position(), 750.0);
    assert_eq!(tl.position(), 750.0);
    assert_abs_diff_eq!(hero.borrow().props().alpha, 0.75, epsilon = 1e-9);
    assert_abs_diff_eq!(shadow.borrow().props().alpha, 0.75, epsilon = 1e-9);
    assert_eq!(tl.current_label().as_deref(), Some("fadeIn"));
}

#[test]
fn unresolved_target_fails_the_build() {
    let mut s = Scheduler::default();
    let doc = json!({
        "tweens": [ { "target": "ghost", "keyframes": [ { "duration": 100 } ] } ]
    })
    .to_string();
    let mut targets: HashMap<String, TargetRef> = HashMap::new();
    let err = s.load_timeline_json(&doc, &mut targets).unwrap_err();
    assert_eq!(
        err,
        TweenError::UnresolvedTarget {
            key: "ghost".into()
        }
    );
    assert_eq!(err.category(), "target");
    assert_eq!(s.ticker().listener_count(), 0);
}

#[test]
fn capture_start_begins_from_current_values() {
    let mut s = Scheduler::default();
    let hero = TweenNode::new(s.create_target_id(), "hero").into_ref();
    hero.borrow_mut().props_mut().alpha = 0.4;
    let mut targets: HashMap<String, TargetRef> = HashMap::new();
    targets.insert("hero".into(), hero.clone());

    let doc = json!({
        "options": { "paused": true },
        "tweens": [ {
            "target": "hero",
            "captureStart": true,
            "keyframes": [ { "duration": 1000,
                "motions": [ { "kind": "alpha", "properties": [ { "from": 0, "to": 1 } ] } ] } ]
        } ]
    })
    .to_string();
    let tl = s.load_timeline_json(&doc, &mut targets).unwrap();
    tl.goto_and_stop(500.0).unwrap();
    assert!(tl.is_paused());
    assert!(!tl.is_subscribed());
    assert_abs_diff_eq!(hero.borrow().props().alpha, 0.7, epsilon = 1e-9);
}

#[test]
fn invalid_documents_are_rejected_before_building() {
    let negative = json!({
        "tweens": [ { "target": "a", "keyframes": [ { "duration": -5 } ] } ]
    })
    .to_string();
    assert!(matches!(
        parse_stored_timeline_json(&negative),
        Err(TweenError::InvalidDuration { .. })
    ));

    let empty = json!({ "tweens": [ { "target": "a", "keyframes": [] } ] }).to_string();
    assert_eq!(parse_stored_timeline_json(&empty).unwrap_err().category(), "serialization");

    let bad_label = json!({
        "labels": { "oops": -1 },
        "tweens": []
    })
    .to_string();
    assert!(parse_stored_timeline_json(&bad_label).is_err());
}
