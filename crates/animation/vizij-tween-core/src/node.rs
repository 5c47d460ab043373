//! Reference target: a plain drawable node.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ids::TargetId;
use crate::target::{DrawableProps, TweenTarget, TweenTargetState};

static DETACHED: DrawableProps = DrawableProps {
    x: 0.0,
    y: 0.0,
    scale_x: 1.0,
    scale_y: 1.0,
    rotation: 0.0,
    alpha: 1.0,
    visible: true,
    text: String::new(),
    graphics: None,
};

/// Named node whose tweened properties live in attached [`DrawableProps`].
#[derive(Debug)]
pub struct TweenNode {
    id: TargetId,
    name: String,
    state: TweenTargetState,
}

impl TweenNode {
    /// New node with default drawable properties attached.
    pub fn new(id: TargetId, name: impl Into<String>) -> Self {
        let mut state = TweenTargetState::new();
        state.drawable_or_default();
        Self {
            id,
            name: name.into(),
            state,
        }
    }

    pub fn into_ref(self) -> Rc<RefCell<TweenNode>> {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current drawable properties; defaults when detached.
    pub fn props(&self) -> &DrawableProps {
        self.state.drawable().unwrap_or(&DETACHED)
    }

    pub fn props_mut(&mut self) -> &mut DrawableProps {
        self.state.drawable_or_default()
    }
}

impl TweenTarget for TweenNode {
    fn target_id(&self) -> TargetId {
        self.id
    }

    fn tween_state(&self) -> &TweenTargetState {
        &self.state
    }

    fn tween_state_mut(&mut self) -> &mut TweenTargetState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{PropertyMask, TweenMotion};

    #[test]
    fn detached_node_ignores_motions() {
        let mut node = TweenNode::new(TargetId(3), "n");
        node.detach_drawable();
        let mut motion = TweenMotion::alpha(0.0, 0.5);
        motion.update(10.0);
        node.set_tween_motion(&motion, PropertyMask::ALL);
        assert!(node.drawable().is_none());
        assert_eq!(node.props().alpha, 1.0);
    }

    #[test]
    fn attached_node_takes_text() {
        let mut node = TweenNode::new(TargetId(4), "label");
        let mut motion = TweenMotion::text("A", "B");
        motion.update(0.0);
        node.set_tween_motion(&motion, PropertyMask::ALL);
        assert_eq!(node.props().text, "B");
        assert_eq!(node.name(), "label");
    }
}
