//! Scroll region fixtures.

use std::rc::Rc;

use glam::Vec2;
use meshui_ui3d::{FlexNodeState, ScrollController};

use crate::ManualClock;

/// World units per pixel used by [`scroll_region`].
pub const PIXEL_SIZE: f32 = 0.01;

/// Laid-out node of `size` pixels holding `content` pixels of content.
pub fn scroll_node(size: Vec2, content: Vec2) -> Rc<FlexNodeState> {
    let node = FlexNodeState::new(PIXEL_SIZE);
    node.set_layout(size, content);
    Rc::new(node)
}

/// Controller over a fresh [`scroll_node`], driven by a [`ManualClock`].
pub fn scroll_region(size: Vec2, content: Vec2) -> (ScrollController, Rc<FlexNodeState>, ManualClock) {
    let node = scroll_node(size, content);
    let clock = ManualClock::new();
    let controller = ScrollController::with_clock(node.clone(), Box::new(clock.clone()));
    (controller, node, clock)
}

/// Tick `controller` at 60 Hz until it stops moving or `max_frames` pass.
/// Returns the number of frames ticked.
pub fn settle(controller: &mut ScrollController, max_frames: usize) -> usize {
    for frame in 0..max_frames {
        let before = controller.position().get();
        controller.tick(1.0 / 60.0);
        if controller.position().get() == before && controller.velocity() == Vec2::ZERO {
            return frame + 1;
        }
    }
    max_frames
}
