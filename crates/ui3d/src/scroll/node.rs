//! Layout node capability consumed by scrolling.

use glam::Vec2;
use meshui_core::Signal;
use serde::{Deserialize, Serialize};

/// Border inset in pixels, ordered top, right, bottom, left.
pub type Inset = [f32; 4];

/// Maximum scroll position per axis; `None` means the axis does not scroll.
pub type MaxScroll = [Option<f32>; 2];

/// Scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Horizontal
    X,
    /// Vertical
    Y,
}

impl Axis {
    /// Both axes.
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    /// Component index in vectors and arrays.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }

    /// The perpendicular axis.
    pub fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// Computed layout of an element, as provided by the flexbox engine.
pub trait FlexNode {
    /// Outer size in pixels.
    fn size(&self) -> Vec2;
    /// Border inset in pixels.
    fn border_inset(&self) -> Inset;
    /// Scroll bounds.
    fn max_scroll_position(&self) -> MaxScroll;
    /// Whether content overflows on each axis.
    fn scrollable(&self) -> [bool; 2];
    /// Whether any ancestor scrolls on each axis.
    fn any_ancestor_scrollable(&self) -> [bool; 2];
    /// World units per pixel.
    fn pixel_size(&self) -> f32;
}

/// [`FlexNode`] backed by signals, written by whoever runs layout.
#[derive(Debug, Clone)]
pub struct FlexNodeState {
    /// Outer size
    pub size: Signal<Vec2>,
    /// Border inset
    pub border_inset: Signal<Inset>,
    /// Scroll bounds
    pub max_scroll_position: Signal<MaxScroll>,
    /// Overflow flags
    pub scrollable: Signal<[bool; 2]>,
    /// Ancestor overflow flags
    pub any_ancestor_scrollable: Signal<[bool; 2]>,
    pixel_size: f32,
}

impl FlexNodeState {
    /// Create a node with zero size.
    pub fn new(pixel_size: f32) -> Self {
        Self {
            size: Signal::new(Vec2::ZERO),
            border_inset: Signal::new([0.0; 4]),
            max_scroll_position: Signal::new([None, None]),
            scrollable: Signal::new([false, false]),
            any_ancestor_scrollable: Signal::new([false, false]),
            pixel_size,
        }
    }

    /// Builder: Set the border inset
    pub fn with_border_inset(self, inset: Inset) -> Self {
        self.border_inset.set(inset);
        self
    }

    /// Builder: Mark ancestors as scrollable
    pub fn with_ancestor_scrollable(self, flags: [bool; 2]) -> Self {
        self.any_ancestor_scrollable.set(flags);
        self
    }

    /// Store the result of a layout pass. Scroll bounds are the overflow of `content_size`
    /// past the padding box; axes without overflow are not scrollable.
    pub fn set_layout(&self, size: Vec2, content_size: Vec2) {
        self.size.set(size);
        let inset = self.border_inset.get();
        let inner = Vec2::new(size.x - inset[1] - inset[3], size.y - inset[0] - inset[2]);
        let overflow = content_size - inner;
        let max = [
            (overflow.x > 0.0).then_some(overflow.x),
            (overflow.y > 0.0).then_some(overflow.y),
        ];
        self.max_scroll_position.set(max);
        self.scrollable.set([max[0].is_some(), max[1].is_some()]);
    }
}

impl FlexNode for FlexNodeState {
    fn size(&self) -> Vec2 {
        self.size.get()
    }

    fn border_inset(&self) -> Inset {
        self.border_inset.get()
    }

    fn max_scroll_position(&self) -> MaxScroll {
        self.max_scroll_position.get()
    }

    fn scrollable(&self) -> [bool; 2] {
        self.scrollable.get()
    }

    fn any_ancestor_scrollable(&self) -> [bool; 2] {
        self.any_ancestor_scrollable.get()
    }

    fn pixel_size(&self) -> f32 {
        self.pixel_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_derives_scroll_bounds() {
        let node = FlexNodeState::new(0.01).with_border_inset([2.0, 0.0, 2.0, 0.0]);
        node.set_layout(Vec2::new(100.0, 54.0), Vec2::new(80.0, 150.0));
        assert_eq!(node.max_scroll_position(), [None, Some(100.0)]);
        assert_eq!(node.scrollable(), [false, true]);
    }

    #[test]
    fn test_axis_helpers() {
        assert_eq!(Axis::X.other(), Axis::Y);
        assert_eq!(Axis::Y.index(), 1);
    }
}
