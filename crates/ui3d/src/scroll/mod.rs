//! Scrollable regions: input handling, inertia and scrollbars

pub mod controller;
pub mod node;
pub mod scrollbar;

pub use controller::{
    compute_scroll, outside_distance, Clock, PointerEvent, ScrollController, ScrollEventContext,
    ScrollListener, ScrollState, SystemClock, WheelEvent,
};
pub use node::{Axis, FlexNode, FlexNodeState, Inset, MaxScroll};
pub use scrollbar::{
    compute_scrollbar_geometry, scroll_matrix, ScrollbarGeometry, DEFAULT_SCROLLBAR_WIDTH,
};
