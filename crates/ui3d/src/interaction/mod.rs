//! 3D UI Interaction System
//!
//! Ray intersection against flat UI panels, adjusted by paint order and filtered by the
//! clip rectangles of scrolling / overflow-hidden ancestors.

pub mod clipping;
pub mod raycaster;

pub use clipping::{unit_square_sides, ClipRect, Plane};
pub use raycaster::{
    filter_and_adjust, intersect_panel, order_distance_bias, screen_to_ray, sort_intersections,
    ClippedPanel, Intersection, PanelHit, Ray, HIT_BIAS_ELEMENT_TYPE, HIT_BIAS_MAJOR,
    HIT_BIAS_MINOR,
};
