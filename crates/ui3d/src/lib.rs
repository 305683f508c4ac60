#![warn(missing_docs)]
//! Spatial UI composition for meshui
//!
//! UI elements live on flat panels placed in a 3D scene. This crate decides how they
//! stack, which one a pointer ray hits, how their text is laid out and drawn, and how
//! scrollable regions move their content.
//!
//! # Features
//!
//! - **Paint order**: Hierarchical order resolution shared by drawing and hit-testing
//! - **Hit-testing**: Ray/panel intersection clipped by overflow-hidden ancestors
//! - **Text**: Glyph layout with three wrap modes, pooled glyph slots and selection
//! - **Scrolling**: Drag, wheel and inertia with rubber-banding and scrollbars
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meshui_ui3d::{FontdueMetrics, Panel3D, Text3D, UiScene};
//! use glam::Vec3;
//!
//! # fn main() -> anyhow::Result<()> {
//! let font = Arc::new(FontdueMetrics::from_file("assets/fonts/ui.ttf")?);
//! let mut scene = UiScene::new(font);
//!
//! let panel = scene.add_panel(None, Panel3D::new(Vec3::ZERO, 4.0, 2.0))?;
//! scene.add_text(Some(panel), Text3D::new(Vec3::ZERO, "Welcome!").with_max_width(3.5))?;
//!
//! let draw_list = scene.draw_list(Vec3::new(0.0, 0.0, 5.0));
//! # let _ = draw_list;
//! # Ok(())
//! # }
//! ```

pub mod components;
pub mod interaction;
pub mod manager;
pub mod scroll;
pub mod text;

// Re-export commonly used types
pub use components::{Panel3D, Text3D, Transform3D};
pub use interaction::{
    screen_to_ray, sort_intersections, ClipRect, ClippedPanel, Intersection, PanelHit, Ray,
};
pub use manager::{DrawItem, SceneError, UiElementHandle, UiScene};
pub use scroll::{
    compute_scroll, compute_scrollbar_geometry, Axis, Clock, FlexNode, FlexNodeState,
    PointerEvent, ScrollController, ScrollbarGeometry, SystemClock, WheelEvent,
};
pub use text::{
    build_glyph_layout, measure_glyph_layout, FontdueMetrics, GlyphInfo, GlyphLayout,
    GlyphLayoutProperties, GlyphMetrics, HorizontalAlign, SelectionRange, TextRenderState,
    VerticalAlign, WordBreak,
};

/// Version of the ui3d crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
