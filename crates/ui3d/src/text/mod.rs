//! Text layout and glyph rendering state

pub mod font;
pub mod layout;
pub mod render;
pub mod selection;
pub mod wrap;

pub use font::{FontError, FontdueMetrics, GlyphInfo, GlyphMetrics, ASCII_RANGE};
pub use layout::{
    build_glyph_layout, glyph_advance, glyph_layout_height, line_advance, measure_glyph_layout,
    GlyphLayout, GlyphLayoutLine, GlyphLayoutProperties, GlyphMeasurement, LayoutError,
};
pub use render::{
    GlyphEntry, GlyphInstance, GlyphSlot, HorizontalAlign, SlotId, TextRenderState,
    VerticalAlign, MIN_VISIBLE_OPACITY,
};
pub use selection::{Caret, SelectionBox, SelectionGeometry, SelectionRange};
pub use wrap::{WordBreak, WrapContext, WrapStrategy, WrappedLine};
