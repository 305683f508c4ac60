//! Fixed-pitch glyph metrics.

use meshui_ui3d::{GlyphInfo, GlyphMetrics};

/// Every glyph advances by the same amount; whitespace has an empty box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceFont {
    /// Pen advance in font-size units.
    pub advance: f32,
    /// Glyph box height in font-size units.
    pub height: f32,
}

impl Default for MonospaceFont {
    fn default() -> Self {
        Self {
            advance: 0.5,
            height: 1.0,
        }
    }
}

impl MonospaceFont {
    /// Font with the given advance and a full-height box.
    pub fn new(advance: f32) -> Self {
        Self {
            advance,
            ..Default::default()
        }
    }
}

impl GlyphMetrics for MonospaceFont {
    fn glyph_info(&self, c: char) -> GlyphInfo {
        let blank = c.is_whitespace();
        GlyphInfo {
            id: c as u32,
            x_advance: self.advance,
            width: if blank { 0.0 } else { self.advance },
            height: if blank { 0.0 } else { self.height },
            uv_max: (1.0, 1.0),
            ..Default::default()
        }
    }
}
