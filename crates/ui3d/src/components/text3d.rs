//! 3D Text Component

use std::sync::Arc;

use super::Transform3D;
use crate::text::{
    GlyphLayoutProperties, GlyphMetrics, HorizontalAlign, LayoutError, VerticalAlign, WordBreak,
};
use glam::Vec3;
use meshui_core::ZIndexOffset;

/// Text placed in a UI scene
#[derive(Debug, Clone)]
pub struct Text3D {
    /// Transform of the text box centre relative to its parent
    pub transform: Transform3D,

    /// Text content
    pub text: String,

    /// Font size in the parent's units
    pub font_size: f32,

    /// Line height multiplier
    pub line_height: f32,

    /// Extra space after each glyph
    pub letter_spacing: f32,

    /// Wrapping behaviour
    pub word_break: WordBreak,

    /// Horizontal alignment
    pub horizontal_align: HorizontalAlign,

    /// Vertical alignment
    pub vertical_align: VerticalAlign,

    /// Text color (RGBA)
    pub color: [f32; 4],

    /// Whether the text is visible
    pub visible: bool,

    /// Wrap width; `None` sizes the box to the content
    pub max_width: Option<f32>,

    /// Explicit paint order offset
    pub z_index: ZIndexOffset,
}

impl Default for Text3D {
    fn default() -> Self {
        Self {
            transform: Transform3D::default(),
            text: String::new(),
            font_size: 1.0,
            line_height: 1.2,
            letter_spacing: 0.0,
            word_break: WordBreak::default(),
            horizontal_align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            color: [1.0, 1.0, 1.0, 1.0],
            visible: true,
            max_width: None,
            z_index: ZIndexOffset::NONE,
        }
    }
}

impl Text3D {
    /// Create a new Text3D component
    pub fn new(position: Vec3, text: impl Into<String>) -> Self {
        Self {
            transform: Transform3D::new(position),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Builder: Set font size
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    /// Builder: Set line height multiplier
    pub fn with_line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }

    /// Builder: Set color
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Builder: Set alignment
    pub fn with_alignment(mut self, horizontal: HorizontalAlign, vertical: VerticalAlign) -> Self {
        self.horizontal_align = horizontal;
        self.vertical_align = vertical;
        self
    }

    /// Builder: Set max width for wrapping
    pub fn with_max_width(mut self, width: f32) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Builder: Set the wrap mode
    pub fn with_word_break(mut self, word_break: WordBreak) -> Self {
        self.word_break = word_break;
        self
    }

    /// Builder: Set the wrap mode from its configuration key
    pub fn with_word_break_key(self, key: &str) -> Result<Self, LayoutError> {
        Ok(self.with_word_break(key.parse()?))
    }

    /// Builder: Set the paint order offset
    pub fn with_z_index(mut self, z_index: impl Into<ZIndexOffset>) -> Self {
        self.z_index = z_index.into();
        self
    }

    /// Update the text content
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Get a reference to the text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Layout inputs for this text
    pub fn layout_properties(&self, font: Arc<dyn GlyphMetrics>) -> GlyphLayoutProperties {
        GlyphLayoutProperties::new(self.text.clone(), font)
            .with_font_size(self.font_size)
            .with_line_height(self.line_height)
            .with_letter_spacing(self.letter_spacing)
            .with_word_break(self.word_break)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text3d_creation() {
        let text = Text3D::new(Vec3::new(0.0, 10.0, 0.0), "Hello, World!");
        assert_eq!(text.text(), "Hello, World!");
        assert_eq!(text.transform.position, Vec3::new(0.0, 10.0, 0.0));
        assert!(text.visible);
    }

    #[test]
    fn test_text3d_builder() {
        let text = Text3D::new(Vec3::ZERO, "Test")
            .with_font_size(2.0)
            .with_color([1.0, 0.0, 0.0, 1.0])
            .with_alignment(HorizontalAlign::Center, VerticalAlign::Bottom)
            .with_max_width(8.0);

        assert_eq!(text.font_size, 2.0);
        assert_eq!(text.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(text.horizontal_align, HorizontalAlign::Center);
        assert_eq!(text.max_width, Some(8.0));
    }

    #[test]
    fn test_text3d_word_break_key() {
        let text = Text3D::new(Vec3::ZERO, "Test").with_word_break_key("keep-all").unwrap();
        assert_eq!(text.word_break, WordBreak::KeepAll);
        assert!(Text3D::new(Vec3::ZERO, "Test").with_word_break_key("wrap").is_err());
    }

    #[test]
    fn test_text3d_update() {
        let mut text = Text3D::new(Vec3::ZERO, "Initial");
        text.set_text("Updated");
        assert_eq!(text.text(), "Updated");
    }
}
