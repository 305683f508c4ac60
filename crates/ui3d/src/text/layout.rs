//! Glyph layout: splitting text into measured lines.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::font::{GlyphInfo, GlyphMetrics};
use super::wrap::{WordBreak, WrapContext};

/// Errors raised when configuring layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The `word-break` key does not name a wrap strategy.
    #[error("unknown word-break mode {0:?} (expected keep-all, break-all or break-word)")]
    UnknownWordBreak(String),
}

/// Vertical distance between two consecutive lines.
pub fn line_advance(font_size: f32, line_height: f32) -> f32 {
    font_size * line_height
}

/// Height of a block of `lines` lines.
pub fn glyph_layout_height(lines: usize, font_size: f32, line_height: f32) -> f32 {
    lines as f32 * line_advance(font_size, line_height)
}

/// Horizontal distance from one glyph's pen position to the next.
pub fn glyph_advance(info: &GlyphInfo, font_size: f32, letter_spacing: f32) -> f32 {
    info.x_advance * font_size + letter_spacing
}

/// Horizontal offset of a glyph box from the pen position, including kerning with the
/// previous glyph.
pub fn glyph_offset_x(
    font: &dyn GlyphMetrics,
    font_size: f32,
    info: &GlyphInfo,
    prev_glyph_id: Option<u32>,
) -> f32 {
    let kerning = prev_glyph_id.map_or(0.0, |prev| font.kerning(prev, info.id));
    (kerning + info.x_offset) * font_size
}

/// Vertical offset (downwards) of a glyph box from the top of its line. The font box is
/// centred in the line advance.
pub fn glyph_offset_y(font_size: f32, line_height: f32, info: Option<&GlyphInfo>) -> f32 {
    let leading = (line_advance(font_size, line_height) - font_size) / 2.0;
    leading + info.map_or(0.0, |i| i.y_offset * font_size)
}

/// One visual line: a half-open char range plus alignment metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphLayoutLine {
    /// First char of the line.
    pub char_index_offset: usize,
    /// Chars belonging to the line, including hanging whitespace, excluding a forced
    /// line break.
    pub char_length: usize,
    /// Chars up to and including the last non-whitespace char.
    pub non_whitespace_char_length: usize,
    /// Width of the first `non_whitespace_char_length` chars.
    pub non_whitespace_width: f32,
    /// Whitespace chars inside the non-whitespace span (justification gaps).
    pub whitespaces_between: usize,
}

impl GlyphLayoutLine {
    /// Empty line starting at `offset`.
    pub fn empty(offset: usize) -> Self {
        Self {
            char_index_offset: offset,
            ..Self::default()
        }
    }

    /// One past the last char of the line.
    pub fn char_index_end(&self) -> usize {
        self.char_index_offset + self.char_length
    }
}

/// Text and style inputs of a layout pass.
#[derive(Clone)]
pub struct GlyphLayoutProperties {
    /// Text to lay out.
    pub text: String,
    /// Glyph metrics provider.
    pub font: Arc<dyn GlyphMetrics>,
    /// Font size in local units.
    pub font_size: f32,
    /// Line advance as a multiple of the font size.
    pub line_height: f32,
    /// Extra space after each glyph.
    pub letter_spacing: f32,
    /// Wrapping behaviour.
    pub word_break: WordBreak,
}

impl GlyphLayoutProperties {
    /// Properties with default styling: size 16, line height 1.2, no letter spacing,
    /// `break-word`.
    pub fn new(text: impl Into<String>, font: Arc<dyn GlyphMetrics>) -> Self {
        Self {
            text: text.into(),
            font,
            font_size: 16.0,
            line_height: 1.2,
            letter_spacing: 0.0,
            word_break: WordBreak::default(),
        }
    }

    /// Builder: Set font size
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Builder: Set line height multiplier
    pub fn with_line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }

    /// Builder: Set letter spacing
    pub fn with_letter_spacing(mut self, letter_spacing: f32) -> Self {
        self.letter_spacing = letter_spacing;
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

    /// Vertical distance between lines.
    pub fn line_advance(&self) -> f32 {
        line_advance(self.font_size, self.line_height)
    }

    fn wrap_context<'a>(&'a self, chars: &'a [char]) -> WrapContext<'a> {
        WrapContext {
            chars,
            font: self.font.as_ref(),
            font_size: self.font_size,
            letter_spacing: self.letter_spacing,
        }
    }
}

impl fmt::Debug for GlyphLayoutProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphLayoutProperties")
            .field("text", &self.text)
            .field("font_size", &self.font_size)
            .field("line_height", &self.line_height)
            .field("letter_spacing", &self.letter_spacing)
            .field("word_break", &self.word_break)
            .finish_non_exhaustive()
    }
}

/// Size of laid-out text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMeasurement {
    /// Widest line without hanging whitespace.
    pub width: f32,
    /// Height of all lines.
    pub height: f32,
    /// Number of lines.
    pub line_count: usize,
}

/// Result of a layout pass. Immutable; a new pass produces a new layout.
#[derive(Debug, Clone)]
pub struct GlyphLayout {
    /// Lines in visual order.
    pub lines: Vec<GlyphLayoutLine>,
    /// Width of the text box.
    pub available_width: f32,
    /// Height of the text box.
    pub available_height: f32,
    /// Inputs the layout was built from.
    pub properties: GlyphLayoutProperties,
    chars: Vec<char>,
}

impl GlyphLayout {
    /// Text as characters; line ranges index into this.
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Number of chars in the text.
    pub fn char_count(&self) -> usize {
        self.chars.len()
    }

    /// Vertical distance between lines.
    pub fn line_advance(&self) -> f32 {
        self.properties.line_advance()
    }

    /// Height of all lines.
    pub fn height(&self) -> f32 {
        glyph_layout_height(
            self.lines.len(),
            self.properties.font_size,
            self.properties.line_height,
        )
    }

    /// The text of one line, without a trailing forced break.
    pub fn line_text(&self, index: usize) -> Option<String> {
        let line = self.lines.get(index)?;
        Some(self.chars[line.char_index_offset..line.char_index_end()].iter().collect())
    }
}

/// Run the wrap strategy over the whole text. `on_line` sees every produced line.
fn for_each_line(
    properties: &GlyphLayoutProperties,
    chars: &[char],
    available_width: Option<f32>,
    mut on_line: impl FnMut(GlyphLayoutLine),
) {
    let strategy = properties.word_break.strategy();
    let ctx = properties.wrap_context(chars);
    let mut char_index = 0;
    let mut produced = 0usize;
    while char_index < chars.len() {
        let wrapped = strategy.wrap_line(&ctx, available_width, char_index);
        on_line(wrapped.line);
        produced += 1;
        char_index = wrapped.next_char_index.max(char_index + 1);
    }
    // Callers place carets on the last line, so there is always at least one.
    if produced == 0 || chars.last() == Some(&'\n') {
        on_line(GlyphLayoutLine::empty(chars.len()));
    }
}

/// Measure text without building a layout.
pub fn measure_glyph_layout(
    properties: &GlyphLayoutProperties,
    available_width: Option<f32>,
) -> GlyphMeasurement {
    let chars: Vec<char> = properties.text.chars().collect();
    let mut width = 0.0f32;
    let mut line_count = 0;
    for_each_line(properties, &chars, available_width, |line| {
        width = width.max(line.non_whitespace_width);
        line_count += 1;
    });
    GlyphMeasurement {
        width,
        height: glyph_layout_height(line_count, properties.font_size, properties.line_height),
        line_count,
    }
}

/// Build the line layout for a text box.
pub fn build_glyph_layout(
    properties: &GlyphLayoutProperties,
    available_width: f32,
    available_height: f32,
) -> GlyphLayout {
    let chars: Vec<char> = properties.text.chars().collect();
    let mut lines = Vec::new();
    for_each_line(properties, &chars, Some(available_width), |line| lines.push(line));
    debug!(
        chars = chars.len(),
        lines = lines.len(),
        available_width,
        mode = %properties.word_break,
        "built glyph layout"
    );
    GlyphLayout {
        lines,
        available_width,
        available_height,
        properties: properties.clone(),
        chars,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct HalfEm;

    impl GlyphMetrics for HalfEm {
        fn glyph_info(&self, c: char) -> GlyphInfo {
            GlyphInfo {
                id: c as u32,
                x_advance: 0.5,
                width: 0.5,
                height: 1.0,
                ..Default::default()
            }
        }
    }

    fn props(text: &str) -> GlyphLayoutProperties {
        GlyphLayoutProperties::new(text, Arc::new(HalfEm))
            .with_font_size(10.0)
            .with_line_height(1.0)
    }

    #[test]
    fn empty_text_has_one_empty_line() {
        let layout = build_glyph_layout(&props(""), 100.0, 100.0);
        assert_eq!(layout.lines.len(), 1);
        assert_eq!(layout.lines[0].char_length, 0);
        assert_eq!(measure_glyph_layout(&props(""), None).line_count, 1);
    }

    #[test]
    fn trailing_newline_adds_empty_line() {
        let layout = build_glyph_layout(&props("ab\n"), 100.0, 100.0);
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[1], GlyphLayoutLine::empty(3));
        assert_eq!(layout.height(), 20.0);
    }

    #[test]
    fn consecutive_newlines_give_empty_lines() {
        let layout = build_glyph_layout(&props("a\n\nb"), 100.0, 100.0);
        let ranges: Vec<(usize, usize)> = layout
            .lines
            .iter()
            .map(|l| (l.char_index_offset, l.char_length))
            .collect();
        assert_eq!(ranges, vec![(0, 1), (2, 0), (3, 1)]);
    }

    #[test]
    fn measure_reports_widest_line() {
        let m = measure_glyph_layout(&props("abcd\nab"), None);
        assert_eq!(m.line_count, 2);
        assert_eq!(m.width, 20.0);
        assert_eq!(m.height, 20.0);
    }

    #[test]
    fn letter_spacing_widens_lines() {
        let m = measure_glyph_layout(&props("abc").with_letter_spacing(1.0), None);
        assert_eq!(m.width, 18.0);
    }

    #[test]
    fn unknown_word_break_key_fails_fast() {
        assert!(props("x").with_word_break_key("anywhere").is_err());
        assert_eq!(
            props("x").with_word_break_key("break-all").unwrap().word_break,
            WordBreak::BreakAll
        );
    }

    #[test]
    fn line_text_skips_forced_break() {
        let layout = build_glyph_layout(&props("ab\ncd"), 100.0, 100.0);
        assert_eq!(layout.line_text(0).as_deref(), Some("ab"));
        assert_eq!(layout.line_text(1).as_deref(), Some("cd"));
    }
}
