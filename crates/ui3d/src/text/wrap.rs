//! Line wrapping strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::font::GlyphMetrics;
use super::layout::{glyph_advance, GlyphLayoutLine, LayoutError};

/// Wrapping behaviour, named after the CSS `word-break` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WordBreak {
    /// Only break at explicit newlines.
    KeepAll,
    /// Break between any two glyphs when the line is full.
    BreakAll,
    /// Break after whitespace; split a word only when it alone overflows.
    #[default]
    BreakWord,
}

impl WordBreak {
    /// All variants with their configuration keys.
    pub const ALL: [(&'static str, WordBreak); 3] = [
        ("keep-all", WordBreak::KeepAll),
        ("break-all", WordBreak::BreakAll),
        ("break-word", WordBreak::BreakWord),
    ];

    /// Configuration key of this mode.
    pub fn key(self) -> &'static str {
        match self {
            WordBreak::KeepAll => "keep-all",
            WordBreak::BreakAll => "break-all",
            WordBreak::BreakWord => "break-word",
        }
    }

    /// Strategy implementing this mode.
    pub fn strategy(self) -> &'static dyn WrapStrategy {
        match self {
            WordBreak::KeepAll => &KeepAll,
            WordBreak::BreakAll => &BreakAll,
            WordBreak::BreakWord => &BreakWord,
        }
    }
}

impl FromStr for WordBreak {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|(key, _)| *key == s)
            .map(|(_, mode)| *mode)
            .ok_or_else(|| LayoutError::UnknownWordBreak(s.to_string()))
    }
}

impl fmt::Display for WordBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Inputs shared by every strategy for one layout pass.
#[derive(Clone, Copy)]
pub struct WrapContext<'a> {
    /// Text as characters; indices are char indices.
    pub chars: &'a [char],
    /// Glyph metrics provider.
    pub font: &'a dyn GlyphMetrics,
    /// Font size in local units.
    pub font_size: f32,
    /// Extra space after each glyph.
    pub letter_spacing: f32,
}

impl WrapContext<'_> {
    fn advance(&self, c: char) -> f32 {
        glyph_advance(&self.font.glyph_info(c), self.font_size, self.letter_spacing)
    }
}

/// One line produced by a strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrappedLine {
    /// The line's char range and metrics.
    pub line: GlyphLayoutLine,
    /// Where the next line starts; skips a consumed `\n`.
    pub next_char_index: usize,
}

/// Splits text into lines.
pub trait WrapStrategy: Sync {
    /// Produce the line starting at `start`. `available_width` of `None` disables soft
    /// wrapping.
    fn wrap_line(
        &self,
        ctx: &WrapContext<'_>,
        available_width: Option<f32>,
        start: usize,
    ) -> WrappedLine;
}

/// Whitespace that may separate words on a line.
pub fn is_line_whitespace(c: char) -> bool {
    c != '\n' && c.is_whitespace()
}

/// Fill line metrics for the char range `[start, end)`.
pub fn measure_line(ctx: &WrapContext<'_>, start: usize, end: usize) -> GlyphLayoutLine {
    let range = &ctx.chars[start..end];
    let non_whitespace_char_length = range
        .iter()
        .rposition(|c| !is_line_whitespace(*c))
        .map_or(0, |i| i + 1);
    let content = &range[..non_whitespace_char_length];
    GlyphLayoutLine {
        char_index_offset: start,
        char_length: end - start,
        non_whitespace_char_length,
        non_whitespace_width: content.iter().map(|c| ctx.advance(*c)).sum(),
        whitespaces_between: content.iter().filter(|c| is_line_whitespace(**c)).count(),
    }
}

/// Scan result shared by the strategies: where the line must end at the latest.
struct Scan {
    /// End of the line content (exclusive).
    end: usize,
    /// Next line start.
    next: usize,
    /// Index of the first glyph that did not fit, if the line overflowed.
    overflow_at: Option<usize>,
    /// End of the last whitespace run following content, a soft break opportunity.
    last_break: Option<usize>,
}

fn scan(ctx: &WrapContext<'_>, available_width: Option<f32>, start: usize) -> Scan {
    let chars = ctx.chars;
    let mut x = 0.0f32;
    let mut seen_content = false;
    let mut last_break = None;
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            return Scan {
                end: i,
                next: i + 1,
                overflow_at: None,
                last_break,
            };
        }
        let advance = ctx.advance(c);
        if is_line_whitespace(c) {
            x += advance;
            if seen_content && chars.get(i + 1).is_some_and(|n| !n.is_whitespace()) {
                last_break = Some(i + 1);
            }
            i += 1;
            continue;
        }
        if let Some(width) = available_width {
            if i > start && x + advance > width {
                return Scan {
                    end: i,
                    next: i,
                    overflow_at: Some(i),
                    last_break,
                };
            }
        }
        seen_content = true;
        x += advance;
        i += 1;
    }
    Scan {
        end: chars.len(),
        next: chars.len(),
        overflow_at: None,
        last_break,
    }
}

fn finish(ctx: &WrapContext<'_>, start: usize, end: usize, next: usize) -> WrappedLine {
    WrappedLine {
        line: measure_line(ctx, start, end),
        next_char_index: next,
    }
}

/// `keep-all`: no soft wrapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl WrapStrategy for KeepAll {
    fn wrap_line(&self, ctx: &WrapContext<'_>, _: Option<f32>, start: usize) -> WrappedLine {
        let scan = scan(ctx, None, start);
        finish(ctx, start, scan.end, scan.next)
    }
}

/// `break-all`: break before the first glyph that overflows.
#[derive(Debug, Clone, Copy, Default)]
pub struct BreakAll;

impl WrapStrategy for BreakAll {
    fn wrap_line(
        &self,
        ctx: &WrapContext<'_>,
        available_width: Option<f32>,
        start: usize,
    ) -> WrappedLine {
        let scan = scan(ctx, available_width, start);
        finish(ctx, start, scan.end, scan.next)
    }
}

/// `break-word`: break at the last whitespace that fits, splitting words only as a
/// fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct BreakWord;

impl WrapStrategy for BreakWord {
    fn wrap_line(
        &self,
        ctx: &WrapContext<'_>,
        available_width: Option<f32>,
        start: usize,
    ) -> WrappedLine {
        let scan = scan(ctx, available_width, start);
        match (scan.overflow_at, scan.last_break) {
            (Some(_), Some(at)) => finish(ctx, start, at, at),
            _ => finish(ctx, start, scan.end, scan.next),
        }
    }
}
