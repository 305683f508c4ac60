//! Caret and selection box geometry.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::layout::{glyph_offset_y, GlyphLayout};
use super::render::TextRenderState;

/// Half-open char range `[start, end)`. A range with `end <= start` is a caret at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRange {
    /// First selected char.
    pub start: usize,
    /// One past the last selected char.
    pub end: usize,
}

impl SelectionRange {
    /// Create a range.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Caret at `index`.
    pub fn caret(index: usize) -> Self {
        Self::new(index, index)
    }

    /// Returns true when the range selects nothing.
    pub fn is_degenerate(&self) -> bool {
        self.end <= self.start
    }
}

/// Text cursor in the text-local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Caret {
    /// Vertical centre of the caret.
    pub position: Vec2,
    /// Caret height.
    pub height: f32,
}

/// Highlight rectangle covering the selected part of one line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectionBox {
    /// Centre of the box.
    pub position: Vec2,
    /// Width and height.
    pub size: Vec2,
}

/// Selection overlay: a caret for degenerate ranges, boxes otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionGeometry {
    /// Caret, when the range is degenerate.
    pub caret: Option<Caret>,
    /// One box per covered line.
    pub boxes: Vec<SelectionBox>,
}

/// Line index and x of a char boundary.
#[derive(Debug, Clone, Copy)]
struct Located {
    line: usize,
    x: f32,
}

impl TextRenderState {
    pub(super) fn compute_selection(&self, range: Option<SelectionRange>) -> SelectionGeometry {
        let (Some(range), Some(layout)) = (range, self.layout.as_deref()) else {
            return SelectionGeometry::default();
        };
        if layout.lines.is_empty() {
            return SelectionGeometry::default();
        }
        let font_size = layout.properties.font_size;

        if range.is_degenerate() {
            let at = self.locate_caret(layout, range.end);
            return SelectionGeometry {
                caret: Some(Caret {
                    position: Vec2::new(at.x, self.line_top(layout, at.line) - font_size / 2.0),
                    height: font_size,
                }),
                boxes: Vec::new(),
            };
        }

        let start = self.locate_start(layout, range.start);
        let end = self.locate_end(layout, range.end - 1);
        let boxes = if start.line > end.line {
            // Only a forced line break is selected.
            Vec::new()
        } else if start.line == end.line && start.x == end.x {
            // Nothing drawable, e.g. a range past the end of the text.
            Vec::new()
        } else if start.line == end.line {
            vec![self.selection_box(layout, start.line, start.x, end.x)]
        } else {
            let mut boxes = Vec::with_capacity(end.line - start.line + 1);
            boxes.push(self.selection_box(
                layout,
                start.line,
                start.x,
                self.line_end_x(layout, start.line),
            ));
            for line in start.line + 1..end.line {
                boxes.push(self.selection_box(
                    layout,
                    line,
                    self.line_start_x(layout, line),
                    self.line_end_x(layout, line),
                ));
            }
            boxes.push(self.selection_box(
                layout,
                end.line,
                self.line_start_x(layout, end.line),
                end.x,
            ));
            boxes
        };
        SelectionGeometry { caret: None, boxes }
    }

    fn selection_box(
        &self,
        layout: &GlyphLayout,
        line: usize,
        start_x: f32,
        end_x: f32,
    ) -> SelectionBox {
        let height = layout.properties.font_size;
        let width = end_x - start_x;
        SelectionBox {
            position: Vec2::new(
                start_x + width / 2.0,
                self.line_top(layout, line) - height / 2.0,
            ),
            size: Vec2::new(width, height),
        }
    }

    /// Top of the font box of a line.
    fn line_top(&self, layout: &GlyphLayout, line: usize) -> f32 {
        let props = &layout.properties;
        self.text_top(layout)
            - line as f32 * layout.line_advance()
            - glyph_offset_y(props.font_size, props.line_height, None)
    }

    /// Leading x of the boundary before `index` within `line`.
    fn boundary_x(&self, layout: &GlyphLayout, line: usize, index: usize) -> f32 {
        let local = index.saturating_sub(layout.lines[line].char_index_offset);
        match self.lines[line].get(local) {
            Some(entry) => self.entry_x(entry, 0.0),
            None => self.line_end_x(layout, line),
        }
    }

    fn last_line_end(&self, layout: &GlyphLayout) -> Located {
        let line = layout.lines.len() - 1;
        Located {
            line,
            x: self.line_end_x(layout, line),
        }
    }

    /// A caret sits on the first line whose range reaches it.
    fn locate_caret(&self, layout: &GlyphLayout, index: usize) -> Located {
        layout
            .lines
            .iter()
            .position(|l| index <= l.char_index_end())
            .map(|line| Located {
                line,
                x: self.boundary_x(layout, line, index),
            })
            .unwrap_or_else(|| self.last_line_end(layout))
    }

    /// A selection start at a line boundary belongs to the following line.
    fn locate_start(&self, layout: &GlyphLayout, index: usize) -> Located {
        layout
            .lines
            .iter()
            .position(|l| index < l.char_index_end())
            .map(|line| Located {
                line,
                x: self.boundary_x(layout, line, index),
            })
            .unwrap_or_else(|| self.last_line_end(layout))
    }

    /// Trailing edge of the last selected char; a selected forced break ends its line.
    fn locate_end(&self, layout: &GlyphLayout, last: usize) -> Located {
        let chars = layout.chars();
        for (line, l) in layout.lines.iter().enumerate() {
            if last < l.char_index_end() {
                let local = last.saturating_sub(l.char_index_offset);
                let x = match self.lines[line].get(local) {
                    Some(entry) => self.entry_x(entry, 1.0),
                    None => self.line_end_x(layout, line),
                };
                return Located { line, x };
            }
            if last == l.char_index_end() && chars.get(last) == Some(&'\n') {
                return Located {
                    line,
                    x: self.line_end_x(layout, line),
                };
            }
        }
        self.last_line_end(layout)
    }
}
