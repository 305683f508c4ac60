//! Text render state - reconciles a glyph layout against a pool of glyph slots

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::layout::{
    glyph_advance, glyph_layout_height, glyph_offset_x, glyph_offset_y, GlyphLayout,
    GlyphLayoutLine,
};
use super::selection::{SelectionGeometry, SelectionRange};
use super::wrap::is_line_whitespace;
use crate::interaction::ClipRect;

/// Text is hidden below this opacity.
pub const MIN_VISIBLE_OPACITY: f32 = 0.01;

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HorizontalAlign {
    /// Flush left
    #[default]
    Left,
    /// Centred
    Center,
    /// Flush right
    Right,
    /// Justified; the last line stays flush left
    Block,
}

/// Vertical text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalAlign {
    /// Lines start at the top of the box
    #[default]
    Top,
    /// Lines are centred in the box
    Center,
    /// Lines end at the bottom of the box
    Bottom,
}

/// Index of a slot in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

/// One cell of a laid-out line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlyphEntry {
    /// Whitespace or hanging char; only its cell is kept
    Placeholder {
        /// Pen position of the cell
        pen: f32,
        /// Cell width, including letter spacing and justification stretch
        advance: f32,
    },
    /// A char drawn by a pool slot
    Glyph(SlotId),
}

/// A reusable renderable glyph
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphSlot {
    /// Glyph index in the font
    pub glyph_id: u32,
    /// Character currently shown
    pub ch: char,
    /// Pen position of the cell
    pub pen_x: f32,
    /// Horizontal advance of the glyph
    pub advance: f32,
    /// Top-left corner of the glyph box (text-local frame, +Y up)
    pub position: Vec2,
    /// Glyph box size
    pub size: Vec2,
    /// Atlas coordinates
    pub uv_min: Vec2,
    /// Atlas coordinates
    pub uv_max: Vec2,
    /// RGB color
    pub color: [f32; 3],
    /// Opacity
    pub opacity: f32,
    /// Bound to a cell of the current layout
    pub visible: bool,
    /// Centre lies outside the ancestor clip rectangle
    pub clipped: bool,
}

impl GlyphSlot {
    fn new(color: [f32; 3], opacity: f32) -> Self {
        Self {
            glyph_id: 0,
            ch: ' ',
            pen_x: 0.0,
            advance: 0.0,
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            uv_min: Vec2::ZERO,
            uv_max: Vec2::ZERO,
            color,
            opacity,
            visible: false,
            clipped: false,
        }
    }

    /// Centre of the glyph box
    pub fn center(&self) -> Vec2 {
        self.position + Vec2::new(self.size.x, -self.size.y) * 0.5
    }

    /// X of the cell scaled by `fraction` of its advance (0 = leading edge, 1 = trailing)
    pub fn x_at(&self, fraction: f32) -> f32 {
        self.pen_x + fraction * self.advance
    }

    fn update_clipped(&mut self, base_matrix: &Mat4, clip: Option<&ClipRect>) {
        self.clipped = match clip {
            Some(rect) => {
                let center = base_matrix.transform_point3(self.center().extend(0.0));
                !rect.contains(center.truncate())
            }
            None => false,
        };
    }
}

/// GPU record for one glyph quad
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GlyphInstance {
    /// Maps the unit quad (centred, +Y up) into the frame of the base matrix
    pub model: [[f32; 4]; 4],
    /// Atlas coordinates
    pub uv_min: [f32; 2],
    /// Atlas coordinates
    pub uv_max: [f32; 2],
    /// Text color (RGBA)
    pub color: [f32; 4],
}

/// Glyph slot pool of one text element
#[derive(Debug)]
pub struct TextRenderState {
    pub(super) lines: Vec<Vec<GlyphEntry>>,
    slots: Vec<GlyphSlot>,
    spare: Vec<SlotId>,
    allocations: usize,
    pub(super) layout: Option<Arc<GlyphLayout>>,
    pub(super) horizontal_align: HorizontalAlign,
    pub(super) vertical_align: VerticalAlign,
    color: [f32; 3],
    opacity: f32,
    hidden: bool,
    shown: bool,
    base_matrix: Mat4,
    clip: Option<ClipRect>,
    pub(super) selection_range: Option<SelectionRange>,
    pub(super) selection: SelectionGeometry,
}

impl Default for TextRenderState {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRenderState {
    /// Create an empty state: white, opaque, shown, identity transform
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            slots: Vec::new(),
            spare: Vec::new(),
            allocations: 0,
            layout: None,
            horizontal_align: HorizontalAlign::default(),
            vertical_align: VerticalAlign::default(),
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            hidden: false,
            shown: true,
            base_matrix: Mat4::IDENTITY,
            clip: None,
            selection_range: None,
            selection: SelectionGeometry::default(),
        }
    }

    /// Builder: Set alignment
    pub fn with_alignment(mut self, horizontal: HorizontalAlign, vertical: VerticalAlign) -> Self {
        self.horizontal_align = horizontal;
        self.vertical_align = vertical;
        self
    }

    /// Reconcile the pool against a new layout.
    pub fn apply_layout(&mut self, layout: Arc<GlyphLayout>) {
        let allocations_before = self.allocations;
        let props = &layout.properties;
        let font = props.font.as_ref();
        let chars = layout.chars();
        let available_width = layout.available_width;
        let line_advance = layout.line_advance();
        let line_count = layout.lines.len();
        let mut y = top_offset(&layout, self.vertical_align) - layout.available_height / 2.0;

        for (line_index, line) in layout.lines.iter().enumerate() {
            if line_index == self.lines.len() {
                self.lines.push(Vec::new());
            }
            let is_last = line_index + 1 == line_count;
            let offset_per_whitespace = match self.horizontal_align {
                HorizontalAlign::Block if !is_last && line.whitespaces_between > 0 => {
                    (available_width - line.non_whitespace_width) / line.whitespaces_between as f32
                }
                _ => 0.0,
            };
            let mut x = align_x(available_width, line, self.horizontal_align);
            let mut prev_glyph_id = None;

            for glyph_index in 0..line.char_length {
                let c = chars[line.char_index_offset + glyph_index];
                let info = font.glyph_info(c);
                let advance = glyph_advance(&info, props.font_size, props.letter_spacing);

                if is_line_whitespace(c) || glyph_index >= line.non_whitespace_char_length {
                    let stretch = match glyph_index < line.non_whitespace_char_length {
                        true => offset_per_whitespace,
                        false => 0.0,
                    };
                    let cell = GlyphEntry::Placeholder {
                        pen: x,
                        advance: advance + stretch,
                    };
                    let entries = &mut self.lines[line_index];
                    match entries.get_mut(glyph_index) {
                        Some(entry @ GlyphEntry::Placeholder { .. }) => *entry = cell,
                        _ => entries.insert(glyph_index, cell),
                    }
                    x += advance + stretch;
                    prev_glyph_id = Some(info.id);
                    continue;
                }

                // Drop placeholders until a reusable slot (or the end) is found.
                let entries = &mut self.lines[line_index];
                while matches!(entries.get(glyph_index), Some(GlyphEntry::Placeholder { .. })) {
                    entries.remove(glyph_index);
                }
                let reusable = match entries.get(glyph_index) {
                    Some(GlyphEntry::Glyph(id)) => Some(*id),
                    _ => None,
                };
                let id = match reusable {
                    Some(id) => id,
                    None => {
                        let id = self.take_slot();
                        self.lines[line_index].push(GlyphEntry::Glyph(id));
                        id
                    }
                };

                let slot = &mut self.slots[id.0];
                slot.glyph_id = info.id;
                slot.ch = c;
                slot.pen_x = x;
                slot.advance = advance;
                slot.position = Vec2::new(
                    x + glyph_offset_x(font, props.font_size, &info, prev_glyph_id),
                    -(y + glyph_offset_y(props.font_size, props.line_height, Some(&info))),
                );
                slot.size = Vec2::new(info.width, info.height) * props.font_size;
                slot.uv_min = Vec2::from(info.uv_min);
                slot.uv_max = Vec2::from(info.uv_max);
                slot.color = self.color;
                slot.opacity = self.opacity;
                slot.visible = true;
                slot.update_clipped(&self.base_matrix, self.clip.as_ref());

                prev_glyph_id = Some(info.id);
                x += advance;
            }

            y += line_advance;

            let stale = self.lines[line_index].split_off(line.char_length);
            self.release_entries(stale);
        }

        let stale_lines = self.lines.split_off(line_count);
        for entries in stale_lines {
            self.release_entries(entries);
        }

        if self.allocations > allocations_before {
            debug!(
                allocated = self.allocations - allocations_before,
                pool = self.slots.len(),
                "grew glyph slot pool"
            );
        }
        self.layout = Some(layout);
        self.refresh_selection();
    }

    /// Re-run the last layout after an alignment change
    pub fn set_alignment(&mut self, horizontal: HorizontalAlign, vertical: VerticalAlign) {
        if self.horizontal_align == horizontal && self.vertical_align == vertical {
            return;
        }
        self.horizontal_align = horizontal;
        self.vertical_align = vertical;
        if let Some(layout) = self.layout.clone() {
            self.apply_layout(layout);
        }
    }

    /// Update color and opacity of every slot
    pub fn set_appearance(&mut self, color: [f32; 3], opacity: f32) {
        self.color = color;
        self.opacity = opacity;
        for id in self.active_slots() {
            let slot = &mut self.slots[id.0];
            slot.color = color;
            slot.opacity = opacity;
        }
        self.refresh_shown();
    }

    /// Hide or show the whole text
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
        self.refresh_shown();
    }

    /// Whether the text currently produces instances
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Transform from the text-local frame to the root frame
    pub fn set_base_matrix(&mut self, matrix: Mat4) {
        self.base_matrix = matrix;
        self.update_clipping();
    }

    /// Ancestor clip rectangle in the root frame
    pub fn set_clip_rect(&mut self, clip: Option<ClipRect>) {
        self.clip = clip;
        self.update_clipping();
    }

    /// Number of slots ever allocated
    pub fn slot_allocations(&self) -> usize {
        self.allocations
    }

    /// Hidden slots waiting for reuse
    pub fn spare_slots(&self) -> usize {
        self.spare.len()
    }

    /// Per-line glyph entries
    pub fn glyph_lines(&self) -> &[Vec<GlyphEntry>] {
        &self.lines
    }

    /// Look up a slot
    pub fn slot(&self, id: SlotId) -> Option<&GlyphSlot> {
        self.slots.get(id.0)
    }

    /// Last applied layout
    pub fn layout(&self) -> Option<&Arc<GlyphLayout>> {
        self.layout.as_ref()
    }

    /// Current selection geometry
    pub fn selection(&self) -> &SelectionGeometry {
        &self.selection
    }

    /// GPU records for visible, unclipped glyphs
    pub fn instances(&self) -> Vec<GlyphInstance> {
        if !self.shown {
            return Vec::new();
        }
        self.active_slots()
            .into_iter()
            .map(|id| &self.slots[id.0])
            .filter(|slot| slot.visible && !slot.clipped)
            .map(|slot| {
                let model = self.base_matrix
                    * Mat4::from_translation(slot.center().extend(0.0))
                    * Mat4::from_scale(Vec3::new(slot.size.x, slot.size.y, 1.0));
                GlyphInstance {
                    model: model.to_cols_array_2d(),
                    uv_min: slot.uv_min.to_array(),
                    uv_max: slot.uv_max.to_array(),
                    color: [slot.color[0], slot.color[1], slot.color[2], slot.opacity],
                }
            })
            .collect()
    }

    /// Nearest char boundary to a point in the text-local frame
    pub fn char_index_at(&self, x: f32, y: f32) -> usize {
        let Some(layout) = &self.layout else {
            return 0;
        };
        let below_top = self.text_top(layout) - y;
        if below_top < 0.0 || layout.lines.is_empty() {
            return 0;
        }
        let line_index = (below_top / layout.line_advance()).floor() as usize;
        let Some(line) = layout.lines.get(line_index) else {
            return layout.char_count();
        };
        let entries = &self.lines[line_index];
        for (i, entry) in entries.iter().enumerate() {
            if x < self.entry_x(entry, 0.5) {
                return line.char_index_offset + i;
            }
        }
        line.char_index_end()
    }

    /// Recompute the selection for `range`
    pub fn update_selection(&mut self, range: Option<SelectionRange>) -> &SelectionGeometry {
        self.selection_range = range;
        self.refresh_selection();
        &self.selection
    }

    fn refresh_selection(&mut self) {
        self.selection = self.compute_selection(self.selection_range);
    }

    /// Y of the first line's top edge
    pub(super) fn text_top(&self, layout: &GlyphLayout) -> f32 {
        layout.available_height / 2.0 - top_offset(layout, self.vertical_align)
    }

    /// X of an entry scaled by `fraction` of its advance
    pub(super) fn entry_x(&self, entry: &GlyphEntry, fraction: f32) -> f32 {
        match entry {
            GlyphEntry::Placeholder { pen, advance } => pen + fraction * advance,
            GlyphEntry::Glyph(id) => self.slots[id.0].x_at(fraction),
        }
    }

    /// X where an empty or unaligned line starts
    pub(super) fn line_start_x(&self, layout: &GlyphLayout, line_index: usize) -> f32 {
        match self.lines[line_index].first() {
            Some(entry) => self.entry_x(entry, 0.0),
            None => align_x(
                layout.available_width,
                &layout.lines[line_index],
                self.horizontal_align,
            ),
        }
    }

    /// X after the last cell of a line
    pub(super) fn line_end_x(&self, layout: &GlyphLayout, line_index: usize) -> f32 {
        match self.lines[line_index].last() {
            Some(entry) => self.entry_x(entry, 1.0),
            None => align_x(
                layout.available_width,
                &layout.lines[line_index],
                self.horizontal_align,
            ),
        }
    }

    fn take_slot(&mut self) -> SlotId {
        if let Some(id) = self.spare.pop() {
            return id;
        }
        self.slots.push(GlyphSlot::new(self.color, self.opacity));
        self.allocations += 1;
        SlotId(self.slots.len() - 1)
    }

    fn release_entries(&mut self, entries: Vec<GlyphEntry>) {
        for entry in entries {
            if let GlyphEntry::Glyph(id) = entry {
                self.slots[id.0].visible = false;
                self.spare.push(id);
            }
        }
    }

    fn active_slots(&self) -> Vec<SlotId> {
        self.lines
            .iter()
            .flatten()
            .filter_map(|entry| match entry {
                GlyphEntry::Glyph(id) => Some(*id),
                GlyphEntry::Placeholder { .. } => None,
            })
            .collect()
    }

    fn refresh_shown(&mut self) {
        let shown = !self.hidden && self.opacity >= MIN_VISIBLE_OPACITY;
        if shown == self.shown {
            return;
        }
        self.shown = shown;
        debug!(shown, "text visibility changed");
    }

    fn update_clipping(&mut self) {
        for id in self.active_slots() {
            self.slots[id.0].update_clipped(&self.base_matrix, self.clip.as_ref());
        }
    }
}

/// Left edge of a line in the centred frame
pub(super) fn align_x(available_width: f32, line: &GlyphLayoutLine, align: HorizontalAlign) -> f32 {
    let free = available_width - line.non_whitespace_width;
    let offset = match align {
        HorizontalAlign::Right => free,
        HorizontalAlign::Center => free / 2.0,
        HorizontalAlign::Left | HorizontalAlign::Block => 0.0,
    };
    offset - available_width / 2.0
}

/// Distance from the top of the box to the first line
fn top_offset(layout: &GlyphLayout, align: VerticalAlign) -> f32 {
    let props = &layout.properties;
    let free = layout.available_height
        - glyph_layout_height(layout.lines.len(), props.font_size, props.line_height);
    match align {
        VerticalAlign::Top => 0.0,
        VerticalAlign::Center => free / 2.0,
        VerticalAlign::Bottom => free,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::font::{GlyphInfo, GlyphMetrics};
    use crate::text::layout::{build_glyph_layout, GlyphLayoutProperties};
    use crate::text::wrap::WordBreak;

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

    fn layout(text: &str, width: f32) -> Arc<GlyphLayout> {
        let props = GlyphLayoutProperties::new(text, Arc::new(HalfEm))
            .with_font_size(10.0)
            .with_line_height(1.0)
            .with_word_break(WordBreak::BreakWord);
        Arc::new(build_glyph_layout(&props, width, 40.0))
    }

    fn glyph_count(state: &TextRenderState) -> usize {
        state
            .glyph_lines()
            .iter()
            .flatten()
            .filter(|e| matches!(e, GlyphEntry::Glyph(_)))
            .count()
    }

    #[test]
    fn test_apply_layout_positions_glyphs() {
        let mut state = TextRenderState::new();
        state.apply_layout(layout("ab", 100.0));
        let lines = state.glyph_lines();
        assert_eq!(lines.len(), 1);
        let GlyphEntry::Glyph(b) = lines[0][1] else {
            panic!("expected glyph");
        };
        let slot = state.slot(b).unwrap();
        // Box is 100 wide, centred: line starts at -50.
        assert_eq!(slot.pen_x, -45.0);
        assert_eq!(slot.position.y, 20.0);
        assert_eq!(slot.size, Vec2::new(5.0, 10.0));
    }

    #[test]
    fn test_apply_same_layout_is_idempotent() {
        let mut state = TextRenderState::new();
        let l = layout("hello world\nagain", 100.0);
        state.apply_layout(l.clone());
        let allocated = state.slot_allocations();
        let before = state.glyph_lines().to_vec();
        state.apply_layout(l);
        assert_eq!(state.slot_allocations(), allocated);
        assert_eq!(state.glyph_lines(), before.as_slice());
    }

    #[test]
    fn test_whitespace_uses_placeholders() {
        let mut state = TextRenderState::new();
        state.apply_layout(layout("a b", 100.0));
        assert!(matches!(state.glyph_lines()[0][1], GlyphEntry::Placeholder { pen, advance } if pen == -45.0 && advance == 5.0));
        assert_eq!(glyph_count(&state), 2);
    }

    #[test]
    fn test_shorter_text_returns_slots_to_spare_list() {
        let mut state = TextRenderState::new();
        state.apply_layout(layout("abcd\nef", 100.0));
        assert_eq!(state.slot_allocations(), 6);
        state.apply_layout(layout("ab", 100.0));
        assert_eq!(state.spare_slots(), 4);
        assert_eq!(state.instances().len(), 2);
        state.apply_layout(layout("abc de", 100.0));
        assert_eq!(state.slot_allocations(), 6);
    }

    #[test]
    fn test_alignment_right_and_center() {
        let mut state =
            TextRenderState::new().with_alignment(HorizontalAlign::Right, VerticalAlign::Bottom);
        state.apply_layout(layout("ab", 100.0));
        let GlyphEntry::Glyph(a) = state.glyph_lines()[0][0] else {
            panic!("expected glyph");
        };
        assert_eq!(state.slot(a).unwrap().pen_x, 40.0);
        // One 10-high line at the bottom of a 40-high box.
        assert_eq!(state.slot(a).unwrap().position.y, -10.0);

        state.set_alignment(HorizontalAlign::Center, VerticalAlign::Top);
        let slot = state.slot(a).unwrap();
        assert_eq!(slot.pen_x, -5.0);
        assert_eq!(slot.position.y, 20.0);
    }

    #[test]
    fn test_block_alignment_spreads_whitespace() {
        let mut state = TextRenderState::new().with_alignment(HorizontalAlign::Block, VerticalAlign::Top);
        // Wraps to "aa bb " and "cc".
        state.apply_layout(layout("aa bb cc", 30.0));
        let first = &state.glyph_lines()[0];
        let GlyphEntry::Glyph(last) = first[4] else {
            panic!("expected glyph");
        };
        // 25 units of content justified to 30.
        assert_eq!(state.slot(last).unwrap().x_at(1.0), 15.0);

        // The stretched space is 10 wide: [-5, 5).
        let space = state.update_selection(Some(SelectionRange::new(2, 3))).boxes[0];
        assert_eq!(space.size.x, 10.0);
        assert_eq!(state.char_index_at(-1.0, 15.0), 2);
        assert_eq!(state.char_index_at(1.0, 15.0), 3);
    }

    #[test]
    fn test_letter_spacing_widens_placeholders() {
        let props = GlyphLayoutProperties::new("a b", Arc::new(HalfEm))
            .with_font_size(10.0)
            .with_line_height(1.0)
            .with_letter_spacing(2.0);
        let mut state = TextRenderState::new();
        state.apply_layout(Arc::new(build_glyph_layout(&props, 100.0, 40.0)));
        let space = state.update_selection(Some(SelectionRange::new(1, 2))).boxes[0];
        assert_eq!(space.size.x, 7.0);
        assert!(matches!(
            state.glyph_lines()[0][1],
            GlyphEntry::Placeholder { advance, .. } if advance == 7.0
        ));
    }

    #[test]
    fn test_hidden_or_transparent_text_has_no_instances() {
        let mut state = TextRenderState::new();
        state.apply_layout(layout("abc", 100.0));
        assert_eq!(state.instances().len(), 3);
        state.set_hidden(true);
        assert!(state.instances().is_empty());
        state.set_hidden(false);
        state.set_appearance([1.0, 0.0, 0.0], 0.005);
        assert!(!state.is_shown());
        state.set_appearance([1.0, 0.0, 0.0], 0.5);
        let instances = state.instances();
        assert_eq!(instances[0].color, [1.0, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn test_clip_rect_marks_glyphs() {
        let mut state = TextRenderState::new();
        state.apply_layout(layout("abcd", 100.0));
        state.set_clip_rect(Some(ClipRect::from_corners(
            Vec2::new(-50.0, -20.0),
            Vec2::new(-40.0, 20.0),
        )));
        assert_eq!(state.instances().len(), 2);
        state.set_base_matrix(Mat4::from_translation(Vec3::new(-100.0, 0.0, 0.0)));
        assert!(state.instances().is_empty());
        state.set_clip_rect(None);
        assert_eq!(state.instances().len(), 4);
    }

    #[test]
    fn test_char_index_at() {
        let mut state = TextRenderState::new();
        state.apply_layout(layout("ab\ncd", 100.0));
        // Above the text.
        assert_eq!(state.char_index_at(0.0, 25.0), 0);
        // Left half of 'b'.
        assert_eq!(state.char_index_at(-44.0, 15.0), 1);
        // Past the end of the first line.
        assert_eq!(state.char_index_at(30.0, 15.0), 2);
        // Second line, before 'c'.
        assert_eq!(state.char_index_at(-49.0, 5.0), 3);
        // Below all lines.
        assert_eq!(state.char_index_at(0.0, -15.0), 5);
    }
}
