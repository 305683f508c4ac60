//! Headless demo scene: a clipped viewport with scrollable text.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use meshui_core::ElementId;
use meshui_ui3d::scroll::{MaxScroll, ScrollState};
use meshui_ui3d::{
    measure_glyph_layout, Clock, FlexNodeState, GlyphMetrics, Panel3D, PointerEvent, Ray,
    ScrollController, ScrollbarGeometry, Text3D, UiScene, WheelEvent, WordBreak,
};
use serde::Serialize;
use tracing::debug;

use crate::config::{DemoConfig, ScrollInput};

/// Distance of the pointer camera in front of the viewport.
const CAMERA_DISTANCE: f32 = 5.0;

#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub word_break: WordBreak,
    pub measurement: MeasurementReport,
    pub lines: Vec<LineReport>,
    pub glyph_instances: usize,
    pub slot_allocations: usize,
    pub scroll: ScrollReport,
    pub hits: Vec<HitReport>,
    pub draw_order: Vec<ElementId>,
}

#[derive(Debug, Serialize)]
pub struct MeasurementReport {
    pub width: f32,
    pub height: f32,
    pub line_count: usize,
}

#[derive(Debug, Serialize)]
pub struct LineReport {
    pub offset: usize,
    pub length: usize,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ScrollReport {
    pub max_position: MaxScroll,
    pub frames: Vec<ScrollState>,
    pub final_state: ScrollState,
    pub scrollbars: [ScrollbarGeometry; 2],
}

#[derive(Debug, Serialize)]
pub struct HitReport {
    pub element: ElementId,
    pub distance: f32,
    pub uv: Vec2,
}

/// Simulation time, advanced once per frame.
#[derive(Debug, Clone, Default)]
struct FrameClock(Rc<Cell<f64>>);

impl FrameClock {
    fn advance(&self, seconds: f64) {
        self.0.set(self.0.get() + seconds);
    }
}

impl Clock for FrameClock {
    fn now(&self) -> f64 {
        self.0.get()
    }
}

/// Build the scene, apply the configured scroll input and collect the report.
pub fn run(cfg: &DemoConfig, font: Arc<dyn GlyphMetrics>) -> Result<DemoReport> {
    let word_break: WordBreak = cfg
        .text
        .word_break
        .parse()
        .context("Invalid [text] word_break")?;
    let viewport_size = Vec2::new(cfg.viewport.width, cfg.viewport.height);
    let wrap_width = cfg.text.max_width.unwrap_or(viewport_size.x);

    let mut text = Text3D::new(Vec3::ZERO, cfg.text.content.clone())
        .with_font_size(cfg.text.font_size)
        .with_line_height(cfg.text.line_height)
        .with_word_break(word_break)
        .with_alignment(cfg.text.horizontal_align, cfg.text.vertical_align)
        .with_max_width(wrap_width);
    text.letter_spacing = cfg.text.letter_spacing;
    let measured = measure_glyph_layout(&text.layout_properties(font.clone()), Some(wrap_width));
    // Pin the top of the text box to the top of the viewport.
    text.transform.position.y = (viewport_size.y - measured.height) / 2.0;

    let mut scene = UiScene::new(font);
    let viewport = scene.add_panel(
        None,
        Panel3D::new(Vec3::ZERO, viewport_size.x, viewport_size.y).with_clipping(true),
    )?;
    let label = scene.add_text(Some(viewport), text)?;

    let pixel_size = cfg.viewport.pixel_size;
    let node = Rc::new(FlexNodeState::new(pixel_size).with_border_inset(cfg.viewport.border_inset));
    node.set_layout(
        viewport_size / pixel_size,
        Vec2::new(wrap_width, measured.height) / pixel_size,
    );
    let clock = FrameClock::default();
    let mut scroll = ScrollController::with_clock(node.clone(), Box::new(clock.clone()));
    scene.bind_scroll(viewport, &scroll)?;

    let delta = Vec2::from(cfg.scroll.delta);
    match cfg.scroll.input {
        ScrollInput::Wheel => scroll.on_wheel(&mut WheelEvent::new(delta)),
        ScrollInput::Drag => {
            scroll.on_pointer_down(&PointerEvent::new(0, Vec3::ZERO));
            clock.advance(f64::from(cfg.scroll.drag_seconds));
            let target = Vec3::new(-delta.x * pixel_size, delta.y * pixel_size, 0.0);
            scroll.on_pointer_move(&mut PointerEvent::new(0, target));
            scroll.on_pointer_up(0);
        }
    }

    let frame_time = 1.0 / cfg.scroll.frame_rate.max(1.0);
    let mut frames = Vec::with_capacity(cfg.scroll.frames as usize);
    for _ in 0..cfg.scroll.frames {
        scroll.tick(frame_time);
        clock.advance(f64::from(frame_time));
        frames.push(scroll.state());
    }
    debug!(frames = frames.len(), position = ?scroll.position().get(), "simulated scroll");

    let pointer_ray = Ray::new(Vec3::new(0.0, 0.0, CAMERA_DISTANCE), Vec3::NEG_Z);
    let hits = scene
        .raycast(&pointer_ray)
        .into_iter()
        .map(|hit| HitReport {
            element: hit.element,
            distance: hit.hit.distance,
            uv: hit.hit.uv,
        })
        .collect();
    let draw_order = scene
        .draw_list(pointer_ray.origin)
        .into_iter()
        .map(|item| item.element)
        .collect();

    let state = scene
        .text_state(label)
        .context("Text element missing from scene")?;
    let layout = state.layout().context("Text element has no layout")?;
    let lines = layout
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| LineReport {
            offset: line.char_index_offset,
            length: line.char_length,
            text: layout.line_text(i).unwrap_or_default(),
        })
        .collect();

    Ok(DemoReport {
        word_break,
        measurement: MeasurementReport {
            width: measured.width,
            height: measured.height,
            line_count: measured.line_count,
        },
        lines,
        glyph_instances: state.instances().len(),
        slot_allocations: state.slot_allocations(),
        scroll: ScrollReport {
            max_position: node.max_scroll_position.get(),
            final_state: scroll.state(),
            scrollbars: scroll.scrollbars(cfg.viewport.scrollbar_width),
            frames,
        },
        hits,
        draw_order,
    })
}
