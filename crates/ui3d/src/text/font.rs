//! Glyph metrics lookup.
//!
//! Layout and rendering only need per-glyph advance and placement information, exposed by
//! the [`GlyphMetrics`] trait. [`FontdueMetrics`] implements it on top of a `fontdue`
//! font; rasterization and atlas packing are left to the renderer.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use thiserror::Error;
use tracing::{debug, info};

/// Character range for ASCII printable characters
pub const ASCII_RANGE: std::ops::Range<u32> = 32..127;

/// Size the font is sampled at before normalizing metrics to a font size of 1.
const SAMPLE_SIZE: f32 = 64.0;

/// Metrics of one glyph, in units of the font size (multiply by the font size to get
/// local units).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphInfo {
    /// Glyph index in the font, used for kerning.
    pub id: u32,
    /// Horizontal pen advance.
    pub x_advance: f32,
    /// Offset of the glyph box from the pen position.
    pub x_offset: f32,
    /// Offset of the glyph box top below the line's ascender.
    pub y_offset: f32,
    /// Glyph box width.
    pub width: f32,
    /// Glyph box height.
    pub height: f32,
    /// Atlas texture coordinates, when the provider knows them.
    pub uv_min: (f32, f32),
    /// Atlas texture coordinates, when the provider knows them.
    pub uv_max: (f32, f32),
}

/// Glyph metrics capability consumed by layout and rendering.
pub trait GlyphMetrics: fmt::Debug {
    /// Metrics of `c`. Unknown characters return the provider's fallback glyph.
    fn glyph_info(&self, c: char) -> GlyphInfo;

    /// Extra horizontal offset between two glyph ids, in font-size units.
    fn kerning(&self, _first: u32, _second: u32) -> f32 {
        0.0
    }
}

/// Errors raised while loading fonts.
#[derive(Debug, Error)]
pub enum FontError {
    /// The font bytes could not be parsed.
    #[error("failed to parse font: {0}")]
    Parse(String),
}

/// [`GlyphMetrics`] backed by a `fontdue` font.
pub struct FontdueMetrics {
    font: Font,
    /// Cached metrics for the preloaded character set
    glyphs: HashMap<char, GlyphInfo>,
    ascent: f32,
}

impl FontdueMetrics {
    /// Parse a font and cache metrics for printable ASCII.
    pub fn from_bytes(font_data: Vec<u8>) -> Result<Self, FontError> {
        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;
        let ascent = font
            .horizontal_line_metrics(SAMPLE_SIZE)
            .map(|m| m.ascent / SAMPLE_SIZE)
            .unwrap_or(0.8);

        let mut metrics = Self {
            font,
            glyphs: HashMap::new(),
            ascent,
        };
        let chars: Vec<char> = ASCII_RANGE.filter_map(char::from_u32).collect();
        for c in chars {
            let info = metrics.compute(c);
            metrics.glyphs.insert(c, info);
        }
        debug!(glyphs = metrics.glyphs.len(), ascent, "cached glyph metrics");
        Ok(metrics)
    }

    /// Load a font from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let font_data = std::fs::read(path)
            .with_context(|| format!("Failed to read font file: {}", path.display()))?;
        let metrics = Self::from_bytes(font_data)
            .with_context(|| format!("Failed to load font: {}", path.display()))?;
        info!("Loaded font {}", path.display());
        Ok(metrics)
    }

    /// The underlying font
    pub fn font(&self) -> &Font {
        &self.font
    }

    fn compute(&self, c: char) -> GlyphInfo {
        let metrics = self.font.metrics(c, SAMPLE_SIZE);
        let top = metrics.ymin as f32 + metrics.height as f32;
        GlyphInfo {
            id: u32::from(self.font.lookup_glyph_index(c)),
            x_advance: metrics.advance_width / SAMPLE_SIZE,
            x_offset: metrics.xmin as f32 / SAMPLE_SIZE,
            y_offset: self.ascent - top / SAMPLE_SIZE,
            width: metrics.width as f32 / SAMPLE_SIZE,
            height: metrics.height as f32 / SAMPLE_SIZE,
            uv_min: (0.0, 0.0),
            uv_max: (0.0, 0.0),
        }
    }
}

impl GlyphMetrics for FontdueMetrics {
    fn glyph_info(&self, c: char) -> GlyphInfo {
        match self.glyphs.get(&c) {
            Some(info) => *info,
            None => self.compute(c),
        }
    }

    fn kerning(&self, first: u32, second: u32) -> f32 {
        let (Ok(first), Ok(second)) = (u16::try_from(first), u16::try_from(second)) else {
            return 0.0;
        };
        self.font
            .horizontal_kern_indexed(first, second, SAMPLE_SIZE)
            .map(|k| k / SAMPLE_SIZE)
            .unwrap_or(0.0)
    }
}

impl fmt::Debug for FontdueMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontdueMetrics")
            .field("glyphs", &self.glyphs.len())
            .field("ascent", &self.ascent)
            .finish()
    }
}
