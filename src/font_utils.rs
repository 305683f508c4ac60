//! Font utility functions

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use meshui_ui3d::{FontdueMetrics, GlyphInfo, GlyphMetrics};
use tracing::warn;

use crate::config::FontConfig;

/// Try to find a usable system font
pub fn find_system_font() -> Result<PathBuf> {
    // Try common font locations
    let candidates = [
        // Linux
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        // macOS
        "/Library/Fonts/Arial.ttf",
        // Windows
        "C:\\Windows\\Fonts\\arial.ttf",
        "C:\\Windows\\Fonts\\segoeui.ttf",
    ];

    for path in candidates {
        if Path::new(path).exists() {
            return Ok(PathBuf::from(path));
        }
    }

    anyhow::bail!("Could not find a system font. Install DejaVu Sans or pass --font <path>.")
}

/// Fixed-pitch metrics used when no font file is available
#[derive(Debug, Clone, Copy)]
pub struct FixedPitchMetrics {
    pub advance: f32,
}

impl GlyphMetrics for FixedPitchMetrics {
    fn glyph_info(&self, c: char) -> GlyphInfo {
        let blank = c.is_whitespace();
        GlyphInfo {
            id: c as u32,
            x_advance: self.advance,
            width: if blank { 0.0 } else { self.advance },
            height: if blank { 0.0 } else { 1.0 },
            ..Default::default()
        }
    }
}

/// Resolve the configured font. An explicit path must load; a missing system font
/// falls back to fixed-pitch metrics.
pub fn load_font(cfg: &FontConfig) -> Result<Arc<dyn GlyphMetrics>> {
    if let Some(path) = &cfg.path {
        return Ok(Arc::new(FontdueMetrics::from_file(path)?));
    }
    let fallback = FixedPitchMetrics {
        advance: cfg.fallback_advance,
    };
    if !cfg.system {
        return Ok(Arc::new(fallback));
    }
    match find_system_font().and_then(|path| FontdueMetrics::from_file(path)) {
        Ok(metrics) => Ok(Arc::new(metrics)),
        Err(err) => {
            warn!(%err, "Using fixed-pitch fallback metrics");
            Ok(Arc::new(fallback))
        }
    }
}
