use meshui_ui3d::{HorizontalAlign, VerticalAlign};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/meshui.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    pub text: TextConfig,
    pub viewport: ViewportConfig,
    pub scroll: ScrollConfig,
    pub font: FontConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TextConfig {
    pub content: String,
    pub font_size: f32,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    pub letter_spacing: f32,
    /// One of `keep-all`, `break-all`, `break-word`. Checked at startup.
    pub word_break: String,
    pub horizontal_align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    /// Wrap width in world units; defaults to the viewport width.
    pub max_width: Option<f32>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: "Hello from meshui".to_string(),
            font_size: 0.1,
            line_height: 1.2,
            letter_spacing: 0.0,
            word_break: "break-word".to_string(),
            horizontal_align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            max_width: None,
        }
    }
}

/// Clipping, scrollable region hosting the text.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Width in world units.
    pub width: f32,
    /// Height in world units.
    pub height: f32,
    /// World units per layout pixel.
    pub pixel_size: f32,
    /// Scrollbar thickness in pixels.
    pub scrollbar_width: f32,
    /// Border inset in pixels (top, right, bottom, left).
    pub border_inset: [f32; 4],
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 2.0,
            height: 1.0,
            pixel_size: 0.01,
            scrollbar_width: 10.0,
            border_inset: [0.0; 4],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollInput {
    /// Mouse wheel: clamped, never rubber-bands.
    #[default]
    Wheel,
    /// Pointer drag: may overscroll and then settles back.
    Drag,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub input: ScrollInput,
    /// Scroll delta in pixels (x, y).
    pub delta: [f32; 2],
    /// Duration of a drag gesture in seconds, used for the release velocity.
    pub drag_seconds: f32,
    /// Frames simulated after the input.
    pub frames: u32,
    pub frame_rate: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            input: ScrollInput::Wheel,
            delta: [0.0, 0.0],
            drag_seconds: 0.1,
            frames: 60,
            frame_rate: 60.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font file; searched among system fonts when unset.
    pub path: Option<PathBuf>,
    /// Whether to look for a system font when no path is given.
    pub system: bool,
    /// Advance (in font-size units) of the fixed-pitch fallback font.
    pub fallback_advance: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: None,
            system: true,
            fallback_advance: 0.5,
        }
    }
}

impl DemoConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<DemoConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    DemoConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("Config not found at {}. Using defaults", path.display());
                }
                DemoConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: DemoConfig = toml::from_str(
            r#"
            [text]
            content = "ab\ncd"
            word_break = "keep-all"
            horizontal_align = "block"

            [scroll]
            input = "drag"
            "#,
        )
        .expect("valid toml");
        assert_eq!(cfg.text.content, "ab\ncd");
        assert_eq!(cfg.text.horizontal_align, HorizontalAlign::Block);
        assert_eq!(cfg.text.line_height, 1.2);
        assert_eq!(cfg.scroll.input, ScrollInput::Drag);
        assert_eq!(cfg.scroll.frames, 60);
        assert!(cfg.font.system);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let cfg = DemoConfig::load_from_path(Path::new("does/not/exist.toml"));
        assert_eq!(cfg.viewport.pixel_size, 0.01);
        assert_eq!(cfg.text.word_break, "break-word");
    }

    #[test]
    fn malformed_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("meshui-bad-{}.toml", std::process::id()));
        fs::write(&path, "text = [").expect("write temp config");
        let cfg = DemoConfig::load_from_path(&path);
        assert_eq!(cfg.scroll.frame_rate, 60.0);
    }
}
