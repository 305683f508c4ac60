//! meshui - spatial UI composition demo
//!
//! Builds a clipped, scrollable text panel, simulates scroll input frame by frame and
//! prints a JSON report of the layout, scroll state and hit-test results.

mod config;
mod demo;
mod font_utils;

use anyhow::{Context, Result};
use clap::Parser;
use config::{DemoConfig, ScrollInput};
use meshui_ui3d::text::LayoutError;
use meshui_ui3d::WordBreak;
use std::{fs, path::PathBuf};
use tracing::info;

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting meshui v{} (ui3d v{})",
        env!("CARGO_PKG_VERSION"),
        meshui_ui3d::VERSION
    );

    let cli = CliOptions::parse();
    let mut cfg = match &cli.config {
        Some(path) => DemoConfig::load_from_path(path),
        None => DemoConfig::load(),
    };
    cli.apply(&mut cfg);

    let font = font_utils::load_font(&cfg.font)?;
    let report = demo::run(&cfg, font)?;
    let json = serde_json::to_string_pretty(&report)?;

    match &cli.report {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            info!("Wrote report to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Spatial UI composition demo for meshui", long_about = None)]
struct CliOptions {
    /// Configuration file (default: config/meshui.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the JSON report to this file instead of stdout
    #[arg(long)]
    report: Option<PathBuf>,

    /// Text content; `\n` starts a new line
    #[arg(long)]
    text: Option<String>,

    /// Wrap width in world units
    #[arg(long, value_parser = parse_positive)]
    width: Option<f32>,

    /// Wrap mode: keep-all, break-all or break-word
    #[arg(long, value_parser = parse_word_break)]
    word_break: Option<WordBreak>,

    /// Font file to measure glyphs with
    #[arg(long)]
    font: Option<PathBuf>,

    /// Skip the system font search and use fixed-pitch metrics
    #[arg(long)]
    no_system_font: bool,

    /// Vertical scroll delta in pixels
    #[arg(long, allow_negative_numbers = true)]
    scroll_delta: Option<f32>,

    /// Scroll with a pointer drag instead of the wheel
    #[arg(long)]
    drag: bool,

    /// Frames simulated after the input
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    frames: Option<u32>,
}

fn parse_positive(raw: &str) -> Result<f32, String> {
    match raw.parse::<f32>() {
        Ok(value) if value > 0.0 && value.is_finite() => Ok(value),
        Ok(_) => Err(format!("{raw} is not a positive number")),
        Err(err) => Err(err.to_string()),
    }
}

fn parse_word_break(raw: &str) -> Result<WordBreak, LayoutError> {
    raw.parse()
}

impl CliOptions {
    /// Command-line flags take precedence over the config file.
    fn apply(&self, cfg: &mut DemoConfig) {
        if let Some(text) = &self.text {
            cfg.text.content = text.replace("\\n", "\n");
        }
        if let Some(width) = self.width {
            cfg.text.max_width = Some(width);
        }
        if let Some(word_break) = self.word_break {
            cfg.text.word_break = word_break.to_string();
        }
        if let Some(path) = &self.font {
            cfg.font.path = Some(path.clone());
        }
        if self.no_system_font {
            cfg.font.system = false;
        }
        if let Some(delta) = self.scroll_delta {
            cfg.scroll.delta = [0.0, delta];
        }
        if self.drag {
            cfg.scroll.input = ScrollInput::Drag;
        }
        if let Some(frames) = self.frames {
            cfg.scroll.frames = frames;
        }
    }
}
