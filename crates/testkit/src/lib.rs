#![warn(missing_docs)]
//! Deterministic fixtures for meshui tests: fonts, clocks, scroll regions and traces.

mod clock;
mod font;
mod scroll;

use anyhow::Result;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub use clock::*;
pub use font::*;
pub use scroll::*;

/// Default tolerance of [`assert_close`].
pub const EPSILON: f32 = 1e-4;

/// Assert that two floats differ by at most [`EPSILON`].
#[track_caller]
pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() <= EPSILON,
        "expected {expected}, got {actual}"
    );
}

/// One frame of a recorded interaction.
#[derive(Debug, Serialize)]
pub struct TraceRecord<'a, T: Serialize> {
    /// Frame index.
    pub frame: u64,
    /// Human-readable kind label.
    pub kind: &'a str,
    /// Recorded state.
    pub state: &'a T,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct TraceSink {
    file: File,
}

impl TraceSink {
    /// Create a sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            file: File::create(path)?,
        })
    }

    /// Append a record to the trace.
    pub fn write<T: Serialize>(&mut self, record: &TraceRecord<'_, T>) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}
