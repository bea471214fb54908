//! hexcam core library for camera hex-dump conversion.
//!
//! The camera firmware prints raw pixel data as lines of hex text. This crate
//! turns that text back into pixels: line sources feed the hex decoder, the
//! frame assembler groups decoded bytes into YUV samples, the color model
//! converts them to RGB, and pixel sinks store or write the result. Decoding
//! and conversion are side-effect free; all I/O is isolated in `source` and
//! the sinks.
//!
//! Invariants:
//! - Pixels are placed in raster order; the column never reaches the width.
//! - Pixels past the last row follow the configured `OverflowPolicy`.
//! - Color channels are clamped to `0..=255` and truncated, never rounded.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use hexcam_core::FrameConfig;
//! use hexcam_core::pipeline::render_frame;
//! use hexcam_core::source::TextLineSource;
//!
//! let mut source = TextLineSource::open(Path::new("yuv_96x96.txt"))?;
//! let (frame, stats) = render_frame(&mut source, &FrameConfig::default())?;
//! frame.write_png(Path::new("frame.png"), 4)?;
//! println!("pixels: {}", stats.frame.pixels_emitted);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

pub mod color;
pub mod config;
pub mod frame;
pub mod hex;
pub mod pattern;
pub mod pipeline;
pub mod source;

pub use config::{ColorModel, ConfigError, DecodePolicy, FrameConfig, GroupLayout, OverflowPolicy};
pub use pipeline::{PipelineError, PipelineStats};

/// Current summary schema version.
pub const SUMMARY_VERSION: u32 = 1;

/// Machine-readable outcome of one conversion.
///
/// # Examples
/// ```
/// use hexcam_core::make_summary;
///
/// let summary = make_summary("yuv.txt", Some(12));
/// assert_eq!(summary.summary_version, hexcam_core::SUMMARY_VERSION);
/// assert!(summary.frame.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionSummary {
    /// Summary schema version (not the binary version).
    pub summary_version: u32,
    pub tool: ToolInfo,
    pub input: InputInfo,
    pub decode: hex::DecodeStats,
    /// Frame settings and counters; absent for byte-only conversions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<FrameSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path or serial port as provided.
    pub path: String,
    /// Input size in bytes, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSummary {
    pub config: FrameConfig,
    pub stats: frame::AssemblerStats,
}

/// Build a summary with base fields filled and zeroed counters.
pub fn make_summary(input_path: &str, input_bytes: Option<u64>) -> ConversionSummary {
    ConversionSummary {
        summary_version: SUMMARY_VERSION,
        tool: ToolInfo {
            name: "hexcam".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        decode: hex::DecodeStats::default(),
        frame: None,
    }
}

impl ConversionSummary {
    pub fn with_stats(mut self, stats: PipelineStats, config: &FrameConfig) -> Self {
        self.decode = stats.decode;
        self.frame = Some(FrameSummary {
            config: *config,
            stats: stats.frame,
        });
        self
    }
}
