//! Conversion pipelines.
//!
//! Each pipeline pulls lines from a [`LineSource`], classifies them, decodes
//! data lines and, for pixel pipelines, feeds a [`FrameAssembler`]. Status
//! lines restart the frame. Batch pipelines run to the end of the source;
//! the streaming pipeline runs the same steps on a reader thread.

pub mod stream;

use std::io::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, DecodePolicy, FrameConfig};
use crate::frame::{
    AssemblerStats, FrameAssembler, FrameError, PixelSink, RawRgbWriter, RgbFrame, SinkError,
};
use crate::hex::{DecodeError, DecodeStats, DecodedLine, HexLineDecoder};
use crate::source::{LineKind, LineSource, SourceError};

pub use stream::{FrameRenderer, StreamEvent, StreamReader, StreamSummary, spawn_stream_reader};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid frame config: {0}")]
    Config(#[from] ConfigError),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("line {line}: {source}")]
    Decode {
        line: u64,
        #[source]
        source: DecodeError,
    },
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("stream reader thread panicked")]
    ReaderPanicked,
}

/// Counters from one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub decode: DecodeStats,
    pub frame: AssemblerStats,
}

/// Tracks line numbers and decode counters while walking a source.
pub(crate) struct LineDecoder {
    decoder: HexLineDecoder,
    line: u64,
    stats: DecodeStats,
}

/// What a single source line turned into.
pub(crate) enum DecodedKind {
    Status(String),
    Data(DecodedLine),
    Blank,
}

impl LineDecoder {
    pub(crate) fn new(policy: DecodePolicy) -> Self {
        Self {
            decoder: HexLineDecoder::new(policy),
            line: 0,
            stats: DecodeStats::default(),
        }
    }

    pub(crate) fn stats(&self) -> DecodeStats {
        self.stats
    }

    pub(crate) fn decode(&mut self, line: &str) -> Result<DecodedKind, PipelineError> {
        self.line += 1;
        match LineKind::classify(line) {
            LineKind::Status(text) => {
                self.stats.status_lines += 1;
                tracing::info!(line = self.line, "{text}");
                Ok(DecodedKind::Status(text.to_string()))
            }
            LineKind::Blank => Ok(DecodedKind::Blank),
            LineKind::Data(data) => {
                let decoded = self
                    .decoder
                    .decode_line(data)
                    .map_err(|source| PipelineError::Decode {
                        line: self.line,
                        source,
                    })?;
                self.stats.record(&decoded);
                Ok(DecodedKind::Data(decoded))
            }
        }
    }
}

/// Decode hex text into raw bytes, written in input order.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use hexcam_core::DecodePolicy;
/// use hexcam_core::pipeline::hex_to_bin;
/// use hexcam_core::source::TextLineSource;
///
/// let mut source = TextLineSource::new(Cursor::new("ff d8 zz\n00\n"));
/// let mut out = Vec::new();
/// let stats = hex_to_bin(&mut source, &mut out, DecodePolicy::Lenient)?;
/// assert_eq!(out, vec![0xff, 0xd8, 0x00]);
/// assert_eq!(stats.tokens_skipped, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn hex_to_bin<S, W>(
    source: &mut S,
    mut writer: W,
    policy: DecodePolicy,
) -> Result<DecodeStats, PipelineError>
where
    S: LineSource + ?Sized,
    W: Write,
{
    let mut lines = LineDecoder::new(policy);
    while let Some(line) = source.next_line()? {
        if let DecodedKind::Data(decoded) = lines.decode(&line)? {
            writer.write_all(&decoded.bytes)?;
        }
    }
    writer.flush()?;
    Ok(lines.stats())
}

/// Convert hex pixel text into headerless raw RGB records.
pub fn yuv_to_raw<S, W>(
    source: &mut S,
    writer: W,
    config: &FrameConfig,
) -> Result<PipelineStats, PipelineError>
where
    S: LineSource + ?Sized,
    W: Write,
{
    let mut sink = RawRgbWriter::new(writer);
    let stats = assemble(source, config, &mut sink)?;
    sink.finish()?;
    Ok(stats)
}

/// Decode hex pixel text into an in-memory frame.
pub fn render_frame<S>(
    source: &mut S,
    config: &FrameConfig,
) -> Result<(RgbFrame, PipelineStats), PipelineError>
where
    S: LineSource + ?Sized,
{
    config.validate()?;
    let mut frame = RgbFrame::new(config.width, config.height);
    let stats = assemble(source, config, &mut frame)?;
    Ok((frame, stats))
}

/// Drive `source` through a frame assembler into `sink`.
pub fn assemble<S, K>(
    source: &mut S,
    config: &FrameConfig,
    sink: &mut K,
) -> Result<PipelineStats, PipelineError>
where
    S: LineSource + ?Sized,
    K: PixelSink + ?Sized,
{
    config.validate()?;
    let mut lines = LineDecoder::new(config.decode_policy);
    let mut assembler = FrameAssembler::new(*config);
    while let Some(line) = source.next_line()? {
        match lines.decode(&line)? {
            DecodedKind::Status(_) => assembler.start_frame(),
            DecodedKind::Data(decoded) => assembler.push(&decoded.bytes, sink)?,
            DecodedKind::Blank => {}
        }
    }
    Ok(PipelineStats {
        decode: lines.stats(),
        frame: assembler.finish(),
    })
}
