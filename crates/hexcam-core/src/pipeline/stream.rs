//! Live frame streaming.
//!
//! A reader thread owns the line source and the assembler. It turns every
//! source line into [`StreamEvent`]s and sends them through a bounded
//! channel, so a slow consumer applies backpressure to the reader instead of
//! queueing without limit. Dropping the [`StreamReader`] (or its receiver)
//! stops the reader at its next send.

use std::mem;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};

use super::{DecodedKind, LineDecoder, PipelineError, PipelineStats};
use crate::color::Rgb;
use crate::config::FrameConfig;
use crate::frame::{FrameAssembler, PixelSink, PixelUpdate, RgbFrame, SinkError};
use crate::source::LineSource;

/// Default number of in-flight events between reader and consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Out-of-band status line. The next pixel starts a new frame.
    Status(String),
    /// Pixels decoded from one data line, in raster order.
    Pixels(Vec<PixelUpdate>),
    /// The overflow policy closed the frame and restarted at the top.
    FrameWrapped,
}

/// Outcome of a finished stream session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub stats: PipelineStats,
    /// The consumer went away before the source ended.
    pub disconnected: bool,
}

/// Handle to a running reader thread.
pub struct StreamReader {
    events: Receiver<StreamEvent>,
    handle: JoinHandle<Result<StreamSummary, PipelineError>>,
}

impl StreamReader {
    /// Block for the next event; `None` once the reader has stopped.
    pub fn recv(&self) -> Option<StreamEvent> {
        self.events.recv().ok()
    }

    pub fn iter(&self) -> mpsc::Iter<'_, StreamEvent> {
        self.events.iter()
    }

    /// Stop receiving and wait for the reader to finish.
    pub fn join(self) -> Result<StreamSummary, PipelineError> {
        drop(self.events);
        self.handle
            .join()
            .map_err(|_| PipelineError::ReaderPanicked)?
    }
}

/// Start reading `source` on a background thread.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use hexcam_core::FrameConfig;
/// use hexcam_core::pipeline::{StreamEvent, spawn_stream_reader};
/// use hexcam_core::source::SerialLineSource;
///
/// let source = SerialLineSource::new(Cursor::new(b"# frame\n80 80\n".to_vec()));
/// let reader = spawn_stream_reader(source, FrameConfig::default(), 4)?;
/// let events: Vec<_> = reader.iter().collect();
/// assert_eq!(events[0], StreamEvent::Status("# frame".to_string()));
/// assert!(matches!(&events[1], StreamEvent::Pixels(pixels) if pixels.len() == 1));
/// reader.join()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn spawn_stream_reader<S>(
    source: S,
    config: FrameConfig,
    capacity: usize,
) -> Result<StreamReader, PipelineError>
where
    S: LineSource + Send + 'static,
{
    config.validate()?;
    let (tx, events) = mpsc::sync_channel(capacity.max(1));
    let handle = thread::Builder::new()
        .name("hexcam-reader".to_string())
        .spawn(move || run_reader(source, config, tx))?;
    Ok(StreamReader { events, handle })
}

fn run_reader<S: LineSource>(
    mut source: S,
    config: FrameConfig,
    tx: SyncSender<StreamEvent>,
) -> Result<StreamSummary, PipelineError> {
    let mut lines = LineDecoder::new(config.decode_policy);
    let mut assembler = FrameAssembler::new(config);
    let mut batcher = EventBatcher::default();
    let mut disconnected = false;
    tracing::info!(
        width = config.width,
        height = config.height,
        layout = %config.layout,
        "stream reader started"
    );

    'read: while let Some(line) = source.next_line()? {
        match lines.decode(&line)? {
            DecodedKind::Status(text) => {
                assembler.start_frame();
                batcher.events.push(StreamEvent::Status(text));
            }
            DecodedKind::Data(decoded) => assembler.push(&decoded.bytes, &mut batcher)?,
            DecodedKind::Blank => continue,
        }
        for event in batcher.drain() {
            if tx.send(event).is_err() {
                tracing::debug!("stream consumer disconnected");
                disconnected = true;
                break 'read;
            }
        }
    }

    let stats = PipelineStats {
        decode: lines.stats(),
        frame: assembler.finish(),
    };
    tracing::info!(
        lines = stats.decode.lines,
        pixels = stats.frame.pixels_emitted,
        "stream reader finished"
    );
    Ok(StreamSummary {
        stats,
        disconnected,
    })
}

/// Groups the pixels of one line into a single event, splitting at wraps.
#[derive(Default)]
struct EventBatcher {
    events: Vec<StreamEvent>,
    pixels: Vec<PixelUpdate>,
}

impl EventBatcher {
    fn flush_pixels(&mut self) {
        if !self.pixels.is_empty() {
            let pixels = mem::take(&mut self.pixels);
            self.events.push(StreamEvent::Pixels(pixels));
        }
    }

    fn drain(&mut self) -> Vec<StreamEvent> {
        self.flush_pixels();
        mem::take(&mut self.events)
    }
}

impl PixelSink for EventBatcher {
    fn put_pixel(&mut self, x: u32, y: u32, rgb: Rgb) -> Result<(), SinkError> {
        self.pixels.push(PixelUpdate { x, y, rgb });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), SinkError> {
        self.flush_pixels();
        self.events.push(StreamEvent::FrameWrapped);
        Ok(())
    }
}

/// Rendering consumer: applies events to a frame buffer.
pub struct FrameRenderer {
    frame: RgbFrame,
    completed: u64,
}

impl FrameRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: RgbFrame::new(width, height),
            completed: 0,
        }
    }

    /// The frame currently being drawn.
    pub fn frame(&self) -> &RgbFrame {
        &self.frame
    }

    /// Frames handed out by [`apply`](Self::apply) so far.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Apply one event. Returns the finished frame when the event closes a
    /// frame that received pixels; the live buffer then starts blank.
    pub fn apply(&mut self, event: &StreamEvent) -> Result<Option<RgbFrame>, SinkError> {
        match event {
            StreamEvent::Status(_) | StreamEvent::FrameWrapped => Ok(self.take_frame()),
            StreamEvent::Pixels(pixels) => {
                for pixel in pixels {
                    self.frame.put_pixel(pixel.x, pixel.y, pixel.rgb)?;
                }
                Ok(None)
            }
        }
    }

    /// Take the live frame if it holds pixels.
    pub fn take_frame(&mut self) -> Option<RgbFrame> {
        if !self.frame.has_pixels() {
            return None;
        }
        let done = self.frame.clone();
        self.frame.clear();
        self.completed += 1;
        Some(done)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{FrameRenderer, StreamEvent, spawn_stream_reader};
    use crate::color::Rgb;
    use crate::config::{DecodePolicy, FrameConfig, OverflowPolicy};
    use crate::frame::PixelUpdate;
    use crate::pipeline::PipelineError;
    use crate::source::SerialLineSource;

    fn serial(text: &str) -> SerialLineSource<Cursor<Vec<u8>>> {
        SerialLineSource::new(Cursor::new(text.as_bytes().to_vec()))
    }

    fn config(width: u32, height: u32) -> FrameConfig {
        FrameConfig {
            width,
            height,
            ..FrameConfig::default()
        }
    }

    #[test]
    fn sentinel_resets_cursor_between_frames() {
        let reader = spawn_stream_reader(
            serial("# f1\n10 00 20 00\n# f2\n30 00\n"),
            config(4, 4),
            2,
        )
        .unwrap();
        let events: Vec<_> = reader.iter().collect();
        let summary = reader.join().unwrap();

        assert_eq!(events.len(), 4);
        assert_eq!(events[0], StreamEvent::Status("# f1".to_string()));
        assert_eq!(events[2], StreamEvent::Status("# f2".to_string()));
        assert_eq!(
            events[3],
            StreamEvent::Pixels(vec![PixelUpdate {
                x: 0,
                y: 0,
                rgb: Rgb::gray(0x30)
            }])
        );
        assert_eq!(summary.stats.decode.status_lines, 2);
        assert_eq!(summary.stats.frame.frames, 2);
        assert!(!summary.disconnected);
    }

    #[test]
    fn wrap_policy_emits_frame_boundary_inside_a_line() {
        let config = FrameConfig {
            overflow: OverflowPolicy::WrapNewFrame,
            ..config(1, 1)
        };
        let reader = spawn_stream_reader(serial("01 00 02 00\n"), config, 8).unwrap();
        let events: Vec<_> = reader.iter().collect();
        reader.join().unwrap();

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], StreamEvent::Pixels(p) if p[0].rgb == Rgb::gray(1)));
        assert_eq!(events[1], StreamEvent::FrameWrapped);
        assert!(matches!(&events[2], StreamEvent::Pixels(p) if p[0].rgb == Rgb::gray(2)));
    }

    #[test]
    fn dropped_consumer_stops_reader() {
        let text = "01 00\n".repeat(64);
        let reader = spawn_stream_reader(serial(&text), config(96, 96), 1).unwrap();
        let first = reader.recv();
        assert!(first.is_some());
        let summary = reader.join().unwrap();
        assert!(summary.disconnected);
        assert!(summary.stats.decode.lines < 64);
    }

    #[test]
    fn strict_decode_error_surfaces_on_join() {
        let config = FrameConfig {
            decode_policy: DecodePolicy::Strict,
            ..config(4, 4)
        };
        let reader = spawn_stream_reader(serial("01 00\nzz\n"), config, 4).unwrap();
        let events: Vec<_> = reader.iter().collect();
        assert_eq!(events.len(), 1);
        let err = reader.join().unwrap_err();
        assert!(matches!(err, PipelineError::Decode { line: 2, .. }));
    }

    #[test]
    fn renderer_hands_out_completed_frames() {
        let mut renderer = FrameRenderer::new(2, 1);
        assert!(
            renderer
                .apply(&StreamEvent::Status("# start".to_string()))
                .unwrap()
                .is_none()
        );
        let pixels = vec![PixelUpdate {
            x: 1,
            y: 0,
            rgb: Rgb::gray(50),
        }];
        assert!(renderer.apply(&StreamEvent::Pixels(pixels)).unwrap().is_none());

        let done = renderer
            .apply(&StreamEvent::Status("# next".to_string()))
            .unwrap()
            .expect("completed frame");
        assert_eq!(done.pixel(1, 0), Some(Rgb::gray(50)));
        assert!(!renderer.frame().has_pixels());
        assert_eq!(renderer.completed(), 1);
    }
}
