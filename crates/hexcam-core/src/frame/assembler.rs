use serde::{Deserialize, Serialize};

use super::cursor::RasterCursor;
use super::error::FrameError;
use super::sink::PixelSink;
use crate::color::{Rgb, YuvSample};
use crate::config::{FrameConfig, GroupLayout, OverflowPolicy};

const MAX_GROUP_LEN: usize = 4;

/// Counters describing one assembly run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblerStats {
    /// Pixels handed to the sink.
    pub pixels_emitted: u64,
    /// Pixels discarded past the last row (truncate policy).
    pub pixels_dropped: u64,
    /// Frames that received at least one pixel.
    pub frames: u64,
    /// Frames closed by the wrap overflow policy.
    pub frames_wrapped: u64,
    /// Bytes of incomplete groups discarded at frame boundaries.
    pub remainder_bytes: u64,
}

/// Converts decoded bytes into raster-ordered pixels.
///
/// Incomplete groups are carried over between [`push`](Self::push) calls, so
/// a group may span input lines. They are discarded when a new frame starts
/// or when the assembler is finished.
///
/// # Examples
/// ```
/// use hexcam_core::FrameConfig;
/// use hexcam_core::color::Rgb;
/// use hexcam_core::frame::{FrameAssembler, PixelRecorder};
///
/// let mut assembler = FrameAssembler::new(FrameConfig::default());
/// let mut recorder = PixelRecorder::new();
/// assembler.push(&[0x80, 0x80], &mut recorder)?;
/// assert_eq!(recorder.pixels[0].rgb, Rgb::gray(128));
/// assert_eq!(recorder.positions(), vec![(0, 0)]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    config: FrameConfig,
    cursor: RasterCursor,
    pending: Vec<u8>,
    frame_has_pixels: bool,
    overflow_reported: bool,
    stats: AssemblerStats,
}

impl FrameAssembler {
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            cursor: RasterCursor::new(config.width.max(1)),
            pending: Vec::with_capacity(MAX_GROUP_LEN),
            frame_has_pixels: false,
            overflow_reported: false,
            stats: AssemblerStats::default(),
        }
    }

    pub fn cursor(&self) -> RasterCursor {
        self.cursor
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// Bytes of an incomplete group waiting for more input.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Feed decoded bytes, emitting every completed group.
    ///
    /// # Errors
    /// Returns `FrameError::Overflow` under [`OverflowPolicy::Error`] when a
    /// pixel falls past the last row, and propagates sink failures.
    pub fn push<S: PixelSink + ?Sized>(
        &mut self,
        bytes: &[u8],
        sink: &mut S,
    ) -> Result<(), FrameError> {
        let group_len = self.config.layout.group_len();
        let mut rest = bytes;

        if !self.pending.is_empty() {
            let take = (group_len - self.pending.len()).min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.pending.len() < group_len {
                return Ok(());
            }
            let mut group = [0u8; MAX_GROUP_LEN];
            group[..group_len].copy_from_slice(&self.pending);
            self.pending.clear();
            self.emit_group(&group[..group_len], sink)?;
        }

        let mut groups = rest.chunks_exact(group_len);
        for group in &mut groups {
            self.emit_group(group, sink)?;
        }
        self.pending.extend_from_slice(groups.remainder());
        Ok(())
    }

    /// Restart at the top-left corner of a new frame.
    pub fn start_frame(&mut self) {
        self.discard_pending();
        self.cursor.reset();
        self.frame_has_pixels = false;
        self.overflow_reported = false;
    }

    /// Discard any incomplete group and return the final counters.
    pub fn finish(&mut self) -> AssemblerStats {
        self.discard_pending();
        self.stats
    }

    fn discard_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        tracing::warn!(
            bytes = self.pending.len(),
            "dropping incomplete {}-byte group",
            self.config.layout.group_len()
        );
        self.stats.remainder_bytes += self.pending.len() as u64;
        self.pending.clear();
    }

    fn emit_group<S: PixelSink + ?Sized>(
        &mut self,
        group: &[u8],
        sink: &mut S,
    ) -> Result<(), FrameError> {
        let model = self.config.color_model;
        match self.config.layout {
            GroupLayout::PackedNibble => {
                let sample = YuvSample::from_packed(group[0], group[1]);
                self.emit(model.convert(sample), sink)
            }
            GroupLayout::Yuyv => {
                let (u, v) = (group[1], group[3]);
                self.emit(model.convert(YuvSample::new(group[0], u, v)), sink)?;
                self.emit(model.convert(YuvSample::new(group[2], u, v)), sink)
            }
        }
    }

    fn emit<S: PixelSink + ?Sized>(&mut self, rgb: Rgb, sink: &mut S) -> Result<(), FrameError> {
        if self.cursor.row() >= self.config.height {
            match self.config.overflow {
                OverflowPolicy::Truncate => {
                    if !self.overflow_reported {
                        tracing::warn!(
                            "pixel data past {}x{} frame, dropping until next frame",
                            self.config.width,
                            self.config.height
                        );
                        self.overflow_reported = true;
                    }
                    self.stats.pixels_dropped += 1;
                    return Ok(());
                }
                OverflowPolicy::WrapNewFrame => {
                    sink.end_frame()?;
                    self.cursor.reset();
                    self.frame_has_pixels = false;
                    self.stats.frames_wrapped += 1;
                    tracing::debug!(frame = self.stats.frames + 1, "frame wrapped");
                }
                OverflowPolicy::Error => {
                    return Err(FrameError::Overflow {
                        width: self.config.width,
                        height: self.config.height,
                    });
                }
            }
        }

        let (x, y) = self.cursor.position();
        sink.put_pixel(x, y, rgb)?;
        self.cursor.advance();
        self.stats.pixels_emitted += 1;
        if !self.frame_has_pixels {
            self.frame_has_pixels = true;
            self.stats.frames += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FrameAssembler;
    use crate::color::{Rgb, YuvSample};
    use crate::config::{ColorModel, FrameConfig, GroupLayout, OverflowPolicy};
    use crate::frame::{FrameError, PixelRecorder};

    fn config(layout: GroupLayout, width: u32, height: u32) -> FrameConfig {
        FrameConfig {
            width,
            height,
            layout,
            ..FrameConfig::default()
        }
    }

    #[test]
    fn two_byte_groups_fill_rows_in_raster_order() {
        let mut assembler = FrameAssembler::new(config(GroupLayout::PackedNibble, 4, 2));
        let mut recorder = PixelRecorder::new();
        let bytes: Vec<u8> = (0..8u8).flat_map(|i| [i * 10, 0x88]).collect();
        assembler.push(&bytes, &mut recorder).unwrap();

        let columns: Vec<u32> = recorder.pixels.iter().map(|p| p.x).collect();
        let rows: Vec<u32> = recorder.pixels.iter().map(|p| p.y).collect();
        assert_eq!(columns, vec![0, 1, 2, 3, 0, 1, 2, 3]);
        assert_eq!(rows, vec![0, 0, 0, 0, 1, 1, 1, 1]);
        assert_eq!(recorder.pixels[7].rgb, Rgb::gray(70));
    }

    #[test]
    fn four_byte_group_emits_two_pixels_sharing_chroma() {
        let config = FrameConfig {
            color_model: ColorModel::FullYuv,
            ..config(GroupLayout::Yuyv, 4, 4)
        };
        let mut assembler = FrameAssembler::new(config);
        let mut recorder = PixelRecorder::new();
        assembler.push(&[100, 90, 140, 170], &mut recorder).unwrap();

        assert_eq!(recorder.positions(), vec![(0, 0), (1, 0)]);
        let first = recorder.pixels[0].rgb;
        let second = recorder.pixels[1].rgb;
        assert_eq!(first, ColorModel::FullYuv.convert(YuvSample::new(100, 90, 170)));
        assert_eq!(second, ColorModel::FullYuv.convert(YuvSample::new(140, 90, 170)));
        // Same chroma offset, luma differs by 40 and nothing clamps here.
        assert_eq!(second.r - first.r, 40);
        assert_eq!(second.g - first.g, 40);
        assert_eq!(second.b - first.b, 40);
    }

    #[test]
    fn yuyv_reference_line_is_clamped() {
        let config = FrameConfig {
            color_model: ColorModel::FullYuv,
            ..config(GroupLayout::Yuyv, 4, 1)
        };
        let mut assembler = FrameAssembler::new(config);
        let mut recorder = PixelRecorder::new();
        assembler.push(&[0xff, 0x00, 0x00, 0xff], &mut recorder).unwrap();
        assert_eq!(recorder.pixels[0].rgb, Rgb::new(255, 208, 27));
        assert_eq!(recorder.pixels[1].rgb, Rgb::new(178, 0, 0));
    }

    #[test]
    fn groups_may_span_pushes() {
        let mut assembler = FrameAssembler::new(config(GroupLayout::Yuyv, 4, 1));
        let mut recorder = PixelRecorder::new();
        assembler.push(&[10, 128, 20], &mut recorder).unwrap();
        assert!(recorder.pixels.is_empty());
        assert_eq!(assembler.pending_len(), 3);
        assembler.push(&[128, 30], &mut recorder).unwrap();
        assert_eq!(recorder.positions(), vec![(0, 0), (1, 0)]);
        assert_eq!(assembler.pending_len(), 1);
        let stats = assembler.finish();
        assert_eq!(stats.remainder_bytes, 1);
    }

    #[test]
    fn truncate_drops_pixels_past_last_row() {
        let mut assembler = FrameAssembler::new(config(GroupLayout::PackedNibble, 2, 1));
        let mut recorder = PixelRecorder::new();
        assembler.push(&[1, 0, 2, 0, 3, 0, 4, 0], &mut recorder).unwrap();
        assert_eq!(recorder.positions(), vec![(0, 0), (1, 0)]);
        let stats = assembler.finish();
        assert_eq!(stats.pixels_emitted, 2);
        assert_eq!(stats.pixels_dropped, 2);
        assert_eq!(stats.frames, 1);
    }

    #[test]
    fn wrap_starts_a_new_frame() {
        let config = FrameConfig {
            overflow: OverflowPolicy::WrapNewFrame,
            ..config(GroupLayout::PackedNibble, 2, 1)
        };
        let mut assembler = FrameAssembler::new(config);
        let mut recorder = PixelRecorder::new();
        assembler.push(&[1, 0, 2, 0, 3, 0], &mut recorder).unwrap();
        assert_eq!(recorder.positions(), vec![(0, 0), (1, 0), (0, 0)]);
        assert_eq!(recorder.frame_ends, vec![2]);
        let stats = assembler.finish();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.frames_wrapped, 1);
    }

    #[test]
    fn error_policy_rejects_overflow() {
        let config = FrameConfig {
            overflow: OverflowPolicy::Error,
            ..config(GroupLayout::PackedNibble, 1, 1)
        };
        let mut assembler = FrameAssembler::new(config);
        let mut recorder = PixelRecorder::new();
        let err = assembler.push(&[1, 0, 2, 0], &mut recorder).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Overflow {
                width: 1,
                height: 1
            }
        ));
        assert_eq!(recorder.pixels.len(), 1);
    }

    #[test]
    fn start_frame_resets_cursor_and_discards_partial_group() {
        let mut assembler = FrameAssembler::new(config(GroupLayout::PackedNibble, 4, 4));
        let mut recorder = PixelRecorder::new();
        assembler.push(&[1, 0, 2, 0, 3], &mut recorder).unwrap();
        assert_eq!(assembler.cursor().position(), (2, 0));
        assembler.start_frame();
        assert!(assembler.cursor().is_origin());
        assembler.push(&[9, 0], &mut recorder).unwrap();
        assert_eq!(recorder.positions(), vec![(0, 0), (1, 0), (0, 0)]);
        let stats = assembler.finish();
        assert_eq!(stats.remainder_bytes, 1);
        assert_eq!(stats.frames, 2);
    }

    #[test]
    fn start_frame_clears_truncation() {
        let mut assembler = FrameAssembler::new(config(GroupLayout::PackedNibble, 1, 1));
        let mut recorder = PixelRecorder::new();
        assembler.push(&[1, 0, 2, 0], &mut recorder).unwrap();
        assembler.start_frame();
        assembler.push(&[3, 0], &mut recorder).unwrap();
        let values: Vec<u8> = recorder.pixels.iter().map(|p| p.rgb.r).collect();
        assert_eq!(values, vec![1, 3]);
    }
}
