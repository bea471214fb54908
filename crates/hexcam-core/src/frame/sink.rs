use std::io::Write;
use std::path::Path;

use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

use super::error::SinkError;
use crate::color::Rgb;

/// Largest rendered image, in pixels.
pub const MAX_IMAGE_PIXELS: u64 = 1 << 26;

/// Receiver of assembled pixels.
pub trait PixelSink {
    fn put_pixel(&mut self, x: u32, y: u32, rgb: Rgb) -> Result<(), SinkError>;

    /// Called when the assembler closes a frame and starts a new one.
    fn end_frame(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: PixelSink + ?Sized> PixelSink for &mut S {
    fn put_pixel(&mut self, x: u32, y: u32, rgb: Rgb) -> Result<(), SinkError> {
        (**self).put_pixel(x, y, rgb)
    }

    fn end_frame(&mut self) -> Result<(), SinkError> {
        (**self).end_frame()
    }
}

/// A single pixel placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelUpdate {
    pub x: u32,
    pub y: u32,
    pub rgb: Rgb,
}

/// In-memory frame buffer, 3 bytes per pixel in raster order.
///
/// # Examples
/// ```
/// use hexcam_core::color::Rgb;
/// use hexcam_core::frame::{PixelSink, RgbFrame};
///
/// let mut frame = RgbFrame::new(2, 2);
/// frame.put_pixel(1, 1, Rgb::gray(9))?;
/// assert_eq!(frame.pixel(1, 1), Some(Rgb::gray(9)));
/// assert!(frame.put_pixel(2, 0, Rgb::gray(9)).is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
    touched: bool,
}

impl RgbFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
            touched: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether any pixel was written since creation or the last clear.
    pub fn has_pixels(&self) -> bool {
        self.touched
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        let offset = self.offset(x, y)?;
        let px = &self.data[offset..offset + 3];
        Some(Rgb::new(px[0], px[1], px[2]))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
        self.touched = false;
    }

    /// Convert to an image, zoomed by an integer `scale` (nearest neighbour).
    ///
    /// # Errors
    /// Returns `SinkError::ImageTooLarge` when the zoomed image would exceed
    /// [`MAX_IMAGE_PIXELS`].
    pub fn to_image(&self, scale: u32) -> Result<RgbImage, SinkError> {
        let scale = scale.max(1);
        let too_large = || SinkError::ImageTooLarge {
            width: self.width,
            height: self.height,
            scale,
        };
        let width = self.width.checked_mul(scale).ok_or_else(too_large)?;
        let height = self.height.checked_mul(scale).ok_or_else(too_large)?;
        if u64::from(width) * u64::from(height) > MAX_IMAGE_PIXELS {
            return Err(too_large());
        }
        Ok(RgbImage::from_fn(width, height, |x, y| {
            let rgb = self.pixel(x / scale, y / scale).unwrap_or_default();
            image::Rgb(rgb.to_array())
        }))
    }

    pub fn write_png(&self, path: &Path, scale: u32) -> Result<(), SinkError> {
        self.to_image(scale)?
            .save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 3)
    }
}

impl PixelSink for RgbFrame {
    fn put_pixel(&mut self, x: u32, y: u32, rgb: Rgb) -> Result<(), SinkError> {
        let offset = self.offset(x, y).ok_or(SinkError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self.data[offset..offset + 3].copy_from_slice(&rgb.to_array());
        self.touched = true;
        Ok(())
    }

    /// A wrapped frame starts from a blank buffer.
    fn end_frame(&mut self) -> Result<(), SinkError> {
        self.clear();
        Ok(())
    }
}

/// Writes headerless `R G B` records in emission order.
pub struct RawRgbWriter<W: Write> {
    writer: W,
    pixels: u64,
}

impl<W: Write> RawRgbWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, pixels: 0 }
    }

    pub fn pixels_written(&self) -> u64 {
        self.pixels
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W, SinkError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> PixelSink for RawRgbWriter<W> {
    fn put_pixel(&mut self, _x: u32, _y: u32, rgb: Rgb) -> Result<(), SinkError> {
        self.writer.write_all(&rgb.to_array())?;
        self.pixels += 1;
        Ok(())
    }
}

/// Collects emissions in order; frame ends are kept as positions into the
/// pixel list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelRecorder {
    pub pixels: Vec<PixelUpdate>,
    pub frame_ends: Vec<usize>,
}

impl PixelRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> Vec<(u32, u32)> {
        self.pixels.iter().map(|p| (p.x, p.y)).collect()
    }
}

impl PixelSink for PixelRecorder {
    fn put_pixel(&mut self, x: u32, y: u32, rgb: Rgb) -> Result<(), SinkError> {
        self.pixels.push(PixelUpdate { x, y, rgb });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), SinkError> {
        self.frame_ends.push(self.pixels.len());
        Ok(())
    }
}
