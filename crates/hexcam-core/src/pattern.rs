//! Synthetic frames for checking the render path without camera data.

use crate::color::Rgb;
use crate::frame::{PixelSink, RgbFrame, SinkError};

/// Constant red level of the test pattern.
pub const PATTERN_RED: u8 = 0x80;

/// Gradient test pattern: green follows the row, blue follows the column.
///
/// # Examples
/// ```
/// use hexcam_core::color::Rgb;
/// use hexcam_core::pattern::test_pattern;
///
/// let frame = test_pattern(4, 3)?;
/// assert_eq!(frame.pixel(3, 2), Some(Rgb::new(0x80, 2, 3)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn test_pattern(width: u32, height: u32) -> Result<RgbFrame, SinkError> {
    let mut frame = RgbFrame::new(width, height);
    for y in 0..height {
        for x in 0..width {
            frame.put_pixel(x, y, Rgb::new(PATTERN_RED, y as u8, x as u8))?;
        }
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::test_pattern;
    use crate::color::Rgb;

    #[test]
    fn channels_wrap_past_255() {
        let frame = test_pattern(300, 1).unwrap();
        assert_eq!(frame.pixel(256, 0), Some(Rgb::new(0x80, 0, 0)));
        assert_eq!(frame.pixel(299, 0), Some(Rgb::new(0x80, 0, 43)));
    }

    #[test]
    fn every_pixel_is_written() {
        let frame = test_pattern(96, 96).unwrap();
        assert!(frame.has_pixels());
        assert_eq!(frame.as_bytes().len(), 96 * 96 * 3);
        assert!(frame.as_bytes().chunks(3).all(|px| px[0] == 0x80));
    }
}
