use serde::{Deserialize, Serialize};

use super::layout;
use crate::config::ColorModel;

/// 8-bit RGB pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }

    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// One luminance sample with its (possibly shared) chroma.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YuvSample {
    pub y: u8,
    pub u: u8,
    pub v: u8,
}

impl YuvSample {
    pub const fn new(y: u8, u: u8, v: u8) -> Self {
        Self { y, u, v }
    }

    /// Build a sample from a luminance byte and a packed `UV` byte.
    pub fn from_packed(y: u8, uv: u8) -> Self {
        let (u, v) = unpack_nibble_chroma(uv);
        Self { y, u, v }
    }
}

/// Expand a packed chroma byte: U in the high nibble, V in the low nibble.
///
/// Each nibble is scaled by 16, so only 16 chroma levels survive.
///
/// # Examples
/// ```
/// use hexcam_core::color::unpack_nibble_chroma;
///
/// assert_eq!(unpack_nibble_chroma(0x8f), (128, 240));
/// ```
pub fn unpack_nibble_chroma(uv: u8) -> (u8, u8) {
    ((uv >> 4) * layout::NIBBLE_SCALE, (uv & 0x0f) * layout::NIBBLE_SCALE)
}

impl ColorModel {
    /// Convert one sample to RGB.
    ///
    /// # Examples
    /// ```
    /// use hexcam_core::ColorModel;
    /// use hexcam_core::color::{Rgb, YuvSample};
    ///
    /// let sample = YuvSample::new(128, 128, 128);
    /// assert_eq!(ColorModel::FullYuv.convert(sample), Rgb::gray(128));
    /// assert_eq!(ColorModel::LumaOnly.convert(YuvSample::new(7, 0, 255)), Rgb::gray(7));
    /// ```
    pub fn convert(self, sample: YuvSample) -> Rgb {
        match self {
            ColorModel::LumaOnly => Rgb::gray(sample.y),
            ColorModel::FullYuv => yuv_to_rgb(sample),
        }
    }
}

fn yuv_to_rgb(sample: YuvSample) -> Rgb {
    let y = f64::from(sample.y);
    let u = f64::from(sample.u) - layout::CHROMA_BIAS;
    let v = f64::from(sample.v) - layout::CHROMA_BIAS;

    let r = y + layout::R_FROM_V * v;
    let g = y - layout::G_FROM_U * u - layout::G_FROM_V * v;
    let b = y + layout::B_FROM_U * u;
    Rgb::new(clamp_channel(r), clamp_channel(g), clamp_channel(b))
}

fn clamp_channel(value: f64) -> u8 {
    value.clamp(layout::CHANNEL_MIN, layout::CHANNEL_MAX) as u8
}
