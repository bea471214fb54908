//! YUV to RGB pixel conversion.
//!
//! Two color models are supported: a grayscale model that only reads
//! luminance, and a full conversion with fixed coefficients in `layout`.
//! Every conversion is total over byte inputs: channels are clamped to
//! `0..=255` and then truncated, never rounded.

pub mod layout;
pub mod model;

pub use model::{Rgb, YuvSample, unpack_nibble_chroma};

pub use crate::config::ColorModel;
