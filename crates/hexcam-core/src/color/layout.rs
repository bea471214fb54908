/// Chroma value representing "no color".
pub const CHROMA_BIAS: f64 = 128.0;

/// Red contribution of V.
pub const R_FROM_V: f64 = 1.4075;
/// Green contribution of U (subtracted).
pub const G_FROM_U: f64 = 0.3455;
/// Green contribution of V (subtracted).
pub const G_FROM_V: f64 = 0.7169;
/// Blue contribution of U.
pub const B_FROM_U: f64 = 1.7790;

/// Scale from a 4-bit packed chroma nibble to an 8-bit chroma value.
pub const NIBBLE_SCALE: u8 = 16;

pub const CHANNEL_MIN: f64 = 0.0;
pub const CHANNEL_MAX: f64 = 255.0;
