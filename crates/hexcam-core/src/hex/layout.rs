/// Maximum number of hex digits in one byte token.
pub const MAX_TOKEN_DIGITS: usize = 2;

/// Radix used by the camera dump format.
pub const TOKEN_RADIX: u32 = 16;
