use serde::{Deserialize, Serialize};

use super::error::DecodeError;
use super::layout;
use super::reader::{HexTokens, fits_in_byte, is_hex_digits};
use crate::config::DecodePolicy;

/// Decode a single hex token into a byte.
///
/// `index` is the token position within its line and is only used for
/// error reporting.
///
/// # Examples
/// ```
/// use hexcam_core::hex::decode_token;
///
/// assert_eq!(decode_token("ff", 0).unwrap(), 255);
/// assert_eq!(decode_token("A", 0).unwrap(), 10);
/// assert!(decode_token("zz", 0).is_err());
/// ```
pub fn decode_token(token: &str, index: usize) -> Result<u8, DecodeError> {
    if !is_hex_digits(token) {
        return Err(DecodeError::InvalidDigit {
            token: token.to_string(),
            index,
        });
    }
    if !fits_in_byte(token) {
        return Err(DecodeError::TooLong {
            token: token.to_string(),
            index,
        });
    }
    u8::from_str_radix(token, layout::TOKEN_RADIX).map_err(|_| DecodeError::InvalidDigit {
        token: token.to_string(),
        index,
    })
}

/// Result of decoding one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedLine {
    /// Decoded bytes in input order.
    pub bytes: Vec<u8>,
    /// Tokens skipped under the lenient policy.
    pub skipped: Vec<DecodeError>,
}

/// Running totals across decoded lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeStats {
    /// Data lines decoded (blank and status lines excluded).
    pub lines: u64,
    /// Sentinel status lines seen.
    pub status_lines: u64,
    /// Tokens decoded into bytes.
    pub tokens_decoded: u64,
    /// Malformed tokens skipped.
    pub tokens_skipped: u64,
}

impl DecodeStats {
    pub fn record(&mut self, line: &DecodedLine) {
        self.lines += 1;
        self.tokens_decoded += line.bytes.len() as u64;
        self.tokens_skipped += line.skipped.len() as u64;
    }
}

/// Line decoder parameterized by a malformed-token policy.
///
/// # Examples
/// ```
/// use hexcam_core::DecodePolicy;
/// use hexcam_core::hex::HexLineDecoder;
///
/// let decoder = HexLineDecoder::new(DecodePolicy::Lenient);
/// let line = decoder.decode_line("zz 80").unwrap();
/// assert_eq!(line.bytes, vec![0x80]);
/// assert_eq!(line.skipped.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HexLineDecoder {
    policy: DecodePolicy,
}

impl HexLineDecoder {
    pub fn new(policy: DecodePolicy) -> Self {
        Self { policy }
    }

    /// Decode every token of `line`.
    ///
    /// # Errors
    /// Under [`DecodePolicy::Strict`], returns the first malformed token.
    pub fn decode_line(&self, line: &str) -> Result<DecodedLine, DecodeError> {
        let mut decoded = DecodedLine::default();
        for (index, token) in HexTokens::new(line) {
            match decode_token(token, index) {
                Ok(byte) => decoded.bytes.push(byte),
                Err(err) => match self.policy {
                    DecodePolicy::Strict => return Err(err),
                    DecodePolicy::Lenient => {
                        tracing::warn!("skipping {err}");
                        decoded.skipped.push(err);
                    }
                },
            }
        }
        Ok(decoded)
    }
}
