use super::layout;

/// Whitespace token splitter over one text line.
pub struct HexTokens<'a> {
    inner: std::iter::Enumerate<std::str::SplitAsciiWhitespace<'a>>,
}

impl<'a> HexTokens<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            inner: line.split_ascii_whitespace().enumerate(),
        }
    }
}

impl<'a> Iterator for HexTokens<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Check that a token only carries hex digits.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// use hexcam_core::hex::reader::is_hex_digits;
///
/// assert!(is_hex_digits("aF"));
/// assert!(!is_hex_digits("+f"));
/// ```
pub fn is_hex_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Check that a token is short enough to encode a single byte.
pub fn fits_in_byte(token: &str) -> bool {
    token.len() <= layout::MAX_TOKEN_DIGITS
}
