use thiserror::Error;

/// Errors returned by hex token decoding.
///
/// # Examples
/// ```
/// use hexcam_core::hex::DecodeError;
///
/// let err = DecodeError::InvalidDigit { token: "zz".to_string(), index: 0 };
/// assert!(err.to_string().contains("invalid hex token"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid hex token '{token}' at position {index}")]
    InvalidDigit { token: String, index: usize },
    #[error("hex token '{token}' at position {index} does not fit in a byte")]
    TooLong { token: String, index: usize },
}

impl DecodeError {
    /// The offending token as it appeared in the input.
    pub fn token(&self) -> &str {
        match self {
            DecodeError::InvalidDigit { token, .. } | DecodeError::TooLong { token, .. } => token,
        }
    }

    /// Zero-based token position within its line.
    pub fn index(&self) -> usize {
        match self {
            DecodeError::InvalidDigit { index, .. } | DecodeError::TooLong { index, .. } => *index,
        }
    }
}
