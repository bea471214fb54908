//! Line sources.
//!
//! A source yields text lines until the session ends. File sources end at
//! EOF; serial sources end on the first read timeout that produced no bytes
//! (unless following). All I/O lives here; decoding happens downstream.

mod serial;
mod text;

pub use serial::{DEFAULT_BAUD, DEFAULT_MAX_LINE_LEN, DEFAULT_TIMEOUT, SerialLineSource};
pub use text::TextLineSource;

use thiserror::Error;

/// First character of an out-of-band status line.
pub const STATUS_SENTINEL: char = '#';

pub trait LineSource {
    /// Next line without its terminator, or `None` once the session ends.
    fn next_line(&mut self) -> Result<Option<String>, SourceError>;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        (**self).next_line()
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error ({port}): {message}")]
    Serial { port: String, message: String },
}

/// Role of a line in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Out-of-band message; starts a new frame.
    Status(&'a str),
    /// Pixel data.
    Data(&'a str),
    /// Nothing but whitespace.
    Blank,
}

impl<'a> LineKind<'a> {
    /// Classify a line.
    ///
    /// # Examples
    /// ```
    /// use hexcam_core::source::LineKind;
    ///
    /// assert_eq!(LineKind::classify("# frame 3"), LineKind::Status("# frame 3"));
    /// assert_eq!(LineKind::classify("80 80"), LineKind::Data("80 80"));
    /// assert_eq!(LineKind::classify("  "), LineKind::Blank);
    /// ```
    pub fn classify(line: &'a str) -> Self {
        if line.starts_with(STATUS_SENTINEL) {
            LineKind::Status(line.trim_end())
        } else if line.trim().is_empty() {
            LineKind::Blank
        } else {
            LineKind::Data(line)
        }
    }
}

fn strip_line_ending(line: &mut String) {
    while line.ends_with(['\n', '\r']) {
        line.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::{LineKind, strip_line_ending};

    #[test]
    fn sentinel_must_be_first_character() {
        assert_eq!(LineKind::classify(" # not status"), LineKind::Data(" # not status"));
        assert_eq!(LineKind::classify("#\r"), LineKind::Status("#"));
    }

    #[test]
    fn strips_crlf() {
        let mut line = "01 02\r\n".to_string();
        strip_line_ending(&mut line);
        assert_eq!(line, "01 02");
    }
}
