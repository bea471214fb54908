use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{LineSource, SourceError, strip_line_ending};

/// Line source over buffered text, read to EOF.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use hexcam_core::source::{LineSource, TextLineSource};
///
/// let mut source = TextLineSource::new(Cursor::new("01 02\n03\n"));
/// assert_eq!(source.next_line()?, Some("01 02".to_string()));
/// assert_eq!(source.next_line()?, Some("03".to_string()));
/// assert_eq!(source.next_line()?, None);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct TextLineSource<R: BufRead> {
    reader: R,
}

impl TextLineSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> TextLineSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for TextLineSource<R> {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        strip_line_ending(&mut line);
        Ok(Some(line))
    }
}
