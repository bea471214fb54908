use std::io::{self, BufRead, BufReader, Read};
use std::time::Duration;

use super::{LineSource, SourceError, strip_line_ending};

/// Baud rate used by the camera firmware.
pub const DEFAULT_BAUD: u32 = 460_800;
/// Per-read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);
/// Longest line returned in one piece.
pub const DEFAULT_MAX_LINE_LEN: usize = 1024;

/// Line source over a timed byte stream such as a serial port.
///
/// A line ends at `\n`, at `max_line_len` bytes, or at a read timeout that
/// interrupts a partial line. A timeout with no pending bytes ends the
/// session, unless the source follows the stream, in which case it keeps
/// polling. Invalid UTF-8 is replaced rather than rejected.
pub struct SerialLineSource<R: Read> {
    reader: BufReader<R>,
    max_line_len: usize,
    follow: bool,
}

impl SerialLineSource<Box<dyn serialport::SerialPort>> {
    /// Open a serial port for reading.
    ///
    /// # Errors
    /// Returns `SourceError::Serial` when the port cannot be opened or
    /// configured.
    pub fn open(port: &str, baud: u32, timeout: Duration) -> Result<Self, SourceError> {
        let serial = serialport::new(port, baud)
            .timeout(timeout)
            .open()
            .map_err(|err| SourceError::Serial {
                port: port.to_string(),
                message: err.to_string(),
            })?;
        tracing::info!(port, baud, "serial port opened");
        Ok(Self::new(serial))
    }
}

impl<R: Read> SerialLineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            max_line_len: DEFAULT_MAX_LINE_LEN,
            follow: false,
        }
    }

    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len.max(1);
        self
    }

    /// Keep polling across idle timeouts instead of ending the session.
    pub fn follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    fn read_raw_line(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        let mut line = Vec::new();
        loop {
            let available = match self.reader.fill_buf() {
                Ok(available) => available,
                Err(err) if is_timeout(&err) => {
                    if !line.is_empty() {
                        return Ok(Some(line));
                    }
                    if self.follow {
                        continue;
                    }
                    return Ok(None);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            if available.is_empty() {
                return Ok(if line.is_empty() { None } else { Some(line) });
            }

            let room = self.max_line_len - line.len();
            let window = &available[..available.len().min(room)];
            if let Some(end) = window.iter().position(|b| *b == b'\n') {
                line.extend_from_slice(&window[..=end]);
                self.reader.consume(end + 1);
                return Ok(Some(line));
            }
            let taken = window.len();
            line.extend_from_slice(window);
            self.reader.consume(taken);
            if line.len() >= self.max_line_len {
                return Ok(Some(line));
            }
        }
    }
}

impl<R: Read> LineSource for SerialLineSource<R> {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        let Some(raw) = self.read_raw_line()? else {
            return Ok(None);
        };
        let mut line = String::from_utf8_lossy(&raw).into_owned();
        strip_line_ending(&mut line);
        Ok(Some(line))
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{self, Cursor, Read};

    use super::SerialLineSource;
    use crate::source::LineSource;

    /// Replays chunks, reporting a timeout for every `None`.
    struct TimedReader {
        chunks: VecDeque<Option<Vec<u8>>>,
    }

    impl TimedReader {
        fn new(chunks: &[Option<&str>]) -> Self {
            Self {
                chunks: chunks
                    .iter()
                    .map(|c| c.map(|text| text.as_bytes().to_vec()))
                    .collect(),
            }
        }
    }

    impl Read for TimedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                None => Ok(0),
                Some(None) => Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
                Some(Some(chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.chunks.push_front(Some(chunk[n..].to_vec()));
                    }
                    Ok(n)
                }
            }
        }
    }

    #[test]
    fn splits_on_newline() {
        let mut source = SerialLineSource::new(Cursor::new(b"# hi\r\n01 02\n".to_vec()));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("# hi"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("01 02"));
        assert!(source.next_line().unwrap().is_none());
    }

    #[test]
    fn idle_timeout_ends_session() {
        let reader = TimedReader::new(&[Some("01\n"), None, Some("02\n")]);
        let mut source = SerialLineSource::new(reader);
        assert_eq!(source.next_line().unwrap().as_deref(), Some("01"));
        assert!(source.next_line().unwrap().is_none());
    }

    #[test]
    fn follow_polls_through_idle_timeouts() {
        let reader = TimedReader::new(&[Some("01\n"), None, None, Some("02\n")]);
        let mut source = SerialLineSource::new(reader).follow(true);
        assert_eq!(source.next_line().unwrap().as_deref(), Some("01"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("02"));
        assert!(source.next_line().unwrap().is_none());
    }

    #[test]
    fn timeout_returns_partial_line() {
        let reader = TimedReader::new(&[Some("01 0"), None, Some("2\n")]);
        let mut source = SerialLineSource::new(reader);
        assert_eq!(source.next_line().unwrap().as_deref(), Some("01 0"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn long_lines_are_split_at_limit() {
        let mut source =
            SerialLineSource::new(Cursor::new(b"0102030405\n".to_vec())).with_max_line_len(4);
        assert_eq!(source.next_line().unwrap().as_deref(), Some("0102"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("0304"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("05"));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut source = SerialLineSource::new(Cursor::new(vec![b'8', 0xff, b'\n']));
        let line = source.next_line().unwrap().unwrap();
        assert!(line.starts_with('8'));
        assert!(line.contains('\u{fffd}'));
    }
}
