use thiserror::Error;

/// Errors raised by pixel sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pixel ({x}, {y}) is outside the {width}x{height} frame")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("{scale}x image of a {width}x{height} frame is too large")]
    ImageTooLarge { width: u32, height: u32, scale: u32 },
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors raised while assembling frames.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("pixel data overflows the {width}x{height} frame")]
    Overflow { width: u32, height: u32 },
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}
