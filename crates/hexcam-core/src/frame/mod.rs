//! Frame assembly.
//!
//! The assembler walks decoded bytes in fixed-size groups, converts each
//! group into one or two pixels and places them in raster order through a
//! [`RasterCursor`]. Pixels are handed to a [`PixelSink`]; what happens past
//! the last row is decided by the configured `OverflowPolicy`.

pub mod assembler;
pub mod cursor;
pub mod error;
pub mod sink;

pub use assembler::{AssemblerStats, FrameAssembler};
pub use cursor::RasterCursor;
pub use error::{FrameError, SinkError};
pub use sink::{
    MAX_IMAGE_PIXELS, PixelRecorder, PixelSink, PixelUpdate, RawRgbWriter, RgbFrame,
};
