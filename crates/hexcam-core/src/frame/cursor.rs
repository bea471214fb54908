/// Raster position of the next pixel.
///
/// The column always stays below the frame width; the row is bounded by the
/// assembler, not by the cursor.
///
/// # Examples
/// ```
/// use hexcam_core::frame::RasterCursor;
///
/// let mut cursor = RasterCursor::new(2);
/// cursor.advance();
/// cursor.advance();
/// assert_eq!(cursor.position(), (0, 1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterCursor {
    width: u32,
    column: u32,
    row: u32,
}

impl RasterCursor {
    /// `width` must be non-zero.
    pub fn new(width: u32) -> Self {
        debug_assert!(width > 0, "raster width must be non-zero");
        Self {
            width,
            column: 0,
            row: 0,
        }
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn position(&self) -> (u32, u32) {
        (self.column, self.row)
    }

    pub fn is_origin(&self) -> bool {
        self.column == 0 && self.row == 0
    }

    pub fn advance(&mut self) {
        self.column += 1;
        if self.column >= self.width {
            self.column = 0;
            self.row += 1;
        }
    }

    pub fn reset(&mut self) {
        self.column = 0;
        self.row = 0;
    }
}
