//! # Printer Drivers
//!
//! One capability interface, three protocol families.
//!
//! | Driver | Family | Text | Columns |
//! |--------|--------|------|---------|
//! | [`DirectTextDriver`] | Woosim WSP-i350 | Inline control bytes | Tab stops (`ESC D` / `HT`) |
//! | [`LinePaddedDriver`] | Honeywell 0188 | Inline control bytes | Literal space padding |
//! | [`RasterDriver`] | Honeywell PR3 | Rendered bitmaps | Drawn into one raster |
//!
//! A driver owns the [`CommandBuffer`] for the job it is formatting. Jobs
//! start with [`Driver::begin_job`] and end with [`Driver::flush`], which
//! hands the bytes over for the transport write.
//!
//! ```
//! use printer_drivers::driver::{AlignedText, Driver};
//! use printer_drivers::printer::PrinterFamily;
//!
//! let mut driver = PrinterFamily::WoosimWspI350.driver(4096);
//! driver.begin_job();
//! driver.init_printer()?;
//! driver.emit_aligned_text(&AlignedText::new("HÓA ĐƠN").center().bold())?;
//! driver.emit_separator_line()?;
//! driver.emit_line_feeds(2)?;
//! let bytes = driver.flush();
//! assert!(!bytes.is_empty());
//! # Ok::<(), printer_drivers::PrinterError>(())
//! ```

pub mod direct;
pub mod line;
pub mod raster;

pub use direct::DirectTextDriver;
pub use line::LinePaddedDriver;
pub use raster::RasterDriver;

use crate::buffer::CommandBuffer;
use crate::error::PrinterError;
use crate::layout::{FontSpec, TextRaster};
use crate::printer::{PrinterFamily, PrinterProfile};
use crate::protocol::graphics;
use crate::protocol::text::{self, Alignment};

/// Atomic unit of layout input: text plus its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlignedText {
    pub text: String,
    pub align: Alignment,
    pub bold: bool,
    pub double_size: bool,
}

impl AlignedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn left(mut self) -> Self {
        self.align = Alignment::Left;
        self
    }

    pub fn center(mut self) -> Self {
        self.align = Alignment::Center;
        self
    }

    pub fn right(mut self) -> Self {
        self.align = Alignment::Right;
        self
    }

    pub fn align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn double_size(mut self) -> Self {
        self.double_size = true;
        self
    }

    pub fn font_spec(&self) -> FontSpec {
        FontSpec::new(self.bold, self.double_size)
    }
}

/// Protocol-specific receipt operations.
///
/// Column operations ignore the `align` of their cells: position is implied
/// by the column.
pub trait Driver: Send {
    fn family(&self) -> PrinterFamily;

    fn profile(&self) -> PrinterProfile;

    fn buffer(&self) -> &CommandBuffer;

    fn buffer_mut(&mut self) -> &mut CommandBuffer;

    /// Reset the buffer for a new job.
    fn begin_job(&mut self) {
        self.buffer_mut().clear();
    }

    fn init_printer(&mut self) -> Result<(), PrinterError>;

    /// Word-wrapped paragraph. Empty text (after one trailing newline is
    /// trimmed) appends nothing.
    fn emit_aligned_text(&mut self, text: &AlignedText) -> Result<(), PrinterError>;

    /// Left text at the left edge, right text flush right, on one line.
    fn emit_two_column_text(
        &mut self,
        left: &AlignedText,
        right: &AlignedText,
    ) -> Result<(), PrinterError>;

    fn emit_three_column_text(
        &mut self,
        left: &AlignedText,
        middle: &AlignedText,
        right: &AlignedText,
    ) -> Result<(), PrinterError>;

    fn emit_image(&mut self, raster: &TextRaster, align: Alignment) -> Result<(), PrinterError>;

    fn emit_line_feeds(&mut self, n: u8) -> Result<(), PrinterError>;

    fn emit_separator_line(&mut self) -> Result<(), PrinterError>;

    /// Inline marker printed in place of an element that could not be
    /// produced. The job continues.
    fn emit_asset_error(&mut self, reason: &str) -> Result<(), PrinterError> {
        self.emit_aligned_text(&AlignedText::new(format!("ERROR: {}", reason)))
    }

    /// Hand the finished job over. The buffer stays sealed until the next
    /// [`begin_job`](Self::begin_job).
    fn flush(&mut self) -> Vec<u8> {
        self.buffer_mut().snapshot()
    }
}

// ============================================================================
// CHARACTER-MODE HELPERS
// ============================================================================

/// Columns occupied by `text` at the given size.
pub(crate) fn columns(text: &str, double_size: bool) -> usize {
    let n = text.chars().count();
    if double_size { n * 2 } else { n }
}

/// Text wrapped in its own attribute toggles. Plain text gets no control
/// bytes at all.
pub(crate) fn styled(text: &str, bold: bool, double_size: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 12);
    if bold {
        out.extend(text::bold(true));
    }
    if double_size {
        out.extend(text::double_size(true));
    }
    out.extend_from_slice(text.as_bytes());
    if double_size {
        out.extend(text::double_size(false));
    }
    if bold {
        out.extend(text::bold(false));
    }
    out
}

pub(crate) fn spaces(n: usize) -> Vec<u8> {
    vec![b' '; n]
}

/// `GS v 0` image bracketed by alignment. Images wider than the head are
/// cropped on the right.
pub(crate) fn raster_image(
    raster: &TextRaster,
    align: Alignment,
    head_width: usize,
) -> Result<Vec<u8>, PrinterError> {
    let cropped;
    let image = if raster.width() > head_width {
        cropped = raster.placed(head_width, Alignment::Left, 0);
        &cropped
    } else {
        raster
    };
    let width = u16::try_from(image.width())
        .map_err(|_| PrinterError::Image(format!("image too wide: {} dots", image.width())))?;
    let height = u16::try_from(image.height())
        .map_err(|_| PrinterError::Image(format!("image too tall: {} rows", image.height())))?;

    let mut out = text::align(align);
    out.extend(graphics::raster(width, height, &image.to_packed()));
    out.extend(text::align(Alignment::Left));
    Ok(out)
}
