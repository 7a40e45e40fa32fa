//! # Raster Driver (Honeywell PR3)
//!
//! The PR3 runs in Line Printer mode and has no usable ESC/POS text styling,
//! so every styled element is drawn host-side and sent as an `ESC V` image.
//!
//! | Operation | Output |
//! |-----------|--------|
//! | Aligned text | Paragraph raster, 576 dots wide |
//! | Two / three columns | One shared raster |
//! | Separator | `-` × 72 drawn across the head |
//! | Line feeds | `LF` × n |
//! | Asset error | `ESC w !` text line |
//!
//! The glyph source is a type parameter so tests can use
//! [`BlockFont`](crate::layout::BlockFont) for exact pixel assertions.

use tracing::trace;

use super::{AlignedText, Driver};
use crate::buffer::CommandBuffer;
use crate::error::PrinterError;
use crate::layout::{
    Cell, FontSpec, GlyphRenderer, RasterLayout, SpleenFont, TextRaster, render_paragraph,
    render_three_columns, render_two_columns,
};
use crate::printer::{PrinterFamily, PrinterProfile};
use crate::protocol::commands;
use crate::protocol::graphics;
use crate::protocol::line_printer;
use crate::protocol::text::Alignment;

pub struct RasterDriver<F: GlyphRenderer = SpleenFont> {
    profile: PrinterProfile,
    layout: RasterLayout,
    font: F,
    buffer: CommandBuffer,
}

impl RasterDriver {
    pub fn new(profile: PrinterProfile, capacity: usize) -> Self {
        Self::with_font(profile, capacity, SpleenFont)
    }
}

impl<F: GlyphRenderer> RasterDriver<F> {
    pub fn with_font(profile: PrinterProfile, capacity: usize, font: F) -> Self {
        Self {
            layout: profile.raster_layout(),
            profile,
            font,
            buffer: CommandBuffer::with_capacity(capacity),
        }
    }

    pub fn layout(&self) -> &RasterLayout {
        &self.layout
    }

    fn emit_raster(&mut self, raster: &TextRaster) -> Result<(), PrinterError> {
        let width = u16::try_from(raster.width())
            .map_err(|_| PrinterError::Image(format!("raster too wide: {} dots", raster.width())))?;
        let height = u16::try_from(raster.height())
            .map_err(|_| PrinterError::Image(format!("raster too tall: {} rows", raster.height())))?;
        trace!(width, height, "emitting raster band");
        self.buffer
            .append(&graphics::lp_image(width, height, &raster.to_packed()))
    }
}

impl<F: GlyphRenderer + Send> Driver for RasterDriver<F> {
    fn family(&self) -> PrinterFamily {
        PrinterFamily::HoneywellPr3
    }

    fn profile(&self) -> PrinterProfile {
        self.profile
    }

    fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut CommandBuffer {
        &mut self.buffer
    }

    /// Line Printer mode needs no reset sequence.
    fn init_printer(&mut self) -> Result<(), PrinterError> {
        Ok(())
    }

    fn emit_aligned_text(&mut self, t: &AlignedText) -> Result<(), PrinterError> {
        match render_paragraph(&t.text, t.align, t.font_spec(), &self.layout, &self.font) {
            Some(raster) => self.emit_raster(&raster),
            None => Ok(()),
        }
    }

    fn emit_two_column_text(
        &mut self,
        left: &AlignedText,
        right: &AlignedText,
    ) -> Result<(), PrinterError> {
        let raster = render_two_columns(
            Cell::new(&left.text, left.font_spec()),
            Cell::new(&right.text, right.font_spec()),
            &self.layout,
            &self.font,
        );
        match raster {
            Some(raster) => self.emit_raster(&raster),
            None => Ok(()),
        }
    }

    fn emit_three_column_text(
        &mut self,
        left: &AlignedText,
        middle: &AlignedText,
        right: &AlignedText,
    ) -> Result<(), PrinterError> {
        let raster = render_three_columns(
            Cell::new(&left.text, left.font_spec()),
            Cell::new(&middle.text, middle.font_spec()),
            Cell::new(&right.text, right.font_spec()),
            &self.layout,
            &self.font,
        );
        match raster {
            Some(raster) => self.emit_raster(&raster),
            None => Ok(()),
        }
    }

    fn emit_image(&mut self, raster: &TextRaster, align: Alignment) -> Result<(), PrinterError> {
        let head = self.layout.head_width;
        let placed = raster.placed(head, align, 0);
        self.emit_raster(&placed)
    }

    fn emit_line_feeds(&mut self, n: u8) -> Result<(), PrinterError> {
        self.buffer.append(&commands::line_feeds(n))
    }

    fn emit_separator_line(&mut self) -> Result<(), PrinterError> {
        let rule = "-".repeat(self.profile.separator_len);
        match render_paragraph(&rule, Alignment::Center, FontSpec::default(), &self.layout, &self.font) {
            Some(raster) => self.emit_raster(&raster),
            None => Ok(()),
        }
    }

    fn emit_asset_error(&mut self, reason: &str) -> Result<(), PrinterError> {
        self.buffer
            .append(&line_printer::text_line(&format!("ERROR: {}", reason)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BlockFont;

    fn block_driver() -> RasterDriver<BlockFont> {
        RasterDriver::with_font(PrinterProfile::HONEYWELL_PR3, 64 * 1024, BlockFont::new(8, 20, 12))
    }

    /// (width_bytes, rows) of the first `ESC V` band.
    fn first_band(bytes: &[u8]) -> (u8, u16) {
        assert_eq!(&bytes[..2], &[0x1B, b'V']);
        let rows = u16::from_le_bytes([bytes[2], bytes[3]]);
        (bytes[4], rows)
    }

    #[test]
    fn test_init_is_empty() {
        let mut d = block_driver();
        d.init_printer().unwrap();
        assert!(d.flush().is_empty());
    }

    #[test]
    fn test_text_is_rasterized_head_wide() {
        let mut d = block_driver();
        d.emit_aligned_text(&AlignedText::new("TỔNG CỘNG").center().bold())
            .unwrap();
        let bytes = d.flush();
        let (width_bytes, rows) = first_band(&bytes);
        assert_eq!(width_bytes, 72);
        assert_eq!(rows, 2 + 20 + 2);
        assert_eq!(bytes.len(), 5 + 72 * rows as usize);
    }

    #[test]
    fn test_empty_text_emits_nothing() {
        let mut d = block_driver();
        d.emit_aligned_text(&AlignedText::new("\n")).unwrap();
        d.emit_two_column_text(&AlignedText::new(""), &AlignedText::new(""))
            .unwrap();
        assert!(d.buffer().is_empty());
    }

    #[test]
    fn test_two_columns_share_one_raster() {
        let mut d = block_driver();
        d.emit_two_column_text(&AlignedText::new("Tiền nước:"), &AlignedText::new("150000 VND").bold())
            .unwrap();
        let bytes = d.flush();
        let (_, rows) = first_band(&bytes);
        assert_eq!(bytes.len(), 5 + 72 * rows as usize);
    }

    #[test]
    fn test_separator_spans_head() {
        let mut d = block_driver();
        d.emit_separator_line().unwrap();
        let bytes = d.flush();
        let (width_bytes, _) = first_band(&bytes);
        assert_eq!(width_bytes, 72);
        // Row at the baseline band is fully inked: 72 dashes × 8 dots.
        let row = 2 + 5;
        let start = 5 + row * 72;
        assert!(bytes[start..start + 72].iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn test_asset_error_is_line_printer_text() {
        let mut d = block_driver();
        d.emit_asset_error("qr-code.png not found").unwrap();
        let bytes = d.flush();
        assert_eq!(&bytes[..3], &[0x1B, b'w', b'!']);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("ERROR: qr-code.png not found"));
    }

    #[test]
    fn test_feeds_are_lf() {
        let mut d = block_driver();
        d.emit_line_feeds(3).unwrap();
        assert_eq!(d.flush(), vec![0x0A; 3]);
    }

    #[test]
    fn test_default_driver_uses_spleen() {
        let mut d = RasterDriver::new(PrinterProfile::HONEYWELL_PR3, 64 * 1024);
        d.emit_aligned_text(&AlignedText::new("Xin cảm ơn")).unwrap();
        let bytes = d.flush();
        let (width_bytes, rows) = first_band(&bytes);
        assert_eq!(width_bytes, 72);
        assert_eq!(rows, 2 + 20 + 2);
    }
}
