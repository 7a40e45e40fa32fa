//! Monochrome rasters and text-to-raster rendering.
//!
//! ## Paragraph Geometry
//!
//! ```text
//!  ├ margin ┤                                 ├ margin ┤
//!  ┌─────────────────────────────────────────────────────┐ ─┬─ padding_top
//!  │        LEFT LINE                                    │  │  line_height
//!  │                 CENTERED LINE                       │  │  line_height
//!  │                                      RIGHT LINE     │  │  line_height
//!  └─────────────────────────────────────────────────────┘ ─┴─ padding_bottom
//!  ├──────────────────── head_width ─────────────────────┤
//! ```
//!
//! - LEFT: `x = margin`
//! - CENTER: `x = (head_width − line_width) / 2`
//! - RIGHT: `x = head_width − line_width − margin`
//!
//! The first baseline sits one ascent below `padding_top`; each further line
//! moves down by `line_height`.

use image::{GrayImage, Luma};
use qrcode::{EcLevel, QrCode};

use super::font::{FontSpec, GlyphRenderer};
use super::wrap::{trim_terminator, wrap_pixels};
use crate::error::PrinterError;
use crate::protocol::text::Alignment;

/// Monochrome pixel grid. `true` is a black dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRaster {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl TextRaster {
    /// Blank (all white) raster.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the dot at (x, y) is black. Out of range reads as white.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, black: bool) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = black;
        }
    }

    /// Blacken a rectangle, clipped to the raster.
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for py in y.min(y_end)..y_end {
            for px in x.min(x_end)..x_end {
                self.pixels[py * self.width + px] = true;
            }
        }
    }

    /// Copy the black dots of `src` with its top-left corner at (x, y).
    pub fn blit(&mut self, src: &TextRaster, x: usize, y: usize) {
        for sy in 0..src.height {
            for sx in 0..src.width {
                if src.pixels[sy * src.width + sx] {
                    self.set(x + sx, y + sy, true);
                }
            }
        }
    }

    pub fn count_black(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    /// Bounding box of black dots as `(min_x, min_y, max_x, max_y)`, inclusive.
    pub fn ink_bounds(&self) -> Option<(usize, usize, usize, usize)> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.pixels[y * self.width + x] {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds
    }

    /// Pack rows MSB-first, 1 = black, each row padded to a whole byte.
    pub fn to_packed(&self) -> Vec<u8> {
        let width_bytes = self.width.div_ceil(8);
        let mut data = vec![0u8; width_bytes * self.height];
        for y in 0..self.height {
            for x in 0..self.width {
                if self.pixels[y * self.width + x] {
                    data[y * width_bytes + x / 8] |= 0x80 >> (x % 8);
                }
            }
        }
        data
    }

    /// Place this raster on a blank canvas `width` dots wide.
    ///
    /// A raster at least as wide as the canvas is cropped on the right.
    pub fn placed(&self, width: usize, align: Alignment, margin: usize) -> TextRaster {
        let x = align_offset(width, self.width, align, margin);
        let mut canvas = TextRaster::new(width, self.height);
        canvas.blit(self, x, 0);
        canvas
    }

    /// Threshold a grayscale image: anything darker than mid-gray prints.
    pub fn from_gray(image: &GrayImage) -> Self {
        let (w, h) = image.dimensions();
        let mut raster = TextRaster::new(w as usize, h as usize);
        for (x, y, Luma([v])) in image.enumerate_pixels() {
            if *v < 128 {
                raster.set(x as usize, y as usize, true);
            }
        }
        raster
    }

    /// Grayscale view, black dots as 0, for PNG previews.
    pub fn to_gray(&self) -> GrayImage {
        let mut img = GrayImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for x in 0..self.width {
                let v = if self.get(x, y) { 0u8 } else { 255u8 };
                img.put_pixel(x as u32, y as u32, Luma([v]));
            }
        }
        img
    }

    /// Render a QR code, `cell_size` dots per module, with a quiet zone of
    /// two modules on every side.
    pub fn from_qr(payload: &str, cell_size: usize) -> Result<Self, PrinterError> {
        Ok(draw_qr(&encode_qr(payload)?, cell_size.max(1)))
    }

    /// Render a QR code no wider than `max_width`, using the largest cell
    /// size up to `max_cell`.
    ///
    /// Fails when the code does not fit even at one dot per module.
    pub fn qr_fitting(payload: &str, max_width: usize, max_cell: usize) -> Result<Self, PrinterError> {
        let code = encode_qr(payload)?;
        let span = code.width() + 2 * QR_QUIET_MODULES;
        let cell = (max_width / span).min(max_cell);
        if cell == 0 {
            return Err(PrinterError::Image(format!(
                "QR code needs {} dots, head is {}",
                span, max_width
            )));
        }
        Ok(draw_qr(&code, cell))
    }
}

/// Quiet-zone width in modules on each side of a QR code.
const QR_QUIET_MODULES: usize = 2;

fn encode_qr(payload: &str) -> Result<QrCode, PrinterError> {
    QrCode::with_error_correction_level(payload, EcLevel::M)
        .map_err(|e| PrinterError::Image(format!("QR code generation failed: {}", e)))
}

fn draw_qr(code: &QrCode, cell_size: usize) -> TextRaster {
    let quiet = QR_QUIET_MODULES * cell_size;
    let modules = code.width();
    let side = modules * cell_size + 2 * quiet;
    let mut raster = TextRaster::new(side, side);

    for qy in 0..modules {
        for qx in 0..modules {
            if code[(qx, qy)] == qrcode::Color::Dark {
                raster.fill_rect(
                    quiet + qx * cell_size,
                    quiet + qy * cell_size,
                    cell_size,
                    cell_size,
                );
            }
        }
    }
    raster
}

// ============================================================================
// TEXT RENDERING
// ============================================================================

/// Canvas geometry for rasterized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterLayout {
    /// Printable width of the head in dots
    pub head_width: usize,
    /// Horizontal margin for LEFT/RIGHT placement
    pub margin: usize,
    pub padding_top: usize,
    pub padding_bottom: usize,
    /// Minimum space between neighbouring columns
    pub column_gap: usize,
}

impl RasterLayout {
    /// Width available to a line: `head_width − 2 × margin`.
    pub fn usable_width(&self) -> usize {
        self.head_width.saturating_sub(2 * self.margin)
    }

    /// Left edge of a line `line_width` dots wide.
    pub fn line_offset(&self, line_width: usize, align: Alignment) -> usize {
        align_offset(self.head_width, line_width, align, self.margin)
    }
}

fn align_offset(canvas: usize, content: usize, align: Alignment, margin: usize) -> usize {
    match align {
        Alignment::Left => margin,
        Alignment::Center => canvas.saturating_sub(content) / 2,
        Alignment::Right => canvas.saturating_sub(content + margin),
    }
}

/// Word-wrap `text` to the usable width and draw it.
///
/// Returns `None` when the text is empty after trimming one trailing line
/// terminator; the caller emits nothing in that case.
pub fn render_paragraph<F>(
    text: &str,
    align: Alignment,
    spec: FontSpec,
    layout: &RasterLayout,
    font: &F,
) -> Option<TextRaster>
where
    F: GlyphRenderer + ?Sized,
{
    let text = trim_terminator(text);
    if text.is_empty() {
        return None;
    }

    let lines = wrap_pixels(text, font, spec, layout.usable_width());
    let line_height = font.line_height(spec);
    let height = layout.padding_top + line_height * lines.len() + layout.padding_bottom;
    let mut raster = TextRaster::new(layout.head_width, height);

    let mut baseline = layout.padding_top + font.ascent(spec);
    for line in &lines {
        let x = layout.line_offset(font.measure(line, spec), align);
        font.draw(&mut raster, x, baseline, line, spec);
        baseline += line_height;
    }

    Some(raster)
}

/// One cell of a multi-column line.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub text: &'a str,
    pub spec: FontSpec,
}

impl<'a> Cell<'a> {
    pub fn new(text: &'a str, spec: FontSpec) -> Self {
        Self { text, spec }
    }
}

/// Draw two strings into one shared-width raster.
///
/// The right text is anchored at `head_width − width − margin` on the first
/// line. When the left text would run into it, the left text is wrapped into
/// the space that remains and continues on further lines.
pub fn render_two_columns<F>(
    left: Cell<'_>,
    right: Cell<'_>,
    layout: &RasterLayout,
    font: &F,
) -> Option<TextRaster>
where
    F: GlyphRenderer + ?Sized,
{
    let left_text = trim_terminator(left.text);
    let right_text = trim_terminator(right.text);
    if left_text.is_empty() && right_text.is_empty() {
        return None;
    }

    let right_width = font.measure(right_text, right.spec);
    let left_room = layout
        .usable_width()
        .saturating_sub(right_width + layout.column_gap)
        .max(1);
    let left_lines = if left_text.is_empty() {
        Vec::new()
    } else {
        wrap_pixels(left_text, font, left.spec, left_room)
    };

    let ascent = font.ascent(left.spec).max(font.ascent(right.spec));
    let baseline = layout.padding_top + ascent;
    let left_lh = font.line_height(left.spec);
    let left_bottom = match left_lines.len() {
        0 => baseline,
        n => baseline + (n - 1) * left_lh + left_lh - font.ascent(left.spec),
    };
    let right_bottom = baseline + font.line_height(right.spec) - font.ascent(right.spec);
    let height = left_bottom.max(right_bottom) + layout.padding_bottom;

    let mut raster = TextRaster::new(layout.head_width, height);
    for (i, line) in left_lines.iter().enumerate() {
        font.draw(&mut raster, layout.margin, baseline + i * left_lh, line, left.spec);
    }
    if !right_text.is_empty() {
        let x = layout.line_offset(right_width, Alignment::Right);
        font.draw(&mut raster, x, baseline, right_text, right.spec);
    }

    Some(raster)
}

/// Draw three strings on one line: left at the margin, middle centered,
/// right anchored to the right margin. No wrapping.
pub fn render_three_columns<F>(
    left: Cell<'_>,
    middle: Cell<'_>,
    right: Cell<'_>,
    layout: &RasterLayout,
    font: &F,
) -> Option<TextRaster>
where
    F: GlyphRenderer + ?Sized,
{
    let cells = [
        (trim_terminator(left.text), left.spec, Alignment::Left),
        (trim_terminator(middle.text), middle.spec, Alignment::Center),
        (trim_terminator(right.text), right.spec, Alignment::Right),
    ];
    if cells.iter().all(|(text, _, _)| text.is_empty()) {
        return None;
    }

    let ascent = cells
        .iter()
        .map(|(_, spec, _)| font.ascent(*spec))
        .max()
        .unwrap_or(0);
    let baseline = layout.padding_top + ascent;
    let bottom = cells
        .iter()
        .map(|(_, spec, _)| baseline + font.line_height(*spec) - font.ascent(*spec))
        .max()
        .unwrap_or(baseline);

    let mut raster = TextRaster::new(layout.head_width, bottom + layout.padding_bottom);
    for (text, spec, align) in cells {
        if text.is_empty() {
            continue;
        }
        let x = layout.line_offset(font.measure(text, spec), align);
        font.draw(&mut raster, x, baseline, text, spec);
    }

    Some(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font::BlockFont;

    const LAYOUT: RasterLayout = RasterLayout {
        head_width: 200,
        margin: 4,
        padding_top: 2,
        padding_bottom: 2,
        column_gap: 10,
    };

    fn font() -> BlockFont {
        BlockFont::new(10, 20, 16)
    }

    #[test]
    fn test_packing_msb_first() {
        let mut raster = TextRaster::new(10, 2);
        raster.set(0, 0, true);
        raster.set(9, 1, true);
        assert_eq!(raster.to_packed(), vec![0x80, 0x00, 0x00, 0x40]);
    }

    #[test]
    fn test_empty_paragraph_is_none() {
        let spec = FontSpec::default();
        assert!(render_paragraph("", Alignment::Left, spec, &LAYOUT, &font()).is_none());
        assert!(render_paragraph("\n", Alignment::Left, spec, &LAYOUT, &font()).is_none());
    }

    #[test]
    fn test_paragraph_height() {
        let spec = FontSpec::default();
        // 30 chars = 300px > 192 usable → two lines
        let text = "aaaa bbbb cccc dddd eeee ffff";
        let raster = render_paragraph(text, Alignment::Left, spec, &LAYOUT, &font()).unwrap();
        assert_eq!(raster.width(), 200);
        assert_eq!(raster.height(), 2 + 2 * 20 + 2);
    }

    #[test]
    fn test_alignment_offsets() {
        let spec = FontSpec::default();
        let f = font();

        let left = render_paragraph("abc", Alignment::Left, spec, &LAYOUT, &f).unwrap();
        assert_eq!(left.ink_bounds().unwrap().0, 4);

        let center = render_paragraph("abc", Alignment::Center, spec, &LAYOUT, &f).unwrap();
        assert_eq!(center.ink_bounds().unwrap().0, (200 - 30) / 2);

        let right = render_paragraph("abc", Alignment::Right, spec, &LAYOUT, &f).unwrap();
        let (_, _, max_x, _) = right.ink_bounds().unwrap();
        assert_eq!(max_x + 1, 200 - 4);
    }

    #[test]
    fn test_first_baseline_uses_ascent() {
        let raster =
            render_paragraph("x", Alignment::Left, FontSpec::default(), &LAYOUT, &font()).unwrap();
        let (_, min_y, _, max_y) = raster.ink_bounds().unwrap();
        // Block glyph spans [baseline - ascent, baseline)
        assert_eq!(min_y, 2);
        assert_eq!(max_y, 2 + 16 - 1);
    }

    #[test]
    fn test_overlong_word_placed_unmodified() {
        let word = "x".repeat(30);
        let raster =
            render_paragraph(&word, Alignment::Center, FontSpec::default(), &LAYOUT, &font())
                .unwrap();
        // One line, starting at 0, clipped at the canvas edge
        assert_eq!(raster.height(), 2 + 20 + 2);
        assert_eq!(raster.ink_bounds().unwrap().0, 0);
    }

    #[test]
    fn test_two_columns_share_one_line() {
        let spec = FontSpec::default();
        let raster = render_two_columns(
            Cell::new("Total", spec),
            Cell::new("150000", spec),
            &LAYOUT,
            &font(),
        )
        .unwrap();
        assert_eq!(raster.height(), 2 + 20 + 2);
        // Right text ends at the right margin
        assert!(raster.get(200 - 4 - 1, 10));
        assert!(!raster.get(200 - 4, 10));
        // Left text starts at the margin
        assert!(raster.get(4, 10));
    }

    #[test]
    fn test_two_columns_wrap_left_into_remaining_space() {
        let spec = FontSpec::default();
        let raster = render_two_columns(
            Cell::new("aaaa bbbb cccc dddd", spec),
            Cell::new("1234567", spec),
            &LAYOUT,
            &font(),
        )
        .unwrap();
        // 192 - 70 - 10 = 112px for the left column → 2 lines
        assert_eq!(raster.height(), 2 + 2 * 20 + 2);
    }

    #[test]
    fn test_three_columns() {
        let spec = FontSpec::default();
        let raster = render_three_columns(
            Cell::new("L", spec),
            Cell::new("M", spec),
            Cell::new("R", spec),
            &LAYOUT,
            &font(),
        )
        .unwrap();
        assert!(raster.get(4, 10));
        assert!(raster.get(95, 10));
        assert!(raster.get(195, 10));
    }

    #[test]
    fn test_placed_right() {
        let mut small = TextRaster::new(8, 1);
        small.fill_rect(0, 0, 8, 1);
        let placed = small.placed(32, Alignment::Right, 0);
        assert_eq!(placed.width(), 32);
        assert_eq!(placed.to_packed(), vec![0, 0, 0, 0xFF]);
    }

    #[test]
    fn test_qr_raster_is_square() {
        let qr = TextRaster::from_qr("00020101021238570010A000000727", 4).unwrap();
        assert_eq!(qr.width(), qr.height());
        assert!(qr.count_black() > 0);
        // Quiet zone stays white
        assert!(!qr.get(0, 0));
    }

    #[test]
    fn test_qr_fitting_shrinks_cells_to_head() {
        let payload = "X".repeat(900);
        assert!(TextRaster::from_qr(&payload, 6).unwrap().width() > 576);

        let qr = TextRaster::qr_fitting(&payload, 576, 6).unwrap();
        assert!(qr.width() <= 576);
        assert!(qr.width() >= 576 / 2, "cells shrank more than needed");
    }

    #[test]
    fn test_qr_fitting_keeps_max_cell_when_it_fits() {
        let payload = "00020101021238570010A000000727";
        let qr = TextRaster::qr_fitting(payload, 576, 6).unwrap();
        assert_eq!(qr, TextRaster::from_qr(payload, 6).unwrap());
    }

    #[test]
    fn test_qr_fitting_rejects_code_wider_than_head() {
        let err = TextRaster::qr_fitting(&"X".repeat(900), 50, 6).unwrap_err();
        assert!(matches!(err, PrinterError::Image(_)));
    }

    #[test]
    fn test_gray_round_trip() {
        let mut raster = TextRaster::new(3, 2);
        raster.set(1, 1, true);
        assert_eq!(TextRaster::from_gray(&raster.to_gray()), raster);
    }
}
