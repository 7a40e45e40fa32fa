//! Font metrics and glyph rendering for raster text.
//!
//! Measuring and drawing are separate capabilities: the wrap algorithm only
//! needs [`TextMetrics`], so it can be exercised with [`BlockFont`] in tests
//! while real output goes through [`SpleenFont`].

use spleen_font::{FONT_8X16, PSF2Font};

use super::raster::TextRaster;

/// Weight and size of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FontSpec {
    pub bold: bool,
    pub double_size: bool,
}

impl FontSpec {
    pub fn new(bold: bool, double_size: bool) -> Self {
        Self { bold, double_size }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn double(mut self) -> Self {
        self.double_size = true;
        self
    }

    /// Integer scale factor applied to the base cell.
    #[inline]
    pub fn scale(&self) -> usize {
        if self.double_size { 2 } else { 1 }
    }
}

/// Pixel measurements of text in a given font.
pub trait TextMetrics {
    /// Advance width of `text` in pixels.
    fn measure(&self, text: &str, font: FontSpec) -> usize;

    /// Distance between consecutive baselines.
    fn line_height(&self, font: FontSpec) -> usize;

    /// Distance from the top of a line to its baseline.
    fn ascent(&self, font: FontSpec) -> usize;
}

/// Draws text into a raster. Always paired with matching metrics.
pub trait GlyphRenderer: TextMetrics {
    /// Draw `text` with its left edge at `x` and its baseline at `baseline`.
    /// Pixels falling outside the raster are clipped.
    fn draw(&self, raster: &mut TextRaster, x: usize, baseline: usize, text: &str, font: FontSpec);
}

// ============================================================================
// SPLEEN BITMAP FONT
// ============================================================================

const CELL_W: usize = 8;
const CELL_H: usize = 16;
const CELL_ASCENT: usize = 12;
const LINE_GAP: usize = 4;

/// Spleen 8×16 bitmap font, doubled by pixel replication for double size.
///
/// 72 cells span a 576-dot head, matching the separator width the PR3 uses.
/// Bold is synthesized by smearing each lit pixel one dot to the right.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpleenFont;

impl TextMetrics for SpleenFont {
    fn measure(&self, text: &str, font: FontSpec) -> usize {
        text.chars().count() * CELL_W * font.scale()
    }

    fn line_height(&self, font: FontSpec) -> usize {
        (CELL_H + LINE_GAP) * font.scale()
    }

    fn ascent(&self, font: FontSpec) -> usize {
        CELL_ASCENT * font.scale()
    }
}

impl GlyphRenderer for SpleenFont {
    fn draw(&self, raster: &mut TextRaster, x: usize, baseline: usize, text: &str, font: FontSpec) {
        let scale = font.scale();
        let top = baseline.saturating_sub(self.ascent(font));
        let mut spleen = PSF2Font::new(FONT_8X16).ok();

        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }

            let mut cell = [false; CELL_W * CELL_H];
            let mut found = false;

            if let Some(spleen) = spleen.as_mut() {
                for candidate in [ch, fold_diacritics(ch)] {
                    let utf8 = candidate.to_string();
                    if let Some(glyph) = spleen.glyph_for_utf8(utf8.as_bytes()) {
                        for (row_y, row) in glyph.enumerate() {
                            for (col_x, on) in row.enumerate() {
                                if on && row_y < CELL_H && col_x < CELL_W {
                                    cell[row_y * CELL_W + col_x] = true;
                                }
                            }
                        }
                        found = true;
                        break;
                    }
                }
            }

            if !found {
                draw_box(&mut cell);
            }

            let cell_x = x + i * CELL_W * scale;
            for cy in 0..CELL_H {
                for cx in 0..CELL_W {
                    if !cell[cy * CELL_W + cx] {
                        continue;
                    }
                    let px = cell_x + cx * scale;
                    let py = top + cy * scale;
                    let w = if font.bold { scale + 1 } else { scale };
                    raster.fill_rect(px, py, w, scale);
                }
            }
        }
    }
}

/// Box outline for characters missing from the font.
fn draw_box(cell: &mut [bool; CELL_W * CELL_H]) {
    for x in 1..CELL_W - 1 {
        cell[2 * CELL_W + x] = true;
        cell[(CELL_H - 3) * CELL_W + x] = true;
    }
    for y in 2..CELL_H - 2 {
        cell[y * CELL_W + 1] = true;
        cell[y * CELL_W + CELL_W - 2] = true;
    }
}

/// Map a Vietnamese letter to its undecorated base letter.
///
/// Spleen has no glyphs for most precomposed Vietnamese vowels; printing
/// the base letter keeps amounts and names legible instead of boxes.
pub fn fold_diacritics(ch: char) -> char {
    const GROUPS: &[(&str, char)] = &[
        ("àáảãạăằắẳẵặâầấẩẫậ", 'a'),
        ("ÀÁẢÃẠĂẰẮẲẴẶÂẦẤẨẪẬ", 'A'),
        ("èéẻẽẹêềếểễệ", 'e'),
        ("ÈÉẺẼẸÊỀẾỂỄỆ", 'E'),
        ("ìíỉĩị", 'i'),
        ("ÌÍỈĨỊ", 'I'),
        ("òóỏõọôồốổỗộơờớởỡợ", 'o'),
        ("ÒÓỎÕỌÔỒỐỔỖỘƠỜỚỞỠỢ", 'O'),
        ("ùúủũụưừứửữự", 'u'),
        ("ÙÚỦŨỤƯỪỨỬỮỰ", 'U'),
        ("ỳýỷỹỵ", 'y'),
        ("ỲÝỶỸỴ", 'Y'),
        ("đ", 'd'),
        ("Đ", 'D'),
    ];

    GROUPS
        .iter()
        .find(|(group, _)| group.contains(ch))
        .map(|&(_, base)| base)
        .unwrap_or(ch)
}

// ============================================================================
// FIXED-WIDTH BLOCK FONT
// ============================================================================

/// Fixed-advance font that draws each visible character as a solid block.
///
/// Deterministic and independent of any glyph data, which makes layout
/// offsets easy to assert on.
#[derive(Debug, Clone, Copy)]
pub struct BlockFont {
    pub advance: usize,
    pub line_height: usize,
    pub ascent: usize,
}

impl BlockFont {
    pub fn new(advance: usize, line_height: usize, ascent: usize) -> Self {
        Self {
            advance,
            line_height,
            ascent,
        }
    }
}

impl TextMetrics for BlockFont {
    fn measure(&self, text: &str, font: FontSpec) -> usize {
        text.chars().count() * self.advance * font.scale()
    }

    fn line_height(&self, font: FontSpec) -> usize {
        self.line_height * font.scale()
    }

    fn ascent(&self, font: FontSpec) -> usize {
        self.ascent * font.scale()
    }
}

impl GlyphRenderer for BlockFont {
    fn draw(&self, raster: &mut TextRaster, x: usize, baseline: usize, text: &str, font: FontSpec) {
        let advance = self.advance * font.scale();
        let ascent = self.ascent(font);
        let top = baseline.saturating_sub(ascent);
        for (i, ch) in text.chars().enumerate() {
            if !ch.is_whitespace() {
                raster.fill_rect(x + i * advance, top, advance, ascent);
            }
        }
    }
}
