//! # Printer Profiles
//!
//! Hardware characteristics of the supported printer families.
//!
//! | Model | Protocol | Page width | Separator | Head width | Job buffer |
//! |-------|----------|------------|-----------|------------|------------|
//! | Woosim WSP-i350 | ESC/POS, tab columns | 35 chars | 35 | 576 dots | 50 KiB |
//! | Honeywell 0188 (MPD31D) | ESC/POS, padded columns | 48 chars | 48 | 576 dots | 50 KiB |
//! | Honeywell PR3 | Line Printer raster | 53 chars | 72 | 576 dots | 128 KiB |
//!
//! The PR3 sends every line as an uncompressed 72-byte-per-row bitmap, so a
//! full receipt with a payment QR needs well over the 50 KiB that suffices
//! for the text families.
//!
//! ## Usage
//!
//! ```
//! use printer_drivers::printer::PrinterProfile;
//!
//! let profile = PrinterProfile::HONEYWELL_PR3;
//! assert_eq!(profile.head_width_dots, 576);
//! assert_eq!(profile.raster_layout().usable_width(), 576 - 8);
//! ```

use crate::buffer::DEFAULT_CAPACITY;
use crate::layout::RasterLayout;

/// # Printer Profile
///
/// - **page_width_chars**: characters per line at normal size
/// - **separator_len**: glyphs in a separator rule
/// - **head_width_dots**: printable head width for images
/// - **margin_dots**: horizontal margin for rasterized text
/// - **buffer_capacity**: default command buffer size for one job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterProfile {
    /// Printer model name
    pub name: &'static str,

    pub page_width_chars: usize,

    pub separator_len: usize,

    pub head_width_dots: u16,

    pub margin_dots: u16,

    pub buffer_capacity: usize,
}

impl PrinterProfile {
    /// # Woosim WSP-i350
    ///
    /// 3-inch mobile printer. Characters are wide enough that only 35 fit
    /// on a line at normal size.
    pub const WOOSIM_WSP_I350: Self = Self {
        name: "Woosim WSP-i350",
        page_width_chars: 35,
        separator_len: 35,
        head_width_dots: 576,
        margin_dots: 0,
        buffer_capacity: DEFAULT_CAPACITY,
    };

    /// # Honeywell 0188 (MPD31D)
    ///
    /// ESC/POS-compatible line printer without usable tab stops.
    pub const HONEYWELL_0188: Self = Self {
        name: "Honeywell 0188",
        page_width_chars: 48,
        separator_len: 48,
        head_width_dots: 576,
        margin_dots: 0,
        buffer_capacity: DEFAULT_CAPACITY,
    };

    /// # Honeywell PR3
    ///
    /// Line Printer mode only; all styled text is rasterized at 576 dots.
    ///
    /// ```text
    /// ├ 4 ┼────────── 568 usable ──────────┼ 4 ┤
    /// │   │            576 dots            │   │
    /// ```
    pub const HONEYWELL_PR3: Self = Self {
        name: "Honeywell PR3",
        page_width_chars: 53,
        separator_len: 72,
        head_width_dots: 576,
        margin_dots: 4,
        buffer_capacity: 128 * 1024,
    };

    /// Raster canvas geometry for this head.
    pub fn raster_layout(&self) -> RasterLayout {
        RasterLayout {
            head_width: self.head_width_dots as usize,
            margin: self.margin_dots as usize,
            padding_top: 2,
            padding_bottom: 2,
            column_gap: 16,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
