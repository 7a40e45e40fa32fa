//! # Text Layout Engine
//!
//! Word wrapping and text rasterization shared by the drivers.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`wrap`] | Greedy wrap by character count or pixel width |
//! | [`font`] | `TextMetrics` / `GlyphRenderer` capabilities, Spleen and block fonts |
//! | [`raster`] | `TextRaster` plus paragraph and column rendering |
//!
//! Character-oriented drivers only use [`wrap::wrap_chars`]. The raster
//! driver wraps by measured pixel width and draws every paragraph into a
//! head-wide bitmap.
//!
//! ```
//! use printer_drivers::layout::{render_paragraph, FontSpec, RasterLayout, SpleenFont};
//! use printer_drivers::protocol::text::Alignment;
//!
//! let layout = RasterLayout {
//!     head_width: 576,
//!     margin: 4,
//!     padding_top: 2,
//!     padding_bottom: 2,
//!     column_gap: 16,
//! };
//! let raster = render_paragraph("Xin chào", Alignment::Center, FontSpec::default(), &layout, &SpleenFont)
//!     .expect("non-empty text");
//! assert_eq!(raster.width(), 576);
//! ```

pub mod font;
pub mod raster;
pub mod wrap;

pub use font::{BlockFont, FontSpec, GlyphRenderer, SpleenFont, TextMetrics};
pub use raster::{
    Cell, RasterLayout, TextRaster, render_paragraph, render_three_columns, render_two_columns,
};
pub use wrap::{trim_terminator, wrap_chars, wrap_pixels, wrap_with};
