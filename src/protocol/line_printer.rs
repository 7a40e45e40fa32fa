//! # Honeywell Line Printer Text
//!
//! The PR3 controller runs in Line Printer mode. Text attributes exist only
//! as font selections, so receipts are rasterized instead (see
//! [`crate::driver::raster`]). Plain text is still used for diagnostics
//! such as missing-asset markers.
//!
//! | Command | Bytes | Effect |
//! |---------|-------|--------|
//! | Select font | ESC w f | `!` is the 16-dot default font |
//! | Line end | CR LF | Print and advance |

use super::commands::{ESC, LF};

/// CR - carriage return
pub const CR: u8 = 0x0D;

/// Default resident font for Line Printer mode.
pub const DEFAULT_FONT: u8 = b'!';

/// # Select Font (ESC w f)
///
/// ```
/// use printer_drivers::protocol::line_printer;
///
/// assert_eq!(line_printer::select_font(b'!'), vec![0x1B, 0x77, 0x21]);
/// ```
#[inline]
pub fn select_font(font: u8) -> Vec<u8> {
    vec![ESC, b'w', font]
}

/// One line of plain text in the default font, terminated by CR LF.
pub fn text_line(text: &str) -> Vec<u8> {
    let mut cmd = select_font(DEFAULT_FONT);
    cmd.extend_from_slice(text.as_bytes());
    cmd.extend_from_slice(&[CR, LF]);
    cmd
}
