//! # Raster Graphics Commands
//!
//! Image commands for the three printer families.
//!
//! ## Bit Packing
//!
//! Graphics data is packed as bytes where each bit represents one dot:
//! - Bit 7 (MSB) = leftmost dot
//! - Bit 0 (LSB) = rightmost dot
//! - 1 = black (print), 0 = white (no print)
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0x0F = 00001111 = ░░░░████
//! ```
//!
//! ## Commands
//!
//! | Family | Command | Notes |
//! |--------|---------|-------|
//! | ESC/POS (Woosim, 0188) | GS v 0 | Whole image in one block |
//! | Line Printer (PR3) | ESC V | One block per band of rows |

use super::commands::{ESC, GS, u16_le};

/// Rows per `ESC V` block for the line-printer family.
pub const LP_BAND_ROWS: usize = 256;

/// # Print Raster Bit Image (GS v 0 m xL xH yL yH d1...dk)
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | GS v 0 m xL xH yL yH d1...dk |
/// | Hex    | 1D 76 30 m xL xH yL yH d1...dk |
///
/// ## Parameters
///
/// - `m`: Always 0 (normal density)
/// - `xL xH`: Width in **bytes**
/// - `yL yH`: Height in rows
/// - `d`: `width_bytes × height` bytes, row-major, MSB left
///
/// ## Example
///
/// ```
/// use printer_drivers::protocol::graphics;
///
/// let data = vec![0xFF; 2 * 3];
/// let cmd = graphics::raster(16, 3, &data);
/// assert_eq!(&cmd[..8], &[0x1D, 0x76, 0x30, 0x00, 2, 0, 3, 0]);
/// assert_eq!(cmd.len(), 8 + 6);
/// ```
pub fn raster(width_dots: u16, height: u16, data: &[u8]) -> Vec<u8> {
    let width_bytes = width_dots.div_ceil(8);

    debug_assert!(
        data.len() == width_bytes as usize * height as usize,
        "Raster data length mismatch. Expected {} ({} bytes × {} rows), got {}",
        width_bytes as usize * height as usize,
        width_bytes,
        height,
        data.len()
    );

    let [xl, xh] = u16_le(width_bytes);
    let [yl, yh] = u16_le(height);

    let mut cmd = Vec::with_capacity(8 + data.len());
    cmd.extend_from_slice(&[GS, b'v', b'0', 0, xl, xh, yl, yh]);
    cmd.extend_from_slice(data);
    cmd
}

/// # Line Printer Graphic Band (ESC V yL yH xB d1...dk)
///
/// Honeywell Line Printer mode graphic. Taller images are split into
/// blocks of at most [`LP_BAND_ROWS`] rows, each with its own header, so the
/// printer's receive buffer never has to hold the whole image.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC V yL yH xB d1...dk |
/// | Hex    | 1B 56 yL yH xB d1...dk |
///
/// - `yL yH`: rows in this block
/// - `xB`: width in bytes (72 for a 576-dot head)
///
/// ```
/// use printer_drivers::protocol::graphics;
///
/// let data = vec![0u8; 72 * 300];
/// let cmd = graphics::lp_image(576, 300, &data);
/// // Two blocks: 256 rows, then 44 rows
/// assert_eq!(&cmd[..5], &[0x1B, 0x56, 0x00, 0x01, 72]);
/// assert_eq!(cmd.len(), 2 * 5 + data.len());
/// ```
pub fn lp_image(width_dots: u16, height: u16, data: &[u8]) -> Vec<u8> {
    let width_bytes = width_dots.div_ceil(8) as usize;
    let height = height as usize;
    let blocks = height.div_ceil(LP_BAND_ROWS);

    let mut cmd = Vec::with_capacity(blocks * 5 + data.len());
    for start in (0..height).step_by(LP_BAND_ROWS) {
        let rows = (height - start).min(LP_BAND_ROWS);
        let [yl, yh] = u16_le(rows as u16);
        cmd.extend_from_slice(&[ESC, b'V', yl, yh, width_bytes as u8]);
        let from = start * width_bytes;
        let to = (from + rows * width_bytes).min(data.len());
        cmd.extend_from_slice(&data[from.min(to)..to]);
    }
    cmd
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_header() {
        let data = vec![0xAA; 72 * 10];
        let cmd = raster(576, 10, &data);
        assert_eq!(&cmd[0..3], &[0x1D, 0x76, 0x30]);
        assert_eq!(cmd[4], 72);
        assert_eq!(cmd[5], 0);
        assert_eq!(cmd[6], 10);
        assert_eq!(cmd.len(), 8 + data.len());
    }

    #[test]
    fn test_raster_odd_width_rounds_up() {
        let data = vec![0u8; 2 * 4];
        let cmd = raster(9, 4, &data);
        assert_eq!(cmd[4], 2);
    }

    #[test]
    fn test_lp_image_single_block() {
        let data = vec![0xFF; 72 * 20];
        let cmd = lp_image(576, 20, &data);
        assert_eq!(&cmd[..5], &[ESC, b'V', 20, 0, 72]);
        assert_eq!(&cmd[5..], &data[..]);
    }

    #[test]
    fn test_lp_image_splits_bands() {
        let height = LP_BAND_ROWS * 2 + 1;
        let data = vec![0x0F; 72 * height];
        let cmd = lp_image(576, height as u16, &data);
        let headers = cmd
            .windows(2)
            .filter(|w| *w == [ESC, b'V'])
            .count();
        assert_eq!(headers, 3);
        assert_eq!(cmd.len(), 3 * 5 + data.len());
    }
}
