//! # ESC/POS Text Styling Commands
//!
//! Inline attribute bytes for the character-oriented families.
//!
//! | Style | Command | Effect |
//! |-------|---------|--------|
//! | Alignment | ESC a n | Left / center / right |
//! | Bold | ESC E n | Emphasized text |
//! | Size | GS ! n | Width/height multipliers |
//!
//! ## Text Alignment
//!
//! ```text
//! Left aligned (default)    |LEFT TEXT
//! Center aligned            |  CENTER TEXT
//! Right aligned             |      RIGHT TEXT
//! ```

use serde::{Deserialize, Serialize};

use super::commands::{ESC, GS};

// ============================================================================
// TEXT ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// # Select Justification (ESC a n)
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC a n |
/// | Hex    | 1B 61 n |
///
/// Takes effect at the start of the next line and stays until changed
/// or until `ESC @`.
///
/// ```
/// use printer_drivers::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// EMPHASIS
// ============================================================================

/// # Turn Emphasized Mode On/Off (ESC E n)
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC E n |
/// | Hex    | 1B 45 n |
#[inline]
pub fn bold(enabled: bool) -> Vec<u8> {
    vec![ESC, b'E', enabled as u8]
}

// ============================================================================
// CHARACTER SIZE
// ============================================================================

/// # Select Character Size (GS ! n)
///
/// High nibble is the width multiplier minus one, low nibble the height
/// multiplier minus one. Multipliers are clamped to 1..=8.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | GS ! n |
/// | Hex    | 1D 21 n |
///
/// ```
/// use printer_drivers::protocol::text::size;
///
/// assert_eq!(size(2, 2), vec![0x1D, 0x21, 0x11]);
/// assert_eq!(size(1, 1), vec![0x1D, 0x21, 0x00]);
/// ```
pub fn size(width_mult: u8, height_mult: u8) -> Vec<u8> {
    let w = width_mult.clamp(1, 8) - 1;
    let h = height_mult.clamp(1, 8) - 1;
    vec![GS, b'!', (w << 4) | h]
}

/// Double width and height, or back to normal.
#[inline]
pub fn double_size(enabled: bool) -> Vec<u8> {
    if enabled { size(2, 2) } else { size(1, 1) }
}

/// Bytes that set alignment, emphasis and size in one go.
pub fn style(alignment: Alignment, bold_on: bool, double: bool) -> Vec<u8> {
    let mut cmds = align(alignment);
    cmds.extend(bold(bold_on));
    cmds.extend(double_size(double));
    cmds
}

/// Back to left aligned, regular weight, normal size.
pub fn reset() -> Vec<u8> {
    style(Alignment::Left, false, false)
}

// ============================================================================
// TESTS
// ============================================================================
