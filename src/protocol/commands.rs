//! # ESC/POS Control Commands
//!
//! Basic commands shared by the character-oriented printer families
//! (Woosim WSP-i350 and Honeywell 0188/MPD31D). Both controllers accept the
//! ESC/POS subset used here.
//!
//! ## Escape Sequence Structure
//!
//! - Single byte: `LF`, `HT`
//! - Two bytes: `ESC @`
//! - Multi-byte with parameters: `ESC d n`, `ESC D n1...nk NUL`
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix (sizes, raster images)
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - Print the line buffer and advance one line
pub const LF: u8 = 0x0A;

/// HT (Horizontal Tab) - Advance to the next tab stop set by `ESC D`
pub const HT: u8 = 0x09;

/// NUL - Terminates the tab-stop list
pub const NUL: u8 = 0x00;

/// Most tab stops `ESC D` accepts
pub const MAX_TAB_STOPS: usize = 32;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Clears the line buffer and resets text attributes, alignment and tab
/// stops to power-on defaults. Sent once at the start of every job.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC @ |
/// | Hex    | 1B 40 |
///
/// ## Example
///
/// ```
/// use printer_drivers::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

// ============================================================================
// PAPER FEED
// ============================================================================

/// # Print and Feed n Lines (ESC d n)
///
/// Prints the line buffer and feeds `n` lines at the current line spacing.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC d n |
/// | Hex    | 1B 64 n |
///
/// ## Example
///
/// ```
/// use printer_drivers::protocol::commands;
///
/// assert_eq!(commands::feed_lines(3), vec![0x1B, 0x64, 3]);
/// ```
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

/// `n` literal line feeds, for controllers without a counted feed.
#[inline]
pub fn line_feeds(n: u8) -> Vec<u8> {
    vec![LF; n as usize]
}

// ============================================================================
// TAB STOPS
// ============================================================================

/// # Set Horizontal Tab Positions (ESC D n1...nk NUL)
///
/// Each `n` is a column (in characters) counted from the left margin.
/// Positions must be strictly ascending; anything that is not ascending
/// is dropped so the printer never sees a malformed list. At most
/// [`MAX_TAB_STOPS`] positions are sent.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC D n1 ... nk NUL |
/// | Hex    | 1B 44 n1 ... nk 00 |
///
/// ## Example
///
/// ```
/// use printer_drivers::protocol::commands;
///
/// assert_eq!(commands::set_tabs(&[10, 20]), vec![0x1B, 0x44, 10, 20, 0x00]);
/// assert_eq!(commands::set_tabs(&[20, 10]), vec![0x1B, 0x44, 20, 0x00]);
/// ```
pub fn set_tabs(positions: &[u8]) -> Vec<u8> {
    let mut cmd = vec![ESC, b'D'];
    let mut last = 0u8;
    for &pos in positions.iter().take(MAX_TAB_STOPS) {
        if pos == 0 || pos <= last {
            continue;
        }
        cmd.push(pos);
        last = pos;
    }
    cmd.push(NUL);
    cmd
}

/// Clear all tab stops (`ESC D NUL`).
#[inline]
pub fn clear_tabs() -> Vec<u8> {
    vec![ESC, b'D', NUL]
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ```
/// use printer_drivers::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// assert_eq!(u16_le(576), [0x40, 0x02]);
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

// ============================================================================
// TESTS
// ============================================================================
