//! # Direct Text Driver (Woosim WSP-i350)
//!
//! Text goes out as UTF-8 with inline ESC/POS attribute bytes. Columns use
//! the printer's own tab stops:
//!
//! ```text
//! ESC D <stop> NUL   left-text   HT   right-text   LF   ESC D NUL
//! ```
//!
//! The WSP-i350 clips the last glyph of a right-aligned line, so every
//! right-aligned line carries one trailing space.

use tracing::debug;

use super::{AlignedText, Driver, columns, raster_image, styled};
use crate::buffer::CommandBuffer;
use crate::error::PrinterError;
use crate::layout::{TextRaster, trim_terminator, wrap_chars};
use crate::printer::{PrinterFamily, PrinterProfile};
use crate::protocol::commands::{self, HT, LF};
use crate::protocol::text::{self, Alignment};

pub struct DirectTextDriver {
    profile: PrinterProfile,
    buffer: CommandBuffer,
}

impl DirectTextDriver {
    pub fn new(profile: PrinterProfile, capacity: usize) -> Self {
        Self {
            profile,
            buffer: CommandBuffer::with_capacity(capacity),
        }
    }

    /// Characters per line at the requested size.
    fn line_width(&self, double_size: bool) -> usize {
        let width = self.profile.page_width_chars;
        let width = if double_size { width / 2 } else { width };
        width.max(1)
    }

    /// One line of cells separated by `HT`, with a stop per cell after the first.
    fn emit_tabbed_line(&mut self, cells: &[(&str, &AlignedText, usize)]) -> Result<(), PrinterError> {
        let stops: Vec<u8> = cells
            .iter()
            .skip(1)
            .filter_map(|(_, _, stop)| u8::try_from(*stop).ok())
            .collect();

        let mut out = commands::set_tabs(&stops);
        for (i, (content, cell, _)) in cells.iter().enumerate() {
            if i > 0 {
                out.push(HT);
            }
            out.extend(styled(content, cell.bold, cell.double_size));
        }
        out.push(LF);
        out.extend(commands::clear_tabs());
        self.buffer.append(&out)
    }

    /// Fallback when cells collide: each cell on its own line, aligned to
    /// the position its column would have had.
    fn emit_stacked(&mut self, cells: &[(&str, &AlignedText, Alignment)]) -> Result<(), PrinterError> {
        for (content, cell, align) in cells {
            if content.is_empty() {
                continue;
            }
            let aligned = AlignedText {
                text: content.to_string(),
                align: *align,
                bold: cell.bold,
                double_size: cell.double_size,
            };
            self.emit_aligned_text(&aligned)?;
        }
        Ok(())
    }
}

impl Driver for DirectTextDriver {
    fn family(&self) -> PrinterFamily {
        PrinterFamily::WoosimWspI350
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

    fn init_printer(&mut self) -> Result<(), PrinterError> {
        self.buffer.append(&commands::init())
    }

    fn emit_aligned_text(&mut self, t: &AlignedText) -> Result<(), PrinterError> {
        let content = trim_terminator(&t.text);
        if content.is_empty() {
            return Ok(());
        }

        let right = t.align == Alignment::Right;
        let mut width = self.line_width(t.double_size);
        if right {
            width = width.saturating_sub(1).max(1);
        }

        let mut out = text::style(t.align, t.bold, t.double_size);
        for line in wrap_chars(content, width) {
            out.extend_from_slice(line.as_bytes());
            if right {
                out.push(b' ');
            }
            out.push(LF);
        }
        out.extend(text::reset());
        self.buffer.append(&out)
    }

    fn emit_two_column_text(
        &mut self,
        left: &AlignedText,
        right: &AlignedText,
    ) -> Result<(), PrinterError> {
        let l = trim_terminator(&left.text);
        let r = trim_terminator(&right.text);
        if l.is_empty() && r.is_empty() {
            return Ok(());
        }

        let page = self.profile.page_width_chars;
        let lw = columns(l, left.double_size);
        let rw = columns(r, right.double_size);

        if lw + 1 + rw <= page {
            let stop = page - rw;
            self.emit_tabbed_line(&[(l, left, 0), (r, right, stop)])
        } else {
            debug!(left = lw, right = rw, page, "two-column line does not fit, stacking");
            self.emit_stacked(&[(l, left, Alignment::Left), (r, right, Alignment::Right)])
        }
    }

    fn emit_three_column_text(
        &mut self,
        left: &AlignedText,
        middle: &AlignedText,
        right: &AlignedText,
    ) -> Result<(), PrinterError> {
        let l = trim_terminator(&left.text);
        let m = trim_terminator(&middle.text);
        let r = trim_terminator(&right.text);
        if l.is_empty() && m.is_empty() && r.is_empty() {
            return Ok(());
        }

        let page = self.profile.page_width_chars;
        let lw = columns(l, left.double_size);
        let mw = columns(m, middle.double_size);
        let rw = columns(r, right.double_size);

        let middle_stop = page.saturating_sub(mw) / 2;
        let right_stop = page.saturating_sub(rw);
        let fits = lw < middle_stop && middle_stop + mw < right_stop && rw < page;

        if fits {
            self.emit_tabbed_line(&[(l, left, 0), (m, middle, middle_stop), (r, right, right_stop)])
        } else {
            debug!(left = lw, middle = mw, right = rw, page, "three-column line does not fit, stacking");
            self.emit_stacked(&[
                (l, left, Alignment::Left),
                (m, middle, Alignment::Center),
                (r, right, Alignment::Right),
            ])
        }
    }

    fn emit_image(&mut self, raster: &TextRaster, align: Alignment) -> Result<(), PrinterError> {
        let out = raster_image(raster, align, self.profile.head_width_dots as usize)?;
        self.buffer.append(&out)
    }

    fn emit_line_feeds(&mut self, n: u8) -> Result<(), PrinterError> {
        self.buffer.append(&commands::feed_lines(n))
    }

    fn emit_separator_line(&mut self) -> Result<(), PrinterError> {
        let mut out = text::align(Alignment::Left);
        out.extend(std::iter::repeat_n(b'-', self.profile.separator_len));
        out.push(LF);
        self.buffer.append(&out)
    }
}

/// Render a tabbed line as it would look on paper. Used in tests.
#[cfg(test)]
fn render_tabs(bytes: &[u8]) -> String {
    let mut stops = Vec::new();
    let mut line = String::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            0x1B if bytes.get(i + 1) == Some(&b'D') => {
                i += 2;
                while i < bytes.len() && bytes[i] != 0 {
                    stops.push(bytes[i] as usize);
                    i += 1;
                }
                i += 1;
            }
            0x1B | 0x1D => i += 3,
            HT => {
                let col = line.chars().count();
                if let Some(stop) = stops.iter().find(|s| **s > col) {
                    line.push_str(&" ".repeat(stop - col));
                }
                i += 1;
            }
            LF => break,
            _ => {
                let start = i;
                while i < bytes.len() && !matches!(bytes[i], 0x1B | 0x1D | HT | LF) {
                    i += 1;
                }
                line.push_str(&String::from_utf8_lossy(&bytes[start..i]));
            }
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> DirectTextDriver {
        DirectTextDriver::new(PrinterProfile::WOOSIM_WSP_I350, 4096)
    }

    #[test]
    fn test_init_is_esc_at() {
        let mut d = driver();
        d.init_printer().unwrap();
        assert_eq!(d.flush(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_empty_text_emits_nothing() {
        let mut d = driver();
        d.emit_aligned_text(&AlignedText::new("")).unwrap();
        d.emit_aligned_text(&AlignedText::new("\n").center()).unwrap();
        assert!(d.buffer().is_empty());
    }

    #[test]
    fn test_right_aligned_text_gets_trailing_space() {
        let mut d = driver();
        d.emit_aligned_text(&AlignedText::new("150000 VND").right()).unwrap();
        let bytes = d.flush();
        let needle = b"150000 VND \n";
        assert!(bytes.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_long_text_wraps_to_page_width() {
        let mut d = driver();
        let text = "Công ty cổ phần cấp nước Thủ Đức xin trân trọng thông báo";
        d.emit_aligned_text(&AlignedText::new(text)).unwrap();
        let bytes = d.flush();
        let body = String::from_utf8_lossy(&bytes[9..bytes.len() - 9]).to_string();
        for line in body.lines() {
            assert!(line.chars().count() <= 35, "line too long: {:?}", line);
        }
        assert!(body.lines().count() >= 2);
    }

    #[test]
    fn test_two_columns_use_tab_stop() {
        let mut d = driver();
        let left = AlignedText::new("Tiền nước:");
        let right = AlignedText::new("150000 VND");
        d.emit_two_column_text(&left, &right).unwrap();
        let bytes = d.flush();

        // ESC D 25 NUL
        assert_eq!(&bytes[..4], &[0x1B, b'D', 25, 0x00]);
        let line = render_tabs(&bytes);
        assert_eq!(line.chars().count(), 35);
        assert!(line.starts_with("Tiền nước:"));
        assert!(line.ends_with("150000 VND"));
        assert!(bytes.ends_with(&[LF, 0x1B, b'D', 0x00]));
    }

    #[test]
    fn test_two_columns_stack_when_too_wide() {
        let mut d = driver();
        let left = AlignedText::new("Địa chỉ: 123 Đường Võ Văn Ngân, Phường Linh Chiểu");
        let right = AlignedText::new("150000 VND");
        d.emit_two_column_text(&left, &right).unwrap();
        let bytes = d.flush();
        assert!(!bytes.contains(&HT));
        let needle = b"150000 VND \n";
        assert!(bytes.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_three_columns_place_middle_centered() {
        let mut d = driver();
        d.emit_three_column_text(
            &AlignedText::new("Cũ"),
            &AlignedText::new("Mới"),
            &AlignedText::new("12"),
        )
        .unwrap();
        let line = render_tabs(&d.flush());
        assert_eq!(line.chars().count(), 35);
        assert_eq!(line.find("Mới").map(|b| line[..b].chars().count()), Some(16));
        assert!(line.ends_with("12"));
    }

    #[test]
    fn test_separator_is_35_dashes() {
        let mut d = driver();
        d.emit_separator_line().unwrap();
        let bytes = d.flush();
        assert_eq!(bytes.iter().filter(|b| **b == b'-').count(), 35);
        assert_eq!(bytes.last(), Some(&LF));
    }

    #[test]
    fn test_line_feeds_use_esc_d() {
        let mut d = driver();
        d.emit_line_feeds(3).unwrap();
        assert_eq!(d.flush(), vec![0x1B, b'd', 3]);
    }

    #[test]
    fn test_image_uses_gs_v_0() {
        let mut d = driver();
        let mut r = TextRaster::new(16, 2);
        r.set(0, 0, true);
        d.emit_image(&r, Alignment::Center).unwrap();
        let bytes = d.flush();
        assert_eq!(&bytes[..3], &[0x1B, 0x61, 1]);
        assert_eq!(&bytes[3..7], &[0x1D, b'v', b'0', 0]);
    }

    #[test]
    fn test_overflow_reported_not_truncated() {
        let mut d = DirectTextDriver::new(PrinterProfile::WOOSIM_WSP_I350, 8);
        let err = d.emit_separator_line().unwrap_err();
        assert!(matches!(err, PrinterError::BufferOverflow { .. }));
        assert!(d.buffer().is_empty());
    }
}
