//! # Line-Padded Driver (Honeywell 0188 / MPD31D)
//!
//! Same control bytes as the Woosim driver, but this controller ignores tab
//! stops. Columns are built from literal spaces so every line is laid out
//! before it leaves the host.
//!
//! ## Column Boundaries
//!
//! ```text
//! 0                      24          36          48
//! ├──── left (padded) ───┼─ middle ──┼── right ──┤
//! ```
//!
//! Two-column lines put the right cell flush against column 48. When the
//! left cell would collide, it wraps inside the space left of the right cell
//! and continues on its own lines. Text is never truncated; an oversize cell
//! is still followed by one blank.

use super::{AlignedText, Driver, columns, raster_image, spaces, styled};
use crate::buffer::CommandBuffer;
use crate::error::PrinterError;
use crate::layout::{TextRaster, trim_terminator, wrap_chars};
use crate::printer::{PrinterFamily, PrinterProfile};
use crate::protocol::commands::{self, LF};
use crate::protocol::text::{self, Alignment};

pub struct LinePaddedDriver {
    profile: PrinterProfile,
    buffer: CommandBuffer,
}

/// A line under construction, tracking the printed column.
struct PaddedLine {
    bytes: Vec<u8>,
    column: usize,
}

impl PaddedLine {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            column: 0,
        }
    }

    /// Pad up to `target`; at least one blank once something is printed.
    fn pad_to(&mut self, target: usize) {
        let min = if self.column > 0 { 1 } else { 0 };
        let n = target.saturating_sub(self.column).max(min);
        self.bytes.extend(spaces(n));
        self.column += n;
    }

    fn push(&mut self, content: &str, cell: &AlignedText) {
        self.bytes.extend(styled(content, cell.bold, cell.double_size));
        self.column += columns(content, cell.double_size);
    }

    fn finish(mut self) -> Vec<u8> {
        self.bytes.push(LF);
        self.bytes
    }
}

impl LinePaddedDriver {
    pub fn new(profile: PrinterProfile, capacity: usize) -> Self {
        Self {
            profile,
            buffer: CommandBuffer::with_capacity(capacity),
        }
    }

    fn page(&self) -> usize {
        self.profile.page_width_chars
    }
}

impl Driver for LinePaddedDriver {
    fn family(&self) -> PrinterFamily {
        PrinterFamily::Honeywell0188
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

        let width = if t.double_size { self.page() / 2 } else { self.page() };
        let mut out = text::style(t.align, t.bold, t.double_size);
        for line in wrap_chars(content, width.max(1)) {
            out.extend_from_slice(line.as_bytes());
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

        let page = self.page();
        let rw = columns(r, right.double_size);

        if rw + 1 >= page {
            self.emit_aligned_text(&AlignedText {
                text: l.to_string(),
                align: Alignment::Left,
                ..left.clone()
            })?;
            return self.emit_aligned_text(&AlignedText {
                text: r.to_string(),
                align: Alignment::Right,
                ..right.clone()
            });
        }

        let room = page - rw - 1;
        let room = if left.double_size { room / 2 } else { room };
        let left_lines = if l.is_empty() {
            vec![String::new()]
        } else {
            wrap_chars(l, room.max(1))
        };

        let mut out = Vec::new();
        for (i, content) in left_lines.iter().enumerate() {
            let mut line = PaddedLine::new();
            line.push(content, left);
            if i == 0 && !r.is_empty() {
                line.pad_to(page - rw);
                line.push(r, right);
            }
            out.extend(line.finish());
        }
        self.buffer.append(&out)
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

        let page = self.page();
        let middle_end = page * 3 / 4;

        let mut line = PaddedLine::new();
        line.push(l, left);
        if !m.is_empty() {
            let mw = columns(m, middle.double_size);
            line.pad_to(middle_end.saturating_sub(mw).max(page / 2));
            line.push(m, middle);
        }
        if !r.is_empty() {
            line.pad_to(page.saturating_sub(columns(r, right.double_size)));
            line.push(r, right);
        }
        self.buffer.append(&line.finish())
    }

    fn emit_image(&mut self, raster: &TextRaster, align: Alignment) -> Result<(), PrinterError> {
        let out = raster_image(raster, align, self.profile.head_width_dots as usize)?;
        self.buffer.append(&out)
    }

    fn emit_line_feeds(&mut self, n: u8) -> Result<(), PrinterError> {
        self.buffer.append(&commands::line_feeds(n))
    }

    fn emit_separator_line(&mut self) -> Result<(), PrinterError> {
        let mut out = text::align(Alignment::Left);
        out.extend(std::iter::repeat_n(b'=', self.profile.separator_len));
        out.push(LF);
        self.buffer.append(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> LinePaddedDriver {
        LinePaddedDriver::new(PrinterProfile::HONEYWELL_0188, 4096)
    }

    fn lines(bytes: &[u8]) -> Vec<String> {
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_two_columns_pad_to_page_width() {
        let mut d = driver();
        d.emit_two_column_text(&AlignedText::new("Tiền nước:"), &AlignedText::new("150000 VND"))
            .unwrap();
        let out = lines(&d.flush());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].chars().count(), 48);
        assert!(out[0].starts_with("Tiền nước: "));
        assert!(out[0].ends_with(" 150000 VND"));
    }

    #[test]
    fn test_two_columns_wrap_left_beside_right() {
        let mut d = driver();
        let left = AlignedText::new("Khách hàng: Nguyễn Văn An, tổ 5 khu phố 3 phường Linh Trung");
        d.emit_two_column_text(&left, &AlignedText::new("12 m3")).unwrap();
        let out = lines(&d.flush());
        assert!(out.len() >= 2);
        assert_eq!(out[0].chars().count(), 48);
        assert!(out[0].ends_with(" 12 m3"));
        for line in &out[1..] {
            assert!(line.chars().count() <= 48 - 5 - 1);
            assert!(!line.contains("12 m3"));
        }
    }

    #[test]
    fn test_oversize_cell_keeps_one_blank() {
        let mut d = driver();
        let left = AlignedText::new("x".repeat(50));
        d.emit_two_column_text(&left, &AlignedText::new("9")).unwrap();
        let out = lines(&d.flush());
        assert_eq!(out[0], format!("{} 9", "x".repeat(50)));
    }

    #[test]
    fn test_three_columns_fixed_boundaries() {
        let mut d = driver();
        d.emit_three_column_text(
            &AlignedText::new("Chỉ số"),
            &AlignedText::new("120"),
            &AlignedText::new("132"),
        )
        .unwrap();
        let out = lines(&d.flush());
        let line = &out[0];
        let chars: Vec<char> = line.chars().collect();
        assert_eq!(chars.len(), 48);
        // middle ends at column 36, right at 48
        assert_eq!(chars[33..36].iter().collect::<String>(), "120");
        assert_eq!(chars[45..48].iter().collect::<String>(), "132");
    }

    #[test]
    fn test_bold_right_cell_toggles_inline() {
        let mut d = driver();
        d.emit_two_column_text(&AlignedText::new("Tổng:"), &AlignedText::new("165000 VND").bold())
            .unwrap();
        let bytes = d.flush();
        let bold_on = [0x1B, 0x45, 0x01];
        let start = bytes.windows(3).position(|w| w == bold_on).unwrap();
        assert!(bytes[start + 3..].starts_with(b"165000 VND"));
    }

    #[test]
    fn test_line_feeds_are_plain_lf() {
        let mut d = driver();
        d.emit_line_feeds(2).unwrap();
        assert_eq!(d.flush(), vec![LF, LF]);
    }

    #[test]
    fn test_separator_uses_page_width() {
        let mut d = driver();
        d.emit_separator_line().unwrap();
        let bytes = d.flush();
        assert_eq!(bytes.iter().filter(|b| **b == b'=').count(), 48);
    }
}
