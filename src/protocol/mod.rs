//! # Printer Command Builders
//!
//! Low-level byte sequences for the supported printer families.
//!
//! ## Module Structure
//!
//! - [`commands`]: ESC/POS basics (init, feed, tab stops)
//! - [`text`]: ESC/POS text styling (alignment, bold, size)
//! - [`graphics`]: Raster images for ESC/POS and Line Printer mode
//! - [`line_printer`]: Honeywell Line Printer text
//!
//! ## Usage Example
//!
//! ```
//! use printer_drivers::protocol::{commands, text};
//! use printer_drivers::protocol::text::Alignment;
//!
//! let mut data = Vec::new();
//! data.extend(commands::init());
//! data.extend(text::style(Alignment::Center, true, false));
//! data.extend("HÓA ĐƠN\n".as_bytes());
//! data.extend(text::reset());
//! data.extend(commands::feed_lines(3));
//! ```
//!
//! Every builder returns an owned `Vec<u8>`; drivers append the result to
//! their [`CommandBuffer`](crate::buffer::CommandBuffer).

pub mod commands;
pub mod graphics;
pub mod line_printer;
pub mod text;
