//! # Printer Transport Layer
//!
//! Links that carry finished jobs to the printer.
//!
//! ## Available Transports
//!
//! - [`bluetooth`]: Bluetooth RFCOMM (Linux), plus paired-device listing
//!
//! The [`Transport`](crate::connection::Transport) trait lives with the
//! connection manager that drives it.

pub mod bluetooth;

pub use bluetooth::{RfcommTransport, paired_devices};
