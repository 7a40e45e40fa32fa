//! # Error Types
//!
//! This module defines error types used throughout the printer-drivers library.
//!
//! ## Propagation
//!
//! | Error | Effect |
//! |-------|--------|
//! | [`PrinterError::Connection`] | Sticky status on the connection manager |
//! | [`PrinterError::Busy`] | Rejected call, in-flight work unaffected |
//! | [`PrinterError::UnsupportedPrinter`] | Job never starts, no bytes emitted |
//! | [`PrinterError::BufferOverflow`] | Whole job aborted |
//! | [`PrinterError::AssetMissing`] | Caught per element, replaced by an `ERROR:` line |

use thiserror::Error;

/// Why a Bluetooth link could not be established or was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// No bound device or peer unreachable
    #[error("device not found: {0}")]
    NotFound(String),

    /// Peer did not answer in time
    #[error("connection timed out: {0}")]
    Timeout(String),

    /// Established link dropped by the transport
    #[error("connection lost")]
    LinkLost,

    /// Operation needs a live link but none is open
    #[error("not connected")]
    NotConnected,

    /// Any other transport-reported failure
    #[error("{0}")]
    Failed(String),
}

/// Main error type for printer-drivers operations
#[derive(Debug, Error)]
pub enum PrinterError {
    /// Link establishment or link loss
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Overlapping connect/disconnect/print
    #[error("Busy: {0}")]
    Busy(String),

    /// No driver matches the device or family id
    #[error("Unsupported printer: {0}")]
    UnsupportedPrinter(String),

    /// Job content exceeds the command buffer capacity
    #[error("Buffer overflow: {needed} bytes needed, capacity is {capacity}")]
    BufferOverflow { needed: usize, capacity: usize },

    /// Append after the buffer was handed to the transport
    #[error("Command buffer already flushed; clear it before starting a new job")]
    BufferSealed,

    /// Referenced raster asset is absent or undecodable
    #[error("Asset missing: {0}")]
    AssetMissing(String),

    /// Transport-level errors (open, write, TTY setup)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Image processing error
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid settings or field file
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
