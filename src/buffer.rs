//! # Command Buffer
//!
//! Bounded byte accumulator for one print job.
//!
//! A buffer is created (or cleared) at job start, appended to while the
//! receipt is formatted, and sealed by [`CommandBuffer::snapshot`] when the
//! bytes are handed to the transport. Exceeding the capacity is fatal to the
//! job: receipts carry amounts, so half a receipt is worse than none.

use crate::error::PrinterError;

/// Default capacity for one job (50 KiB). Raster printers override it in
/// their [`PrinterProfile`](crate::printer::PrinterProfile).
pub const DEFAULT_CAPACITY: usize = 50 * 1024;

/// Append-only byte builder with a hard capacity.
#[derive(Debug)]
pub struct CommandBuffer {
    data: Vec<u8>,
    capacity: usize,
    sealed: bool,
}

impl CommandBuffer {
    /// Create an empty buffer with the given capacity in bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
            sealed: false,
        }
    }

    /// Append bytes.
    ///
    /// Fails without modifying the buffer if the result would exceed the
    /// capacity, or if the buffer was already snapshotted.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), PrinterError> {
        if self.sealed {
            return Err(PrinterError::BufferSealed);
        }
        let needed = self.data.len() + bytes.len();
        if needed > self.capacity {
            return Err(PrinterError::BufferOverflow {
                needed,
                capacity: self.capacity,
            });
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Append a single byte.
    pub fn push(&mut self, byte: u8) -> Result<(), PrinterError> {
        self.append(&[byte])
    }

    /// Reset to empty and unseal. Call at job start.
    pub fn clear(&mut self) {
        self.data.clear();
        self.sealed = false;
    }

    /// Take the accumulated bytes for the transport write.
    ///
    /// The buffer is sealed afterwards; appends fail until [`clear`](Self::clear).
    pub fn snapshot(&mut self) -> Vec<u8> {
        self.sealed = true;
        std::mem::take(&mut self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Bytes appended so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
