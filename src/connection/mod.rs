//! # Connection Management
//!
//! The Bluetooth link lifecycle, independent of what gets printed.
//!
//! ## States
//!
//! | From | Call / report | To | Event |
//! |------|---------------|----|-------|
//! | Idle, Failed | `connect` | Connecting → Connected | `DeviceConnected` |
//! | Connecting | transport error | Failed | `ConnectionFailed` |
//! | Connected(A) | `connect(B)` | Disconnecting → Idle → Connecting → Connected(B) | `DeviceDisconnected`, `DeviceConnected` |
//! | Connected, Connecting | `disconnect` | Disconnecting → Idle | `DeviceDisconnected` |
//! | Connected | link lost | Idle, sticky error | `ConnectionLost` |
//! | Failed | `clear_error` | Idle | |
//!
//! Exactly one state is active. Connect and disconnect are single-flight:
//! overlapping calls are rejected with [`PrinterError::Busy`].
//!
//! ## Modules
//!
//! - [`manager`]: The [`ConnectionManager`] state machine

pub mod manager;

pub use manager::ConnectionManager;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ConnectionError, PrinterError};

/// A paired peer. Two devices are the same device when their addresses
/// match, ignoring case.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub address: String,
}

impl Device {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.address.eq_ignore_ascii_case(&other.address)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// Link state. Owned and mutated only by the [`ConnectionManager`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting(Device),
    Connected(Device),
    Disconnecting,
    Failed(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }

    /// Device being connected to or connected.
    pub fn device(&self) -> Option<&Device> {
        match self {
            ConnectionState::Connecting(d) | ConnectionState::Connected(d) => Some(d),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => f.write_str("idle"),
            ConnectionState::Connecting(d) => write!(f, "connecting to {}", d),
            ConnectionState::Connected(d) => write!(f, "connected to {}", d),
            ConnectionState::Disconnecting => f.write_str("disconnecting"),
            ConnectionState::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// Snapshot returned by [`ConnectionManager::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Last connection or print error, kept until explicitly cleared
    pub last_error: Option<String>,
}

/// Notifications broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    DeviceConnected { name: String, address: String },
    DeviceDisconnected,
    ConnectionFailed { message: String },
    ConnectionLost,
    DataReceived(Vec<u8>),
}

/// Unsolicited reports from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    ConnectionLost,
    DataReceived(Vec<u8>),
}

/// A bonded serial link to a printer.
///
/// Writes are fire-and-forget: `Ok` means the bytes left the host, not that
/// anything was printed.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self, device: &Device, secure: bool) -> Result<(), ConnectionError>;

    async fn write(&self, bytes: &[u8]) -> Result<(), PrinterError>;

    async fn disconnect(&self) -> Result<(), PrinterError>;
}
