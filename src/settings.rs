//! # Settings
//!
//! Runtime configuration, read from a JSON file. Every field has a default,
//! so `{}` is a valid settings file.
//!
//! ```json
//! {
//!   "rfcomm_channel": 0,
//!   "device_path": "/dev/rfcomm0",
//!   "secure": true,
//!   "connect_timeout_secs": 15,
//!   "print_cooldown_ms": 2000,
//!   "asset_dir": "/var/cache/printer-drivers",
//!   "buffer_capacity": 131072
//! }
//! ```
//!
//! Without `buffer_capacity`, each printer family uses the job buffer size
//! from its [`PrinterProfile`](crate::printer::PrinterProfile).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PrinterError;
use crate::print::DEFAULT_COOLDOWN;
use crate::printer::PrinterFamily;
use crate::transport::bluetooth::DEFAULT_CONNECT_TIMEOUT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `rfcomm<N>` to bind when no TTY exists for the printer yet
    pub rfcomm_channel: u8,
    /// Fixed TTY, skipping lookup and binding
    pub device_path: Option<PathBuf>,
    /// Request an authenticated, encrypted link
    pub secure: bool,
    pub connect_timeout_secs: u64,
    /// Minimum gap between two print jobs
    pub print_cooldown_ms: u64,
    /// Directory holding staged images such as `qr-code.png`
    pub asset_dir: PathBuf,
    /// Command buffer size per job, overriding the family default
    pub buffer_capacity: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rfcomm_channel: 0,
            device_path: None,
            secure: true,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
            print_cooldown_ms: DEFAULT_COOLDOWN.as_millis() as u64,
            asset_dir: std::env::temp_dir(),
            buffer_capacity: None,
        }
    }
}

impl Settings {
    /// Read settings from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PrinterError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PrinterError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
            .map_err(|e| PrinterError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(text: &str) -> Result<Self, PrinterError> {
        let settings: Settings = serde_json::from_str(text)
            .map_err(|e| PrinterError::Config(format!("Invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), PrinterError> {
        if self.buffer_capacity == Some(0) {
            return Err(PrinterError::Config("buffer_capacity must be positive".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(PrinterError::Config("connect_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn print_cooldown(&self) -> Duration {
        Duration::from_millis(self.print_cooldown_ms)
    }

    /// Job buffer size for `family`.
    pub fn capacity_for(&self, family: PrinterFamily) -> usize {
        self.buffer_capacity
            .unwrap_or_else(|| family.profile().buffer_capacity)
    }
}
