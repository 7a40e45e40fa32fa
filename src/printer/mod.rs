//! # Printer Module
//!
//! Printer families, their hardware profiles, and driver selection.
//!
//! ## Modules
//!
//! - [`config`]: Printer hardware profiles
//!
//! ## Driver Selection
//!
//! A connected device is matched by a case-insensitive substring of its
//! advertised Bluetooth name:
//!
//! | Name contains | Family | Id |
//! |---------------|--------|----|
//! | `woosim` | [`PrinterFamily::WoosimWspI350`] | 1 |
//! | `mpd31d` | [`PrinterFamily::Honeywell0188`] | 2 |
//! | `pr3` | [`PrinterFamily::HoneywellPr3`] | 3 |
//!
//! ```
//! use printer_drivers::printer::PrinterFamily;
//!
//! let family = PrinterFamily::from_device_name("WOOSIM WSP-i350").unwrap();
//! assert_eq!(family, PrinterFamily::WoosimWspI350);
//! assert!(PrinterFamily::from_device_name("Galaxy Buds").is_err());
//! ```

pub mod config;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use config::PrinterProfile;

use crate::driver::{DirectTextDriver, Driver, LinePaddedDriver, RasterDriver};
use crate::error::PrinterError;

/// Supported printer protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrinterFamily {
    /// Direct text with inline control bytes and tab-stop columns
    WoosimWspI350,
    /// Direct text with space-padded columns
    Honeywell0188,
    /// Rasterized text in Line Printer mode
    HoneywellPr3,
}

/// Device-name fragment → family. First match wins.
const NAME_TABLE: &[(&str, PrinterFamily)] = &[
    ("woosim", PrinterFamily::WoosimWspI350),
    ("mpd31d", PrinterFamily::Honeywell0188),
    ("pr3", PrinterFamily::HoneywellPr3),
];

impl PrinterFamily {
    pub const ALL: [PrinterFamily; 3] = [
        PrinterFamily::WoosimWspI350,
        PrinterFamily::Honeywell0188,
        PrinterFamily::HoneywellPr3,
    ];

    /// Stable numeric id.
    pub fn id(&self) -> u8 {
        match self {
            Self::WoosimWspI350 => 1,
            Self::Honeywell0188 => 2,
            Self::HoneywellPr3 => 3,
        }
    }

    /// Stable string id, as accepted by [`FromStr`].
    pub fn slug(&self) -> &'static str {
        match self {
            Self::WoosimWspI350 => "woosim-wsp-i350",
            Self::Honeywell0188 => "honeywell-0188",
            Self::HoneywellPr3 => "honeywell-pr3",
        }
    }

    pub fn profile(&self) -> PrinterProfile {
        match self {
            Self::WoosimWspI350 => PrinterProfile::WOOSIM_WSP_I350,
            Self::Honeywell0188 => PrinterProfile::HONEYWELL_0188,
            Self::HoneywellPr3 => PrinterProfile::HONEYWELL_PR3,
        }
    }

    /// Resolve a family from a device's advertised name.
    pub fn from_device_name(name: &str) -> Result<Self, PrinterError> {
        let lower = name.to_lowercase();
        NAME_TABLE
            .iter()
            .find(|(fragment, _)| lower.contains(fragment))
            .map(|&(_, family)| family)
            .ok_or_else(|| {
                PrinterError::UnsupportedPrinter(format!("no driver for device '{}'", name))
            })
    }

    /// Build a fresh driver sized by the family's profile.
    pub fn default_driver(&self) -> Box<dyn Driver> {
        self.driver(self.profile().buffer_capacity)
    }

    /// Build a fresh driver with a command buffer of `capacity` bytes.
    pub fn driver(&self, capacity: usize) -> Box<dyn Driver> {
        let profile = self.profile();
        match self {
            Self::WoosimWspI350 => Box::new(DirectTextDriver::new(profile, capacity)),
            Self::Honeywell0188 => Box::new(LinePaddedDriver::new(profile, capacity)),
            Self::HoneywellPr3 => Box::new(RasterDriver::new(profile, capacity)),
        }
    }
}

impl FromStr for PrinterFamily {
    type Err = PrinterError;

    /// Accepts the numeric id, the slug, or a short alias (`woosim`, `0188`,
    /// `mpd31d`, `pr3`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let family = match lower.as_str() {
            "1" | "woosim" | "woosim-wsp-i350" => Self::WoosimWspI350,
            "2" | "0188" | "mpd31d" | "honeywell-0188" => Self::Honeywell0188,
            "3" | "pr3" | "honeywell-pr3" => Self::HoneywellPr3,
            _ => {
                return Err(PrinterError::UnsupportedPrinter(format!(
                    "unknown printer family '{}'",
                    s
                )));
            }
        };
        Ok(family)
    }
}

impl fmt::Display for PrinterFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
