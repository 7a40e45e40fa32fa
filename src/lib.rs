//! # printer-drivers - Bluetooth Thermal Receipt Printing
//!
//! Formats receipts for three families of mobile thermal printers and
//! manages the Bluetooth serial link they are printed over.
//!
//! - **Drivers**: one capability interface, three protocols (direct text,
//!   padded line text, rasterized text)
//! - **Layout**: greedy word wrap by characters or pixels, bitmap text
//! - **Receipts**: field map + template → driver operations
//! - **Connection**: single-flight connect/disconnect state machine with
//!   broadcast events
//! - **Transport**: Bluetooth RFCOMM on Linux
//!
//! ## Quick Start
//!
//! ```
//! use printer_drivers::{
//!     assets::NoAssets,
//!     printer::PrinterFamily,
//!     receipt::{format_receipt, ReceiptFields, Template},
//! };
//!
//! let mut fields = ReceiptFields::new();
//! fields.insert("tenCongTy".into(), "ABC Co".into());
//! fields.insert("ky".into(), "01/2024".into());
//! fields.insert("tienNuoc".into(), "150000".into());
//!
//! let family = PrinterFamily::from_device_name("WOOSIM WSP-i350")?;
//! let mut driver = family.driver(printer_drivers::buffer::DEFAULT_CAPACITY);
//! let job = format_receipt(Template::WaterBill, &fields, driver.as_mut(), &NoAssets)?;
//! assert_eq!(&job[..2], &[0x1B, 0x40]);
//! # Ok::<(), printer_drivers::PrinterError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`buffer`] | Bounded per-job command buffer |
//! | [`protocol`] | ESC/POS and Line Printer command builders |
//! | [`layout`] | Word wrap and text rasterization |
//! | [`driver`] | The `Driver` trait and its three implementations |
//! | [`printer`] | Printer families and hardware profiles |
//! | [`receipt`] | Receipt templates |
//! | [`assets`] | Staged raster images |
//! | [`connection`] | Link state machine and `Transport` trait |
//! | [`transport`] | Bluetooth RFCOMM |
//! | [`print`] | Print entrypoint and cool-down |
//! | [`settings`] | JSON settings file |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! - Woosim WSP-i350 (35 columns)
//! - Honeywell 0188 / MPD31D (48 columns)
//! - Honeywell PR3 (576-dot raster)

pub mod assets;
pub mod buffer;
pub mod connection;
pub mod driver;
pub mod error;
pub mod layout;
pub mod print;
pub mod printer;
pub mod protocol;
pub mod receipt;
pub mod settings;
pub mod transport;

// Re-exports for convenience
pub use connection::{ConnectionManager, Device};
pub use driver::{AlignedText, Driver};
pub use error::{ConnectionError, PrinterError};
pub use printer::{PrinterFamily, PrinterProfile};
