//! # printer-drivers CLI
//!
//! Command-line front end for formatting and printing receipts.
//!
//! ## Usage
//!
//! ```bash
//! # List paired Bluetooth devices
//! printer-drivers devices
//!
//! # Print a water bill to a paired printer
//! printer-drivers print --mac 00:15:0E:E6:18:2A --fields bill.json
//!
//! # Format for a family without any Bluetooth, writing the raw job to a file
//! printer-drivers print --family pr3 --fields bill.json --out job.bin
//!
//! # Preview rasterized text as PNG
//! printer-drivers preview --text "GIẤY BÁO TIỀN NƯỚC" --png title.png
//! ```
//!
//! Logging goes to stderr; set `RUST_LOG=debug` for transport details.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use printer_drivers::{
    ConnectionManager, Device, PrinterError, PrinterFamily,
    assets::DirAssetStore,
    layout::{FontSpec, SpleenFont, render_paragraph},
    print::{PrintCooldown, print_receipt},
    protocol::text::Alignment,
    receipt::{self, ReceiptFields, Template},
    settings::Settings,
    transport::{RfcommTransport, paired_devices},
};

/// Thermal receipt printing over Bluetooth serial
#[derive(Parser, Debug)]
#[command(name = "printer-drivers")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List paired Bluetooth devices and the driver each would use
    Devices,

    /// Format a receipt and print it
    Print {
        /// Printer Bluetooth address
        #[arg(long)]
        mac: Option<String>,

        /// Printer name, used to pick the driver (looked up from paired devices if omitted)
        #[arg(long)]
        name: Option<String>,

        /// Printer family: 1|woosim, 2|0188, 3|pr3 (overrides name lookup)
        #[arg(long)]
        family: Option<PrinterFamily>,

        /// JSON object of receipt fields
        #[arg(long, value_name = "FILE")]
        fields: PathBuf,

        /// Receipt template
        #[arg(long, default_value = "water-bill")]
        template: Template,

        /// Number of copies, spaced by the print cool-down
        #[arg(long, default_value = "1")]
        copies: u32,

        /// Write the raw job to a file instead of printing
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Render text the way the raster driver would and save it as PNG
    Preview {
        /// Printer family whose head geometry to use
        #[arg(long, default_value = "pr3")]
        family: PrinterFamily,

        /// Text to render
        #[arg(long)]
        text: String,

        #[arg(long)]
        bold: bool,

        #[arg(long)]
        double: bool,

        /// Alignment: left, center or right
        #[arg(long, default_value = "left")]
        align: String,

        /// Output PNG file
        #[arg(long, value_name = "FILE")]
        png: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), PrinterError> {
    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Devices => {
            for device in paired_devices()? {
                let driver = PrinterFamily::from_device_name(&device.name)
                    .map(|f| format!("{} ({})", f.profile().name, f))
                    .unwrap_or_else(|_| "-".to_string());
                println!("{}  {:<32} {}", device.address, device.name, driver);
            }
        }

        Commands::Print {
            mac,
            name,
            family,
            fields,
            template,
            copies,
            out,
        } => {
            let fields = load_fields(&fields)?;

            if let Some(out) = out {
                let family = match (family, &name) {
                    (Some(family), _) => family,
                    (None, Some(name)) => PrinterFamily::from_device_name(name)?,
                    (None, None) => {
                        return Err(PrinterError::Config(
                            "--out needs --family or --name to pick a driver".into(),
                        ));
                    }
                };
                let assets = DirAssetStore::new(&settings.asset_dir, family.profile().head_width_dots as usize);
                let mut driver = family.driver(settings.capacity_for(family));
                let job = receipt::format_receipt(template, &fields, driver.as_mut(), &assets)?;
                std::fs::write(&out, &job)?;
                println!("Wrote {} bytes to {}", job.len(), out.display());
                return Ok(());
            }

            let mac = mac.ok_or_else(|| PrinterError::Config("--mac is required to print".into()))?;
            let name = match name {
                Some(name) => name,
                None => lookup_name(&mac)?,
            };
            print_over_bluetooth(&settings, Device::new(name, mac), family, template, &fields, copies)
                .await?;
        }

        Commands::Preview {
            family,
            text,
            bold,
            double,
            align,
            png,
        } => {
            let align = parse_alignment(&align)?;
            let layout = family.profile().raster_layout();
            let spec = FontSpec::new(bold, double);
            let raster = render_paragraph(&text, align, spec, &layout, &SpleenFont)
                .ok_or_else(|| PrinterError::Config("nothing to render".into()))?;
            raster
                .to_gray()
                .save(&png)
                .map_err(|e| PrinterError::Image(format!("Failed to save PNG: {}", e)))?;
            println!("Saved {}x{} preview to {}", raster.width(), raster.height(), png.display());
        }
    }

    Ok(())
}

fn load_fields(path: &Path) -> Result<ReceiptFields, PrinterError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| PrinterError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| PrinterError::Config(format!("{}: expected a JSON object of strings: {}", path.display(), e)))
}

fn lookup_name(mac: &str) -> Result<String, PrinterError> {
    let wanted = Device::new("", mac);
    paired_devices()?
        .into_iter()
        .find(|d| *d == wanted)
        .map(|d| d.name)
        .ok_or_else(|| PrinterError::Config(format!("{} is not paired; pass --name", mac)))
}

fn parse_alignment(s: &str) -> Result<Alignment, PrinterError> {
    match s.to_lowercase().as_str() {
        "left" => Ok(Alignment::Left),
        "center" | "centre" => Ok(Alignment::Center),
        "right" => Ok(Alignment::Right),
        other => Err(PrinterError::Config(format!("unknown alignment '{}'", other))),
    }
}

async fn print_over_bluetooth(
    settings: &Settings,
    device: Device,
    family: Option<PrinterFamily>,
    template: Template,
    fields: &ReceiptFields,
    copies: u32,
) -> Result<(), PrinterError> {
    let (link_tx, link_rx) = mpsc::unbounded_channel();
    let mut transport = RfcommTransport::new(settings.rfcomm_channel)
        .with_connect_timeout(settings.connect_timeout())
        .with_link_events(link_tx);
    if let Some(path) = &settings.device_path {
        transport = transport.with_device_path(path);
    }

    let manager = Arc::new(ConnectionManager::new(Arc::new(transport)));
    let listener = manager.spawn_link_listener(link_rx);

    manager.connect(device, settings.secure).await?;

    let head_width = family
        .map(|f| f.profile().head_width_dots as usize)
        .unwrap_or(576);
    let assets = DirAssetStore::new(&settings.asset_dir, head_width);
    let mut cooldown = PrintCooldown::new(settings.print_cooldown());

    let mut result = Ok(());
    for copy in 1..=copies {
        if let Some(wait) = cooldown.remaining_at(std::time::Instant::now()) {
            tokio::time::sleep(wait).await;
        }
        cooldown.try_begin()?;
        match print_receipt(&manager, family, template, fields, &assets, settings.buffer_capacity).await {
            Ok(bytes) => info!(copy, bytes, "printed"),
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    manager.disconnect().await?;
    listener.abort();
    result
}
