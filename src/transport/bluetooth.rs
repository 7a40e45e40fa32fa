//! # Bluetooth RFCOMM Transport
//!
//! Serial Port Profile links to the receipt printers on Linux, through the
//! kernel's `/dev/rfcommN` TTYs.
//!
//! | Step | Done by |
//! |------|---------|
//! | Pairing | `bluetoothctl pair <MAC>` (once, by hand) |
//! | TTY lookup | `/proc/net/rfcomm`, then `rfcomm -a` |
//! | TTY binding | `bluetoothctl connect`, `l2ping`, `rfcomm bind` |
//! | Writes | raw-mode TTY, 4 KiB chunks |
//!
//! Binding needs root. On a locked-down host, bind once by hand and set
//! `device_path` in the settings:
//!
//! ```bash
//! $ sudo rfcomm bind 0 00:15:0E:XX:XX:XX
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, instrument, warn};

use crate::connection::{Device, LinkEvent, Transport};
use crate::error::{ConnectionError, PrinterError};

/// Largest single `write(2)` to the TTY
const CHUNK_SIZE: usize = 4096;

/// Pause between chunks so the printer's receive buffer keeps up
const CHUNK_DELAY: Duration = Duration::from_millis(2);

/// Settle time after `bluetoothctl connect` and `rfcomm bind`
const SETTLE: Duration = Duration::from_millis(500);

/// Default time allowed for locating, binding and opening the device
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

// ============================================================================
// RAW PORT
// ============================================================================

/// An open, raw-mode `/dev/rfcommN`. Blocking; [`RfcommTransport`] drives
/// it from `spawn_blocking`.
pub struct RfcommPort {
    file: File,
    path: PathBuf,
}

impl RfcommPort {
    /// Open the TTY for writing and switch it to raw mode.
    pub fn open(path: &Path) -> Result<Self, PrinterError> {
        let file = OpenOptions::new().write(true).open(path).map_err(|e| {
            PrinterError::Transport(format!("Failed to open {}: {}", path.display(), e))
        })?;
        make_raw(file.as_raw_fd())?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a whole job and flush.
    pub fn write_all(&mut self, data: &[u8]) -> Result<(), PrinterError> {
        let mut chunks = data.chunks(CHUNK_SIZE).peekable();
        while let Some(chunk) = chunks.next() {
            self.file
                .write_all(chunk)
                .map_err(|e| PrinterError::Transport(format!("Write to {} failed: {}", self.path.display(), e)))?;
            if chunks.peek().is_some() {
                thread::sleep(CHUNK_DELAY);
            }
        }
        self.file
            .flush()
            .map_err(|e| PrinterError::Transport(format!("Flush failed: {}", e)))
    }
}

/// 8N1, no echo, no line discipline, no flow control.
///
/// XON/XOFF in particular must be off: 0x11 and 0x13 are common in raster
/// data, and CR/LF translation would corrupt both text and images.
fn make_raw(fd: i32) -> Result<(), PrinterError> {
    use std::mem::MaybeUninit;

    let tty_error = |call: &str| {
        PrinterError::Transport(format!("{} failed: {}", call, io::Error::last_os_error()))
    };

    let mut termios = MaybeUninit::uninit();
    if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
        return Err(tty_error("tcgetattr"));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag = (termios.c_cflag & !(libc::CSIZE | libc::PARENB)) | libc::CS8;

    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(tty_error("tcsetattr"));
    }
    Ok(())
}

// ============================================================================
// TRANSPORT
// ============================================================================

/// # RFCOMM Transport
///
/// [`Transport`] over an RFCOMM TTY. `connect` finds the TTY already bound
/// to the device's MAC, binding `rfcomm<channel>` when there is none.
///
/// A failed write is reported as [`LinkEvent::ConnectionLost`] to the
/// channel set with [`with_link_events`](Self::with_link_events).
pub struct RfcommTransport {
    channel: u8,
    device_path: Option<PathBuf>,
    connect_timeout: Duration,
    port: Mutex<Option<RfcommPort>>,
    link_events: Option<mpsc::UnboundedSender<LinkEvent>>,
}

impl RfcommTransport {
    /// Transport that binds `/dev/rfcomm<channel>` when needed.
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            device_path: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            port: Mutex::new(None),
            link_events: None,
        }
    }

    /// Always open this TTY instead of looking one up.
    pub fn with_device_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.device_path = Some(path.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_link_events(mut self, tx: mpsc::UnboundedSender<LinkEvent>) -> Self {
        self.link_events = Some(tx);
        self
    }

    fn report(&self, event: LinkEvent) {
        if let Some(tx) = &self.link_events {
            let _ = tx.send(event);
        }
    }
}

/// Locate or bind the TTY for `mac` and open it.
fn open_for(mac: &str, channel: u8, explicit: Option<PathBuf>) -> Result<RfcommPort, ConnectionError> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let found = find_rfcomm_for_mac(mac).map_err(|e| ConnectionError::Failed(e.to_string()))?;
            match found {
                Some(path) => PathBuf::from(path),
                None => PathBuf::from(
                    setup_rfcomm(mac, channel).map_err(|e| ConnectionError::NotFound(e.to_string()))?,
                ),
            }
        }
    };
    RfcommPort::open(&path).map_err(|e| ConnectionError::Failed(e.to_string()))
}

#[async_trait]
impl Transport for RfcommTransport {
    #[instrument(skip(self, device), fields(mac = %device.address))]
    async fn connect(&self, device: &Device, secure: bool) -> Result<(), ConnectionError> {
        if !is_valid_mac(&device.address) {
            return Err(ConnectionError::NotFound(format!(
                "invalid Bluetooth address '{}'",
                device.address
            )));
        }
        if !secure {
            // rfcomm TTYs inherit the bonding's security level
            debug!("insecure link requested; using the paired link as-is");
        }

        let mac = device.address.to_uppercase();
        let channel = self.channel;
        let explicit = self.device_path.clone();
        let task = tokio::task::spawn_blocking(move || open_for(&mac, channel, explicit));

        let port = tokio::time::timeout(self.connect_timeout, task)
            .await
            .map_err(|_| {
                ConnectionError::Timeout(format!(
                    "{} did not answer within {}s",
                    device.address,
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| ConnectionError::Failed(format!("connect task failed: {}", e)))??;

        info!(path = %port.path().display(), "rfcomm link open");
        *self.port.lock().await = Some(port);
        Ok(())
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), PrinterError> {
        let mut guard = self.port.lock().await;
        let mut port = guard.take().ok_or(ConnectionError::NotConnected)?;

        let data = bytes.to_vec();
        let (port, result) = tokio::task::spawn_blocking(move || {
            let result = port.write_all(&data);
            (port, result)
        })
        .await
        .map_err(|e| PrinterError::Transport(format!("write task failed: {}", e)))?;

        match result {
            Ok(()) => {
                *guard = Some(port);
                Ok(())
            }
            Err(e) => {
                // The TTY is unusable once a write fails; drop it.
                drop(port);
                drop(guard);
                warn!(error = %e, "rfcomm write failed");
                self.report(LinkEvent::ConnectionLost);
                Err(e)
            }
        }
    }

    async fn disconnect(&self) -> Result<(), PrinterError> {
        if let Some(port) = self.port.lock().await.take() {
            debug!(path = %port.path().display(), "closing rfcomm link");
        }
        Ok(())
    }
}

// ============================================================================
// RFCOMM SETUP HELPERS
// ============================================================================

/// `XX:XX:XX:XX:XX:XX`, hex digits in either case.
pub fn is_valid_mac(mac: &str) -> bool {
    let mut octets = 0;
    for octet in mac.split(':') {
        if octet.len() != 2 || !octet.bytes().all(|b| b.is_ascii_hexdigit()) {
            return false;
        }
        octets += 1;
    }
    octets == 6
}

/// The `/dev/rfcommN` named on the first line mentioning `mac`.
fn rfcomm_path_in(listing: &str, mac_upper: &str) -> Option<String> {
    listing
        .lines()
        .filter(|line| line.to_uppercase().contains(mac_upper))
        .filter_map(|line| line.split(':').next())
        .map(|dev_name| format!("/dev/{}", dev_name.trim()))
        .find(|device_path| Path::new(device_path).exists())
}

/// Run a Bluetooth tool and capture its output.
fn run(program: &str, args: &[&str]) -> Result<Output, PrinterError> {
    debug!(program, ?args, "running");
    Command::new(program)
        .args(args)
        .output()
        .map_err(|e| PrinterError::Transport(format!("Failed to run {}: {}", program, e)))
}

/// Like [`run`], but a non-zero exit is an error carrying stderr.
fn run_checked(program: &str, args: &[&str], what: &str) -> Result<Output, PrinterError> {
    let output = run(program, args)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PrinterError::Transport(format!("{}: {}", what, stderr.trim())));
    }
    Ok(output)
}

/// The TTY already bound to `mac`, if any.
pub fn find_rfcomm_for_mac(mac: &str) -> Result<Option<String>, PrinterError> {
    let mac_upper = mac.to_uppercase();

    // "rfcomm0: XX:XX:XX:XX:XX:XX channel N ..."
    if let Ok(table) = fs::read_to_string("/proc/net/rfcomm") {
        if let Some(path) = rfcomm_path_in(&table, &mac_upper) {
            return Ok(Some(path));
        }
    }

    let output = run("rfcomm", &["-a"])?;
    Ok(rfcomm_path_in(&String::from_utf8_lossy(&output.stdout), &mac_upper))
}

/// Bring the link up and bind `/dev/rfcomm<channel>` to `mac` on SPP
/// channel 1. Needs root.
pub fn setup_rfcomm(mac: &str, channel: u8) -> Result<String, PrinterError> {
    let mac = mac.to_uppercase();
    let device_path = format!("/dev/rfcomm{}", channel);

    info!(%mac, "connecting via bluetoothctl");
    let output = run("bluetoothctl", &["connect", &mac])?;
    // Output wording varies between BlueZ releases; l2ping decides.
    debug!(output = %String::from_utf8_lossy(&output.stdout).trim(), "bluetoothctl connect");
    thread::sleep(SETTLE);

    run_checked("l2ping", &["-c", "1", &mac], &format!("Device {} not reachable", mac))?;

    info!(channel, "binding rfcomm");
    run_checked("rfcomm", &["bind", &channel.to_string(), &mac, "1"], "rfcomm bind failed")?;
    thread::sleep(SETTLE);

    if !Path::new(&device_path).exists() {
        return Err(PrinterError::Transport(format!("{} was not created", device_path)));
    }
    info!(path = %device_path, "rfcomm device ready");
    Ok(device_path)
}

// ============================================================================
// PAIRED DEVICES
// ============================================================================

/// Devices paired with the local adapter, in `bluetoothctl` order.
pub fn paired_devices() -> Result<Vec<Device>, PrinterError> {
    let output = run_checked("bluetoothctl", &["devices", "Paired"], "bluetoothctl devices failed")?;
    Ok(parse_paired_devices(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `Device <MAC> <name>` lines. Anything else is skipped.
pub fn parse_paired_devices(listing: &str) -> Vec<Device> {
    listing
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("Device ")?;
            let (mac, name) = rest.split_once(' ').unwrap_or((rest, ""));
            if !is_valid_mac(mac) {
                return None;
            }
            let name = if name.trim().is_empty() { mac } else { name.trim() };
            Some(Device::new(name, mac))
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
