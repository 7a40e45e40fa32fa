//! # Connection Manager
//!
//! Explicit owner of the link state. Create one per process and pass it to
//! whatever prints.
//!
//! The state lock is never held across a transport call. Single-flight is
//! enforced by the `Connecting` / `Disconnecting` states themselves, and
//! every connect attempt carries a sequence number so a result that arrives
//! after a disconnect can be recognised and dropped.
//!
//! A connect abandoned by [`ConnectionManager::disconnect`] still owns the
//! transport until its call returns. New connects are refused with `Busy`
//! until then, and a link it opened late is closed again.
//!
//! ```no_run
//! use std::sync::Arc;
//! use printer_drivers::connection::{ConnectionManager, Device};
//! use printer_drivers::transport::RfcommTransport;
//!
//! # async fn run() -> Result<(), printer_drivers::PrinterError> {
//! let manager = ConnectionManager::new(Arc::new(RfcommTransport::new(0)));
//! let mut events = manager.subscribe();
//!
//! manager.connect(Device::new("WOOSIM", "00:15:0E:E6:18:2A"), true).await?;
//! println!("{:?}", events.recv().await);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use super::{ConnectionEvent, ConnectionState, ConnectionStatus, Device, LinkEvent, Transport};
use crate::error::{ConnectionError, PrinterError};

/// Events buffered per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct Inner {
    state: ConnectionState,
    last_error: Option<String>,
    /// Bumped by every connect and disconnect
    attempt: u64,
    /// A disconnected-away connect whose transport call has not returned
    abandoned: bool,
    bytes_received: u64,
}

pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    inner: Mutex<Inner>,
    events: broadcast::Sender<ConnectionEvent>,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            inner: Mutex::new(Inner::default()),
            events,
        }
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    pub async fn status(&self) -> ConnectionStatus {
        let inner = self.inner.lock().await;
        ConnectionStatus {
            state: inner.state.clone(),
            last_error: inner.last_error.clone(),
        }
    }

    /// Total inbound bytes reported by the transport while connected.
    pub async fn bytes_received(&self) -> u64 {
        self.inner.lock().await.bytes_received
    }

    fn emit(&self, event: ConnectionEvent) {
        trace!(?event, "emit");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    // ========================================================================
    // CONNECT / DISCONNECT
    // ========================================================================

    /// Connect to `device`.
    ///
    /// Already connected to it: nothing happens. Connected elsewhere: the old
    /// link is fully disconnected first, and if that disconnect fails the
    /// switch stops there with its error. A result that lands after
    /// [`disconnect`](Self::disconnect) was called is dropped and this
    /// returns `Ok`.
    #[instrument(skip(self, device), fields(device = %device))]
    pub async fn connect(&self, device: Device, secure: bool) -> Result<(), PrinterError> {
        let switch_from = {
            let inner = self.inner.lock().await;
            if inner.abandoned {
                return Err(PrinterError::Busy("previous connect still resolving".into()));
            }
            match &inner.state {
                ConnectionState::Connecting(_) => {
                    return Err(PrinterError::Busy("connect already in progress".into()));
                }
                ConnectionState::Disconnecting => {
                    return Err(PrinterError::Busy("disconnect in progress".into()));
                }
                ConnectionState::Connected(current) if *current == device => {
                    debug!("already connected");
                    return Ok(());
                }
                ConnectionState::Connected(current) => Some(current.clone()),
                ConnectionState::Idle | ConnectionState::Failed(_) => None,
            }
        };

        if let Some(previous) = switch_from {
            info!(previous = %previous, "switching printers");
            self.disconnect().await?;
        }

        let attempt = {
            let mut inner = self.inner.lock().await;
            if inner.abandoned {
                return Err(PrinterError::Busy("previous connect still resolving".into()));
            }
            match &inner.state {
                ConnectionState::Idle | ConnectionState::Failed(_) => {}
                ConnectionState::Connected(current) if *current == device => return Ok(()),
                _ => {
                    return Err(PrinterError::Busy(format!("connection is {}", inner.state)));
                }
            }
            inner.attempt += 1;
            inner.state = ConnectionState::Connecting(device.clone());
            inner.attempt
        };

        info!("connecting");
        let result = self.transport.connect(&device, secure).await;

        let mut inner = self.inner.lock().await;
        let current = inner.attempt == attempt
            && matches!(&inner.state, ConnectionState::Connecting(d) if *d == device);
        if !current {
            // Nothing else connects while abandoned, so an open link is ours.
            inner.abandoned = false;
            drop(inner);
            debug!(ok = result.is_ok(), "connect attempt superseded");
            if result.is_ok() {
                if let Err(e) = self.transport.disconnect().await {
                    warn!(error = %e, "failed to close orphaned link");
                }
            }
            return Ok(());
        }

        match result {
            Ok(()) => {
                inner.state = ConnectionState::Connected(device.clone());
                inner.last_error = None;
                drop(inner);
                info!("connected");
                self.emit(ConnectionEvent::DeviceConnected {
                    name: device.name,
                    address: device.address,
                });
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                inner.state = ConnectionState::Failed(message.clone());
                inner.last_error = Some(message.clone());
                drop(inner);
                warn!(error = %message, "connection failed");
                self.emit(ConnectionEvent::ConnectionFailed { message });
                Err(e.into())
            }
        }
    }

    /// Close the link, or abandon a connect in progress.
    ///
    /// Idle or failed: nothing to do. The state ends `Idle` either way. A
    /// clean close emits `DeviceDisconnected`; a failed one records the error
    /// and emits `ConnectionLost`, since the link was dropped uncleanly.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<(), PrinterError> {
        {
            let mut inner = self.inner.lock().await;
            match &inner.state {
                ConnectionState::Connected(_) => {}
                ConnectionState::Connecting(_) => inner.abandoned = true,
                ConnectionState::Disconnecting => {
                    return Err(PrinterError::Busy("disconnect already in progress".into()));
                }
                ConnectionState::Idle | ConnectionState::Failed(_) => return Ok(()),
            }
            inner.attempt += 1;
            inner.state = ConnectionState::Disconnecting;
        }

        info!("disconnecting");
        let result = self.transport.disconnect().await;

        {
            let mut inner = self.inner.lock().await;
            inner.state = ConnectionState::Idle;
            if let Err(e) = &result {
                inner.last_error = Some(e.to_string());
            }
        }
        match &result {
            Ok(()) => self.emit(ConnectionEvent::DeviceDisconnected),
            Err(e) => {
                warn!(error = %e, "transport disconnect failed; link dropped anyway");
                self.emit(ConnectionEvent::ConnectionLost);
            }
        }
        result
    }

    /// Forget the sticky error. A `Failed` link goes back to `Idle`; nothing
    /// is reconnected.
    pub async fn clear_error(&self) {
        let mut inner = self.inner.lock().await;
        if matches!(inner.state, ConnectionState::Failed(_)) {
            inner.state = ConnectionState::Idle;
        }
        inner.last_error = None;
    }

    /// Keep an error visible in [`status`](Self::status) until cleared.
    pub async fn record_error(&self, error: &PrinterError) {
        self.inner.lock().await.last_error = Some(error.to_string());
    }

    // ========================================================================
    // LINK
    // ========================================================================

    /// Send a finished job.
    pub async fn write(&self, bytes: &[u8]) -> Result<(), PrinterError> {
        if !self.inner.lock().await.state.is_connected() {
            return Err(ConnectionError::NotConnected.into());
        }
        debug!(bytes = bytes.len(), "writing job");
        self.transport.write(bytes).await
    }

    /// Apply an unsolicited report from the transport.
    pub async fn handle_link_event(&self, event: LinkEvent) {
        match event {
            LinkEvent::ConnectionLost => {
                {
                    let mut inner = self.inner.lock().await;
                    if !inner.state.is_connected() {
                        debug!(state = %inner.state, "link loss ignored");
                        return;
                    }
                    inner.state = ConnectionState::Idle;
                    inner.last_error = Some(ConnectionError::LinkLost.to_string());
                }
                warn!("connection lost");
                self.emit(ConnectionEvent::ConnectionLost);
            }
            LinkEvent::DataReceived(bytes) => {
                {
                    let mut inner = self.inner.lock().await;
                    if !inner.state.is_connected() {
                        return;
                    }
                    inner.bytes_received += bytes.len() as u64;
                }
                debug!(len = bytes.len(), "data received");
                self.emit(ConnectionEvent::DataReceived(bytes));
            }
        }
    }

    /// Feed transport reports from `rx` into the manager until the sender
    /// side is dropped.
    pub fn spawn_link_listener(
        self: &Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<LinkEvent>,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                manager.handle_link_event(event).await;
            }
            debug!("link event channel closed");
        })
    }
}
