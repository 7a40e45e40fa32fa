//! # Printing
//!
//! Glue between formatting and the link: pick the driver, format the job,
//! write it, and leave any failure on the manager's sticky status.
//!
//! Printers give no completion acknowledgment, so callers throttle print
//! requests with a [`PrintCooldown`].

use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use crate::assets::AssetStore;
use crate::connection::ConnectionManager;
use crate::error::PrinterError;
use crate::printer::PrinterFamily;
use crate::receipt::{ReceiptFields, Template, format_receipt};

/// Gap enforced between two print jobs.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

/// Rejects a print issued too soon after the previous one.
#[derive(Debug, Clone)]
pub struct PrintCooldown {
    period: Duration,
    last: Option<Instant>,
}

impl Default for PrintCooldown {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl PrintCooldown {
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    /// Claim the printer now, or fail with [`PrinterError::Busy`].
    pub fn try_begin(&mut self) -> Result<(), PrinterError> {
        self.try_begin_at(Instant::now())
    }

    pub fn try_begin_at(&mut self, now: Instant) -> Result<(), PrinterError> {
        if let Some(remaining) = self.remaining_at(now) {
            return Err(PrinterError::Busy(format!(
                "previous print still cooling down ({} ms left)",
                remaining.as_millis()
            )));
        }
        self.last = Some(now);
        Ok(())
    }

    /// Time left before the next print is accepted.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        let last = self.last?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < self.period).then(|| self.period - elapsed)
    }
}

/// Format `fields` with `template` and send the job over `manager`.
///
/// With no `family`, the driver is chosen from the connected device's name.
/// With no `capacity`, the job buffer is sized by the family's profile.
/// Returns the number of bytes written. Errors are also recorded on the
/// manager's status.
#[instrument(skip_all, fields(template = %template))]
pub async fn print_receipt(
    manager: &ConnectionManager,
    family: Option<PrinterFamily>,
    template: Template,
    fields: &ReceiptFields,
    assets: &dyn AssetStore,
    capacity: Option<usize>,
) -> Result<usize, PrinterError> {
    let result = send_receipt(manager, family, template, fields, assets, capacity).await;
    if let Err(e) = &result {
        warn!(error = %e, "print failed");
        manager.record_error(e).await;
    }
    result
}

async fn send_receipt(
    manager: &ConnectionManager,
    family: Option<PrinterFamily>,
    template: Template,
    fields: &ReceiptFields,
    assets: &dyn AssetStore,
    capacity: Option<usize>,
) -> Result<usize, PrinterError> {
    let family = match family {
        Some(family) => family,
        None => {
            let status = manager.status().await;
            let device = status.state.device().ok_or_else(|| {
                PrinterError::UnsupportedPrinter("no connected device to pick a driver from".into())
            })?;
            PrinterFamily::from_device_name(&device.name)?
        }
    };

    let bytes = {
        let capacity = capacity.unwrap_or(family.profile().buffer_capacity);
        let mut driver = family.driver(capacity);
        format_receipt(template, fields, driver.as_mut(), assets)?
    };

    manager.write(&bytes).await?;
    info!(%family, bytes = bytes.len(), "receipt sent");
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_rejects_then_allows() {
        let mut cooldown = PrintCooldown::new(Duration::from_secs(2));
        let t0 = Instant::now();
        cooldown.try_begin_at(t0).unwrap();

        let err = cooldown.try_begin_at(t0 + Duration::from_millis(500)).unwrap_err();
        assert!(matches!(err, PrinterError::Busy(_)));
        assert_eq!(
            cooldown.remaining_at(t0 + Duration::from_millis(500)),
            Some(Duration::from_millis(1500))
        );

        cooldown.try_begin_at(t0 + Duration::from_secs(2)).unwrap();
    }

    #[test]
    fn test_rejected_attempt_does_not_restart_cooldown() {
        let mut cooldown = PrintCooldown::default();
        let t0 = Instant::now();
        cooldown.try_begin_at(t0).unwrap();
        assert!(cooldown.try_begin_at(t0 + Duration::from_secs(1)).is_err());
        assert!(cooldown.try_begin_at(t0 + Duration::from_secs(2)).is_ok());
    }
}
