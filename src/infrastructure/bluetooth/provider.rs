//! Scan Provider Seam
//!
//! The picker drives discovery through [`ScanProvider`]; the radio-level work
//! lives behind it.

use crate::domain::models::Advertisement;
use crate::error::ScanError;
use std::sync::Arc;
use tracing::info;

/// Invoked once per received advertisement, possibly on a provider-owned thread.
pub type DiscoveryCallback = Arc<dyn Fn(Advertisement) + Send + Sync>;

/// A BLE discovery backend.
pub trait ScanProvider: Send {
    /// Prepare the backend. Called once before the first scan.
    fn init(&mut self) -> Result<(), ScanError> {
        Ok(())
    }

    /// Start delivering advertisements to `callback` until [`stop_scan`](Self::stop_scan).
    fn start_scan(&mut self, callback: DiscoveryCallback) -> Result<(), ScanError>;

    /// Stop delivering advertisements. Must be safe to call when not scanning.
    fn stop_scan(&mut self) -> Result<(), ScanError>;
}

/// Provider for platforms without a supported backend. It never starts.
pub struct UnavailableScanProvider {
    reason: String,
}

impl UnavailableScanProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ScanProvider for UnavailableScanProvider {
    fn init(&mut self) -> Result<(), ScanError> {
        Err(ScanError::Unavailable(self.reason.clone()))
    }

    fn start_scan(&mut self, _callback: DiscoveryCallback) -> Result<(), ScanError> {
        Err(ScanError::Unavailable(self.reason.clone()))
    }

    fn stop_scan(&mut self) -> Result<(), ScanError> {
        Ok(())
    }
}

/// The default provider for the current platform.
pub fn platform_provider() -> Box<dyn ScanProvider> {
    #[cfg(windows)]
    {
        info!("Using WinRT advertisement watcher for BLE discovery");
        Box::new(super::scanner::WinRtScanProvider::new())
    }

    #[cfg(not(windows))]
    {
        info!("No BLE discovery backend for {}", std::env::consts::OS);
        Box::new(UnavailableScanProvider::new(format!(
            "BLE scanning is not supported on {}",
            std::env::consts::OS
        )))
    }
}
