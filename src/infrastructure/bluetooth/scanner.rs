//! WinRT Scan Provider
//!
//! Discovers BLE peripherals with `BluetoothLEAdvertisementWatcher`. The
//! watcher raises `Received` on a WinRT thread-pool thread, so the callback
//! only builds an [`Advertisement`] and hands it on.

use crate::domain::models::Advertisement;
use crate::error::ScanError;
use crate::infrastructure::bluetooth::address::format_address;
use crate::infrastructure::bluetooth::provider::{DiscoveryCallback, ScanProvider};
use tracing::{info, warn};
use windows::Devices::Bluetooth::Advertisement::{
    BluetoothLEAdvertisement, BluetoothLEAdvertisementReceivedEventArgs,
    BluetoothLEAdvertisementWatcher, BluetoothLEScanningMode,
};
use windows::Foundation::TypedEventHandler;
use windows::Storage::Streams::DataReader;

pub struct WinRtScanProvider {
    watcher: Option<BluetoothLEAdvertisementWatcher>,
    received_token: Option<i64>,
}

impl WinRtScanProvider {
    pub fn new() -> Self {
        Self {
            watcher: None,
            received_token: None,
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.received_token.is_some()
    }
}

impl Default for WinRtScanProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanProvider for WinRtScanProvider {
    fn init(&mut self) -> Result<(), ScanError> {
        if self.watcher.is_none() {
            let watcher = BluetoothLEAdvertisementWatcher::new()?;
            watcher.SetScanningMode(BluetoothLEScanningMode::Active)?;
            self.watcher = Some(watcher);
        }
        Ok(())
    }

    fn start_scan(&mut self, callback: DiscoveryCallback) -> Result<(), ScanError> {
        if self.is_scanning() {
            return Err(ScanError::AlreadyScanning);
        }
        self.init()?;
        let watcher = self
            .watcher
            .as_ref()
            .ok_or_else(|| ScanError::Unavailable("advertisement watcher missing".into()))?;

        info!("Starting BLE advertisement watcher");

        let handler = TypedEventHandler::new(
            move |_: windows::core::Ref<BluetoothLEAdvertisementWatcher>,
                  args: windows::core::Ref<BluetoothLEAdvertisementReceivedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let adv = args.Advertisement()?;
                    let name = adv.LocalName()?.to_string();

                    callback(Advertisement {
                        name: if name.is_empty() { None } else { Some(name) },
                        address: format_address(args.BluetoothAddress()?),
                        signal_strength: args.RawSignalStrengthInDBm()?,
                        raw_data: raw_advertisement(&adv).unwrap_or_default(),
                    });
                }
                Ok(())
            },
        );

        let token = watcher.Received(&handler)?;
        if let Err(e) = watcher.Start() {
            let _ = watcher.RemoveReceived(token);
            return Err(e.into());
        }
        self.received_token = Some(token);
        Ok(())
    }

    fn stop_scan(&mut self) -> Result<(), ScanError> {
        if let (Some(watcher), Some(token)) = (self.watcher.as_ref(), self.received_token.take()) {
            info!("Stopping BLE advertisement watcher");
            watcher.Stop()?;
            watcher.RemoveReceived(token)?;
        }
        Ok(())
    }
}

impl Drop for WinRtScanProvider {
    fn drop(&mut self) {
        if let Err(e) = self.stop_scan() {
            warn!("Failed to stop advertisement watcher: {}", e);
        }
    }
}

/// Re-encode the advertisement's data sections as length/type/value structures.
fn raw_advertisement(adv: &BluetoothLEAdvertisement) -> windows::core::Result<Vec<u8>> {
    let sections = adv.DataSections()?;
    let mut raw = Vec::new();

    for i in 0..sections.Size()? {
        let section = sections.GetAt(i)?;
        let reader = DataReader::FromBuffer(&section.Data()?)?;
        let mut data = vec![0u8; reader.UnconsumedBufferLength()? as usize];
        reader.ReadBytes(&mut data)?;

        raw.push((data.len() + 1) as u8);
        raw.push(section.DataType()?);
        raw.extend_from_slice(&data);
    }

    Ok(raw)
}
