//! BLE Connection Module
//!
//! Opens the device picked by the user and keeps the link alive. Reports
//! progress and link state as [`AppEvent`]s.

use crate::domain::models::{AppEvent, DeviceRecord, MessageSeverity, StatusMessage};
use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

#[cfg(windows)]
use crate::domain::models::ConnectionStatus;
#[cfg(windows)]
use crate::infrastructure::bluetooth::address::parse_address;
#[cfg(windows)]
use tracing::warn;
#[cfg(windows)]
use windows::Devices::Bluetooth::GenericAttributeProfile::GattSession;
#[cfg(windows)]
use windows::Devices::Bluetooth::{BluetoothConnectionStatus, BluetoothLEDevice};
#[cfg(windows)]
use windows::Foundation::TypedEventHandler;

#[cfg(windows)]
struct OpenDevice {
    device: BluetoothLEDevice,
    // Holding the session keeps Windows from dropping the link
    _session: Option<GattSession>,
    status_token: i64,
}

pub struct BleConnection {
    event_sender: mpsc::UnboundedSender<AppEvent>,
    #[cfg(windows)]
    open: Option<OpenDevice>,
}

impl BleConnection {
    pub fn new(event_sender: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            event_sender,
            #[cfg(windows)]
            open: None,
        }
    }

    #[cfg(windows)]
    pub async fn connect(&mut self, record: &DeviceRecord) -> Result<()> {
        self.disconnect();

        let address = parse_address(record.address())?;
        info!("Connecting to {}", record);
        self.send_log(&format!("Connecting to {}...", record), MessageSeverity::Info);

        let device = BluetoothLEDevice::FromBluetoothAddressAsync(address)?.await?;
        info!("Device opened: {:?}", device.Name()?);

        let session = match self.create_gatt_session(&device).await {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Failed to create GattSession, link may drop: {}", e);
                None
            }
        };

        let sender = self.event_sender.clone();
        let status_token = device.ConnectionStatusChanged(&TypedEventHandler::new(
            move |dev: windows::core::Ref<BluetoothLEDevice>, _| {
                if let Some(dev) = dev.as_ref() {
                    if let Ok(status) = dev.ConnectionStatus() {
                        let app_status = match status {
                            BluetoothConnectionStatus::Connected => ConnectionStatus::Connected,
                            BluetoothConnectionStatus::Disconnected => {
                                ConnectionStatus::Disconnected
                            }
                            _ => ConnectionStatus::Error,
                        };
                        let _ = sender.send(AppEvent::ConnectionStatus(app_status));
                    }
                }
                Ok(())
            },
        ))?;

        self.open = Some(OpenDevice {
            device,
            _session: session,
            status_token,
        });

        self.send_log(&format!("Connected to {}", record), MessageSeverity::Success);
        let _ = self
            .event_sender
            .send(AppEvent::ConnectionStatus(ConnectionStatus::Connected));
        Ok(())
    }

    #[cfg(not(windows))]
    pub async fn connect(&mut self, record: &DeviceRecord) -> Result<()> {
        info!("Cannot connect to {}: no BLE backend", record);
        self.send_log("No Bluetooth backend on this platform", MessageSeverity::Warning);
        anyhow::bail!(
            "BLE connections are not supported on {}",
            std::env::consts::OS
        )
    }

    #[cfg(windows)]
    async fn create_gatt_session(&self, device: &BluetoothLEDevice) -> Result<GattSession> {
        let device_id = device.BluetoothDeviceId()?;
        let session = GattSession::FromDeviceIdAsync(&device_id)?.await?;
        session.SetMaintainConnection(true)?;
        Ok(session)
    }

    #[cfg(windows)]
    pub fn disconnect(&mut self) {
        if let Some(open) = self.open.take() {
            let _ = open.device.RemoveConnectionStatusChanged(open.status_token);
            let _ = open.device.Close();
            info!("Disconnected from device");
            self.send_log("Disconnected from device", MessageSeverity::Info);
        }
    }

    #[cfg(not(windows))]
    pub fn disconnect(&mut self) {}

    #[cfg(windows)]
    pub fn is_connected(&self) -> bool {
        self.open
            .as_ref()
            .and_then(|o| o.device.ConnectionStatus().ok())
            .map(|s| s == BluetoothConnectionStatus::Connected)
            .unwrap_or(false)
    }

    #[cfg(not(windows))]
    pub fn is_connected(&self) -> bool {
        false
    }

    fn send_log(&self, message: &str, severity: MessageSeverity) {
        let _ = self
            .event_sender
            .send(AppEvent::LogMessage(StatusMessage::new(message, severity)));
    }
}
