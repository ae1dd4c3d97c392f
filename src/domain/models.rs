use serde::{Deserialize, Serialize};
use std::fmt;

/// Label shown for devices that advertise no name.
pub const DEFAULT_UNNAMED_LABEL: &str = "Unknown";

/// A discovered peripheral: display name plus hardware address.
///
/// Records are immutable once built. The name may be empty when the
/// device does not advertise one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceRecord {
    name: String,
    address: String,
}

impl DeviceRecord {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Row text for the picker list: `"name (address)"`.
    pub fn display_label(&self, unnamed_label: &str) -> String {
        let name = if self.name.is_empty() {
            unnamed_label
        } else {
            &self.name
        };
        format!("{} ({})", name, self.address)
    }

    /// Whether `other` denotes the same device under the given identity policy.
    pub fn same_device(&self, other: &DeviceRecord, key: DedupKey) -> bool {
        match key {
            DedupKey::NameAndAddress => self == other,
            DedupKey::Address => self.address.eq_ignore_ascii_case(&other.address),
        }
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_label(DEFAULT_UNNAMED_LABEL))
    }
}

/// Identity policy used to drop repeated discoveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupKey {
    /// Name and address together (two records differing only by name are distinct)
    #[default]
    NameAndAddress,
    /// Address alone
    Address,
}

/// Payload a scan provider hands to the discovery callback.
#[derive(Debug, Clone, Default)]
pub struct Advertisement {
    pub name: Option<String>,
    pub address: String,
    /// RSSI in dBm
    pub signal_strength: i16,
    /// Raw advertisement data (AD structures as received)
    pub raw_data: Vec<u8>,
}

impl Advertisement {
    pub fn to_record(&self) -> DeviceRecord {
        DeviceRecord::new(self.name.clone().unwrap_or_default(), self.address.clone())
    }
}

/// Lifecycle of one picker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    /// Constructed, scan not yet started
    Idle,
    /// Scan session active, list accepting discoveries
    Scanning,
    /// Open, but the scan provider could not be started; the list stays empty
    Stalled,
    /// Scan stopped after a selection, handoff in progress
    Selecting,
    /// Terminal
    Closed,
}

impl PickerState {
    /// The dialog is visible and accepts user input.
    pub fn is_open(self) -> bool {
        matches!(self, PickerState::Scanning | PickerState::Stalled)
    }
}

// Host application events

#[derive(Debug, Clone)]
pub enum AppEvent {
    ConnectionStatus(ConnectionStatus),
    LogMessage(StatusMessage),
}

#[derive(Debug, Clone)]
pub enum BluetoothCommand {
    Connect(DeviceRecord),
    Disconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>, severity: MessageSeverity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}
