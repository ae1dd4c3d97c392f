//! BLE device picker: scans for nearby Bluetooth Low Energy peripherals,
//! lists them and hands the user's choice to a connection manager.

pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

pub use domain::models::{Advertisement, DedupKey, DeviceRecord, PickerState};
pub use domain::picker::{ConnectionManager, DevicePicker, RenderNotifier};
pub use error::{PickerError, ScanError};
pub use infrastructure::bluetooth::{DiscoveryCallback, ScanProvider};
