//! Bluetooth Module
//!
//! Discovery and connection backends behind the device picker.
//!
//! ## Architecture
//!
//! ```text
//!        DevicePicker (UI thread)
//!          │                 ▲
//!   start/stop scan     DeviceRecord queue
//!          ▼                 │
//! ┌──────────────────────────┴──┐    ┌──────────────────────────────┐
//! │ ScanProvider                │    │ WorkerConnectionManager      │
//! │  - WinRtScanProvider        │    │  └─> BluetoothService        │
//! │  - UnavailableScanProvider  │    │       (worker thread)        │
//! └─────────────────────────────┘    └──────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`provider`] - Scan provider trait and the platform default
//! - [`scanner`] - WinRT advertisement watcher (Windows only)
//! - [`connection`] - Opening and holding the selected device
//! - [`service`] - Worker thread and the picker's connection manager
//! - [`address`] - Address formatting

pub mod address;
pub mod connection;
pub mod provider;
#[cfg(windows)]
pub mod scanner;
pub mod service;

pub use provider::{platform_provider, DiscoveryCallback, ScanProvider};
pub use service::{spawn_worker, BluetoothService, WorkerConnectionManager};
