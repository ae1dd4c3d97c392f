use crate::domain::models::PickerState;
use thiserror::Error;

/// Failures reported by a scan provider.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Bluetooth scanning unavailable: {0}")]
    Unavailable(String),

    #[error("Bluetooth platform error: {0}")]
    Platform(String),

    #[error("A scan is already in progress")]
    AlreadyScanning,
}

#[cfg(windows)]
impl From<windows::core::Error> for ScanError {
    fn from(e: windows::core::Error) -> Self {
        ScanError::Platform(e.to_string())
    }
}

/// Failures surfaced by the device picker.
#[derive(Debug, Error)]
pub enum PickerError {
    /// The selected row does not exist in the current list.
    #[error("Selection index {index} out of range ({len} devices listed)")]
    OutOfRange { index: usize, len: usize },

    #[error("Device picker is closed")]
    Closed,

    #[error("Operation not allowed while picker is {0:?}")]
    InvalidState(PickerState),
}

pub type Result<T> = std::result::Result<T, PickerError>;
