//! Bluetooth address formatting.
//!
//! WinRT reports addresses as 48-bit integers; the picker shows and stores
//! them in the usual colon-separated hex form.

use anyhow::Result;

/// Format a 48-bit address as `AA:BB:CC:DD:EE:FF`.
pub fn format_address(address: u64) -> String {
    let bytes = address.to_be_bytes();
    bytes[2..]
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parse `AA:BB:CC:DD:EE:FF` (or the bare 12-digit hex form) into a 48-bit address.
pub fn parse_address(address: &str) -> Result<u64> {
    let hex = address.replace([':', '-'], "");

    if hex.len() != 12 {
        return Err(anyhow::anyhow!("Invalid Bluetooth address: {}", address));
    }

    Ok(u64::from_str_radix(&hex, 16)?)
}
