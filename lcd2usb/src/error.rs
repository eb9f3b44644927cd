/*!
Common error types for the LCD2USB driver crates.
*/

use thiserror::Error;

/// Common result type used throughout the driver library
pub type Result<T> = std::result::Result<T, TransportError>;

/// A USB transfer failed for good, after the one reconnect-and-retry
/// attempt the transport layer allows itself
#[derive(Error, Debug)]
pub enum TransportError {
    /// The physical control transfer failed
    #[error("USB control transfer failed: {0}")]
    Transfer(String),

    /// The transfer failed and the device could not be re-opened
    #[error("device lost and reconnect failed: {0}")]
    Reconnect(#[from] DiscoveryError),

    /// The retried transfer failed as well
    #[error("retried USB control transfer failed: {0}")]
    RetryExhausted(String),

    /// The device returned fewer bytes than the query expects
    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },
}

/// Errors locating or claiming the LCD2USB interface
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// No device with the LCD2USB vendor/product id matched the filters
    #[error("no LCD2USB interface found")]
    NotFound,

    /// The device was found but its interface could not be claimed
    #[error("failed to claim interface: {0}")]
    Claim(String),

    /// The USB stack failed while enumerating or opening devices
    #[error("USB enumeration failed: {0}")]
    Bus(String),
}
