//! USB Transport layer abstraction.
//!
//! Defines the `UsbTransport` trait for vendor control transfers,
//! allowing different implementations (nusb, mock, etc.).

use thiserror::Error;

use crate::protocol::ControlSetup;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: VID={vid:04X} PID={pid:04X}")]
    DeviceNotFound { vid: u16, pid: u16 },

    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    #[error("Failed to claim interface {interface}: {message}")]
    ClaimInterfaceFailed { interface: u8, message: String },

    #[error("Endpoint not found: type={ep_type}, direction={direction}")]
    EndpointNotFound { ep_type: String, direction: String },

    #[error("Control transfer failed ({setup}): {message}")]
    ControlFailed { setup: ControlSetup, message: String },

    #[error("Unexpected reply length: expected {expected} bytes, got {actual}")]
    UnexpectedLength { expected: usize, actual: usize },

    #[error("Device disconnected")]
    Disconnected,

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Abstract USB transport interface.
///
/// An implementation is the caller-owned handle to exactly one opened and
/// configured device. The core only borrows it for the duration of a call.
pub trait UsbTransport: Send + Sync {
    /// Issue an IN control transfer, returning up to `length` bytes.
    fn control_in(&self, setup: ControlSetup, length: u16) -> Result<Vec<u8>, TransportError>;

    /// Issue an OUT control transfer with `data` as payload.
    fn control_out(&self, setup: ControlSetup, data: &[u8]) -> Result<(), TransportError>;

    /// Check if device is still connected.
    fn is_connected(&self) -> bool;

    /// Get the device VID.
    fn vendor_id(&self) -> u16;

    /// Get the device PID.
    fn product_id(&self) -> u16;
}
