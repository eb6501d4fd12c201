//! nusb-based USB transport implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use nusb::transfer::{ControlIn, ControlOut, ControlType, Recipient, TransferError};
use nusb::{DeviceInfo, Interface, MaybeFuture, list_devices};
use tracing::{debug, info, instrument, warn};

use super::traits::{TransportError, UsbTransport};
use crate::protocol::ControlSetup;
use crate::protocol::constants::{CONTROL_TIMEOUT_MS, SHIKRA_IN_ENDPOINT, SHIKRA_OUT_ENDPOINT};

/// nusb-based USB transport.
pub struct NusbTransport {
    #[allow(dead_code)] // Keeps the device open for the lifetime of the interface
    device: nusb::Device,
    interface: Interface,
    in_endpoint: u8,
    out_endpoint: u8,
    vid: u16,
    pid: u16,
    timeout: Duration,
    /// Cleared once a transfer reports the device gone.
    connected: AtomicBool,
}

impl NusbTransport {
    /// Look for a device with the given VID/PID without opening it.
    #[instrument(level = "debug", fields(vid = format!("{:04X}", vid), pid = format!("{:04X}", pid)))]
    pub fn find(vid: u16, pid: u16) -> Result<Option<DeviceInfo>, TransportError> {
        let found = list_devices()
            .wait()
            .map_err(|e| TransportError::OpenFailed(e.to_string()))?
            .find(|d| d.vendor_id() == vid && d.product_id() == pid);
        Ok(found)
    }

    /// Find, open and configure the device with specific VID/PID.
    #[instrument(level = "info", fields(vid = format!("{:04X}", vid), pid = format!("{:04X}", pid)))]
    pub fn open_with_ids(vid: u16, pid: u16) -> Result<Self, TransportError> {
        let device_info = Self::find(vid, pid)?.ok_or(TransportError::DeviceNotFound { vid, pid })?;
        Self::configure(device_info)
    }

    /// Open a discovered device, claim interface 0 and resolve its bulk
    /// endpoints.
    pub fn configure(device_info: DeviceInfo) -> Result<Self, TransportError> {
        let vid = device_info.vendor_id();
        let pid = device_info.product_id();

        info!(
            vendor_id = %format!("{:04X}", vid),
            product_id = %format!("{:04X}", pid),
            "Found device"
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| TransportError::OpenFailed(e.to_string()))?;

        // The serial driver normally owns interface 0
        let interface = device
            .detach_and_claim_interface(0)
            .wait()
            .map_err(|e| TransportError::ClaimInterfaceFailed {
                interface: 0,
                message: e.to_string(),
            })?;

        let config = device
            .active_configuration()
            .map_err(|e| TransportError::OpenFailed(e.to_string()))?;

        let mut in_endpoint: u8 = 0;
        let mut out_endpoint: u8 = 0;

        for iface in config.interfaces() {
            if iface.interface_number() != 0 {
                continue;
            }
            for alt in iface.alt_settings() {
                for ep in alt.endpoints() {
                    if ep.transfer_type() == nusb::descriptors::TransferType::Bulk {
                        if ep.direction() == nusb::transfer::Direction::In {
                            in_endpoint = ep.address();
                        } else {
                            out_endpoint = ep.address();
                        }
                    }
                }
            }
        }

        if in_endpoint == 0 {
            return Err(TransportError::EndpointNotFound {
                ep_type: "Bulk".into(),
                direction: "In".into(),
            });
        }
        if out_endpoint == 0 {
            return Err(TransportError::EndpointNotFound {
                ep_type: "Bulk".into(),
                direction: "Out".into(),
            });
        }
        if in_endpoint != SHIKRA_IN_ENDPOINT || out_endpoint != SHIKRA_OUT_ENDPOINT {
            warn!(
                in_ep = %format!("0x{:02X}", in_endpoint),
                out_ep = %format!("0x{:02X}", out_endpoint),
                "Unexpected endpoint layout, is this a Shikra?"
            );
        }

        info!(
            in_ep = %format!("0x{:02X}", in_endpoint),
            out_ep = %format!("0x{:02X}", out_endpoint),
            "Device opened successfully"
        );

        Ok(Self {
            device,
            interface,
            in_endpoint,
            out_endpoint,
            vid,
            pid,
            timeout: Duration::from_millis(CONTROL_TIMEOUT_MS),
            connected: AtomicBool::new(true),
        })
    }

    pub fn in_endpoint(&self) -> u8 {
        self.in_endpoint
    }

    pub fn out_endpoint(&self) -> u8 {
        self.out_endpoint
    }
}

/// Split bmRequestType into nusb's type and recipient.
fn split_request_type(setup: ControlSetup) -> Result<(ControlType, Recipient), TransportError> {
    let control_type = match (setup.request_type >> 5) & 0x03 {
        0 => ControlType::Standard,
        1 => ControlType::Class,
        2 => ControlType::Vendor,
        _ => {
            return Err(TransportError::ControlFailed {
                setup,
                message: "reserved request type".into(),
            });
        }
    };
    let recipient = match setup.request_type & 0x1F {
        0 => Recipient::Device,
        1 => Recipient::Interface,
        2 => Recipient::Endpoint,
        _ => Recipient::Other,
    };
    Ok((control_type, recipient))
}

/// nusb cancels a control transfer that outlives its timeout.
fn map_transfer_error(setup: ControlSetup, err: TransferError, timeout: Duration) -> TransportError {
    match err {
        TransferError::Disconnected => TransportError::Disconnected,
        TransferError::Cancelled => TransportError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        },
        other => TransportError::ControlFailed {
            setup,
            message: other.to_string(),
        },
    }
}

impl NusbTransport {
    fn transfer_failed(&self, setup: ControlSetup, err: TransferError) -> TransportError {
        let mapped = map_transfer_error(setup, err, self.timeout);
        if matches!(mapped, TransportError::Disconnected) {
            self.connected.store(false, Ordering::Relaxed);
        }
        mapped
    }
}

impl UsbTransport for NusbTransport {
    #[instrument(skip(self, setup), fields(setup = %setup))]
    fn control_in(&self, setup: ControlSetup, length: u16) -> Result<Vec<u8>, TransportError> {
        let (control_type, recipient) = split_request_type(setup)?;
        let data = self
            .interface
            .control_in(
                ControlIn {
                    control_type,
                    recipient,
                    request: setup.request,
                    value: setup.value,
                    index: setup.index,
                    length,
                },
                self.timeout,
            )
            .wait()
            .map_err(|e| self.transfer_failed(setup, e))?;

        debug!(bytes_read = data.len(), "Control IN complete");
        Ok(data)
    }

    #[instrument(skip(self, setup, data), fields(setup = %setup, len = data.len()))]
    fn control_out(&self, setup: ControlSetup, data: &[u8]) -> Result<(), TransportError> {
        let (control_type, recipient) = split_request_type(setup)?;
        self.interface
            .control_out(
                ControlOut {
                    control_type,
                    recipient,
                    request: setup.request,
                    value: setup.value,
                    index: setup.index,
                    data,
                },
                self.timeout,
            )
            .wait()
            .map_err(|e| self.transfer_failed(setup, e))?;

        debug!("Control OUT complete");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn vendor_id(&self) -> u16 {
        self.vid
    }

    fn product_id(&self) -> u16 {
        self.pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_request_type() {
        let (ty, rcpt) = split_request_type(ControlSetup::read_word(0)).unwrap();
        assert_eq!(ty, ControlType::Vendor);
        assert_eq!(rcpt, Recipient::Device);

        let (ty, rcpt) = split_request_type(ControlSetup::write_word(0, 0)).unwrap();
        assert_eq!(ty, ControlType::Vendor);
        assert_eq!(rcpt, Recipient::Device);

        let reserved = ControlSetup {
            request_type: 0x60,
            ..ControlSetup::write_word(0, 0)
        };
        assert!(split_request_type(reserved).is_err());
    }

    #[test]
    fn test_map_transfer_error() {
        let setup = ControlSetup::read_word(4);
        let timeout = Duration::from_millis(CONTROL_TIMEOUT_MS);

        assert!(matches!(
            map_transfer_error(setup, TransferError::Cancelled, timeout),
            TransportError::Timeout { timeout_ms: 5000 }
        ));
        assert!(matches!(
            map_transfer_error(setup, TransferError::Disconnected, timeout),
            TransportError::Disconnected
        ));
        assert!(matches!(
            map_transfer_error(setup, TransferError::Stall, timeout),
            TransportError::ControlFailed { .. }
        ));
    }
}
