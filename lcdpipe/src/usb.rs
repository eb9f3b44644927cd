/*!
rusb-backed transport primitives: device discovery and the raw vendor control
transfers. Everything above this file is bus-agnostic.
*/

use std::time::Duration;

use rusb::{DeviceHandle, Direction, GlobalContext, Recipient, RequestType};
use tracing::info;

use lcd2usb::protocol::{PRODUCT_ID, VENDOR_ID};
use lcd2usb::transport::{ControlLink, LinkOpener};
use lcd2usb::{DiscoveryError, Result, TransportError};

/// Finds and claims the LCD2USB interface, optionally pinned to a specific
/// bus number and device address.
///
/// The filters persist across reconnects, so a re-open after a transfer
/// failure finds the same physical device again.
pub struct UsbOpener {
    pub bus: Option<u8>,
    pub address: Option<u8>,
}

impl LinkOpener for UsbOpener {
    type Link = UsbLink;

    fn open(&mut self) -> std::result::Result<UsbLink, DiscoveryError> {
        info!("🔍 Scanning USB for LCD2USB interface...");
        if let Some(bus) = self.bus {
            info!("scanning for bus: {bus}");
        }
        if let Some(address) = self.address {
            info!("scanning for device address: {address}");
        }

        let devices = rusb::devices().map_err(|e| DiscoveryError::Bus(e.to_string()))?;
        for device in devices.iter() {
            if self.bus.is_some_and(|b| b != device.bus_number()) {
                continue;
            }
            if self.address.is_some_and(|a| a != device.address()) {
                continue;
            }

            let descriptor = match device.device_descriptor() {
                Ok(d) => d,
                Err(_) => continue,
            };
            if descriptor.vendor_id() != VENDOR_ID || descriptor.product_id() != PRODUCT_ID {
                continue;
            }

            info!(
                "✅ Found LCD2USB interface on bus {} device {}",
                device.bus_number(),
                device.address()
            );

            let mut handle = device.open().map_err(|e| DiscoveryError::Bus(e.to_string()))?;
            handle
                .claim_interface(0)
                .map_err(|e| DiscoveryError::Claim(e.to_string()))?;
            return Ok(UsbLink { handle });
        }

        Err(DiscoveryError::NotFound)
    }
}

/// An open, claimed LCD2USB device handle
pub struct UsbLink {
    handle: DeviceHandle<GlobalContext>,
}

impl ControlLink for UsbLink {
    fn control_write(&mut self, opcode: u8, value: u16, index: u16, timeout: Duration) -> Result<()> {
        let request_type = rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);
        self.handle
            .write_control(request_type, opcode, value, index, &[], timeout)
            .map_err(|e| TransportError::Transfer(e.to_string()))?;
        Ok(())
    }

    fn control_read(&mut self, opcode: u8, value: u16, timeout: Duration) -> Result<u16> {
        let request_type = rusb::request_type(Direction::In, RequestType::Vendor, Recipient::Device);
        let mut buffer = [0u8; 2];
        let n = self
            .handle
            .read_control(request_type, opcode, value, 0, &mut buffer, timeout)
            .map_err(|e| TransportError::Transfer(e.to_string()))?;
        if n < buffer.len() {
            return Err(TransportError::ShortRead {
                expected: buffer.len(),
                got: n,
            });
        }
        Ok(u16::from(buffer[0]) | (u16::from(buffer[1]) << 8))
    }
}

impl Drop for UsbLink {
    fn drop(&mut self) {
        // the handle itself closes when rusb drops it
        let _ = self.handle.release_interface(0);
    }
}
