/*!
High-level display operations: positioned writes, clearing, contrast and
brightness, and the startup queries that establish which controller chips are
actually installed.
*/

use tracing::{info, warn};

use crate::addressing::Geometry;
use crate::encoder::CommandEncoder;
use crate::error::Result;
use crate::protocol::{BatchKey, ControllerMap};
use crate::transport::Transport;

/// HD44780 "clear display" command byte
const CMD_CLEAR: u8 = 0x01;

/// HD44780 "return home" command byte
const CMD_HOME: u8 = 0x03;

/// HD44780 "set DDRAM address" command, ORed with the position
const CMD_SET_POSITION: u8 = 0x80;

/// Query the interface for its installed-controller bit mask.
///
/// Any failure is treated as "no controllers": better to drop writes on the
/// floor than to address hardware that may not exist.
pub fn detect_controllers<T: Transport>(transport: &mut T) -> ControllerMap {
    match transport.get(BatchKey::GET_CTRL.read_opcode(), 0) {
        Ok(raw) => {
            let map = ControllerMap::from_query(raw);
            if map.is_empty() {
                warn!("no controllers found");
            } else {
                info!("installed controllers: {map}");
            }
            map
        }
        Err(e) => {
            warn!("unable to read installed controllers: {e}");
            ControllerMap::EMPTY
        }
    }
}

/// Query the interface firmware version as (major, minor)
pub fn firmware_version<T: Transport>(transport: &mut T) -> Result<(u8, u8)> {
    let raw = transport.get(BatchKey::GET_FWVER.read_opcode(), 0)?;
    Ok(((raw & 0xff) as u8, (raw >> 8) as u8))
}

/// A character LCD behind the LCD2USB interface.
///
/// Owns the command encoder (and through it the transport) plus the logical
/// geometry. All operations are durable on return: each one ends in a flush.
pub struct Display<T: Transport> {
    encoder: CommandEncoder<T>,
    geometry: Geometry,
}

impl<T: Transport> Display<T> {
    /// Wrap a transport whose controller map is already known
    pub fn new(transport: T, geometry: Geometry, controllers: ControllerMap) -> Self {
        Self {
            encoder: CommandEncoder::new(transport, controllers),
            geometry,
        }
    }

    /// Query the device for its installed controllers and wrap the transport
    pub fn detect(mut transport: T, geometry: Geometry) -> Self {
        let controllers = detect_controllers(&mut transport);
        Self::new(transport, geometry, controllers)
    }

    pub fn controllers(&self) -> ControllerMap {
        self.encoder.controllers()
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn command(&mut self, target: ControllerMap, byte: u8) -> Result<()> {
        let target = target.mask(self.encoder.controllers());
        self.encoder.enqueue(BatchKey::cmd(target), byte)
    }

    /// Write `data` starting at the given logical cell.
    ///
    /// Sets the owning chip's address register, streams the bytes, then
    /// flushes. Empty `data` still issues the cursor-set command.
    pub fn write(&mut self, row: u8, column: u8, data: &[u8]) -> Result<()> {
        let (target, position) = self.geometry.locate(row, column);
        let target = target.mask(self.encoder.controllers());

        self.encoder
            .enqueue(BatchKey::cmd(target), CMD_SET_POSITION | position)?;
        for &byte in data {
            self.encoder.enqueue(BatchKey::data(target), byte)?;
        }
        self.encoder.flush()
    }

    /// Clear the whole display and return the cursor home
    pub fn clear(&mut self) -> Result<()> {
        self.command(ControllerMap::BOTH, CMD_CLEAR)?;
        self.command(ControllerMap::BOTH, CMD_HOME)?;
        self.encoder.flush()
    }

    /// Set the display contrast (0-255)
    pub fn set_contrast(&mut self, contrast: u8) -> Result<()> {
        self.encoder
            .submit(BatchKey::SET_CONTRAST, u16::from(contrast), 0)
    }

    /// Set the backlight brightness (0-255)
    pub fn set_brightness(&mut self, brightness: u8) -> Result<()> {
        self.encoder
            .submit(BatchKey::SET_BRIGHTNESS, u16::from(brightness), 0)
    }

    /// Read the current button state bit mask
    pub fn read_buttons(&mut self) -> Result<u8> {
        Ok((self.encoder.query(BatchKey::GET_BUTTONS)? & 0xff) as u8)
    }

    #[cfg(test)]
    fn transport(&self) -> &T {
        self.encoder.transport()
    }
}
