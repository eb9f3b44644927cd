/*!
LCD2USB wire protocol: opcode layout, controller targeting and request packing.

The interface speaks vendor control transfers whose request byte carries the
command class, the target/sub-selector and the payload length:

```text
 7 6 5 4 3 2 1 0
 C C C T T R L L

 CCC = command class
 TT  = target bit map (CMD/DATA) or sub-code (SET/GET)
 R   = reserved, always 0
 LL  = payload length - 1
```

Up to four payload bytes ride in the 16-bit `value` and `index` fields of a
single transfer; the firmware uses `LL` to know how many of them are live.
*/

use std::fmt;

/// USB vendor id of the LCD2USB interface (donated by FTDI)
pub const VENDOR_ID: u16 = 0x0403;

/// USB product id of the LCD2USB interface
pub const PRODUCT_ID: u16 = 0xC630;

/// Maximum number of payload bytes one control transfer can carry
pub const MAX_BATCH_LEN: usize = 4;

/// Number of buttons on the interface board
pub const BUTTON_COUNT: u8 = 2;

/// Command class values for the opcode byte (bits 7-5)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandClass {
    Echo = 0 << 5,
    Cmd = 1 << 5,
    Data = 2 << 5,
    Set = 3 << 5,
    Get = 4 << 5,
}

impl CommandClass {
    /// Parse the class from a full opcode byte
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode >> 5 {
            0 => Some(Self::Echo),
            1 => Some(Self::Cmd),
            2 => Some(Self::Data),
            3 => Some(Self::Set),
            4 => Some(Self::Get),
            _ => None,
        }
    }
}

/// Bit map of the physical controller chips a CMD/DATA transfer targets.
///
/// The bits are kept in their protocol position (bit 3 = first chip, bit 4 =
/// second chip) so a map ORs straight into the opcode byte. An empty map means
/// no usable controller was detected; writes become no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerMap(u8);

impl ControllerMap {
    /// No controllers
    pub const EMPTY: Self = Self(0);

    /// First controller chip
    pub const CTRL0: Self = Self(1 << 3);

    /// Second controller chip
    pub const CTRL1: Self = Self(1 << 4);

    /// Both controller chips
    pub const BOTH: Self = Self((1 << 3) | (1 << 4));

    /// Build a map from the raw `GET CTRL` query result
    /// (bit 0 = first chip installed, bit 1 = second chip installed)
    pub fn from_query(raw: u16) -> Self {
        let mut map = Self::EMPTY;
        if raw & 1 != 0 {
            map = map.union(Self::CTRL0);
        }
        if raw & 2 != 0 {
            map = map.union(Self::CTRL1);
        }
        map
    }

    /// Raw protocol-position bits of this map
    pub fn bits(self) -> u8 {
        self.0
    }

    /// True if no controller is present
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every controller in `other` is also in `self`
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Controllers present in both maps
    pub fn mask(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Controllers present in either map
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl fmt::Display for ControllerMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.contains(Self::CTRL0), self.contains(Self::CTRL1)) {
            (true, true) => write!(f, "CTRL0 CTRL1"),
            (true, false) => write!(f, "CTRL0"),
            (false, true) => write!(f, "CTRL1"),
            (false, false) => write!(f, "none"),
        }
    }
}

/// A batching equivalence class: an opcode byte with the length bits zero.
///
/// Two enqueued bytes may share one control transfer exactly when their
/// `BatchKey`s are equal, so "CMD targeting CTRL0" and "CMD targeting CTRL1"
/// are distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchKey(u8);

impl BatchKey {
    /// Echo transfer (read direction)
    pub const ECHO: Self = Self(CommandClass::Echo as u8);

    /// Set display contrast
    pub const SET_CONTRAST: Self = Self(CommandClass::Set as u8);

    /// Set backlight brightness
    pub const SET_BRIGHTNESS: Self = Self(CommandClass::Set as u8 | (1 << 3));

    /// Query firmware version
    pub const GET_FWVER: Self = Self(CommandClass::Get as u8);

    /// Query button state
    pub const GET_BUTTONS: Self = Self(CommandClass::Get as u8 | (1 << 3));

    /// Query the installed-controller bit mask
    pub const GET_CTRL: Self = Self(CommandClass::Get as u8 | (2 << 3));

    /// Command byte(s) for the given controller target(s)
    pub fn cmd(target: ControllerMap) -> Self {
        Self(CommandClass::Cmd as u8 | target.bits())
    }

    /// Data byte(s) for the given controller target(s)
    pub fn data(target: ControllerMap) -> Self {
        Self(CommandClass::Data as u8 | target.bits())
    }

    /// The command class encoded in this key
    pub fn class(self) -> Option<CommandClass> {
        CommandClass::from_opcode(self.0)
    }

    /// Full opcode byte for a transfer carrying `len` payload bytes
    pub fn opcode(self, len: usize) -> u8 {
        debug_assert!(len >= 1 && len <= MAX_BATCH_LEN);
        self.0 | (len as u8 - 1)
    }

    /// Opcode byte for a read-direction transfer (no payload length)
    pub fn read_opcode(self) -> u8 {
        self.0
    }
}

/// One USB control transfer: an opcode byte plus two 16-bit payload fields.
///
/// Bytes 0-1 of a batch pack little-end-first into `value`, bytes 2-3 into
/// `index`; slots beyond the batch length stay zero and are ignored by the
/// firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub opcode: u8,
    pub value: u16,
    pub index: u16,
}

impl Request {
    /// Pack a batch of 1-4 bytes into a single transfer
    pub fn pack(key: BatchKey, bytes: &[u8]) -> Self {
        debug_assert!(!bytes.is_empty() && bytes.len() <= MAX_BATCH_LEN);

        let mut slots = [0u8; MAX_BATCH_LEN];
        slots[..bytes.len()].copy_from_slice(bytes);

        Self {
            opcode: key.opcode(bytes.len()),
            value: u16::from(slots[0]) | (u16::from(slots[1]) << 8),
            index: u16::from(slots[2]) | (u16::from(slots[3]) << 8),
        }
    }

    /// Payload length encoded in the opcode
    pub fn len(&self) -> usize {
        (self.opcode & 0x03) as usize + 1
    }

    /// Recover the payload bytes from the `value`/`index` fields
    pub fn payload(&self) -> ([u8; MAX_BATCH_LEN], usize) {
        let bytes = [
            (self.value & 0xff) as u8,
            (self.value >> 8) as u8,
            (self.index & 0xff) as u8,
            (self.index >> 8) as u8,
        ];
        (bytes, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_from_opcode() {
        assert_eq!(CommandClass::from_opcode(0x00), Some(CommandClass::Echo));
        assert_eq!(CommandClass::from_opcode(0x2B), Some(CommandClass::Cmd));
        assert_eq!(CommandClass::from_opcode(0x48), Some(CommandClass::Data));
        assert_eq!(CommandClass::from_opcode(0x60), Some(CommandClass::Set));
        assert_eq!(CommandClass::from_opcode(0x90), Some(CommandClass::Get));
        assert_eq!(CommandClass::from_opcode(0xE0), None); // class 7 unused
    }

    #[test]
    fn test_controller_map_from_query() {
        assert_eq!(ControllerMap::from_query(0), ControllerMap::EMPTY);
        assert_eq!(ControllerMap::from_query(1), ControllerMap::CTRL0);
        assert_eq!(ControllerMap::from_query(2), ControllerMap::CTRL1);
        assert_eq!(ControllerMap::from_query(3), ControllerMap::BOTH);
        // upper bits of the query result are ignored
        assert_eq!(ControllerMap::from_query(0xFF01), ControllerMap::CTRL0);
    }

    #[test]
    fn test_controller_map_masking() {
        assert!(ControllerMap::BOTH.contains(ControllerMap::CTRL1));
        assert!(!ControllerMap::CTRL0.contains(ControllerMap::CTRL1));
        assert_eq!(
            ControllerMap::BOTH.mask(ControllerMap::CTRL0),
            ControllerMap::CTRL0
        );
        assert!(ControllerMap::CTRL0.mask(ControllerMap::CTRL1).is_empty());
    }

    #[test]
    fn test_batch_key_opcodes() {
        // CMD to CTRL0 carrying 1 byte: class 001, target 01, len-1 = 0
        assert_eq!(BatchKey::cmd(ControllerMap::CTRL0).opcode(1), 0x28);
        // DATA to both controllers carrying 4 bytes
        assert_eq!(BatchKey::data(ControllerMap::BOTH).opcode(4), 0x5B);
        // SET/GET sub-codes sit in the target bits
        assert_eq!(BatchKey::SET_BRIGHTNESS.opcode(1), 0x68);
        assert_eq!(BatchKey::GET_CTRL.read_opcode(), 0x90);
    }

    #[test]
    fn test_request_roundtrip_full_batch() {
        let bytes = [b'H', b'E', b'L', b'L'];
        let req = Request::pack(BatchKey::data(ControllerMap::CTRL0), &bytes);

        assert_eq!(req.opcode, 0x4B);
        assert_eq!(req.value, 0x4548);
        assert_eq!(req.index, 0x4C4C);

        let (recovered, len) = req.payload();
        assert_eq!(len, 4);
        assert_eq!(recovered, bytes);
    }

    #[test]
    fn test_request_short_batch_zero_fills() {
        let req = Request::pack(BatchKey::cmd(ControllerMap::CTRL1), &[0x80]);

        assert_eq!(req.opcode, 0x30);
        assert_eq!(req.value, 0x0080);
        assert_eq!(req.index, 0);

        let (bytes, len) = req.payload();
        assert_eq!(len, 1);
        assert_eq!(bytes[0], 0x80);
    }
}
