//! Control transfer setup packets for EEPROM word access.

use std::fmt;

use super::constants::*;

/// Setup stage of a vendor control transfer.
///
/// Only the fields the EEPROM protocol varies are carried; `wLength` is
/// supplied by the caller of an IN transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSetup {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
}

impl ControlSetup {
    /// Read one word at `index`.
    pub const fn read_word(index: u16) -> Self {
        Self {
            request_type: REQUEST_TYPE_VENDOR_IN,
            request: READ_EEPROM_REQUEST,
            value: 0,
            index,
        }
    }

    /// Write `value` to the word at `index`. The word travels in wValue.
    pub const fn write_word(index: u16, value: u16) -> Self {
        Self {
            request_type: REQUEST_TYPE_VENDOR_OUT,
            request: WRITE_EEPROM_REQUEST,
            value,
            index,
        }
    }

    /// Direction bit of bmRequestType (device-to-host).
    pub const fn is_in(&self) -> bool {
        self.request_type & 0x80 != 0
    }
}

impl fmt::Display for ControlSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bmRequestType=0x{:02X} bRequest=0x{:02X} wValue=0x{:04X} wIndex=0x{:04X}",
            self.request_type, self.request, self.value, self.index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_word_setup() {
        let setup = ControlSetup::read_word(0x12);
        assert_eq!(setup.request_type, 0xC0);
        assert_eq!(setup.request, 0x90);
        assert_eq!(setup.value, 0);
        assert_eq!(setup.index, 0x12);
        assert!(setup.is_in());
    }

    #[test]
    fn test_write_word_setup() {
        let setup = ControlSetup::write_word(127, 0xBEEF);
        assert_eq!(setup.request_type, 0x40);
        assert_eq!(setup.request, 0x91);
        assert_eq!(setup.value, 0xBEEF);
        assert_eq!(setup.index, 127);
        assert!(!setup.is_in());
    }

    #[test]
    fn test_display() {
        let s = ControlSetup::write_word(1, 0xFFFF).to_string();
        assert_eq!(
            s,
            "bmRequestType=0x40 bRequest=0x91 wValue=0xFFFF wIndex=0x0001"
        );
    }
}
