//! Errors raised while building, accessing, or parsing an EEPROM image.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EepromError {
    #[error("String table does not fit: records end at 0x{end:03X}, limit is 0x{limit:02X}")]
    LayoutOverflow { end: usize, limit: usize },

    #[error("Index {index} out of range (valid: 0..{limit})")]
    OutOfRange { index: usize, limit: usize },

    #[error("Invalid word value 0x{0:X} (must fit in 16 bits)")]
    InvalidWord(u32),

    #[error("Malformed dump: {0}")]
    MalformedDump(String),

    #[error("Image must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("{field} string must be printable ASCII")]
    InvalidString { field: &'static str },

    #[error("Max power {milliamps} mA exceeds {limit} mA")]
    MaxPowerOutOfRange { milliamps: u16, limit: u16 },

    #[error("{field} descriptor slot is invalid: address=0x{address:02X} length={length}")]
    BadDescriptorSlot {
        field: &'static str,
        address: u8,
        length: u8,
    },
}

pub type Result<T> = std::result::Result<T, EepromError>;
