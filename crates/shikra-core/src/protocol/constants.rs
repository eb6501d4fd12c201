//! Protocol constants for the Shikra (FT232H) EEPROM programmer.
//!
//! Derived from the FT232H EEPROM layout as written by FTDI's FT_PROG.

// ============================================================================
// Device Identification
// ============================================================================

/// FTDI Vendor ID
pub const SHIKRA_VENDOR_ID: u16 = 0x0403;

/// FT232H Product ID (as shipped on the Shikra)
pub const SHIKRA_PRODUCT_ID: u16 = 0x6014;

/// Default bcdDevice release number
pub const SHIKRA_RELEASE_NUMBER: u16 = 0x0900;

/// Bulk IN endpoint address on interface 0
pub const SHIKRA_IN_ENDPOINT: u8 = 0x81;

/// Bulk OUT endpoint address on interface 0
pub const SHIKRA_OUT_ENDPOINT: u8 = 0x02;

// ============================================================================
// Control Transfers
// ============================================================================

/// bmRequestType for vendor IN requests to the device
pub const REQUEST_TYPE_VENDOR_IN: u8 = 0xC0;

/// bmRequestType for vendor OUT requests to the device
pub const REQUEST_TYPE_VENDOR_OUT: u8 = 0x40;

/// Read one EEPROM word
pub const READ_EEPROM_REQUEST: u8 = 0x90;

/// Write one EEPROM word
pub const WRITE_EEPROM_REQUEST: u8 = 0x91;

/// Bytes returned by a word read
pub const WORD_TRANSFER_LEN: u16 = 2;

/// Control transfer timeout in milliseconds
pub const CONTROL_TIMEOUT_MS: u64 = 5000;

// ============================================================================
// EEPROM Geometry
// ============================================================================

/// Total EEPROM size in bytes (93C56)
pub const EEPROM_SIZE: usize = 256;

/// Number of 16-bit words in the EEPROM
pub const EEPROM_WORDS: usize = EEPROM_SIZE / 2;

/// Hex dump row width in bytes (8 words)
pub const DUMP_ROW_BYTES: usize = 16;

/// Fill word used to blank the EEPROM
pub const ZERO_WORD: u16 = 0x0000;

/// Fill word matching an erased (factory) EEPROM
pub const FACTORY_WORD: u16 = 0xFFFF;

// ============================================================================
// Field Offsets
// ============================================================================

pub const MODE_OFFSET: usize = 0x00;
pub const VENDOR_ID_OFFSET: usize = 0x02;
pub const PRODUCT_ID_OFFSET: usize = 0x04;
pub const RELEASE_OFFSET: usize = 0x06;
pub const POWER_OFFSET: usize = 0x08;

/// Manufacturer descriptor-index slot (address, length)
pub const MANUFACTURER_SLOT: usize = 0x0E;
/// Product descriptor-index slot (address, length)
pub const PRODUCT_SLOT: usize = 0x10;
/// Serial descriptor-index slot (address, length)
pub const SERIAL_SLOT: usize = 0x12;

/// LED (ACBUS9 / C9) function byte
pub const LED_OFFSET: usize = 28;

/// EEPROM hardware type byte
pub const HARDWARE_TYPE_OFFSET: usize = 30;

/// Start of the user-programmable area
pub const USER_AREA_BASE: usize = 0x80;

/// Reserved bytes at the start of the user area, before the string table
pub const STRING_TABLE_GAP: usize = 0x20;

/// First string record
pub const STRING_TABLE_START: usize = USER_AREA_BASE + STRING_TABLE_GAP;

/// Checksum word
pub const CHECKSUM_OFFSET: usize = 254;

/// Written in place of a computed checksum
pub const CHECKSUM_SENTINEL: u16 = 0xFFFF;

/// String descriptor type tag following each record's length byte
pub const STRING_DESCRIPTOR_TYPE: u8 = 0x03;

// ============================================================================
// Field Values
// ============================================================================

/// RS232 / UART channel mode
pub const RS232_MODE: u8 = 0x10;

/// 93C56 EEPROM hardware type
pub const EEPROM_TYPE_93C56: u8 = 0x56;

/// Config attribute: bus powered
pub const ATTR_BUS_POWERED: u8 = 0x80;
/// Config attribute: self powered
pub const ATTR_SELF_POWERED: u8 = 0x40;
/// Config attribute: remote wakeup
pub const ATTR_REMOTE_WAKEUP: u8 = 0x20;

/// Max power is stored in units of 2 mA
pub const MAX_POWER_MILLIAMP_PER_UNIT: u16 = 2;

pub const LED_TRISTATE: u8 = 0x00;
pub const LED_TX: u8 = 0x10;
pub const LED_RX: u8 = 0x20;
pub const LED_TXRX: u8 = 0x30;
pub const LED_DRIVE_0: u8 = 0x60;
