//! EEPROM decoding: read the configured fields back out of an image.

use std::fmt;

use super::error::{EepromError, Result};
use super::image::EepromImage;
use super::types::{LedConfig, PowerConfig};
use crate::protocol::constants::*;

/// Fields recovered from an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EepromSummary {
    pub mode: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub release_number: u16,
    pub power: PowerConfig,
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
    pub hardware_type: u8,
    /// Raw LED byte; see [`EepromSummary::led`].
    pub led_byte: u8,
    pub checksum: u16,
}

impl EepromSummary {
    pub fn led(&self) -> Option<LedConfig> {
        LedConfig::from_byte(self.led_byte)
    }
}

/// Follow a descriptor-index slot to its string record.
fn read_string(image: &EepromImage, field: &'static str, slot: usize) -> Result<String> {
    let bytes = image.as_bytes();
    let address = bytes[slot];
    let length = bytes[slot + 1];

    let bad_slot = EepromError::BadDescriptorSlot {
        field,
        address,
        length,
    };
    if length < 2 || length % 2 != 0 {
        return Err(bad_slot);
    }
    let start = address as usize;
    let end = start + (length as usize - 2);
    if end > EEPROM_SIZE {
        return Err(bad_slot);
    }

    Ok(bytes[start..end]
        .chunks_exact(2)
        .map(|pair| pair[0] as char)
        .collect())
}

impl EepromImage {
    /// Decode the configured fields.
    ///
    /// Fails if a string slot does not describe a record inside the image,
    /// which is the normal state of an erased EEPROM.
    pub fn decode(&self) -> Result<EepromSummary> {
        let word_at = |offset: usize| self.get_word(offset / 2);
        let bytes = self.as_bytes();

        Ok(EepromSummary {
            mode: bytes[MODE_OFFSET],
            vendor_id: word_at(VENDOR_ID_OFFSET)?,
            product_id: word_at(PRODUCT_ID_OFFSET)?,
            release_number: word_at(RELEASE_OFFSET)?,
            power: PowerConfig::from_word(word_at(POWER_OFFSET)?),
            manufacturer: read_string(self, "Manufacturer", MANUFACTURER_SLOT)?,
            product: read_string(self, "Product", PRODUCT_SLOT)?,
            serial: read_string(self, "Serial", SERIAL_SLOT)?,
            hardware_type: bytes[HARDWARE_TYPE_OFFSET],
            led_byte: bytes[LED_OFFSET],
            checksum: word_at(CHECKSUM_OFFSET)?,
        })
    }
}

impl fmt::Display for EepromSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "          mode: 0x{:02X}", self.mode)?;
        writeln!(f, "     vendor id: 0x{:04X}", self.vendor_id)?;
        writeln!(f, "    product id: 0x{:04X}", self.product_id)?;
        writeln!(f, "       release: 0x{:04X}", self.release_number)?;
        writeln!(
            f,
            "         power: {}, remote wakeup {}, {} mA",
            if self.power.bus_powered {
                "bus powered"
            } else {
                "self powered"
            },
            if self.power.remote_wakeup { "on" } else { "off" },
            self.power.max_current_ma
        )?;
        writeln!(f, "  manufacturer: {}", self.manufacturer)?;
        writeln!(f, "       product: {}", self.product)?;
        writeln!(f, "        serial: {}", self.serial)?;
        writeln!(f, " hardware type: 0x{:02X}", self.hardware_type)?;
        match self.led() {
            Some(led) => writeln!(f, "           led: {}", led)?,
            None => writeln!(f, "           led: unknown (0x{:02X})", self.led_byte)?,
        }
        write!(f, "      checksum: 0x{:04X}", self.checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eeprom::types::EepromConfig;

    #[test]
    fn test_decode_default() {
        let config = EepromConfig {
            led: Some(LedConfig::RxBlink),
            ..Default::default()
        };
        let summary = EepromImage::build_default(&config).unwrap().decode().unwrap();

        assert_eq!(summary.mode, RS232_MODE);
        assert_eq!(summary.vendor_id, 0x0403);
        assert_eq!(summary.product_id, 0x6014);
        assert_eq!(summary.release_number, 0x0900);
        assert_eq!(summary.power, PowerConfig::default());
        assert_eq!(summary.manufacturer, "XIPITER");
        assert_eq!(summary.product, "SHIKRA");
        assert_eq!(summary.serial, "XIP12345");
        assert_eq!(summary.hardware_type, 0x56);
        assert_eq!(summary.led(), Some(LedConfig::RxBlink));
        assert_eq!(summary.checksum, CHECKSUM_SENTINEL);
    }

    #[test]
    fn test_decode_unset_led_reads_tristate() {
        let summary = EepromImage::build_default(&EepromConfig::default())
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(summary.led_byte, 0);
        assert_eq!(summary.led(), Some(LedConfig::Tristate));
    }

    #[test]
    fn test_decode_erased() {
        let err = EepromImage::filled(0xFFFF).decode().unwrap_err();
        assert!(matches!(
            err,
            EepromError::BadDescriptorSlot {
                field: "Manufacturer",
                ..
            }
        ));
    }

    #[test]
    fn test_summary_display() {
        let summary = EepromImage::build_default(&EepromConfig::default())
            .unwrap()
            .decode()
            .unwrap();
        let text = summary.to_string();
        assert!(text.contains("manufacturer: XIPITER"));
        assert!(text.contains("0x6014"));
        assert!(text.contains("bus powered, remote wakeup off, 100 mA"));
    }
}
