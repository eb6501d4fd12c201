//! EEPROM encoding: turn an [`EepromConfig`] into a binary image.

use tracing::debug;

use super::error::{EepromError, Result};
use super::image::{EepromImage, word_to_storage};
use super::types::EepromConfig;
use crate::protocol::constants::*;

/// Descriptor-index slot of one string record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringSlot {
    /// Address of the record's first character byte.
    pub address: u8,
    /// Record length byte (`2 + 2 * chars`).
    pub length: u8,
}

/// Size in bytes of the packed record for `s`.
pub fn record_len(s: &str) -> usize {
    2 + 2 * s.len()
}

fn check_printable(field: &'static str, s: &str) -> Result<()> {
    if s.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
        Ok(())
    } else {
        Err(EepromError::InvalidString { field })
    }
}

fn put_word(buf: &mut [u8; EEPROM_SIZE], offset: usize, word: u16) {
    buf[offset..offset + 2].copy_from_slice(&word_to_storage(word));
}

/// Write one string record at `*pos` and advance past it.
///
/// The caller has already checked that the record fits.
fn write_string_record(buf: &mut [u8; EEPROM_SIZE], pos: &mut usize, s: &str) -> StringSlot {
    let length = record_len(s) as u8;
    buf[*pos] = length;
    buf[*pos + 1] = STRING_DESCRIPTOR_TYPE;
    let address = (*pos + 2) as u8;

    for (i, ch) in s.bytes().enumerate() {
        buf[*pos + 2 + 2 * i] = ch;
        buf[*pos + 3 + 2 * i] = 0x00;
    }
    *pos += length as usize;

    StringSlot { address, length }
}

/// Lay out manufacturer, product and serial records back to back from
/// [`STRING_TABLE_START`], filling the descriptor-index slots.
///
/// Returns the offset just past the last record.
fn pack_string_table(buf: &mut [u8; EEPROM_SIZE], strings: [(usize, &str); 3]) -> Result<usize> {
    let end = STRING_TABLE_START
        + strings
            .iter()
            .map(|(_, s)| record_len(s))
            .sum::<usize>();
    if end > CHECKSUM_OFFSET {
        return Err(EepromError::LayoutOverflow {
            end,
            limit: CHECKSUM_OFFSET,
        });
    }

    let mut pos = STRING_TABLE_START;
    for (slot_offset, s) in strings {
        let slot = write_string_record(buf, &mut pos, s);
        buf[slot_offset] = slot.address;
        buf[slot_offset + 1] = slot.length;
    }
    Ok(pos)
}

/// Build the binary EEPROM image from a configuration.
///
/// Pure: identical inputs give identical images. The checksum word always
/// holds [`CHECKSUM_SENTINEL`]; the LED byte is only written when an LED
/// function is configured.
pub fn build(config: &EepromConfig) -> Result<EepromImage> {
    check_printable("Manufacturer", &config.manufacturer)?;
    check_printable("Product", &config.product)?;
    check_printable("Serial", &config.serial)?;
    let power = config.power.to_word()?;

    let mut buf = [0u8; EEPROM_SIZE];

    buf[MODE_OFFSET] = config.mode;
    buf[MODE_OFFSET + 1] = 0;
    put_word(&mut buf, VENDOR_ID_OFFSET, config.vendor_id);
    put_word(&mut buf, PRODUCT_ID_OFFSET, config.product_id);
    put_word(&mut buf, RELEASE_OFFSET, config.release_number);
    put_word(&mut buf, POWER_OFFSET, power);

    let end = pack_string_table(
        &mut buf,
        [
            (MANUFACTURER_SLOT, config.manufacturer.as_str()),
            (PRODUCT_SLOT, config.product.as_str()),
            (SERIAL_SLOT, config.serial.as_str()),
        ],
    )?;
    debug!(end = %format!("0x{:02X}", end), "String table packed");

    put_word(&mut buf, CHECKSUM_OFFSET, CHECKSUM_SENTINEL);
    buf[HARDWARE_TYPE_OFFSET] = config.hardware_type;
    if let Some(led) = config.led {
        buf[LED_OFFSET] = led.to_byte();
    }

    Ok(EepromImage::from_array(buf))
}

impl EepromImage {
    /// Build the default configuration image. See [`build`].
    pub fn build_default(config: &EepromConfig) -> Result<Self> {
        build(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eeprom::types::{LedConfig, PowerConfig};

    fn shikra() -> EepromConfig {
        EepromConfig::default()
    }

    #[test]
    fn test_fixed_fields() {
        let image = build(&shikra()).unwrap();
        let b = image.as_bytes();
        assert_eq!(b[0x00], 0x10);
        assert_eq!(b[0x01], 0x00);
        assert_eq!(b[0x02], 0x03);
        assert_eq!(b[0x03], 0x04);
        assert_eq!(b[0x04], 0x14);
        assert_eq!(b[0x05], 0x60);
        assert_eq!(b[0x06], 0x00);
        assert_eq!(b[0x07], 0x09);
        assert_eq!(b[0x08], 0x80);
        assert_eq!(b[0x09], 50);
        assert_eq!(b[30], 0x56);
        assert_eq!(b[254], 0xFF);
        assert_eq!(b[255], 0xFF);
    }

    #[test]
    fn test_string_records() {
        let image = build(&shikra()).unwrap();
        let b = image.as_bytes();

        // Manufacturer "XIPITER" at 0xA0
        assert_eq!(b[0x0F], 16);
        assert_eq!(b[0x0E], 0xA2);
        assert_eq!(b[0xA0], 16);
        assert_eq!(b[0xA1], 0x03);
        assert_eq!(&b[0xA2..0xA6], &[b'X', 0, b'I', 0]);

        // Product "SHIKRA" follows at 0xB0
        assert_eq!(b[0x11], 14);
        assert_eq!(b[0x10], 0xB2);
        assert_eq!(b[0xB0], 14);
        assert_eq!(b[0xB1], 0x03);
        assert_eq!(b[0xB2], b'S');

        // Serial "XIP12345" follows at 0xBE
        assert_eq!(b[0x13], 18);
        assert_eq!(b[0x12], 0xC0);
        assert_eq!(b[0xBE], 18);
        assert_eq!(b[0xCE], b'5');
        assert_eq!(b[0xCF], 0x00);

        // Nothing written past the table except the checksum
        assert!(b[0xD0..254].iter().all(|&x| x == 0));
        // Reserved gap stays clear
        assert!(b[0x80..0xA0].iter().all(|&x| x == 0));
    }

    #[test]
    fn test_deterministic() {
        let config = EepromConfig {
            led: Some(LedConfig::TxBlink),
            ..shikra()
        };
        assert_eq!(build(&config).unwrap(), build(&config).unwrap());
    }

    #[test]
    fn test_led_written_only_when_set() {
        let image = build(&shikra()).unwrap();
        assert_eq!(image.byte(LED_OFFSET).unwrap(), 0);

        let config = EepromConfig {
            led: Some(LedConfig::DriveLow),
            ..shikra()
        };
        let image = build(&config).unwrap();
        assert_eq!(image.byte(LED_OFFSET).unwrap(), 0x60);
    }

    #[test]
    fn test_empty_strings_keep_slots() {
        let config = EepromConfig {
            manufacturer: String::new(),
            product: String::new(),
            serial: String::new(),
            ..shikra()
        };
        let b = build(&config).unwrap();
        let b = b.as_bytes();
        assert_eq!((b[0x0E], b[0x0F]), (0xA2, 2));
        assert_eq!((b[0x10], b[0x11]), (0xA4, 2));
        assert_eq!((b[0x12], b[0x13]), (0xA6, 2));
        assert_eq!(&b[0xA0..0xA6], &[2, 3, 2, 3, 2, 3]);
    }

    #[test]
    fn test_layout_limit() {
        // 0xA0 + 3 * 2 + 2 * 44 = 0xFE: exactly fills up to the checksum
        let config = EepromConfig {
            manufacturer: "M".repeat(44),
            product: String::new(),
            serial: String::new(),
            ..shikra()
        };
        let image = build(&config).unwrap();
        assert_eq!(image.byte(248).unwrap(), b'M');
        assert_eq!(image.byte(249).unwrap(), 0x00);
        // Empty serial record is the last thing before the checksum
        assert_eq!(image.byte(252).unwrap(), 2);
        assert_eq!(image.byte(253).unwrap(), 0x03);
        assert_eq!(image.get_word(127).unwrap(), 0xFFFF);

        let config = EepromConfig {
            manufacturer: "M".repeat(45),
            product: String::new(),
            serial: String::new(),
            ..shikra()
        };
        assert_eq!(
            build(&config),
            Err(EepromError::LayoutOverflow {
                end: 0x100,
                limit: 254
            })
        );
    }

    #[test]
    fn test_rejects_non_printable() {
        let config = EepromConfig {
            serial: "XIP\u{7}".to_string(),
            ..shikra()
        };
        assert_eq!(
            build(&config),
            Err(EepromError::InvalidString { field: "Serial" })
        );

        let config = EepromConfig {
            product: "Shîkra".to_string(),
            ..shikra()
        };
        assert!(matches!(
            build(&config),
            Err(EepromError::InvalidString { field: "Product" })
        ));
    }

    #[test]
    fn test_rejects_excess_power() {
        let config = EepromConfig {
            power: PowerConfig {
                max_current_ma: 1000,
                ..Default::default()
            },
            ..shikra()
        };
        assert!(matches!(
            build(&config),
            Err(EepromError::MaxPowerOutOfRange { .. })
        ));
    }
}
