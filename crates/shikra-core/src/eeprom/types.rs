//! Typed EEPROM fields: LED function, power configuration, and the full
//! set of inputs to the image builder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::{EepromError, Result};
use crate::protocol::constants::*;

/// Function of the on-board LED (ACBUS9 / C9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedConfig {
    /// Pin tristated, LED off.
    Tristate,
    /// Pin driven low, LED on solid.
    DriveLow,
    /// Blink on transmit.
    TxBlink,
    /// Blink on receive.
    RxBlink,
    /// Blink on transmit or receive.
    TxRxBlink,
}

impl LedConfig {
    pub const ALL: [LedConfig; 5] = [
        LedConfig::Tristate,
        LedConfig::DriveLow,
        LedConfig::TxBlink,
        LedConfig::RxBlink,
        LedConfig::TxRxBlink,
    ];

    pub const fn to_byte(self) -> u8 {
        match self {
            LedConfig::Tristate => LED_TRISTATE,
            LedConfig::DriveLow => LED_DRIVE_0,
            LedConfig::TxBlink => LED_TX,
            LedConfig::RxBlink => LED_RX,
            LedConfig::TxRxBlink => LED_TXRX,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|led| led.to_byte() == byte)
    }

    pub const fn name(self) -> &'static str {
        match self {
            LedConfig::Tristate => "tristate",
            LedConfig::DriveLow => "drive-low",
            LedConfig::TxBlink => "tx-blink",
            LedConfig::RxBlink => "rx-blink",
            LedConfig::TxRxBlink => "tx-rx-blink",
        }
    }
}

impl fmt::Display for LedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown LED mode '{0}' (expected off, on, tx, rx or txrx)")]
pub struct UnknownLedMode(pub String);

impl FromStr for LedConfig {
    type Err = UnknownLedMode;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "tristate" => Ok(LedConfig::Tristate),
            "on" | "drive-low" => Ok(LedConfig::DriveLow),
            "tx" | "tx-blink" => Ok(LedConfig::TxBlink),
            "rx" | "rx-blink" => Ok(LedConfig::RxBlink),
            "txrx" | "tx-rx-blink" => Ok(LedConfig::TxRxBlink),
            _ => Err(UnknownLedMode(s.to_string())),
        }
    }
}

/// USB power configuration (bmAttributes + bMaxPower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerConfig {
    pub bus_powered: bool,
    pub remote_wakeup: bool,
    /// Maximum current draw in mA, stored in 2 mA units.
    pub max_current_ma: u16,
}

impl PowerConfig {
    pub const MAX_CURRENT_MA: u16 = 0xFF * MAX_POWER_MILLIAMP_PER_UNIT;

    /// Encode as the word stored at offset 0x08: attributes in the low byte,
    /// max power in the high byte.
    pub fn to_word(&self) -> Result<u16> {
        if self.max_current_ma > Self::MAX_CURRENT_MA {
            return Err(EepromError::MaxPowerOutOfRange {
                milliamps: self.max_current_ma,
                limit: Self::MAX_CURRENT_MA,
            });
        }
        let mut attributes = if self.bus_powered {
            ATTR_BUS_POWERED
        } else {
            ATTR_SELF_POWERED
        };
        if self.remote_wakeup {
            attributes |= ATTR_REMOTE_WAKEUP;
        }
        let max_power = self.max_current_ma / MAX_POWER_MILLIAMP_PER_UNIT;
        Ok((max_power << 8) | attributes as u16)
    }

    pub fn from_word(word: u16) -> Self {
        let attributes = word as u8;
        Self {
            bus_powered: attributes & ATTR_SELF_POWERED == 0,
            remote_wakeup: attributes & ATTR_REMOTE_WAKEUP != 0,
            max_current_ma: (word >> 8) * MAX_POWER_MILLIAMP_PER_UNIT,
        }
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            bus_powered: true,
            remote_wakeup: false,
            max_current_ma: 100,
        }
    }
}

/// Inputs to [`build`](super::build::build).
///
/// The default is the Shikra factory profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EepromConfig {
    pub mode: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub release_number: u16,
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
    pub hardware_type: u8,
    pub led: Option<LedConfig>,
    // Tables last so the TOML form serializes
    pub power: PowerConfig,
}

impl Default for EepromConfig {
    fn default() -> Self {
        Self {
            mode: RS232_MODE,
            vendor_id: SHIKRA_VENDOR_ID,
            product_id: SHIKRA_PRODUCT_ID,
            release_number: SHIKRA_RELEASE_NUMBER,
            manufacturer: "XIPITER".to_string(),
            product: "SHIKRA".to_string(),
            serial: "XIP12345".to_string(),
            hardware_type: EEPROM_TYPE_93C56,
            led: None,
            power: PowerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_bytes() {
        assert_eq!(LedConfig::Tristate.to_byte(), 0x00);
        assert_eq!(LedConfig::DriveLow.to_byte(), 0x60);
        assert_eq!(LedConfig::TxBlink.to_byte(), 0x10);
        assert_eq!(LedConfig::RxBlink.to_byte(), 0x20);
        assert_eq!(LedConfig::TxRxBlink.to_byte(), 0x30);
        for led in LedConfig::ALL {
            assert_eq!(LedConfig::from_byte(led.to_byte()), Some(led));
        }
        assert_eq!(LedConfig::from_byte(0x42), None);
    }

    #[test]
    fn test_led_from_str() {
        assert_eq!("on".parse::<LedConfig>().unwrap(), LedConfig::DriveLow);
        assert_eq!("TXRX".parse::<LedConfig>().unwrap(), LedConfig::TxRxBlink);
        assert_eq!(
            "rx-blink".parse::<LedConfig>().unwrap(),
            LedConfig::RxBlink
        );
        assert!("blue".parse::<LedConfig>().is_err());
    }

    #[test]
    fn test_power_word() {
        let power = PowerConfig::default();
        assert_eq!(power.to_word().unwrap(), 0x3280);

        let power = PowerConfig {
            bus_powered: false,
            remote_wakeup: true,
            max_current_ma: 500,
        };
        let word = power.to_word().unwrap();
        assert_eq!(word, 0xFA60);
        assert_eq!(PowerConfig::from_word(word), power);
    }

    #[test]
    fn test_power_limit() {
        let power = PowerConfig {
            max_current_ma: 512,
            ..Default::default()
        };
        assert!(matches!(
            power.to_word(),
            Err(EepromError::MaxPowerOutOfRange { milliamps: 512, .. })
        ));
    }
}
