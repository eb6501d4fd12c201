//! Programmer profile, stored as TOML.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::eeprom::{EepromConfig, EepromImage};
use crate::protocol::constants::{SHIKRA_PRODUCT_ID, SHIKRA_VENDOR_ID};

/// Which device to open. Independent of the IDs being programmed, since a
/// reprogrammed device enumerates with whatever was last written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSelector {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for DeviceSelector {
    fn default() -> Self {
        Self {
            vendor_id: SHIKRA_VENDOR_ID,
            product_id: SHIKRA_PRODUCT_ID,
        }
    }
}

/// Configuration for a programming session.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgrammerConfig {
    /// Read the EEPROM back after every write and compare.
    pub verify: bool,
    /// Device to open.
    pub device: DeviceSelector,
    /// Contents to program.
    pub eeprom: EepromConfig,
}

impl ProgrammerConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProgrammerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build the image this configuration programs.
    pub fn build_image(&self) -> Result<EepromImage> {
        Ok(EepromImage::build_default(&self.eeprom)?)
    }
}
