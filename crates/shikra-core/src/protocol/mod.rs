//! Protocol module - EEPROM layout and control transfer definitions.

pub mod constants;
pub mod setup;

pub use constants::*;
pub use setup::ControlSetup;
