//! EEPROM image model: building, dumping, parsing and decoding.
//!
//! - [`EepromImage`] - The 256-byte image with word and byte accessors.
//! - [`build`] - Encode an [`EepromConfig`] into an image.
//! - [`dump`] - FT_PROG-style hex dump rendering and parsing.
//! - [`decode`] - Read configured fields back out of an image.

pub mod build;
pub mod decode;
pub mod dump;
mod error;
mod image;
mod types;

pub use build::{StringSlot, record_len};
pub use decode::EepromSummary;
pub use error::{EepromError, Result};
pub use image::{EepromImage, word_from_storage, word_to_storage};
pub use types::{EepromConfig, LedConfig, PowerConfig, UnknownLedMode};
