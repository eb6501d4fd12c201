//! The 256-byte EEPROM image and its word/byte accessors.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use super::error::{EepromError, Result};
use crate::protocol::constants::{EEPROM_SIZE, EEPROM_WORDS};

/// Decode a word from its two storage bytes (low byte first).
///
/// This is the only place the device's byte order is defined. Device reads,
/// device writes, and the hex dump all go through this pair of functions.
pub fn word_from_storage(bytes: [u8; 2]) -> u16 {
    LittleEndian::read_u16(&bytes)
}

/// Encode a word into its two storage bytes (low byte first).
pub fn word_to_storage(word: u16) -> [u8; 2] {
    let mut bytes = [0u8; 2];
    LittleEndian::write_u16(&mut bytes, word);
    bytes
}

/// Full contents of the device's configuration EEPROM.
///
/// Always exactly [`EEPROM_SIZE`] bytes, organized as [`EEPROM_WORDS`]
/// little-endian words.
#[derive(Clone, PartialEq, Eq)]
pub struct EepromImage {
    bytes: [u8; EEPROM_SIZE],
}

impl EepromImage {
    pub const SIZE: usize = EEPROM_SIZE;
    pub const WORDS: usize = EEPROM_WORDS;

    /// All-zero image.
    pub const fn blank() -> Self {
        Self {
            bytes: [0; EEPROM_SIZE],
        }
    }

    /// Image with every word set to `word`.
    pub fn filled(word: u16) -> Self {
        let mut image = Self::blank();
        for chunk in image.bytes.chunks_exact_mut(2) {
            chunk.copy_from_slice(&word_to_storage(word));
        }
        image
    }

    pub(crate) const fn from_array(bytes: [u8; EEPROM_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build an image from raw storage bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let bytes: [u8; EEPROM_SIZE] =
            data.try_into().map_err(|_| EepromError::InvalidLength {
                expected: EEPROM_SIZE,
                actual: data.len(),
            })?;
        Ok(Self { bytes })
    }

    /// Build an image from logical words, in index order.
    pub fn from_words(words: &[u16]) -> Result<Self> {
        if words.len() != EEPROM_WORDS {
            return Err(EepromError::InvalidLength {
                expected: EEPROM_SIZE,
                actual: words.len() * 2,
            });
        }
        let mut image = Self::blank();
        for (chunk, &word) in image.bytes.chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&word_to_storage(word));
        }
        Ok(image)
    }

    pub fn as_bytes(&self) -> &[u8; EEPROM_SIZE] {
        &self.bytes
    }

    /// Iterate over all words in index order.
    pub fn words(&self) -> impl ExactSizeIterator<Item = u16> + '_ {
        self.bytes
            .chunks_exact(2)
            .map(|pair| word_from_storage([pair[0], pair[1]]))
    }

    pub fn byte(&self, offset: usize) -> Result<u8> {
        self.bytes
            .get(offset)
            .copied()
            .ok_or(EepromError::OutOfRange {
                index: offset,
                limit: EEPROM_SIZE,
            })
    }

    pub fn set_byte(&mut self, offset: usize, value: u8) -> Result<()> {
        let cell = self.bytes.get_mut(offset).ok_or(EepromError::OutOfRange {
            index: offset,
            limit: EEPROM_SIZE,
        })?;
        *cell = value;
        Ok(())
    }

    /// Read the word at `index` (0..128).
    pub fn get_word(&self, index: usize) -> Result<u16> {
        check_word_index(index)?;
        Ok(word_from_storage([
            self.bytes[index * 2],
            self.bytes[index * 2 + 1],
        ]))
    }

    /// Write the word at `index` (0..128).
    ///
    /// `value` is taken wide so callers holding parsed or computed values
    /// get `InvalidWord` instead of silent truncation.
    pub fn set_word(&mut self, index: usize, value: u32) -> Result<()> {
        check_word_index(index)?;
        let word = u16::try_from(value).map_err(|_| EepromError::InvalidWord(value))?;
        self.bytes[index * 2..index * 2 + 2].copy_from_slice(&word_to_storage(word));
        Ok(())
    }
}

fn check_word_index(index: usize) -> Result<()> {
    if index >= EEPROM_WORDS {
        return Err(EepromError::OutOfRange {
            index,
            limit: EEPROM_WORDS,
        });
    }
    Ok(())
}

impl Default for EepromImage {
    fn default() -> Self {
        Self::blank()
    }
}

impl fmt::Debug for EepromImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "EepromImage {{")?;
        for line in self.to_hex_dump().lines() {
            writeln!(f, "    {}", line)?;
        }
        write!(f, "}}")
    }
}
