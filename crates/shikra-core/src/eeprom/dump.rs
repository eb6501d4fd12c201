//! Hex dump rendering and parsing, in FT_PROG's layout.
//!
//! Eight words per row, each printed as four uppercase hex digits with the
//! high byte first.

use std::fmt::Write;
use std::str::FromStr;

use super::error::{EepromError, Result};
use super::image::EepromImage;
use crate::protocol::constants::{DUMP_ROW_BYTES, EEPROM_WORDS};

const WORDS_PER_ROW: usize = DUMP_ROW_BYTES / 2;

impl EepromImage {
    /// Render the image as a hex dump.
    ///
    /// Rows are joined with a single `\n`; the final row has no line break.
    pub fn to_hex_dump(&self) -> String {
        let mut out = String::with_capacity(EEPROM_WORDS * 5);
        for (i, word) in self.words().enumerate() {
            if i > 0 {
                out.push(if i % WORDS_PER_ROW == 0 { '\n' } else { ' ' });
            }
            // Writing to a String cannot fail
            let _ = write!(out, "{:04X}", word);
        }
        out
    }

    /// Parse a hex dump produced by [`to_hex_dump`](Self::to_hex_dump).
    ///
    /// Any whitespace separates tokens. Lowercase digits are accepted.
    pub fn parse_hex_dump(text: &str) -> Result<Self> {
        let mut words = Vec::with_capacity(EEPROM_WORDS);
        for (i, token) in text.split_whitespace().enumerate() {
            words.push(parse_token(i, token)?);
        }
        if words.len() != EEPROM_WORDS {
            return Err(EepromError::MalformedDump(format!(
                "expected {} words, found {}",
                EEPROM_WORDS,
                words.len()
            )));
        }
        EepromImage::from_words(&words)
    }
}

fn parse_token(i: usize, token: &str) -> Result<u16> {
    if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(EepromError::MalformedDump(format!(
            "word {}: '{}' is not 4 hex digits",
            i, token
        )));
    }
    u16::from_str_radix(token, 16)
        .map_err(|e| EepromError::MalformedDump(format!("word {}: {}", i, e)))
}

impl FromStr for EepromImage {
    type Err = EepromError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_hex_dump(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eeprom::types::EepromConfig;

    #[test]
    fn test_dump_layout() {
        let mut image = EepromImage::blank();
        image.set_word(0, 0x0010).unwrap();
        image.set_word(1, 0x0403).unwrap();
        image.set_word(127, 0xFFFF).unwrap();

        let dump = image.to_hex_dump();
        let lines: Vec<&str> = dump.split('\n').collect();
        assert_eq!(lines.len(), 16);
        assert_eq!(lines[0], "0010 0403 0000 0000 0000 0000 0000 0000");
        assert_eq!(lines[15], "0000 0000 0000 0000 0000 0000 0000 FFFF");
        assert!(!dump.ends_with('\n'));
        assert!(!dump.ends_with(' '));
    }

    #[test]
    fn test_dump_prints_high_byte_first() {
        let image = EepromImage::build_default(&EepromConfig::default()).unwrap();
        let dump = image.to_hex_dump();
        // Bytes 0x02/0x03 = 03 04 -> "0403", bytes 0x04/0x05 = 14 60 -> "6014"
        assert!(dump.starts_with("0010 0403 6014 0900 3280"));
    }

    #[test]
    fn test_round_trip() {
        let image = EepromImage::build_default(&EepromConfig::default()).unwrap();
        let parsed = EepromImage::parse_hex_dump(&image.to_hex_dump()).unwrap();
        assert_eq!(parsed, image);
    }

    #[test]
    fn test_parse_accepts_loose_whitespace() {
        // Old backups carry a trailing space after every word
        let text = "ffff ".repeat(128) + "\n";
        let image: EepromImage = text.parse().unwrap();
        assert_eq!(image, EepromImage::filled(0xFFFF));
    }

    #[test]
    fn test_parse_wrong_count() {
        let text = vec!["0000"; 127].join(" ");
        assert!(matches!(
            EepromImage::parse_hex_dump(&text),
            Err(EepromError::MalformedDump(_))
        ));

        let text = vec!["0000"; 129].join(" ");
        assert!(matches!(
            EepromImage::parse_hex_dump(&text),
            Err(EepromError::MalformedDump(_))
        ));

        assert!(EepromImage::parse_hex_dump("").is_err());
    }

    #[test]
    fn test_parse_bad_token() {
        let mut tokens = vec!["0000"; 128];
        tokens[5] = "000";
        assert!(matches!(
            EepromImage::parse_hex_dump(&tokens.join(" ")),
            Err(EepromError::MalformedDump(_))
        ));

        tokens[5] = "00G0";
        assert!(EepromImage::parse_hex_dump(&tokens.join(" ")).is_err());

        tokens[5] = "10000";
        assert!(EepromImage::parse_hex_dump(&tokens.join(" ")).is_err());

        tokens[5] = "+FFF";
        assert!(EepromImage::parse_hex_dump(&tokens.join(" ")).is_err());
    }
}
