//! Word-addressed EEPROM transactions over a [`UsbTransport`].
//!
//! Every operation borrows the caller's transport for the duration of the
//! call only. Bulk operations walk word indices in ascending order and stop
//! at the first failed transfer; nothing is retried or rolled back.

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::eeprom::{EepromError, EepromImage, word_from_storage};
use crate::events::{NullObserver, Operation, ProgrammerEvent, ProgrammerObserver};
use crate::protocol::ControlSetup;
use crate::protocol::constants::{EEPROM_WORDS, WORD_TRANSFER_LEN};
use crate::transport::{TransportError, UsbTransport};

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Word index {index} out of range (0..{limit})")]
    OutOfRange { index: usize, limit: usize },

    #[error("Transfer failed at word {index}: {source}")]
    Transport {
        index: usize,
        #[source]
        source: TransportError,
    },

    #[error("{operation} stopped after {completed} of {total} words: {source}")]
    Incomplete {
        operation: Operation,
        completed: usize,
        total: usize,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Image(#[from] EepromError),
}

impl DeviceError {
    /// Words that completed before a bulk operation stopped.
    ///
    /// This is also the index to resume a write from.
    pub fn completed(&self) -> Option<usize> {
        match self {
            DeviceError::Incomplete { completed, .. } => Some(*completed),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;

fn check_index(index: usize) -> Result<u16> {
    if index >= EEPROM_WORDS {
        return Err(DeviceError::OutOfRange {
            index,
            limit: EEPROM_WORDS,
        });
    }
    Ok(index as u16)
}

/// Read one word.
pub fn read_word<T: UsbTransport + ?Sized>(transport: &T, index: usize) -> Result<u16> {
    let w_index = check_index(index)?;
    let data = transport
        .control_in(ControlSetup::read_word(w_index), WORD_TRANSFER_LEN)
        .map_err(|source| DeviceError::Transport { index, source })?;

    let bytes: [u8; 2] = data
        .as_slice()
        .try_into()
        .map_err(|_| DeviceError::Transport {
            index,
            source: TransportError::UnexpectedLength {
                expected: WORD_TRANSFER_LEN as usize,
                actual: data.len(),
            },
        })?;

    let word = word_from_storage(bytes);
    debug!(index, word = %format!("0x{:04X}", word), "Read word");
    Ok(word)
}

/// Write one word. The full word travels in wValue.
pub fn write_word<T: UsbTransport + ?Sized>(transport: &T, index: usize, value: u16) -> Result<()> {
    let w_index = check_index(index)?;
    transport
        .control_out(ControlSetup::write_word(w_index, value), &[])
        .map_err(|source| DeviceError::Transport { index, source })?;
    debug!(index, word = %format!("0x{:04X}", value), "Wrote word");
    Ok(())
}

/// Turn a word-level failure inside a bulk loop into `Incomplete`.
fn abort(
    observer: &dyn ProgrammerObserver,
    operation: Operation,
    completed: usize,
    total: usize,
    err: DeviceError,
) -> DeviceError {
    let source = match err {
        DeviceError::Transport { source, .. } => source,
        DeviceError::Incomplete { source, .. } => source,
        other => return other,
    };
    warn!(operation = %operation, completed, "Bulk transfer aborted");
    observer.on_event(&ProgrammerEvent::Aborted {
        operation,
        completed,
        message: source.to_string(),
    });
    DeviceError::Incomplete {
        operation,
        completed,
        total,
        source,
    }
}

/// Refuse to start a bulk operation on a transport already known to be gone.
fn ensure_connected<T: UsbTransport + ?Sized>(
    transport: &T,
    observer: &dyn ProgrammerObserver,
    operation: Operation,
    start: usize,
    total: usize,
) -> Result<()> {
    if transport.is_connected() {
        return Ok(());
    }
    Err(abort(
        observer,
        operation,
        start,
        total,
        DeviceError::Transport {
            index: start,
            source: TransportError::Disconnected,
        },
    ))
}

/// Write `words` to consecutive indices starting at `start`.
///
/// Progress and failure counts are absolute word indices, so a failed
/// attempt's `completed` is always the index to resume from.
fn write_words<T, I>(
    transport: &T,
    observer: &dyn ProgrammerObserver,
    operation: Operation,
    start: usize,
    words: I,
) -> Result<usize>
where
    T: UsbTransport + ?Sized,
    I: ExactSizeIterator<Item = u16>,
{
    let count = words.len();
    let total = start + count;
    observer.on_event(&ProgrammerEvent::Started { operation, total });
    ensure_connected(transport, observer, operation, start, total)?;

    for (index, word) in (start..).zip(words) {
        if let Err(e) = write_word(transport, index, word) {
            return Err(abort(observer, operation, index, total, e));
        }
        observer.on_event(&ProgrammerEvent::Progress {
            operation,
            current: index + 1,
            total,
        });
    }

    observer.on_event(&ProgrammerEvent::Finished {
        operation,
        words: count,
    });
    Ok(count)
}

/// Read the whole EEPROM, reporting progress to `observer`.
#[instrument(skip_all)]
pub fn read_all_observed<T: UsbTransport + ?Sized>(
    transport: &T,
    observer: &dyn ProgrammerObserver,
) -> Result<EepromImage> {
    let operation = Operation::Read;
    observer.on_event(&ProgrammerEvent::Started {
        operation,
        total: EEPROM_WORDS,
    });
    ensure_connected(transport, observer, operation, 0, EEPROM_WORDS)?;

    let mut words = Vec::with_capacity(EEPROM_WORDS);
    for index in 0..EEPROM_WORDS {
        match read_word(transport, index) {
            Ok(word) => words.push(word),
            Err(e) => return Err(abort(observer, operation, index, EEPROM_WORDS, e)),
        }
        observer.on_event(&ProgrammerEvent::Progress {
            operation,
            current: index + 1,
            total: EEPROM_WORDS,
        });
    }

    observer.on_event(&ProgrammerEvent::Finished {
        operation,
        words: EEPROM_WORDS,
    });
    info!("EEPROM read complete");

    Ok(EepromImage::from_words(&words)?)
}

/// Write words `start..128` of `image`, reporting progress to `observer`.
///
/// Resumes an interrupted [`write_all`] when `start` is the
/// [`completed`](DeviceError::completed) count of the failed attempt.
#[instrument(skip(transport, image, observer))]
pub fn write_from_observed<T: UsbTransport + ?Sized>(
    transport: &T,
    image: &EepromImage,
    start: usize,
    observer: &dyn ProgrammerObserver,
) -> Result<usize> {
    check_index(start)?;
    let written = write_words(
        transport,
        observer,
        Operation::Write,
        start,
        image.words().skip(start),
    )?;
    info!(start, written, "EEPROM write complete");
    Ok(written)
}

/// Write the same word to every index, reporting progress to `observer`.
#[instrument(skip(transport, observer), fields(value = %format!("0x{:04X}", value)))]
pub fn fill_all_observed<T: UsbTransport + ?Sized>(
    transport: &T,
    value: u16,
    observer: &dyn ProgrammerObserver,
) -> Result<()> {
    write_words(
        transport,
        observer,
        Operation::Fill,
        0,
        std::iter::repeat_n(value, EEPROM_WORDS),
    )?;
    info!("EEPROM fill complete");
    Ok(())
}

/// Read all 128 words into an image.
pub fn read_all<T: UsbTransport + ?Sized>(transport: &T) -> Result<EepromImage> {
    read_all_observed(transport, &NullObserver)
}

/// Write all 128 words of `image`.
pub fn write_all<T: UsbTransport + ?Sized>(transport: &T, image: &EepromImage) -> Result<()> {
    write_from_observed(transport, image, 0, &NullObserver).map(|_| ())
}

/// Write words `start..128` of `image`.
pub fn write_from<T: UsbTransport + ?Sized>(
    transport: &T,
    image: &EepromImage,
    start: usize,
) -> Result<usize> {
    write_from_observed(transport, image, start, &NullObserver)
}

/// Write `value` to all 128 words, e.g. [`ZERO_WORD`] or [`FACTORY_WORD`].
///
/// [`ZERO_WORD`]: crate::protocol::constants::ZERO_WORD
/// [`FACTORY_WORD`]: crate::protocol::constants::FACTORY_WORD
pub fn fill_all<T: UsbTransport + ?Sized>(transport: &T, value: u16) -> Result<()> {
    fill_all_observed(transport, value, &NullObserver)
}
