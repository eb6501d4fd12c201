//! Programmer session - high-level orchestrator for the CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{info, instrument};

use crate::config::{DeviceSelector, ProgrammerConfig};
use crate::device;
use crate::eeprom::EepromImage;
use crate::events::{
    LogLevel, Operation, ProgrammerEvent, ProgrammerObserver, TracingObserver,
};
use crate::protocol::constants::{EEPROM_WORDS, FACTORY_WORD, ZERO_WORD};
use crate::transport::{NusbTransport, UsbTransport};

/// Find the selected device, claim its interface and report it to `observer`.
pub fn open(selector: &DeviceSelector, observer: &dyn ProgrammerObserver) -> Result<NusbTransport> {
    let transport = NusbTransport::open_with_ids(selector.vendor_id, selector.product_id)?;
    observer.on_event(&connected_event(&transport));
    Ok(transport)
}

fn connected_event<T: UsbTransport + ?Sized>(transport: &T) -> ProgrammerEvent {
    ProgrammerEvent::DeviceConnected {
        vid: transport.vendor_id(),
        pid: transport.product_id(),
    }
}

/// Render the image `config` would program, without touching a device.
pub fn print_config(config: &ProgrammerConfig) -> Result<String> {
    Ok(config.build_image()?.to_hex_dump())
}

/// Programming session over a caller-owned transport.
///
/// The session borrows the transport; opening and closing the device stays
/// with the caller.
pub struct ProgrammerSession<'a, T: UsbTransport + ?Sized, O: ProgrammerObserver> {
    transport: &'a T,
    config: ProgrammerConfig,
    observer: Arc<O>,
}

impl<'a, T: UsbTransport + ?Sized> ProgrammerSession<'a, T, TracingObserver> {
    /// Create a new session with default tracing observer.
    pub fn new(transport: &'a T, config: ProgrammerConfig) -> Self {
        Self::with_observer(transport, config, Arc::new(TracingObserver))
    }
}

impl<'a, T: UsbTransport + ?Sized, O: ProgrammerObserver> ProgrammerSession<'a, T, O> {
    /// Create a new session with a custom observer.
    pub fn with_observer(transport: &'a T, config: ProgrammerConfig, observer: Arc<O>) -> Self {
        Self {
            transport,
            config,
            observer,
        }
    }

    pub fn config(&self) -> &ProgrammerConfig {
        &self.config
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.observer.on_event(&ProgrammerEvent::Log {
            level,
            message: message.into(),
        });
    }

    /// Build the configured image and write it to the device.
    #[instrument(skip(self))]
    pub fn write_config(&self) -> Result<EepromImage> {
        let image = self.config.build_image()?;
        if self.config.eeprom.led.is_some() {
            self.log(
                LogLevel::Warn,
                "LED programming may not work on older Shikra models",
            );
        }
        self.write_image(&image)?;
        Ok(image)
    }

    /// Write `image` to the device, verifying afterwards if configured.
    pub fn write_image(&self, image: &EepromImage) -> Result<()> {
        device::write_from_observed(self.transport, image, 0, self.observer.as_ref())?;
        if self.config.verify {
            self.verify(image)?;
        }
        Ok(())
    }

    /// Read the EEPROM back and compare it word by word with `expected`.
    pub fn verify(&self, expected: &EepromImage) -> Result<()> {
        let actual = device::read_all_observed(self.transport, self.observer.as_ref())?;
        if let Some(index) = (0..EEPROM_WORDS).find(|&i| actual.get_word(i) != expected.get_word(i)) {
            self.observer.on_event(&ProgrammerEvent::Aborted {
                operation: Operation::Verify,
                completed: index,
                message: "read-back mismatch".into(),
            });
            bail!(
                "Verify failed at word {}: expected 0x{:04X}, read 0x{:04X}",
                index,
                expected.get_word(index)?,
                actual.get_word(index)?
            );
        }
        self.observer.on_event(&ProgrammerEvent::Finished {
            operation: Operation::Verify,
            words: EEPROM_WORDS,
        });
        Ok(())
    }

    /// Read the full EEPROM.
    pub fn dump(&self) -> Result<EepromImage> {
        Ok(device::read_all_observed(self.transport, self.observer.as_ref())?)
    }

    /// Read the EEPROM and save it as a hex dump.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn backup<P: AsRef<Path>>(&self, path: P) -> Result<EepromImage> {
        let image = self.dump()?;
        std::fs::write(path.as_ref(), image.to_hex_dump())?;
        info!("Backup written");
        Ok(image)
    }

    /// Parse a saved hex dump and write it to the device.
    ///
    /// The whole file is validated before the first word is written.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn restore<P: AsRef<Path>>(&self, path: P) -> Result<EepromImage> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let image = EepromImage::parse_hex_dump(&text)?;
        self.log(LogLevel::Info, "Writing EEPROM backup to device");
        self.write_image(&image)?;
        Ok(image)
    }

    /// Write 0x0000 to every word.
    pub fn zero(&self) -> Result<()> {
        self.fill(ZERO_WORD)
    }

    /// Write 0xFFFF to every word (erased state).
    pub fn factory_reset(&self) -> Result<()> {
        self.fill(FACTORY_WORD)
    }

    fn fill(&self, value: u16) -> Result<()> {
        device::fill_all_observed(self.transport, value, self.observer.as_ref())?;
        if self.config.verify {
            self.verify(&EepromImage::filled(value))?;
        }
        Ok(())
    }
}
