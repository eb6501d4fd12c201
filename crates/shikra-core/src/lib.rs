//! Shikra-Core: configuration EEPROM programming for the Shikra FT232H bridge.
//!
//! This crate builds, dumps and parses the 256-byte configuration EEPROM
//! image of the Shikra, and reads or writes it one 16-bit word at a time
//! through vendor control transfers.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! - **Protocol**: Constants, EEPROM layout, control transfer setup packets
//! - **EEPROM**: Image model, builder, hex dump, decoder
//! - **Transport**: USB communication abstraction (nusb, mock)
//! - **Device**: Word and bulk EEPROM transactions
//! - **Events**: Observer pattern for UI decoupling
//! - **Config**: TOML programmer profile
//! - **Session**: High-level orchestrator
//!
//! # Example
//!
//! ```no_run
//! use shikra_core::config::ProgrammerConfig;
//! use shikra_core::events::TracingObserver;
//! use shikra_core::session::{self, ProgrammerSession};
//!
//! let config = ProgrammerConfig::default();
//! let transport = session::open(&config.device, &TracingObserver).expect("Shikra not found");
//! let session = ProgrammerSession::new(&transport, config);
//! session.write_config().expect("EEPROM write failed");
//! ```

pub mod config;
pub mod device;
pub mod eeprom;
pub mod events;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use config::{DeviceSelector, ProgrammerConfig};
pub use device::DeviceError;
pub use eeprom::{EepromConfig, EepromError, EepromImage, EepromSummary, LedConfig, PowerConfig};
pub use events::{LogLevel, Operation, ProgrammerEvent, ProgrammerObserver, TracingObserver};
pub use protocol::ControlSetup;
pub use session::ProgrammerSession;
pub use transport::{MockTransport, NusbTransport, TransportError, UsbTransport};
