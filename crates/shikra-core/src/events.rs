//! Event system for UI decoupling.
//!
//! Allows the CLI (or any other front end) to follow bulk EEPROM operations
//! without tight coupling to the transfer logic.

use std::fmt;

/// Log level for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
}

/// Bulk operations over the whole EEPROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Reading every word from the device.
    Read,
    /// Writing an image to the device.
    Write,
    /// Writing one word to every index.
    Fill,
    /// Reading back and comparing after a write.
    Verify,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "Read"),
            Operation::Write => write!(f, "Write"),
            Operation::Fill => write!(f, "Fill"),
            Operation::Verify => write!(f, "Verify"),
        }
    }
}

/// Events emitted while programming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgrammerEvent {
    /// Device opened and configured.
    DeviceConnected { vid: u16, pid: u16 },
    /// Bulk operation started.
    Started { operation: Operation, total: usize },
    /// One more word transferred.
    Progress {
        operation: Operation,
        current: usize,
        total: usize,
    },
    /// Bulk operation finished without error.
    Finished { operation: Operation, words: usize },
    /// Bulk operation stopped early.
    Aborted {
        operation: Operation,
        completed: usize,
        message: String,
    },
    /// Log message.
    Log { level: LogLevel, message: String },
}

/// Observer trait for receiving programmer events.
///
/// Implement this trait in your UI layer to receive updates.
pub trait ProgrammerObserver: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &ProgrammerEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl ProgrammerObserver for NullObserver {
    fn on_event(&self, _event: &ProgrammerEvent) {}
}

/// Observer that logs events using tracing.
pub struct TracingObserver;

impl ProgrammerObserver for TracingObserver {
    fn on_event(&self, event: &ProgrammerEvent) {
        match event {
            ProgrammerEvent::DeviceConnected { vid, pid } => {
                tracing::info!(vid = %format!("{:04X}", vid), pid = %format!("{:04X}", pid), "Device connected");
            }
            ProgrammerEvent::Started { operation, total } => {
                tracing::info!(operation = %operation, words = total, "Operation started");
            }
            ProgrammerEvent::Progress {
                operation,
                current,
                total,
            } => {
                let pct = if *total > 0 {
                    (*current * 100) / *total
                } else {
                    0
                };
                tracing::trace!(operation = %operation, progress = %format!("{}%", pct), "Progress");
            }
            ProgrammerEvent::Finished { operation, words } => {
                tracing::info!(operation = %operation, words = words, "Operation complete");
            }
            ProgrammerEvent::Aborted {
                operation,
                completed,
                message,
            } => {
                tracing::error!(operation = %operation, completed = completed, "Aborted: {}", message);
            }
            ProgrammerEvent::Log { level, message } => match level {
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
            },
        }
    }
}

/// Observer that keeps every event, for tests and scripted front ends.
#[derive(Default)]
pub struct RecordingObserver {
    events: std::sync::Mutex<Vec<ProgrammerEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgrammerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgrammerObserver for RecordingObserver {
    fn on_event(&self, event: &ProgrammerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
