//! Mock USB transport for testing.

use std::sync::{Arc, Mutex};

use super::traits::{TransportError, UsbTransport};
use crate::eeprom::word_to_storage;
use crate::protocol::ControlSetup;
use crate::protocol::constants::*;

/// Mock transport emulating the device's EEPROM behind the vendor requests.
pub struct MockTransport {
    /// Emulated EEPROM words.
    memory: Arc<Mutex<[u16; EEPROM_WORDS]>>,
    /// Captured control setups, in issue order (failed attempts included).
    transfer_log: Arc<Mutex<Vec<ControlSetup>>>,
    /// Zero-based transfer number that fails, if any.
    fail_at: Arc<Mutex<Option<usize>>>,
    /// Byte count of word read replies, when overridden.
    reply_len: Arc<Mutex<Option<usize>>>,
    /// Simulated VID/PID.
    vid: u16,
    pid: u16,
    /// Whether device is "connected".
    connected: Arc<Mutex<bool>>,
}

impl MockTransport {
    /// New mock with an erased (all 0xFFFF) EEPROM.
    pub fn new() -> Self {
        Self {
            memory: Arc::new(Mutex::new([FACTORY_WORD; EEPROM_WORDS])),
            transfer_log: Arc::new(Mutex::new(Vec::new())),
            fail_at: Arc::new(Mutex::new(None)),
            reply_len: Arc::new(Mutex::new(None)),
            vid: SHIKRA_VENDOR_ID,
            pid: SHIKRA_PRODUCT_ID,
            connected: Arc::new(Mutex::new(true)),
        }
    }

    /// Preload the emulated EEPROM.
    pub fn load_words(&self, words: &[u16; EEPROM_WORDS]) {
        *self.memory.lock().unwrap() = *words;
    }

    /// Current emulated EEPROM contents.
    pub fn words(&self) -> [u16; EEPROM_WORDS] {
        *self.memory.lock().unwrap()
    }

    /// Make the `n`-th transfer (zero-based, counted across IN and OUT)
    /// fail with a stall.
    pub fn fail_on_transfer(&self, n: usize) {
        *self.fail_at.lock().unwrap() = Some(n);
    }

    /// Remove an injected failure.
    pub fn clear_failure(&self) {
        *self.fail_at.lock().unwrap() = None;
    }

    /// Truncate or zero-pad word read replies to `len` bytes.
    pub fn set_reply_len(&self, len: Option<usize>) {
        *self.reply_len.lock().unwrap() = len;
    }

    /// Get all captured transfers.
    pub fn get_transfers(&self) -> Vec<ControlSetup> {
        self.transfer_log.lock().unwrap().clone()
    }

    /// Clear captured transfers.
    pub fn clear_transfers(&self) {
        self.transfer_log.lock().unwrap().clear();
    }

    /// Simulate device disconnect.
    pub fn disconnect(&self) {
        *self.connected.lock().unwrap() = false;
    }

    /// Simulate device reconnect.
    pub fn reconnect(&self) {
        *self.connected.lock().unwrap() = true;
    }

    /// Record the attempt and apply injected failures.
    fn begin(&self, setup: ControlSetup) -> Result<(), TransportError> {
        if !*self.connected.lock().unwrap() {
            return Err(TransportError::Disconnected);
        }
        let mut log = self.transfer_log.lock().unwrap();
        let n = log.len();
        log.push(setup);
        if *self.fail_at.lock().unwrap() == Some(n) {
            return Err(TransportError::ControlFailed {
                setup,
                message: "pipe stalled".into(),
            });
        }
        Ok(())
    }

    fn word_slot(setup: ControlSetup) -> Result<usize, TransportError> {
        let index = setup.index as usize;
        if index >= EEPROM_WORDS {
            return Err(TransportError::ControlFailed {
                setup,
                message: "pipe stalled".into(),
            });
        }
        Ok(index)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbTransport for MockTransport {
    fn control_in(&self, setup: ControlSetup, length: u16) -> Result<Vec<u8>, TransportError> {
        self.begin(setup)?;
        if setup.request != READ_EEPROM_REQUEST {
            return Ok(Vec::new());
        }
        let index = Self::word_slot(setup)?;
        let mut data = word_to_storage(self.memory.lock().unwrap()[index]).to_vec();
        match *self.reply_len.lock().unwrap() {
            Some(len) => data.resize(len, 0),
            None => data.truncate(length as usize),
        }
        Ok(data)
    }

    fn control_out(&self, setup: ControlSetup, _data: &[u8]) -> Result<(), TransportError> {
        self.begin(setup)?;
        if setup.request == WRITE_EEPROM_REQUEST {
            let index = Self::word_slot(setup)?;
            self.memory.lock().unwrap()[index] = setup.value;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock().unwrap()
    }

    fn vendor_id(&self) -> u16 {
        self.vid
    }

    fn product_id(&self) -> u16 {
        self.pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_write_then_read() {
        let mock = MockTransport::new();
        mock.control_out(ControlSetup::write_word(3, 0x6014), &[])
            .unwrap();
        let data = mock.control_in(ControlSetup::read_word(3), 2).unwrap();
        assert_eq!(data, vec![0x14, 0x60]);
        assert_eq!(mock.words()[3], 0x6014);
        assert_eq!(mock.get_transfers().len(), 2);
    }

    #[test]
    fn test_mock_injected_failure() {
        let mock = MockTransport::new();
        mock.fail_on_transfer(1);
        assert!(mock.control_in(ControlSetup::read_word(0), 2).is_ok());
        assert!(mock.control_in(ControlSetup::read_word(1), 2).is_err());
        assert!(mock.control_in(ControlSetup::read_word(2), 2).is_ok());
    }

    #[test]
    fn test_mock_out_of_range_stalls() {
        let mock = MockTransport::new();
        assert!(mock.control_in(ControlSetup::read_word(128), 2).is_err());
        assert!(
            mock.control_out(ControlSetup::write_word(200, 0), &[])
                .is_err()
        );
    }

    #[test]
    fn test_mock_disconnect() {
        let mock = MockTransport::new();
        assert!(mock.is_connected());

        mock.disconnect();
        assert!(!mock.is_connected());
        assert!(matches!(
            mock.control_in(ControlSetup::read_word(0), 2),
            Err(TransportError::Disconnected)
        ));
        assert!(mock.get_transfers().is_empty());

        mock.reconnect();
        assert!(mock.control_in(ControlSetup::read_word(0), 2).is_ok());
    }
}
