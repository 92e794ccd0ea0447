//! Enttec DMX USB Pro output
//!
//! The widget takes framed messages over its virtual serial port:
//! `0x7E, label, length LSB, length MSB, payload, 0xE7`. Label 6 carries a
//! start code followed by the channel data. Without the `serial` feature the
//! interface still exists but refuses to initialize.

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::dmx::interface::{Delivery, DmxInterface, InterfaceConfig};
use crate::dmx::universe::{Universe, DMX_UNIVERSE_SIZE};
use crate::error::{InitError, SendError};

const START_OF_MESSAGE: u8 = 0x7e;
const END_OF_MESSAGE: u8 = 0xe7;
const OUTPUT_ONLY_SEND_DMX: u8 = 6;

/// Frame length: header, start code, channels, terminator
pub const ENTTEC_FRAME_LEN: usize = 4 + 1 + DMX_UNIVERSE_SIZE + 1;

#[cfg(feature = "serial")]
type Port = Box<dyn serialport::SerialPort>;

#[cfg(not(feature = "serial"))]
type Port = std::io::Sink;

/// Enttec Pro settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnttecProConfig {
    /// Serial device path, e.g. `/dev/ttyUSB0` or `COM3`
    pub path: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

fn default_baud_rate() -> u32 {
    57600
}

impl EnttecProConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: default_baud_rate(),
        }
    }
}

/// Serial output through an Enttec DMX USB Pro widget
pub struct EnttecProInterface {
    id: String,
    config: EnttecProConfig,
    port: Option<Port>,
    frame: [u8; ENTTEC_FRAME_LEN],
}

impl EnttecProInterface {
    pub fn new(id: impl Into<String>, config: EnttecProConfig) -> Self {
        let mut frame = [0u8; ENTTEC_FRAME_LEN];
        let len = (DMX_UNIVERSE_SIZE as u16 + 1).to_le_bytes();
        frame[0] = START_OF_MESSAGE;
        frame[1] = OUTPUT_ONLY_SEND_DMX;
        frame[2] = len[0];
        frame[3] = len[1];
        frame[ENTTEC_FRAME_LEN - 1] = END_OF_MESSAGE;

        Self {
            id: id.into(),
            config,
            port: None,
            frame,
        }
    }

    fn stage(&mut self, channels: &Universe) {
        // frame[4] is the start code and stays 0
        self.frame[5..5 + DMX_UNIVERSE_SIZE].copy_from_slice(channels);
    }
}

impl DmxInterface for EnttecProInterface {
    fn id(&self) -> &str {
        &self.id
    }

    #[cfg(feature = "serial")]
    fn init(&mut self) -> Result<(), InitError> {
        let port = serialport::new(&self.config.path, self.config.baud_rate)
            .timeout(std::time::Duration::from_millis(100))
            .open()?;

        tracing::info!(
            "Enttec Pro interface '{}' opened {}",
            self.id,
            self.config.path
        );

        self.port = Some(port);
        Ok(())
    }

    #[cfg(not(feature = "serial"))]
    fn init(&mut self) -> Result<(), InitError> {
        Err(InitError::Unavailable(format!(
            "'{}': built without serial support",
            self.id
        )))
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::debug!("Enttec Pro interface '{}' closed", self.id);
        }
    }

    fn send(&mut self, channels: &Universe, universe: u32) -> Result<Delivery, SendError> {
        if self.port.is_none() {
            return Err(SendError::NotInitialized);
        }
        self.stage(channels);
        if let Some(port) = self.port.as_mut() {
            port.write_all(&self.frame)?;
            port.flush()?;
        }

        tracing::trace!("Sent Enttec Pro frame for universe {}", universe);
        Ok(Delivery::Sent)
    }

    fn config(&self) -> InterfaceConfig {
        InterfaceConfig::EnttecPro(self.config.clone())
    }

    fn is_ready(&self) -> bool {
        self.port.is_some()
    }
}
