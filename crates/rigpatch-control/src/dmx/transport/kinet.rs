//! KiNet output for Color Kinetics power supplies
//!
//! Each universe is pushed as one unicast UDP datagram: a fixed header
//! followed by 512 channel bytes. Version 1 supplies take a single stream;
//! PortOut (v2) supplies carry the output port in the header.

use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, UdpSocket};

use super::resolve;
use crate::dmx::interface::{Delivery, DmxInterface, InterfaceConfig};
use crate::dmx::universe::{Universe, DMX_UNIVERSE_SIZE};
use crate::error::{InitError, SendError};

/// Default KiNet port
pub const KINET_PORT: u16 = 6038;

const V1_HEADER: [u8; 21] = [
    0x04, 0x01, 0xdc, 0x4a, 0x01, 0x00, 0x01, 0x01, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0xff, 0xff, 0xff, 0xff, 0x00,
];

const PORT_OUT_HEADER: [u8; 24] = [
    0x04, 0x01, 0xdc, 0x4a, 0x01, 0x00, 0x08, 0x01, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x01, 0x00, 0x00, 0x01, 0xff, 0x00, 0xff, 0x0f,
];

const PORT_OFFSET: usize = 16;

/// KiNet protocol revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KinetProtocol {
    /// Single stream per supply
    #[default]
    V1,
    /// Addressed output ports
    PortOut,
}

/// KiNet output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KinetConfig {
    /// Power supply host name or address
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub protocol: KinetProtocol,
    /// Output port on PortOut supplies (1-16)
    #[serde(default = "default_output")]
    pub output: u8,
}

fn default_port() -> u16 {
    KINET_PORT
}

fn default_output() -> u8 {
    1
}

impl KinetConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: KINET_PORT,
            protocol: KinetProtocol::V1,
            output: default_output(),
        }
    }
}

/// KiNet sender bound to one power supply
pub struct KinetInterface {
    id: String,
    config: KinetConfig,
    socket: Option<UdpSocket>,
    packet: Vec<u8>,
}

impl KinetInterface {
    pub fn new(id: impl Into<String>, config: KinetConfig) -> Self {
        let packet = Self::template(&config);
        Self {
            id: id.into(),
            config,
            socket: None,
            packet,
        }
    }

    /// Header bytes for the configured protocol
    pub fn header_len(&self) -> usize {
        self.packet.len() - DMX_UNIVERSE_SIZE
    }

    fn template(config: &KinetConfig) -> Vec<u8> {
        let mut packet = match config.protocol {
            KinetProtocol::V1 => V1_HEADER.to_vec(),
            KinetProtocol::PortOut => {
                let mut header = PORT_OUT_HEADER.to_vec();
                header[PORT_OFFSET] = config.output.clamp(1, 16);
                header
            }
        };
        packet.resize(packet.len() + DMX_UNIVERSE_SIZE, 0);
        packet
    }

    fn destination(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    fn stage(&mut self, channels: &Universe) {
        let header = self.header_len();
        self.packet[header..].copy_from_slice(channels);
    }
}

impl DmxInterface for KinetInterface {
    fn id(&self) -> &str {
        &self.id
    }

    fn init(&mut self) -> Result<(), InitError> {
        let target: SocketAddr = resolve(&self.destination())?;
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(target)?;

        tracing::info!("KiNet interface '{}' connected to {}", self.id, target);

        self.socket = Some(socket);
        Ok(())
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            tracing::debug!("KiNet interface '{}' closed", self.id);
        }
    }

    fn send(&mut self, channels: &Universe, universe: u32) -> Result<Delivery, SendError> {
        if self.socket.is_none() {
            return Err(SendError::NotInitialized);
        }
        self.stage(channels);
        if let Some(socket) = &self.socket {
            socket.send(&self.packet)?;
        }

        tracing::trace!("Sent KiNet packet for universe {}", universe);
        Ok(Delivery::Sent)
    }

    fn config(&self) -> InterfaceConfig {
        InterfaceConfig::Kinet(self.config.clone())
    }

    fn is_ready(&self) -> bool {
        self.socket.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_v1_packet() {
        let mut iface = KinetInterface::new("ps", KinetConfig::new("127.0.0.1"));
        let mut channels = [0u8; 512];
        channels[0] = 9;
        iface.stage(&channels);
        let packet = &iface.packet;

        assert_eq!(packet.len(), 21 + 512);
        assert_eq!(&packet[..4], &[0x04, 0x01, 0xdc, 0x4a]);
        assert_eq!(&packet[16..21], &[0xff, 0xff, 0xff, 0xff, 0x00]);
        assert_eq!(packet[21], 9);
    }

    #[test]
    fn test_port_out_packet() {
        let config = KinetConfig {
            protocol: KinetProtocol::PortOut,
            output: 3,
            ..KinetConfig::new("127.0.0.1")
        };
        let mut iface = KinetInterface::new("ps", config);
        assert_eq!(iface.header_len(), 24);

        iface.stage(&[5u8; 512]);
        let packet = &iface.packet;
        assert_eq!(packet[6], 0x08);
        assert_eq!(packet[PORT_OFFSET], 3);
        assert_eq!(&packet[20..24], &[0xff, 0x00, 0xff, 0x0f]);
        assert!(packet[24..].iter().all(|b| *b == 5));
    }

    #[test]
    fn test_send_to_localhost() {
        let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
        rx.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let config = KinetConfig {
            port: rx.local_addr().unwrap().port(),
            ..KinetConfig::new("127.0.0.1")
        };
        let mut iface = KinetInterface::new("ps", config);
        assert!(matches!(
            iface.send(&[0u8; 512], 0),
            Err(SendError::NotInitialized)
        ));

        iface.init().unwrap();
        iface.send(&[1u8; 512], 0).unwrap();

        let mut buf = [0u8; 1024];
        let (len, _) = rx.recv_from(&mut buf).unwrap();
        assert_eq!(len, 533);
        assert_eq!(buf[532], 1);
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: KinetConfig = serde_json::from_str(r#"{"host":"10.1.1.2"}"#).unwrap();
        assert_eq!(config, KinetConfig::new("10.1.1.2"));
    }
}
