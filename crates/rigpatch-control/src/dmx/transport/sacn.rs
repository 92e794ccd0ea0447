//! sACN (E1.31) protocol implementation
//!
//! sACN (Streaming ACN) is a protocol for transmitting DMX512 over IP multicast.
//! Patch universes are zero-based; sACN universes start at 1, so patch
//! universe `n` goes out as sACN universe `n + 1`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::resolve;
use crate::dmx::interface::{Delivery, DmxInterface, InterfaceConfig};
use crate::dmx::universe::Universe;
use crate::error::{InitError, SendError};

/// Highest sACN universe number
pub const SACN_MAX_UNIVERSE: u32 = 63999;

/// Well-known sACN port
pub const SACN_PORT: u16 = 5568;

const PACKET_LEN: usize = 638;

/// sACN output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SacnConfig {
    /// Source name (up to 63 bytes are sent)
    #[serde(default = "default_source_name")]
    pub source_name: String,
    /// Priority (0-200)
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Unicast destination; multicast when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Component identifier; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<Uuid>,
    /// Per-universe rate limit in Hz; unlimited when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
}

fn default_source_name() -> String {
    "rigpatch".to_string()
}

fn default_priority() -> u8 {
    100
}

impl Default for SacnConfig {
    fn default() -> Self {
        Self {
            source_name: default_source_name(),
            priority: default_priority(),
            destination: None,
            cid: None,
            refresh_rate: None,
        }
    }
}

/// sACN sender for outputting DMX data
pub struct SacnInterface {
    id: String,
    config: SacnConfig,
    cid: Uuid,
    socket: Option<UdpSocket>,
    destination: Option<SocketAddr>,
    sequences: BTreeMap<u16, u8>,
    last_send: BTreeMap<u16, Instant>,
}

impl SacnInterface {
    pub fn new(id: impl Into<String>, mut config: SacnConfig) -> Self {
        config.priority = config.priority.min(200);
        let cid = config.cid.unwrap_or_else(Uuid::new_v4);
        Self {
            id: id.into(),
            config,
            cid,
            socket: None,
            destination: None,
            sequences: BTreeMap::new(),
            last_send: BTreeMap::new(),
        }
    }

    pub fn cid(&self) -> Uuid {
        self.cid
    }

    /// sACN universe number for a patch universe
    pub fn protocol_universe(universe: u32) -> Result<u16, SendError> {
        let protocol = universe + 1;
        if protocol > SACN_MAX_UNIVERSE {
            return Err(SendError::UniverseOutOfRange {
                universe,
                protocol: "sACN",
            });
        }
        Ok(protocol as u16)
    }

    /// Multicast group for an sACN universe: 239.255.hi.lo
    pub fn multicast_addr(protocol_universe: u16) -> SocketAddr {
        let [hi, lo] = protocol_universe.to_be_bytes();
        SocketAddr::from(([239, 255, hi, lo], SACN_PORT))
    }

    fn min_interval(&self) -> Option<Duration> {
        self.config
            .refresh_rate
            .filter(|hz| *hz > 0)
            .map(|hz| Duration::from_millis(1000 / u64::from(hz)))
    }

    /// Build an sACN data packet
    fn build_packet(&self, channels: &Universe, universe: u16, sequence: u8) -> Vec<u8> {
        let mut packet = vec![0u8; PACKET_LEN];

        // Root Layer
        let mut offset = 0;

        // Preamble and post-amble sizes
        packet[offset..offset + 2].copy_from_slice(&0x0010u16.to_be_bytes());
        offset += 2;
        packet[offset..offset + 2].copy_from_slice(&0x0000u16.to_be_bytes());
        offset += 2;

        // ACN Packet Identifier
        packet[offset..offset + 12].copy_from_slice(&[
            0x41, 0x53, 0x43, 0x2d, 0x45, 0x31, 0x2e, 0x31, 0x37, 0x00, 0x00, 0x00,
        ]);
        offset += 12;

        // Flags and Length
        let root_length = PACKET_LEN - 16;
        packet[offset..offset + 2]
            .copy_from_slice(&((0x7000u16 | root_length as u16).to_be_bytes()));
        offset += 2;

        // VECTOR_ROOT_E131_DATA
        packet[offset..offset + 4].copy_from_slice(&0x00000004u32.to_be_bytes());
        offset += 4;

        packet[offset..offset + 16].copy_from_slice(self.cid.as_bytes());
        offset += 16;

        // Framing Layer
        let framing_length = PACKET_LEN - 38;
        packet[offset..offset + 2]
            .copy_from_slice(&((0x7000u16 | framing_length as u16).to_be_bytes()));
        offset += 2;

        // VECTOR_E131_DATA_PACKET
        packet[offset..offset + 4].copy_from_slice(&0x00000002u32.to_be_bytes());
        offset += 4;

        // Source Name (64 bytes, null-terminated)
        let source_bytes = self.config.source_name.as_bytes();
        let copy_len = source_bytes.len().min(63);
        packet[offset..offset + copy_len].copy_from_slice(&source_bytes[..copy_len]);
        offset += 64;

        packet[offset] = self.config.priority;
        offset += 1;

        // Synchronization Address, 0 for no sync
        packet[offset..offset + 2].copy_from_slice(&0x0000u16.to_be_bytes());
        offset += 2;

        packet[offset] = sequence;
        offset += 1;

        // Options
        packet[offset] = 0;
        offset += 1;

        packet[offset..offset + 2].copy_from_slice(&universe.to_be_bytes());
        offset += 2;

        // DMP Layer
        let dmp_length = PACKET_LEN - 115;
        packet[offset..offset + 2]
            .copy_from_slice(&((0x7000u16 | dmp_length as u16).to_be_bytes()));
        offset += 2;

        // VECTOR_DMP_SET_PROPERTY
        packet[offset] = 0x02;
        offset += 1;

        // Address Type & Data Type
        packet[offset] = 0xa1;
        offset += 1;

        // First Property Address
        packet[offset..offset + 2].copy_from_slice(&0x0000u16.to_be_bytes());
        offset += 2;

        // Address Increment
        packet[offset..offset + 2].copy_from_slice(&0x0001u16.to_be_bytes());
        offset += 2;

        // Property value count: start code + 512 channels
        packet[offset..offset + 2].copy_from_slice(&513u16.to_be_bytes());
        offset += 2;

        // DMX Start Code
        packet[offset] = 0x00;
        offset += 1;

        packet[offset..offset + 512].copy_from_slice(channels);

        packet
    }
}

impl DmxInterface for SacnInterface {
    fn id(&self) -> &str {
        &self.id
    }

    fn init(&mut self) -> Result<(), InitError> {
        let destination = self
            .config
            .destination
            .as_deref()
            .map(resolve)
            .transpose()?;

        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_multicast_loop_v4(false)?;

        match destination {
            Some(addr) => tracing::info!("sACN interface '{}' unicast to {}", self.id, addr),
            None => tracing::info!("sACN interface '{}' multicast", self.id),
        }

        self.socket = Some(socket);
        self.destination = destination;
        Ok(())
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            tracing::debug!("sACN interface '{}' closed", self.id);
        }
        self.destination = None;
    }

    fn send(&mut self, channels: &Universe, universe: u32) -> Result<Delivery, SendError> {
        let protocol_universe = Self::protocol_universe(universe)?;
        let Some(socket) = self.socket.as_ref() else {
            return Err(SendError::NotInitialized);
        };

        let now = Instant::now();
        if let (Some(interval), Some(last)) =
            (self.min_interval(), self.last_send.get(&protocol_universe))
        {
            if now.duration_since(*last) < interval {
                tracing::trace!("sACN universe {} throttled", protocol_universe);
                return Ok(Delivery::Throttled);
            }
        }

        let sequence = self.sequences.get(&protocol_universe).copied().unwrap_or(0);
        let packet = self.build_packet(channels, protocol_universe, sequence);
        let target = self
            .destination
            .unwrap_or_else(|| Self::multicast_addr(protocol_universe));

        socket.send_to(&packet, target)?;
        self.sequences
            .insert(protocol_universe, sequence.wrapping_add(1));
        self.last_send.insert(protocol_universe, now);

        tracing::trace!("Sent sACN DMX packet for universe {}", protocol_universe);

        Ok(Delivery::Sent)
    }

    fn config(&self) -> InterfaceConfig {
        InterfaceConfig::Sacn(SacnConfig {
            cid: Some(self.cid),
            ..self.config.clone()
        })
    }

    fn is_ready(&self) -> bool {
        self.socket.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unicast_pair() -> (UdpSocket, SacnInterface) {
        let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
        rx.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let sender = SacnInterface::new(
            "sacn",
            SacnConfig {
                destination: Some(rx.local_addr().unwrap().to_string()),
                ..SacnConfig::default()
            },
        );
        (rx, sender)
    }

    #[test]
    fn test_universe_offset() {
        assert_eq!(SacnInterface::protocol_universe(0).unwrap(), 1);
        assert_eq!(SacnInterface::protocol_universe(63998).unwrap(), 63999);
        assert!(SacnInterface::protocol_universe(63999).is_err());
    }

    #[test]
    fn test_multicast_addr() {
        assert_eq!(
            SacnInterface::multicast_addr(0x0102).to_string(),
            "239.255.1.2:5568"
        );
    }

    #[test]
    fn test_sacn_packet_structure() {
        let sender = SacnInterface::new("sacn", SacnConfig::default());
        let packet = sender.build_packet(&[0u8; 512], 1, 0);

        assert_eq!(packet.len(), 638);
        assert_eq!(
            &packet[4..16],
            &[0x41, 0x53, 0x43, 0x2d, 0x45, 0x31, 0x2e, 0x31, 0x37, 0x00, 0x00, 0x00]
        );
        assert_eq!(&packet[22..38], sender.cid().as_bytes());
        assert_eq!(&packet[44..52], b"rigpatch");

        // Priority is at offset 108, start code at 125
        assert_eq!(packet[108], 100);
        assert_eq!(packet[125], 0x00);
    }

    #[test]
    fn test_priority_clamped() {
        let sender = SacnInterface::new(
            "sacn",
            SacnConfig {
                priority: 250,
                ..SacnConfig::default()
            },
        );
        let packet = sender.build_packet(&[0u8; 512], 1, 0);
        assert_eq!(packet[108], 200);
    }

    #[test]
    fn test_unicast_send() {
        let (rx, mut sender) = unicast_pair();
        sender.init().unwrap();

        let mut channels = [0u8; 512];
        channels[10] = 128;
        sender.send(&channels, 0).unwrap();
        sender.send(&channels, 0).unwrap();

        let mut buf = [0u8; 1024];
        let (len, _) = rx.recv_from(&mut buf).unwrap();
        assert_eq!(len, 638);
        // Sequence at 111, universe at 113..115
        assert_eq!(buf[111], 0);
        assert_eq!(&buf[113..115], &[0, 1]);
        assert_eq!(buf[126 + 10], 128);

        rx.recv_from(&mut buf).unwrap();
        assert_eq!(buf[111], 1);
    }

    #[test]
    fn test_sequence_per_universe() {
        let (rx, mut sender) = unicast_pair();
        sender.init().unwrap();

        let channels = [0u8; 512];
        sender.send(&channels, 0).unwrap();
        sender.send(&channels, 1).unwrap();

        let mut buf = [0u8; 1024];
        for _ in 0..2 {
            rx.recv_from(&mut buf).unwrap();
            assert_eq!(buf[111], 0);
        }
    }

    #[test]
    fn test_config_keeps_cid() {
        let sender = SacnInterface::new("sacn", SacnConfig::default());
        let InterfaceConfig::Sacn(config) = sender.config() else {
            panic!("expected sACN config");
        };
        assert_eq!(config.cid, Some(sender.cid()));

        let rebuilt = SacnInterface::new("sacn", config);
        assert_eq!(rebuilt.cid(), sender.cid());
    }
}
