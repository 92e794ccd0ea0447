//! Art-Net protocol implementation (Art-Net 4)
//!
//! Art-Net is a UDP-based protocol for transmitting DMX512 over Ethernet.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use super::resolve;
use crate::dmx::interface::{Delivery, DmxInterface, InterfaceConfig};
use crate::dmx::universe::Universe;
use crate::error::{InitError, SendError};

/// Highest Art-Net port-address
pub const ARTNET_MAX_UNIVERSE: u32 = 0x7FFF;

/// Default broadcast destination
pub const ARTNET_BROADCAST: &str = "255.255.255.255:6454";

/// Art-Net output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtNetConfig {
    /// Destination, typically the broadcast address
    #[serde(default = "default_target")]
    pub target: String,
    /// Per-universe rate limit in Hz; unlimited when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
}

fn default_target() -> String {
    ARTNET_BROADCAST.to_string()
}

impl Default for ArtNetConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            refresh_rate: None,
        }
    }
}

/// Art-Net sender for outputting DMX data
pub struct ArtNetInterface {
    id: String,
    config: ArtNetConfig,
    socket: Option<UdpSocket>,
    target: Option<SocketAddr>,
    sequence: u8,
    last_send: BTreeMap<u32, Instant>,
}

impl ArtNetInterface {
    pub fn new(id: impl Into<String>, config: ArtNetConfig) -> Self {
        Self {
            id: id.into(),
            config,
            socket: None,
            target: None,
            sequence: 0,
            last_send: BTreeMap::new(),
        }
    }

    /// Local address of the bound socket, once initialized
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn min_interval(&self) -> Option<Duration> {
        self.config
            .refresh_rate
            .filter(|hz| *hz > 0)
            .map(|hz| Duration::from_millis(1000 / u64::from(hz)))
    }

    /// Build an Art-Net DMX packet (OpDmx)
    fn build_packet(&self, channels: &Universe, universe: u16) -> Vec<u8> {
        let mut packet = vec![0u8; 18 + 512];

        // Header: "Art-Net\0"
        packet[0..8].copy_from_slice(b"Art-Net\0");

        // OpCode: OpDmx (0x5000)
        packet[8..10].copy_from_slice(&0x5000u16.to_le_bytes());

        // Protocol version (14)
        packet[10..12].copy_from_slice(&14u16.to_be_bytes());

        packet[12] = self.sequence;
        packet[13] = 0;

        // Port-Address
        packet[14..16].copy_from_slice(&universe.to_le_bytes());

        // Length (big-endian)
        packet[16..18].copy_from_slice(&512u16.to_be_bytes());

        packet[18..].copy_from_slice(channels);

        packet
    }
}

impl DmxInterface for ArtNetInterface {
    fn id(&self) -> &str {
        &self.id
    }

    fn init(&mut self) -> Result<(), InitError> {
        let target = resolve(&self.config.target)?;

        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_broadcast(true)?;

        tracing::info!("Art-Net interface '{}' sending to {}", self.id, target);

        self.socket = Some(socket);
        self.target = Some(target);
        Ok(())
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            tracing::debug!("Art-Net interface '{}' closed", self.id);
        }
        self.target = None;
    }

    fn send(&mut self, channels: &Universe, universe: u32) -> Result<Delivery, SendError> {
        if universe > ARTNET_MAX_UNIVERSE {
            return Err(SendError::UniverseOutOfRange {
                universe,
                protocol: "Art-Net",
            });
        }
        let (Some(socket), Some(target)) = (self.socket.as_ref(), self.target) else {
            return Err(SendError::NotInitialized);
        };

        let now = Instant::now();
        if let (Some(interval), Some(last)) = (self.min_interval(), self.last_send.get(&universe)) {
            if now.duration_since(*last) < interval {
                tracing::trace!("Art-Net universe {} throttled", universe);
                return Ok(Delivery::Throttled);
            }
        }

        let packet = self.build_packet(channels, universe as u16);
        socket.send_to(&packet, target)?;
        self.sequence = self.sequence.wrapping_add(1);
        self.last_send.insert(universe, now);

        tracing::trace!("Sent Art-Net DMX packet for universe {}", universe);

        Ok(Delivery::Sent)
    }

    fn config(&self) -> InterfaceConfig {
        InterfaceConfig::ArtNet(self.config.clone())
    }

    fn is_ready(&self) -> bool {
        self.socket.is_some()
    }
}
