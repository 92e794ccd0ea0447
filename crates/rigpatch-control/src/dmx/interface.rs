//! Transport contract and serializable transport settings

use serde::{Deserialize, Serialize};

use super::transport::{
    ArtNetConfig, ArtNetInterface, EnttecProConfig, EnttecProInterface, KinetConfig,
    KinetInterface, LoopbackConfig, LoopbackInterface, SacnConfig, SacnInterface,
};
use super::universe::Universe;
use crate::error::{InitError, SendError};

/// A transport that delivers universe buffers to hardware
///
/// Lifecycle: constructed uninitialized, `init` acquires sockets or device
/// handles, `close` releases them. `close` must be safe to call at any time,
/// any number of times. The patch engine owns its interfaces exclusively and
/// closes them on every teardown path.
pub trait DmxInterface: Send {
    /// Stable identifier, unique within one engine
    fn id(&self) -> &str;

    /// Acquire resources. May be called again after `close`.
    fn init(&mut self) -> Result<(), InitError>;

    /// Release resources
    fn close(&mut self);

    /// Push one universe
    fn send(&mut self, channels: &Universe, universe: u32) -> Result<Delivery, SendError>;

    /// Settings that rebuild an equivalent interface via [`InterfaceConfig::build`]
    fn config(&self) -> InterfaceConfig;

    /// Whether `init` has succeeded and `close` has not been called since
    fn is_ready(&self) -> bool;
}

/// What a successful [`DmxInterface::send`] did with the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the socket, port or bus
    Sent,
    /// Dropped by the transport's refresh-rate limit
    Throttled,
}

/// Transport type tag plus transport parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceConfig {
    ArtNet(ArtNetConfig),
    Sacn(SacnConfig),
    Kinet(KinetConfig),
    EnttecPro(EnttecProConfig),
    Loopback(LoopbackConfig),
}

impl InterfaceConfig {
    /// Type tag as written in rig files
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ArtNet(_) => "ArtNet",
            Self::Sacn(_) => "Sacn",
            Self::Kinet(_) => "Kinet",
            Self::EnttecPro(_) => "EnttecPro",
            Self::Loopback(_) => "Loopback",
        }
    }

    /// Construct an uninitialized interface
    pub fn build(&self, id: impl Into<String>) -> Box<dyn DmxInterface> {
        let id = id.into();
        match self {
            Self::ArtNet(config) => Box::new(ArtNetInterface::new(id, config.clone())),
            Self::Sacn(config) => Box::new(SacnInterface::new(id, config.clone())),
            Self::Kinet(config) => Box::new(KinetInterface::new(id, config.clone())),
            Self::EnttecPro(config) => Box::new(EnttecProInterface::new(id, config.clone())),
            Self::Loopback(config) => Box::new(LoopbackInterface::new(id, config.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_keeps_id_and_config() {
        let config = InterfaceConfig::Kinet(KinetConfig::new("10.0.0.9"));
        let iface = config.build("supply-1");
        assert_eq!(iface.id(), "supply-1");
        assert_eq!(iface.config(), config);
        assert!(!iface.is_ready());
    }

    #[test]
    fn test_externally_tagged_json() {
        let config = InterfaceConfig::Loopback(LoopbackConfig { history: 8 });
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"Loopback":{"history":8}}"#);

        let parsed: InterfaceConfig = serde_json::from_str(r#"{"ArtNet":{}}"#).unwrap();
        assert_eq!(parsed, InterfaceConfig::ArtNet(ArtNetConfig::default()));
        assert_eq!(parsed.kind(), "ArtNet");
    }

    #[test]
    fn test_ron_round_trip() {
        let config = InterfaceConfig::Sacn(SacnConfig {
            destination: Some("10.0.0.5:5568".into()),
            ..SacnConfig::default()
        });
        let text = ron::to_string(&config).unwrap();
        let back: InterfaceConfig = ron::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
