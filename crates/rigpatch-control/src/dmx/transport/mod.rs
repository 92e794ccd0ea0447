//! Concrete DMX transports
//!
//! Every transport opens its socket or device in `init` and releases it in
//! `close`; constructing one never touches the network.

pub mod artnet;
pub mod enttec;
pub mod kinet;
pub mod loopback;
pub mod sacn;

pub use artnet::{ArtNetConfig, ArtNetInterface};
pub use enttec::{EnttecProConfig, EnttecProInterface};
pub use kinet::{KinetConfig, KinetInterface, KinetProtocol};
pub use loopback::{LoopbackConfig, LoopbackFrame, LoopbackInterface, LoopbackTap};
pub use sacn::{SacnConfig, SacnInterface};

use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::InitError;

/// Resolve `host:port` to the first matching socket address
pub(crate) fn resolve(address: &str) -> Result<SocketAddr, InitError> {
    let invalid = |reason: String| InitError::InvalidAddress {
        address: address.to_string(),
        reason,
    };
    address
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("no addresses found".to_string()))
}
