//! Structured events emitted by the patch engine
//!
//! The engine never logs directly from its encode and dispatch paths. It
//! hands [`PatchEvent`]s to an [`EventSink`] chosen by the caller:
//! [`TracingSink`] forwards them to `tracing`, [`ChannelSink`] queues them
//! for inspection.

use crossbeam_channel::{Receiver, Sender};

use crate::error::ConfigError;

/// Why a device was left out of a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Device has no patch entry
    NotPatched,
    /// Device's universe has no buffer yet
    UniverseNotAllocated(u32),
    /// Device's patch names a profile that is not registered
    UnknownProfile(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPatched => write!(f, "not patched"),
            Self::UniverseNotAllocated(u) => write!(f, "universe {} is not allocated", u),
            Self::UnknownProfile(p) => write!(f, "unknown profile '{}'", p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchEvent {
    InterfaceAdded {
        interface: String,
        kind: &'static str,
    },
    InterfaceRemoved {
        interface: String,
    },
    InterfaceInitialized {
        interface: String,
    },
    InitFailed {
        interface: String,
        error: String,
    },
    InterfaceClosed {
        interface: String,
    },
    Assigned {
        interface: String,
        universe: u32,
    },
    Unassigned {
        interface: String,
        universe: u32,
    },
    /// The universe bank grew to `universes` buffers
    BankGrown {
        universes: usize,
    },
    /// A binding was rejected while building the topology
    ConfigRejected(ConfigError),
    DeviceSkipped {
        device: String,
        reason: SkipReason,
    },
    ParamMismatch {
        device: String,
        param: String,
        error: String,
    },
    AddressOutOfRange {
        device: String,
        error: String,
    },
    SendFailed {
        interface: String,
        universe: u32,
        error: String,
    },
    CycleComplete {
        devices: usize,
        sends: usize,
        failures: usize,
    },
}

/// Receiver of engine events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PatchEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PatchEvent) {
        use PatchEvent::*;
        match event {
            InterfaceAdded { interface, kind } => {
                tracing::info!("Added {} interface '{}'", kind, interface)
            }
            InterfaceRemoved { interface } => tracing::info!("Removed interface '{}'", interface),
            InterfaceInitialized { interface } => {
                tracing::info!("Interface '{}' initialized", interface)
            }
            InitFailed { interface, error } => {
                tracing::error!("Interface '{}' failed to initialize: {}", interface, error)
            }
            InterfaceClosed { interface } => tracing::debug!("Interface '{}' closed", interface),
            Assigned {
                interface,
                universe,
            } => tracing::debug!("Universe {} -> interface '{}'", universe, interface),
            Unassigned {
                interface,
                universe,
            } => tracing::debug!("Universe {} -/-> interface '{}'", universe, interface),
            BankGrown { universes } => tracing::debug!("Universe bank grown to {}", universes),
            ConfigRejected(error) => tracing::warn!("{}", error),
            DeviceSkipped { device, reason } => match reason {
                SkipReason::NotPatched => tracing::trace!("Device '{}' is not patched", device),
                reason => tracing::warn!("Skipping device '{}': {}", device, reason),
            },
            ParamMismatch {
                device,
                param,
                error,
            } => tracing::warn!("Device '{}' parameter '{}': {}", device, param, error),
            AddressOutOfRange { device, error } => {
                tracing::error!("Device '{}' skipped: {}", device, error)
            }
            SendFailed {
                interface,
                universe,
                error,
            } => tracing::error!(
                "Interface '{}' failed to send universe {}: {}",
                interface,
                universe,
                error
            ),
            CycleComplete {
                devices,
                sends,
                failures,
            } => tracing::trace!(
                "Cycle complete: {} devices, {} sends, {} failures",
                devices,
                sends,
                failures
            ),
        }
    }
}

/// Queues events on a crossbeam channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<PatchEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it
    pub fn new() -> (Self, Receiver<PatchEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: PatchEvent) {
        // Receiver gone means nobody is listening
        let _ = self.tx.send(event);
    }
}
