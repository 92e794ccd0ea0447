//! Serializable rig topology
//!
//! The description a patch engine is built from and exported to:
//! interfaces with their transport settings, universe assignments, named
//! conversion profiles and device patch bindings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::interface::InterfaceConfig;
use super::patch::DevicePatch;
use super::profile::ConversionProfile;
use crate::error::ConfigError;

/// One interface in a rig description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescription {
    pub id: String,
    pub transport: InterfaceConfig,
}

impl InterfaceDescription {
    pub fn new(id: impl Into<String>, transport: InterfaceConfig) -> Self {
        Self {
            id: id.into(),
            transport,
        }
    }
}

/// Universe routed to an interface
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniverseAssignment {
    pub interface: String,
    pub universe: u32,
}

impl UniverseAssignment {
    pub fn new(interface: impl Into<String>, universe: u32) -> Self {
        Self {
            interface: interface.into(),
            universe,
        }
    }
}

/// Full patch description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigTopology {
    /// Interfaces, built in order
    #[serde(default)]
    pub interfaces: Vec<InterfaceDescription>,
    #[serde(default)]
    pub assignments: Vec<UniverseAssignment>,
    /// Conversion profiles by name
    #[serde(default)]
    pub profiles: BTreeMap<String, ConversionProfile>,
    /// Device patch bindings by device id
    #[serde(default)]
    pub devices: BTreeMap<String, DevicePatch>,
}

impl RigTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
            && self.assignments.is_empty()
            && self.profiles.is_empty()
            && self.devices.is_empty()
    }

    pub fn with_interface(mut self, id: impl Into<String>, transport: InterfaceConfig) -> Self {
        self.interfaces.push(InterfaceDescription::new(id, transport));
        self
    }

    pub fn with_assignment(mut self, interface: impl Into<String>, universe: u32) -> Self {
        self.assignments
            .push(UniverseAssignment::new(interface, universe));
        self
    }

    pub fn with_profile(mut self, name: impl Into<String>, profile: ConversionProfile) -> Self {
        self.profiles.insert(name.into(), profile);
        self
    }

    pub fn with_device(mut self, id: impl Into<String>, patch: DevicePatch) -> Self {
        self.devices.insert(id.into(), patch);
        self
    }
}

/// Outcome of building an engine from a [`RigTopology`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub interfaces: usize,
    pub profiles: usize,
    pub assignments: usize,
    pub devices: usize,
    /// Bindings that were rejected and skipped
    pub errors: Vec<ConfigError>,
}

impl LoadReport {
    /// True when nothing was skipped
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
