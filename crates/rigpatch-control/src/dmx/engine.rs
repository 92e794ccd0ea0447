//! Patch engine: encode devices into universes, dispatch universes to interfaces

use parking_lot::Mutex;
use rayon::prelude::*;
use rigpatch_core::Device;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::conversion::ConversionType;
use super::events::{EventSink, PatchEvent, SkipReason, TracingSink};
use super::interface::{Delivery, DmxInterface, InterfaceConfig};
use super::patch::{encode_device, DevicePatch, EncodeSummary};
use super::profile::ConversionProfile;
use super::topology::{InterfaceDescription, LoadReport, RigTopology, UniverseAssignment};
use super::universe::{describe_universe, Universe, UniverseBank, DMX_UNIVERSE_SIZE};
use crate::error::{ConfigError, ControlError, EncodeError, InitError, Result, SendError};

/// What happened to one device during a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceOutcome {
    /// Encoded; individual parameters may still have been skipped
    Encoded(EncodeSummary),
    /// Left out of the cycle
    Skipped(SkipReason),
    /// Encoding aborted before anything was written
    Failed(EncodeError),
}

impl DeviceOutcome {
    pub fn is_encoded(&self) -> bool {
        matches!(self, Self::Encoded(_))
    }
}

/// A send that did not go through
#[derive(Debug)]
pub struct SendFailure {
    pub interface: String,
    pub universe: u32,
    pub error: SendError,
}

/// Result of pushing universes to interfaces
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Frames handed to a transport
    pub sent: usize,
    /// Frames a transport dropped under its refresh-rate limit
    pub throttled: usize,
    pub failures: Vec<SendFailure>,
    /// Assigned interfaces skipped because they are not initialized
    pub idle: Vec<String>,
}

/// Result of one [`DmxPatch::update`] call
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Per-device outcome, in the order devices were supplied
    pub devices: Vec<(String, DeviceOutcome)>,
    pub dispatch: DispatchReport,
}

impl CycleReport {
    pub fn outcome(&self, device: &str) -> Option<&DeviceOutcome> {
        self.devices
            .iter()
            .find(|(id, _)| id == device)
            .map(|(_, outcome)| outcome)
    }

    /// Number of devices that were encoded
    pub fn encoded(&self) -> usize {
        self.devices.iter().filter(|(_, o)| o.is_encoded()).count()
    }
}

#[derive(Default)]
struct PatchState {
    interfaces: BTreeMap<String, Box<dyn DmxInterface>>,
    /// (interface id, universe)
    assignments: BTreeSet<(String, u32)>,
    bank: UniverseBank,
    patches: BTreeMap<String, DevicePatch>,
    profiles: BTreeMap<String, ConversionProfile>,
}

impl PatchState {
    fn encode(&mut self, device: &Device) -> DeviceOutcome {
        let Some(patch) = self.patches.get(device.id()) else {
            return DeviceOutcome::Skipped(SkipReason::NotPatched);
        };
        let Some(buffer) = self.bank.get_mut(patch.universe) else {
            return DeviceOutcome::Skipped(SkipReason::UniverseNotAllocated(patch.universe));
        };
        let Some(profile) = self.profiles.get(&patch.profile) else {
            return DeviceOutcome::Skipped(SkipReason::UnknownProfile(patch.profile.clone()));
        };

        match encode_device(device, profile, patch.address, buffer) {
            Ok(summary) => DeviceOutcome::Encoded(summary),
            Err(error) => DeviceOutcome::Failed(error),
        }
    }

    /// Send every assigned universe (or only `only`) to its interfaces
    ///
    /// Interfaces run in parallel; each sends its own universes in order.
    fn dispatch(&mut self, only: Option<u32>) -> DispatchReport {
        let bank = &self.bank;
        let assignments = &self.assignments;

        let results: Vec<(DispatchReport, Option<String>)> = self
            .interfaces
            .par_iter_mut()
            .map(|(id, iface)| {
                let universes: Vec<u32> = assignments
                    .range((id.clone(), 0)..=(id.clone(), u32::MAX))
                    .map(|(_, universe)| *universe)
                    .filter(|universe| only.map_or(true, |u| u == *universe))
                    .collect();
                let mut part = DispatchReport::default();
                if universes.is_empty() {
                    return (part, None);
                }
                if !iface.is_ready() {
                    return (part, Some(id.clone()));
                }

                for universe in universes {
                    let Some(buffer) = bank.get(universe) else {
                        continue;
                    };
                    match iface.send(buffer, universe) {
                        Ok(Delivery::Sent) => part.sent += 1,
                        Ok(Delivery::Throttled) => part.throttled += 1,
                        Err(error) => part.failures.push(SendFailure {
                            interface: id.clone(),
                            universe,
                            error,
                        }),
                    }
                }
                (part, None)
            })
            .collect();

        let mut report = DispatchReport::default();
        for (part, idle) in results {
            report.sent += part.sent;
            report.throttled += part.throttled;
            report.failures.extend(part.failures);
            report.idle.extend(idle);
        }
        report
    }

    /// Add an assignment, returning the events it produced
    fn assign(
        &mut self,
        id: &str,
        universe: u32,
    ) -> std::result::Result<Vec<PatchEvent>, ConfigError> {
        if !self.interfaces.contains_key(id) {
            return Err(ConfigError::UnknownInterface {
                interface: id.to_string(),
                universe,
            });
        }

        let mut events = Vec::new();
        if self.bank.ensure(universe) {
            events.push(PatchEvent::BankGrown {
                universes: self.bank.len(),
            });
        }
        if self.assignments.insert((id.to_string(), universe)) {
            events.push(PatchEvent::Assigned {
                interface: id.to_string(),
                universe,
            });
        }
        Ok(events)
    }

    fn unassign(&mut self, interface: &str) -> Vec<u32> {
        let universes: Vec<u32> = self
            .assignments
            .iter()
            .filter(|(id, _)| id == interface)
            .map(|(_, u)| *u)
            .collect();
        for universe in &universes {
            self.assignments.remove(&(interface.to_string(), *universe));
        }
        universes
    }
}

/// DMX patch engine
///
/// Owns the universe bank, the interfaces, the interface/universe assignment
/// table, device patches and conversion profiles. One lock guards all of it;
/// an update cycle holds the lock from the first encode to the last send.
pub struct DmxPatch {
    state: Mutex<PatchState>,
    sink: Arc<dyn EventSink>,
}

impl Default for DmxPatch {
    fn default() -> Self {
        Self::new()
    }
}

impl DmxPatch {
    /// Engine that reports through `tracing`
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            state: Mutex::new(PatchState::default()),
            sink,
        }
    }

    /// Build an engine from a rig description
    pub fn from_topology(topology: &RigTopology, sink: Arc<dyn EventSink>) -> (Self, LoadReport) {
        let patch = Self::with_sink(sink);
        let report = patch.load_topology(topology);
        (patch, report)
    }

    fn emit(&self, event: PatchEvent) {
        self.sink.emit(event);
    }

    fn reject(&self, error: ConfigError) -> ControlError {
        self.emit(PatchEvent::ConfigRejected(error.clone()));
        ControlError::Config(error)
    }

    // ---- cycle -------------------------------------------------------------

    /// Encode `devices` and push every assigned universe to its interfaces
    ///
    /// Per-device and per-interface problems are collected in the report and
    /// never stop the cycle.
    pub fn update<'a, I>(&self, devices: I) -> CycleReport
    where
        I: IntoIterator<Item = &'a Device>,
    {
        let mut state = self.state.lock();
        let mut report = CycleReport::default();

        for device in devices {
            let outcome = state.encode(device);
            self.emit_outcome(device.id(), &outcome);
            report.devices.push((device.id().to_string(), outcome));
        }

        report.dispatch = state.dispatch(None);
        drop(state);

        self.emit_failures(&report.dispatch);
        self.emit(PatchEvent::CycleComplete {
            devices: report.devices.len(),
            sends: report.dispatch.sent,
            failures: report.dispatch.failures.len(),
        });
        report
    }

    fn emit_outcome(&self, device: &str, outcome: &DeviceOutcome) {
        match outcome {
            DeviceOutcome::Encoded(summary) => {
                for mismatch in &summary.mismatches {
                    self.emit(PatchEvent::ParamMismatch {
                        device: device.to_string(),
                        param: mismatch.param.clone(),
                        error: mismatch.error.to_string(),
                    });
                }
            }
            DeviceOutcome::Skipped(reason) => self.emit(PatchEvent::DeviceSkipped {
                device: device.to_string(),
                reason: reason.clone(),
            }),
            DeviceOutcome::Failed(error) => self.emit(PatchEvent::AddressOutOfRange {
                device: device.to_string(),
                error: error.to_string(),
            }),
        }
    }

    fn emit_failures(&self, report: &DispatchReport) {
        for failure in &report.failures {
            self.emit(PatchEvent::SendFailed {
                interface: failure.interface.clone(),
                universe: failure.universe,
                error: failure.error.to_string(),
            });
        }
    }

    /// Replace a universe's contents and push it to its interfaces
    ///
    /// `data` must be exactly 512 bytes; otherwise nothing changes.
    pub fn set_raw_data(&self, universe: u32, data: &[u8]) -> Result<DispatchReport> {
        let data: &Universe = data.try_into().map_err(|_| ControlError::InvalidBufferSize {
            expected: DMX_UNIVERSE_SIZE,
            actual: data.len(),
        })?;

        let mut state = self.state.lock();
        if !state.bank.replace(universe, data) {
            return Err(ControlError::UniverseNotAllocated(universe));
        }
        let report = state.dispatch(Some(universe));
        drop(state);

        self.emit_failures(&report);
        Ok(report)
    }

    // ---- lifecycle ---------------------------------------------------------

    /// Initialize every interface, in parallel
    ///
    /// Returns the interfaces that failed; the others are ready regardless.
    pub fn init(&self) -> Vec<(String, InitError)> {
        let mut state = self.state.lock();

        let results: Vec<(String, std::result::Result<(), InitError>)> = state
            .interfaces
            .par_iter_mut()
            .map(|(id, iface)| (id.clone(), iface.init()))
            .collect();
        drop(state);

        let mut failures = Vec::new();
        for (interface, result) in results {
            match result {
                Ok(()) => self.emit(PatchEvent::InterfaceInitialized { interface }),
                Err(error) => {
                    self.emit(PatchEvent::InitFailed {
                        interface: interface.clone(),
                        error: error.to_string(),
                    });
                    failures.push((interface, error));
                }
            }
        }
        failures
    }

    /// Close every interface
    pub fn close(&self) {
        let mut state = self.state.lock();
        let ids: Vec<String> = state.interfaces.keys().cloned().collect();
        for iface in state.interfaces.values_mut() {
            iface.close();
        }
        drop(state);

        for interface in ids {
            self.emit(PatchEvent::InterfaceClosed { interface });
        }
    }

    /// Close and re-open one interface
    pub fn reinit_interface(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock();
        let iface = state
            .interfaces
            .get_mut(id)
            .ok_or_else(|| ControlError::InterfaceNotFound(id.to_string()))?;
        iface.close();
        let result = iface.init();
        drop(state);

        match result {
            Ok(()) => {
                self.emit(PatchEvent::InterfaceInitialized {
                    interface: id.to_string(),
                });
                Ok(())
            }
            Err(error) => {
                self.emit(PatchEvent::InitFailed {
                    interface: id.to_string(),
                    error: error.to_string(),
                });
                Err(error.into())
            }
        }
    }

    // ---- interfaces and assignments ----------------------------------------

    /// Register an interface. Returns false, changing nothing, if the id is taken.
    pub fn add_interface(&self, iface: Box<dyn DmxInterface>) -> bool {
        let id = iface.id().to_string();
        let kind = iface.config().kind();
        let mut state = self.state.lock();
        if state.interfaces.contains_key(&id) {
            drop(state);
            self.emit(PatchEvent::ConfigRejected(ConfigError::DuplicateInterface(id)));
            return false;
        }
        state.interfaces.insert(id.clone(), iface);
        drop(state);

        self.emit(PatchEvent::InterfaceAdded {
            interface: id,
            kind,
        });
        true
    }

    /// Route `universe` to interface `id`, growing the bank if needed
    ///
    /// Assigning the same pair twice is a no-op.
    pub fn assign_interface(&self, id: &str, universe: u32) -> Result<()> {
        let result = self.state.lock().assign(id, universe);
        match result {
            Ok(events) => {
                events.into_iter().for_each(|event| self.emit(event));
                Ok(())
            }
            Err(error) => Err(self.reject(error)),
        }
    }

    /// Drop assignments for `universe`: one interface's, or every interface's
    /// when `id` is `None`. Buffers are kept. Returns how many were removed.
    pub fn remove_interface_assignment(&self, universe: u32, id: Option<&str>) -> usize {
        let mut state = self.state.lock();
        let removed: Vec<String> = state
            .assignments
            .iter()
            .filter(|(iface, u)| *u == universe && id.map_or(true, |id| id == iface))
            .map(|(iface, _)| iface.clone())
            .collect();
        for iface in &removed {
            state.assignments.remove(&(iface.clone(), universe));
        }
        drop(state);

        for interface in &removed {
            self.emit(PatchEvent::Unassigned {
                interface: interface.clone(),
                universe,
            });
        }
        removed.len()
    }

    /// Move interface `id` from universe `from` to universe `to`
    ///
    /// Best effort: a missing `(id, from)` pair is not an error and `(id, to)`
    /// is still added. Returns whether the `from` pair existed.
    pub fn move_interface_assignment(&self, id: &str, from: u32, to: u32) -> Result<bool> {
        let mut state = self.state.lock();
        if !state.interfaces.contains_key(id) {
            drop(state);
            return Err(self.reject(ConfigError::UnknownInterface {
                interface: id.to_string(),
                universe: to,
            }));
        }
        let existed = state.assignments.remove(&(id.to_string(), from));
        let grown = state.bank.ensure(to).then(|| state.bank.len());
        let added = state.assignments.insert((id.to_string(), to));
        drop(state);

        if existed {
            self.emit(PatchEvent::Unassigned {
                interface: id.to_string(),
                universe: from,
            });
        }
        if let Some(universes) = grown {
            self.emit(PatchEvent::BankGrown { universes });
        }
        if added {
            self.emit(PatchEvent::Assigned {
                interface: id.to_string(),
                universe: to,
            });
        }
        Ok(existed)
    }

    /// Close and remove an interface along with all its assignments
    pub fn delete_interface(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        let Some(mut iface) = state.interfaces.remove(id) else {
            return false;
        };
        iface.close();
        let universes = state.unassign(id);
        drop(state);

        for universe in universes {
            self.emit(PatchEvent::Unassigned {
                interface: id.to_string(),
                universe,
            });
        }
        self.emit(PatchEvent::InterfaceRemoved {
            interface: id.to_string(),
        });
        true
    }

    // ---- devices and profiles ----------------------------------------------

    /// Bind a device, replacing any previous binding
    pub fn patch_device(&self, id: impl Into<String>, patch: DevicePatch) {
        self.state.lock().patches.insert(id.into(), patch);
    }

    pub fn unpatch_device(&self, id: &str) -> Option<DevicePatch> {
        self.state.lock().patches.remove(id)
    }

    /// Register a profile, replacing any profile with the same name
    ///
    /// Profiles whose parameters share a channel are rejected.
    pub fn add_conversion_profile(
        &self,
        name: impl Into<String>,
        profile: ConversionProfile,
    ) -> Result<()> {
        let name = name.into();
        if let Err(error) = profile.validate(&name) {
            return Err(self.reject(error));
        }
        self.state.lock().profiles.insert(name, profile);
        Ok(())
    }

    /// Add or replace one mapping in a profile, creating the profile if needed
    pub fn add_parameter_to_profile(
        &self,
        name: &str,
        param: impl Into<String>,
        start: u32,
        conversion: ConversionType,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let mut profile = state.profiles.get(name).cloned().unwrap_or_default();
        profile.insert(param, start, conversion);
        if let Err(error) = profile.validate(name) {
            drop(state);
            return Err(self.reject(error));
        }
        state.profiles.insert(name.to_string(), profile);
        Ok(())
    }

    pub fn remove_conversion_profile(&self, name: &str) -> Option<ConversionProfile> {
        self.state.lock().profiles.remove(name)
    }

    // ---- queries -----------------------------------------------------------

    pub fn interface_ids(&self) -> Vec<String> {
        self.state.lock().interfaces.keys().cloned().collect()
    }

    pub fn interface_config(&self, id: &str) -> Option<InterfaceConfig> {
        self.state.lock().interfaces.get(id).map(|i| i.config())
    }

    pub fn is_interface_ready(&self, id: &str) -> Option<bool> {
        self.state.lock().interfaces.get(id).map(|i| i.is_ready())
    }

    /// Universes routed to an interface, ascending
    pub fn interface_universes(&self, id: &str) -> Vec<u32> {
        self.state
            .lock()
            .assignments
            .range((id.to_string(), 0)..=(id.to_string(), u32::MAX))
            .map(|(_, u)| *u)
            .collect()
    }

    /// Every `(interface, universe)` pair, ordered by interface then universe
    pub fn assignments(&self) -> Vec<(String, u32)> {
        self.state.lock().assignments.iter().cloned().collect()
    }

    pub fn device_patch(&self, id: &str) -> Option<DevicePatch> {
        self.state.lock().patches.get(id).cloned()
    }

    pub fn patched_devices(&self) -> Vec<String> {
        self.state.lock().patches.keys().cloned().collect()
    }

    pub fn profile(&self, name: &str) -> Option<ConversionProfile> {
        self.state.lock().profiles.get(name).cloned()
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.state.lock().profiles.keys().cloned().collect()
    }

    /// Channels a profile writes, or `None` if it is not registered
    pub fn profile_footprint(&self, name: &str) -> Option<usize> {
        self.state.lock().profiles.get(name).map(|p| p.footprint())
    }

    /// Number of allocated universe buffers
    pub fn universe_count(&self) -> usize {
        self.state.lock().bank.len()
    }

    /// Copy of one universe buffer
    pub fn universe(&self, universe: u32) -> Option<Universe> {
        self.state.lock().bank.get(universe).copied()
    }

    /// Hex dump of one universe
    pub fn describe_universe(&self, universe: u32) -> Option<String> {
        self.universe(universe)
            .map(|data| describe_universe(universe, &data))
    }

    /// Zero every universe buffer without sending
    pub fn blackout(&self) {
        self.state.lock().bank.blackout();
    }

    // ---- topology ----------------------------------------------------------

    /// Build interfaces, profiles, assignments and device patches from a
    /// description
    ///
    /// Pass one creates interfaces and profiles; pass two resolves
    /// assignments and device patches against them. Bindings that do not
    /// resolve are reported and skipped.
    pub fn load_topology(&self, topology: &RigTopology) -> LoadReport {
        let mut report = LoadReport::default();

        for desc in &topology.interfaces {
            if self.add_interface(desc.transport.build(desc.id.clone())) {
                report.interfaces += 1;
            } else {
                report
                    .errors
                    .push(ConfigError::DuplicateInterface(desc.id.clone()));
            }
        }
        for (name, profile) in &topology.profiles {
            match self.add_conversion_profile(name.clone(), profile.clone()) {
                Ok(()) => report.profiles += 1,
                Err(ControlError::Config(error)) => report.errors.push(error),
                Err(_) => {}
            }
        }

        // Pass two resolves against a single view of the state
        let mut events = Vec::new();
        let mut state = self.state.lock();
        for assignment in &topology.assignments {
            match state.assign(&assignment.interface, assignment.universe) {
                Ok(produced) => {
                    events.extend(produced);
                    report.assignments += 1;
                }
                Err(error) => {
                    events.push(PatchEvent::ConfigRejected(error.clone()));
                    report.errors.push(error);
                }
            }
        }
        for (device, patch) in &topology.devices {
            if !state.profiles.contains_key(&patch.profile) {
                let error = ConfigError::UnknownProfile {
                    device: device.clone(),
                    profile: patch.profile.clone(),
                };
                events.push(PatchEvent::ConfigRejected(error.clone()));
                report.errors.push(error);
                continue;
            }
            state.patches.insert(device.clone(), patch.clone());
            report.devices += 1;
        }
        drop(state);
        events.into_iter().for_each(|event| self.emit(event));

        tracing::info!(
            "Loaded topology: {} interfaces, {} profiles, {} assignments, {} devices, {} rejected",
            report.interfaces,
            report.profiles,
            report.assignments,
            report.devices,
            report.errors.len()
        );
        report
    }

    /// Describe the current patch in the shape [`DmxPatch::load_topology`] reads
    pub fn export_topology(&self) -> RigTopology {
        let state = self.state.lock();
        RigTopology {
            interfaces: state
                .interfaces
                .iter()
                .map(|(id, iface)| InterfaceDescription::new(id.clone(), iface.config()))
                .collect(),
            assignments: state
                .assignments
                .iter()
                .map(|(id, u)| UniverseAssignment::new(id.clone(), *u))
                .collect(),
            profiles: state.profiles.clone(),
            devices: state.patches.clone(),
        }
    }
}

impl Drop for DmxPatch {
    fn drop(&mut self) {
        // Close whatever is still open
        for iface in self.state.get_mut().interfaces.values_mut() {
            if iface.is_ready() {
                iface.close();
            }
        }
    }
}
