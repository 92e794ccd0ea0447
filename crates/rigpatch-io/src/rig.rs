//! Rig I/O - High-level API
//!
//! Saving and loading rigs with version and consistency checks, and turning
//! a loaded rig into a running patch engine. Serialization details live in
//! the `rig_format` module.

use crate::error::{IoError, Result};
use crate::rig_format::{RigFile, RIG_FILE_VERSION};
use rigpatch_control::dmx::{DmxPatch, EventSink, LoadReport, RigTopology};
use rigpatch_core::Device;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// Saves devices and their patch to a rig file.
pub fn save_rig(devices: &[Device], patch: &RigTopology, path: &Path) -> Result<()> {
    let mut rig_file = RigFile::new(devices.to_vec(), patch.clone());
    rig_file.save(path)
}

/// Loads a rig file, rejecting other format versions and duplicate device ids.
pub fn load_rig(path: &Path) -> Result<RigFile> {
    let rig_file = RigFile::load(path)?;

    if rig_file.version != RIG_FILE_VERSION {
        return Err(IoError::VersionMismatch {
            expected: RIG_FILE_VERSION.to_string(),
            found: rig_file.version,
        });
    }

    let mut seen = BTreeSet::new();
    for device in &rig_file.devices {
        if !seen.insert(device.id()) {
            return Err(IoError::DuplicateDevice(device.id().to_string()));
        }
    }

    tracing::info!(
        "Loaded rig {} ({} devices)",
        path.display(),
        rig_file.devices.len()
    );
    Ok(rig_file)
}

/// Builds a patch engine from a loaded rig.
///
/// Bindings that do not resolve are listed in the returned report; the
/// engine is usable either way.
pub fn build_patch(rig: &RigFile, sink: Arc<dyn EventSink>) -> (DmxPatch, LoadReport) {
    DmxPatch::from_topology(&rig.patch, sink)
}
