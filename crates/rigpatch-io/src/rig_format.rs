//! Defines the on-disk rig file format.
//!
//! A rig file holds the devices of a show and the DMX patch that drives
//! them, serialized to and from RON or JSON.

use crate::error::{IoError, Result};
use chrono::{DateTime, Utc};
use rigpatch_control::dmx::RigTopology;
use rigpatch_core::Device;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// The current version of the rig file format.
///
/// Bump when a change to `RigFile` or anything it contains breaks older
/// readers.
pub const RIG_FILE_VERSION: &str = "1.0.0";

/// Maximum allowed rig file size (16 MB).
pub const MAX_RIG_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// On-disk formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigFormat {
    Json,
    Ron,
}

impl RigFormat {
    /// Format for a path; files without an extension are RON
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("ron");

        match extension {
            "json" => Ok(Self::Json),
            "ron" | "rig" => Ok(Self::Ron),
            _ => Err(IoError::UnsupportedFormat(extension.to_string())),
        }
    }
}

/// Top-level structure of a saved rig.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RigFile {
    /// The version of the rig file format.
    pub version: String,
    pub metadata: RigMetadata,
    /// Devices in the rig.
    #[serde(default)]
    pub devices: Vec<Device>,
    /// Interfaces, profiles, assignments and device bindings.
    #[serde(default)]
    pub patch: RigTopology,
}

impl RigFile {
    /// Creates a new `RigFile`, setting creation and modification times to now.
    pub fn new(devices: Vec<Device>, patch: RigTopology) -> Self {
        let now = Utc::now();
        Self {
            version: RIG_FILE_VERSION.to_string(),
            metadata: RigMetadata {
                name: None,
                created_at: now,
                modified_at: now,
            },
            devices,
            patch,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = Some(name.into());
        self
    }

    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id() == id)
    }

    pub fn device_mut(&mut self, id: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.id() == id)
    }

    /// Loads a `RigFile` from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_limit(path, MAX_RIG_FILE_SIZE)
    }

    /// Loads a `RigFile` with a specific file size limit.
    pub(crate) fn load_with_limit(path: &Path, limit: u64) -> Result<Self> {
        let size = std::fs::metadata(path)?.len();
        if size > limit {
            return Err(IoError::FileTooLarge { size, limit });
        }

        let format = RigFormat::from_path(path)?;
        let mut content = String::new();
        File::open(path)?.read_to_string(&mut content)?;

        let file = match format {
            RigFormat::Json => serde_json::from_str(&content)?,
            RigFormat::Ron => ron::from_str(&content)?,
        };
        Ok(file)
    }

    /// Saves the `RigFile` to the given path, updating `modified_at`.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let format = RigFormat::from_path(path)?;
        self.metadata.modified_at = Utc::now();

        match format {
            RigFormat::Json => {
                let file = File::create(path)?;
                serde_json::to_writer_pretty(file, self)?;
            }
            RigFormat::Ron => {
                let config = ron::ser::PrettyConfig::default();
                let s = ron::ser::to_string_pretty(self, config)?;
                let mut file = File::create(path)?;
                file.write_all(s.as_bytes())?;
            }
        }

        tracing::debug!("Saved rig file {}", path.display());
        Ok(())
    }
}

/// Metadata associated with a rig file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RigMetadata {
    /// Display name of the rig.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Timestamp of when the rig was first created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last modification.
    pub modified_at: DateTime<Utc>,
}
