//! Rigpatch I/O - Rig Files
//!
//! Reading and writing rig files: the devices of a show plus the DMX patch
//! (interfaces, profiles, universe assignments, device bindings) that drives
//! them. Rig files are JSON or RON, chosen by extension, and carry a format
//! version and timestamps.

#![allow(missing_docs)]

pub mod error;
pub mod rig;
pub mod rig_format;

pub use error::{IoError, Result};
pub use rig::{build_patch, load_rig, save_rig};
pub use rig_format::{RigFile, RigFormat, RigMetadata, MAX_RIG_FILE_SIZE, RIG_FILE_VERSION};
