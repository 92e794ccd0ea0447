//! Rigpatch Core - Device Model
//!
//! This crate contains the device-centric model consumed by the DMX patch engine:
//! - Typed parameter values (float, enum, color, orientation)
//! - Devices with parameters and free-form metadata
//! - Logging configuration shared by the binaries

#![allow(missing_docs)]

use thiserror::Error;

pub mod device;
pub mod logging;
pub mod types;

pub use device::Device;
pub use logging::LogConfig;
pub use types::{
    ColorParam, EnumParam, FloatParam, OrientationParam, OrientationUnit, ParamValue, ValueKind,
};

/// Errors raised by the device model
#[derive(Error, Debug)]
pub enum CoreError {
    /// Parameter does not exist on the device
    #[error("Device '{device}' has no parameter '{param}'")]
    UnknownParameter {
        /// Device id
        device: String,
        /// Requested parameter name
        param: String,
    },

    /// Parameter exists but holds a different kind of value
    #[error("Parameter '{param}' is {found}, not {expected}")]
    KindMismatch {
        /// Parameter name
        param: String,
        /// Kind the caller asked for
        expected: ValueKind,
        /// Kind actually stored
        found: ValueKind,
    },

    /// Enum option is not declared on the parameter
    #[error("Unknown enum option '{0}'")]
    UnknownOption(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for device model operations
pub type Result<T> = std::result::Result<T, CoreError>;
