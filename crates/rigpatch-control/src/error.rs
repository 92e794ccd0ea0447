//! Error types for the DMX patch system
use rigpatch_core::ValueKind;
use thiserror::Error;

/// Patch engine errors surfaced by structural operations
#[derive(Error, Debug)]
pub enum ControlError {
    /// Topology or profile configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Interface id is not registered
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    /// Universe has no buffer in the bank
    #[error("Universe {0} is not allocated")]
    UniverseNotAllocated(u32),

    /// Raw universe data with the wrong length
    #[error("Invalid buffer size: expected {expected} bytes, got {actual} bytes")]
    InvalidBufferSize {
        /// Required length
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// Interface failed to initialize
    #[error("Init error: {0}")]
    Init(#[from] InitError),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Configuration errors found while building or loading a patch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Universe assignment names an interface that does not exist
    #[error("Can't assign universe {universe} to interface '{interface}': interface does not exist")]
    UnknownInterface {
        /// Interface id
        interface: String,
        /// Universe number
        universe: u32,
    },

    /// Device patch names a profile that does not exist
    #[error("Device '{device}' references unknown profile '{profile}'")]
    UnknownProfile {
        /// Device id
        device: String,
        /// Profile name
        profile: String,
    },

    /// Two parameters of a profile write the same channel
    #[error("Profile '{profile}': '{first}' and '{second}' overlap at offset {offset}")]
    OverlappingChannels {
        /// Profile name
        profile: String,
        /// First parameter
        first: String,
        /// Second parameter
        second: String,
        /// First shared offset
        offset: u32,
    },

    /// A parameter's offset places it past the end of any universe
    #[error("Profile '{profile}': '{param}' at offset {offset} does not fit in 512 channels")]
    OffsetOutOfRange {
        /// Profile name
        profile: String,
        /// Parameter name
        param: String,
        /// Offset from the device base address
        offset: u32,
    },

    /// Interface id is already registered
    #[error("Duplicate interface id '{0}'")]
    DuplicateInterface(String),

    /// Interface parameters are unusable
    #[error("Invalid settings for interface '{interface}': {reason}")]
    InvalidInterface {
        /// Interface id
        interface: String,
        /// What is wrong
        reason: String,
    },

    /// Unrecognized conversion tag in a rig description
    #[error("Unknown conversion type '{0}'")]
    UnknownConversion(String),
}

/// Transport initialization errors
#[derive(Error, Debug)]
pub enum InitError {
    /// Socket or device I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Destination could not be parsed or resolved
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress {
        /// Address as configured
        address: String,
        /// Resolver message
        reason: String,
    },

    /// Serial port could not be opened
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Transport is not available in this build
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

#[cfg(feature = "serial")]
impl From<serialport::Error> for InitError {
    fn from(e: serialport::Error) -> Self {
        Self::Serial(e.to_string())
    }
}

/// Transport send errors
#[derive(Error, Debug)]
pub enum SendError {
    /// `send` before a successful `init`, or after `close`
    #[error("Interface is not initialized")]
    NotInitialized,

    /// Universe cannot be expressed by the protocol
    #[error("Universe {universe} is out of range for {protocol}")]
    UniverseOutOfRange {
        /// Universe number
        universe: u32,
        /// Protocol name
        protocol: &'static str,
    },

    /// Socket or device I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-parameter encode errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// Value kind does not match the conversion
    #[error("Encoding mismatch: conversion expects {expected}, value is {found}")]
    Mismatch {
        /// Kind required by the conversion
        expected: ValueKind,
        /// Kind of the supplied value
        found: ValueKind,
    },

    /// Output slice length differs from the conversion width
    #[error("Output slice is {actual} bytes, conversion writes {expected}")]
    WidthMismatch {
        /// Conversion width
        expected: usize,
        /// Slice length
        actual: usize,
    },

    /// Mapping lands past the end of the universe
    #[error("Parameter '{param}' writes channels {start}..{end}, past the 512-byte universe")]
    AddressOutOfRange {
        /// Parameter name
        param: String,
        /// First absolute channel written
        start: u64,
        /// One past the last absolute channel written
        end: u64,
    },
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
