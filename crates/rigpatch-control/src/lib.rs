//! Rigpatch Control - DMX Patch Engine
//!
//! This crate turns device parameter values into DMX512 output:
//! - **Conversions**: float, fine, orientation, enum and color encoders
//! - **Profiles**: per device type parameter layouts
//! - **Patch engine**: universe bank, interface assignments, update cycle
//! - **Transports**: Art-Net, sACN, KiNet, Enttec DMX USB Pro, loopback
//! - **Topology**: serializable rig description with two-pass loading
//!
//! ## Feature Flags
//!
//! - `serial`: Enttec DMX USB Pro support (requires `serialport`, on by default)
//!
//! ## Modules
//!
//! - [`dmx`] - Patch engine and transports
//! - [`error`] - Error types

#![allow(missing_docs)]

/// Error types
pub mod error;

/// DMX patching and output
pub mod dmx;

// Re-exports
pub use error::{ConfigError, ControlError, EncodeError, InitError, Result, SendError};
