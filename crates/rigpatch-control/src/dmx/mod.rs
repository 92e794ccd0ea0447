//! DMX patch system
//!
//! Devices carry typed parameters. A conversion profile says where each
//! parameter lands relative to the device's base address and how it is
//! converted to bytes. The patch engine encodes devices into 512-byte
//! universe buffers and pushes each universe to every interface assigned
//! to it.
//!
//! ## Transports
//!
//! - **Art-Net**: UDP broadcast (255.255.255.255:6454), universes 0-32767
//! - **sACN (E1.31)**: IP multicast (239.255.x.x:5568) or unicast, universes 1-63999
//! - **KiNet**: unicast UDP to Color Kinetics power supplies, v1 and PortOut
//! - **Enttec DMX USB Pro**: serial widget (feature `serial`)
//! - **Loopback**: in-memory bus with a readable tap
//!
//! ## Example Usage
//!
//! ```rust
//! use rigpatch_control::dmx::{
//!     ConversionProfile, ConversionType, DevicePatch, DmxPatch, LoopbackConfig,
//!     LoopbackInterface,
//! };
//! use rigpatch_core::{Device, FloatParam};
//!
//! # fn main() -> rigpatch_control::Result<()> {
//! let patch = DmxPatch::new();
//!
//! let bus = LoopbackInterface::new("bus", LoopbackConfig::default());
//! let tap = bus.tap();
//! patch.add_interface(Box::new(bus));
//! patch.assign_interface("bus", 0)?;
//!
//! patch.add_conversion_profile(
//!     "dimmer",
//!     ConversionProfile::new().with("intensity", 0, ConversionType::SingleByte),
//! )?;
//! patch.patch_device("d1", DevicePatch::new("dimmer", 10, 0));
//! patch.init();
//!
//! let device = Device::new("d1", "dimmer").with_param("intensity", FloatParam::new(0.5));
//! let report = patch.update([&device]);
//!
//! assert_eq!(report.encoded(), 1);
//! assert_eq!(tap.last(0).unwrap()[10], 128);
//! # Ok(())
//! # }
//! ```

pub mod conversion;
pub mod engine;
pub mod events;
pub mod interface;
pub mod patch;
pub mod profile;
pub mod topology;
pub mod transport;
pub mod universe;

pub use conversion::ConversionType;
pub use engine::{CycleReport, DeviceOutcome, DispatchReport, DmxPatch, SendFailure};
pub use events::{ChannelSink, EventSink, PatchEvent, SkipReason, TracingSink};
pub use interface::{Delivery, DmxInterface, InterfaceConfig};
pub use patch::{encode_device, DevicePatch, EncodeSummary, ParamMismatch};
pub use profile::{ConversionProfile, ParameterMapping};
pub use topology::{InterfaceDescription, LoadReport, RigTopology, UniverseAssignment};
pub use transport::{
    ArtNetConfig, ArtNetInterface, EnttecProConfig, EnttecProInterface, KinetConfig,
    KinetInterface, KinetProtocol, LoopbackConfig, LoopbackInterface, LoopbackTap, SacnConfig,
    SacnInterface,
};
pub use universe::{describe_universe, Universe, UniverseBank, DMX_UNIVERSE_SIZE};
