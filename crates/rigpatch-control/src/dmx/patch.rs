//! Device patch entries and the per-device encode step

use rigpatch_core::{Device, ParamValue};
use serde::{Deserialize, Serialize};

use super::conversion::ConversionType;
use super::profile::ConversionProfile;
use super::universe::{Universe, DMX_UNIVERSE_SIZE};
use crate::error::EncodeError;

/// Where a device lives: universe, base address and conversion profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePatch {
    /// Name of the conversion profile
    pub profile: String,
    /// Zero-based channel of the first byte
    pub address: u32,
    /// Universe number
    pub universe: u32,
}

impl DevicePatch {
    pub fn new(profile: impl Into<String>, address: u32, universe: u32) -> Self {
        Self {
            profile: profile.into(),
            address,
            universe,
        }
    }
}

/// A parameter skipped because its value kind did not fit the conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ParamMismatch {
    pub param: String,
    pub error: EncodeError,
}

/// What happened to one device's parameters during encode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodeSummary {
    /// Parameters written into the universe
    pub written: usize,
    /// Profile parameters the device does not carry
    pub missing: Vec<String>,
    /// Parameters whose value kind did not match
    pub mismatches: Vec<ParamMismatch>,
}

/// Encode `device` through `profile` into `buffer` at `patch.address`
///
/// Every present parameter's channel range is checked before anything is
/// written, so an out-of-range mapping leaves the buffer untouched.
pub fn encode_device(
    device: &Device,
    profile: &ConversionProfile,
    address: u32,
    buffer: &mut Universe,
) -> Result<EncodeSummary, EncodeError> {
    let mut summary = EncodeSummary::default();
    let mut pending: Vec<(&str, &ParamValue, ConversionType, usize)> = Vec::new();

    for (param, mapping) in profile.iter() {
        let Some(value) = device.param(param) else {
            summary.missing.push(param.to_string());
            continue;
        };
        // Widened so addresses near u32::MAX cannot wrap back into the universe
        let start = u64::from(address) + u64::from(mapping.start);
        let end = start + mapping.conversion.width() as u64;
        if end > DMX_UNIVERSE_SIZE as u64 {
            return Err(EncodeError::AddressOutOfRange {
                param: param.to_string(),
                start,
                end,
            });
        }
        pending.push((param, value, mapping.conversion, start as usize));
    }

    for (param, value, conversion, start) in pending {
        let out = &mut buffer[start..start + conversion.width()];
        match conversion.encode(value, out) {
            Ok(()) => summary.written += 1,
            Err(error) => summary.mismatches.push(ParamMismatch {
                param: param.to_string(),
                error,
            }),
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigpatch_core::{ColorParam, EnumParam, FloatParam};

    fn par() -> ConversionProfile {
        ConversionProfile::new()
            .with("intensity", 0, ConversionType::SingleByte)
            .with("color", 1, ConversionType::ColorRgb)
            .with("strobe", 4, ConversionType::SingleByte)
    }

    #[test]
    fn test_encode_at_address() {
        let device = Device::new("p1", "par")
            .with_param("intensity", FloatParam::new(1.0))
            .with_param("color", ColorParam::rgb(1.0, 0.0, 0.5));
        let mut buffer = [0u8; DMX_UNIVERSE_SIZE];

        let summary = encode_device(&device, &par(), 20, &mut buffer).unwrap();

        assert_eq!(summary.written, 2);
        assert_eq!(summary.missing, vec!["strobe".to_string()]);
        assert_eq!(&buffer[20..24], &[255, 255, 0, 128]);
        assert_eq!(buffer[24], 0);
    }

    #[test]
    fn test_mismatch_skips_only_that_param() {
        let device = Device::new("p1", "par")
            .with_param("intensity", FloatParam::new(0.5))
            .with_param("color", EnumParam::new([("open", 0), ("red", 10)]));
        let mut buffer = [0u8; DMX_UNIVERSE_SIZE];

        let summary = encode_device(&device, &par(), 0, &mut buffer).unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(summary.mismatches.len(), 1);
        assert_eq!(summary.mismatches[0].param, "color");
        assert_eq!(buffer[0], 128);
        assert_eq!(&buffer[1..4], &[0, 0, 0]);
    }

    #[test]
    fn test_out_of_range_writes_nothing() {
        let device = Device::new("p1", "par")
            .with_param("intensity", FloatParam::new(1.0))
            .with_param("strobe", FloatParam::new(1.0));
        let mut buffer = [0u8; DMX_UNIVERSE_SIZE];

        let err = encode_device(&device, &par(), 508, &mut buffer).unwrap_err();

        assert_eq!(
            err,
            EncodeError::AddressOutOfRange {
                param: "strobe".into(),
                start: 512,
                end: 513,
            }
        );
        assert!(buffer.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_address_at_u32_max() {
        let device = Device::new("d", "dimmer").with_param("intensity", FloatParam::new(1.0));
        let profile = ConversionProfile::new().with("intensity", 1, ConversionType::SingleByte);
        let mut buffer = [0u8; DMX_UNIVERSE_SIZE];

        let err = encode_device(&device, &profile, u32::MAX, &mut buffer).unwrap_err();

        assert_eq!(
            err,
            EncodeError::AddressOutOfRange {
                param: "intensity".into(),
                start: u64::from(u32::MAX) + 1,
                end: u64::from(u32::MAX) + 2,
            }
        );
        assert!(buffer.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_last_channel_fits() {
        let device = Device::new("d", "dimmer").with_param("intensity", FloatParam::new(1.0));
        let profile = ConversionProfile::new().with("intensity", 0, ConversionType::SingleByte);
        let mut buffer = [0u8; DMX_UNIVERSE_SIZE];

        encode_device(&device, &profile, 511, &mut buffer).unwrap();
        assert_eq!(buffer[511], 255);
    }
}
