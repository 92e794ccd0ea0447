//! Parameter to DMX conversions
//!
//! Each conversion writes a fixed number of channels. Encoding is pure: it
//! knows nothing about universes, base addresses or interfaces.

use rigpatch_core::{ColorParam, ParamValue, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, EncodeError};

/// Channel order of the ETC Lustr+ direct mode
pub const LUSTR_PLUS_CHANNELS: [&str; 7] =
    ["Red", "White", "Amber", "Green", "Cyan", "Blue", "Indigo"];

const RGB_CHANNELS: [&str; 3] = ["Red", "Green", "Blue"];
const RGBW_CHANNELS: [&str; 4] = ["Red", "Green", "Blue", "White"];

/// How a typed value becomes DMX bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionType {
    /// Float to one channel (0-255)
    #[serde(rename = "FLOAT_TO_SINGLE")]
    SingleByte,
    /// Float to coarse + fine channels (0-65535)
    #[serde(rename = "FLOAT_TO_FINE")]
    FineChannel,
    /// Orientation to coarse + fine channels
    #[serde(rename = "ORI_TO_FINE")]
    OrientationFine,
    /// Enum to its resolved byte
    #[serde(rename = "ENUM")]
    EnumByte,
    /// Color to R, G, B
    #[serde(rename = "COLOR_RGB")]
    ColorRgb,
    /// Color to R, G, B, W
    #[serde(rename = "COLOR_RGBW")]
    ColorRgbw,
    /// Color to the seven Lustr+ emitters
    #[serde(rename = "COLOR_LUSTRPLUS")]
    ColorLustrPlus,
    /// Color R, G, B written twice (multi-cell fixtures)
    #[serde(rename = "RGB_REPEAT2")]
    RgbRepeat2,
    /// Color R, G, B written three times
    #[serde(rename = "RGB_REPEAT3")]
    RgbRepeat3,
    /// Color R, G, B written four times
    #[serde(rename = "RGB_REPEAT4")]
    RgbRepeat4,
}

impl ConversionType {
    pub const ALL: [ConversionType; 10] = [
        Self::SingleByte,
        Self::FineChannel,
        Self::OrientationFine,
        Self::EnumByte,
        Self::ColorRgb,
        Self::ColorRgbw,
        Self::ColorLustrPlus,
        Self::RgbRepeat2,
        Self::RgbRepeat3,
        Self::RgbRepeat4,
    ];

    /// Number of channels written
    pub fn width(self) -> usize {
        match self {
            Self::SingleByte | Self::EnumByte => 1,
            Self::FineChannel | Self::OrientationFine => 2,
            Self::ColorRgb => 3,
            Self::ColorRgbw => 4,
            Self::ColorLustrPlus => 7,
            Self::RgbRepeat2 => 6,
            Self::RgbRepeat3 => 9,
            Self::RgbRepeat4 => 12,
        }
    }

    /// Value kind this conversion reads
    pub fn source_kind(self) -> ValueKind {
        match self {
            Self::SingleByte | Self::FineChannel => ValueKind::Float,
            Self::OrientationFine => ValueKind::Orientation,
            Self::EnumByte => ValueKind::Enum,
            Self::ColorRgb
            | Self::ColorRgbw
            | Self::ColorLustrPlus
            | Self::RgbRepeat2
            | Self::RgbRepeat3
            | Self::RgbRepeat4 => ValueKind::Color,
        }
    }

    /// Rig file tag
    pub fn tag(self) -> &'static str {
        match self {
            Self::SingleByte => "FLOAT_TO_SINGLE",
            Self::FineChannel => "FLOAT_TO_FINE",
            Self::OrientationFine => "ORI_TO_FINE",
            Self::EnumByte => "ENUM",
            Self::ColorRgb => "COLOR_RGB",
            Self::ColorRgbw => "COLOR_RGBW",
            Self::ColorLustrPlus => "COLOR_LUSTRPLUS",
            Self::RgbRepeat2 => "RGB_REPEAT2",
            Self::RgbRepeat3 => "RGB_REPEAT3",
            Self::RgbRepeat4 => "RGB_REPEAT4",
        }
    }

    /// Encode `value` into `out`, which must be exactly `width()` bytes
    pub fn encode(self, value: &ParamValue, out: &mut [u8]) -> Result<(), EncodeError> {
        if out.len() != self.width() {
            return Err(EncodeError::WidthMismatch {
                expected: self.width(),
                actual: out.len(),
            });
        }

        match (self, value) {
            (Self::SingleByte, ParamValue::Float(v)) => {
                out[0] = to_byte(f64::from(v.as_percent()));
            }
            (Self::FineChannel, ParamValue::Float(v)) => {
                out.copy_from_slice(&to_fine(f64::from(v.as_percent())));
            }
            (Self::OrientationFine, ParamValue::Orientation(v)) => {
                out.copy_from_slice(&to_fine(f64::from(v.as_percent())));
            }
            (Self::EnumByte, ParamValue::Enum(v)) => {
                out[0] = v.range_value();
            }
            (Self::ColorRgb, ParamValue::Color(c)) => write_channels(c, &RGB_CHANNELS, out),
            (Self::ColorRgbw, ParamValue::Color(c)) => write_channels(c, &RGBW_CHANNELS, out),
            (Self::ColorLustrPlus, ParamValue::Color(c)) => {
                write_channels(c, &LUSTR_PLUS_CHANNELS, out)
            }
            (Self::RgbRepeat2 | Self::RgbRepeat3 | Self::RgbRepeat4, ParamValue::Color(c)) => {
                for cell in out.chunks_exact_mut(3) {
                    write_channels(c, &RGB_CHANNELS, cell);
                }
            }
            _ => {
                return Err(EncodeError::Mismatch {
                    expected: self.source_kind(),
                    found: value.kind(),
                })
            }
        }

        Ok(())
    }

    /// Encode into a freshly allocated buffer
    pub fn encode_to_vec(self, value: &ParamValue) -> Result<Vec<u8>, EncodeError> {
        let mut out = vec![0u8; self.width()];
        self.encode(value, &mut out)?;
        Ok(out)
    }

    /// Recover the 0.0-1.0 position from encoded bytes
    ///
    /// Only defined for the scalar conversions; returns `None` for enums,
    /// colors, or a slice of the wrong length.
    pub fn decode_percent(self, bytes: &[u8]) -> Option<f32> {
        match (self, bytes) {
            (Self::SingleByte, [b]) => Some(f32::from(*b) / 255.0),
            (Self::FineChannel | Self::OrientationFine, [coarse, fine]) => {
                let v = u16::from_be_bytes([*coarse, *fine]);
                Some(f32::from(v) / 65535.0)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ConversionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ConversionType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.tag() == s)
            .ok_or_else(|| ConfigError::UnknownConversion(s.to_string()))
    }
}

/// Clamp to 0.0-1.0 and scale to a single byte
fn to_byte(percent: f64) -> u8 {
    (percent.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Clamp to 0.0-1.0 and scale to 16 bits, coarse byte first
fn to_fine(percent: f64) -> [u8; 2] {
    let v = (percent.clamp(0.0, 1.0) * 65535.0).round() as u16;
    v.to_be_bytes()
}

fn write_channels(color: &ColorParam, names: &[&str], out: &mut [u8]) {
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = to_byte(color.channel(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigpatch_core::{EnumParam, FloatParam, OrientationParam, OrientationUnit};

    fn float(v: f32) -> ParamValue {
        ParamValue::Float(FloatParam::new(v))
    }

    #[test]
    fn test_widths() {
        let total: usize = ConversionType::ALL.iter().map(|c| c.width()).sum();
        assert_eq!(total, 1 + 2 + 2 + 1 + 3 + 4 + 7 + 6 + 9 + 12);
    }

    #[test]
    fn test_single_byte_rounding() {
        let c = ConversionType::SingleByte;
        assert_eq!(c.encode_to_vec(&float(0.0)).unwrap(), vec![0]);
        assert_eq!(c.encode_to_vec(&float(0.5)).unwrap(), vec![128]);
        assert_eq!(c.encode_to_vec(&float(1.0)).unwrap(), vec![255]);
    }

    #[test]
    fn test_out_of_range_floats_clamp() {
        let c = ConversionType::SingleByte;
        assert_eq!(c.encode_to_vec(&float(1.7)).unwrap(), vec![255]);
        assert_eq!(c.encode_to_vec(&float(-0.3)).unwrap(), vec![0]);

        let fine = ConversionType::FineChannel;
        assert_eq!(fine.encode_to_vec(&float(2.0)).unwrap(), vec![0xFF, 0xFF]);
    }

    #[test]
    fn test_fine_is_coarse_first() {
        let fine = ConversionType::FineChannel;
        // 0.5 * 65535 = 32767.5 -> 32768 = 0x8000
        assert_eq!(fine.encode_to_vec(&float(0.5)).unwrap(), vec![0x80, 0x00]);
        // 0.25 * 65535 = 16383.75 -> 16384 = 0x4000
        assert_eq!(fine.encode_to_vec(&float(0.25)).unwrap(), vec![0x40, 0x00]);
    }

    #[test]
    fn test_float_range_is_normalized() {
        let value = ParamValue::Float(FloatParam::with_range(100.0, 0.0, 0.0, 200.0));
        assert_eq!(
            ConversionType::SingleByte.encode_to_vec(&value).unwrap(),
            vec![128]
        );
    }

    #[test]
    fn test_orientation_fine() {
        let tilt = ParamValue::Orientation(OrientationParam::with_range(
            0.0,
            OrientationUnit::Degree,
            -135.0,
            135.0,
        ));
        assert_eq!(
            ConversionType::OrientationFine.encode_to_vec(&tilt).unwrap(),
            vec![0x80, 0x00]
        );
    }

    #[test]
    fn test_enum_byte() {
        let mut gobo = EnumParam::new([("Open", 0u8), ("Dots", 16), ("Breakup", 32)]);
        gobo.set("Dots", 0.0).unwrap();
        let bytes = ConversionType::EnumByte
            .encode_to_vec(&ParamValue::Enum(gobo))
            .unwrap();
        assert_eq!(bytes, vec![16]);
    }

    #[test]
    fn test_color_layouts() {
        let color = ParamValue::Color(ColorParam::rgbw(1.0, 0.5, 0.0, 0.2));

        assert_eq!(
            ConversionType::ColorRgb.encode_to_vec(&color).unwrap(),
            vec![255, 128, 0]
        );
        assert_eq!(
            ConversionType::ColorRgbw.encode_to_vec(&color).unwrap(),
            vec![255, 128, 0, 51]
        );
        assert_eq!(
            ConversionType::RgbRepeat3.encode_to_vec(&color).unwrap(),
            vec![255, 128, 0, 255, 128, 0, 255, 128, 0]
        );
    }

    #[test]
    fn test_lustr_plus_order() {
        let color = ParamValue::Color(ColorParam::from_channels([
            ("Red", 1.0),
            ("White", 0.0),
            ("Amber", 0.2),
            ("Green", 0.4),
            ("Cyan", 0.6),
            ("Blue", 0.8),
            ("Indigo", 1.0),
        ]));
        assert_eq!(
            ConversionType::ColorLustrPlus.encode_to_vec(&color).unwrap(),
            vec![255, 0, 51, 102, 153, 204, 255]
        );
    }

    #[test]
    fn test_kind_mismatch() {
        let gobo = ParamValue::Enum(EnumParam::new([("Open", 0u8)]));
        let err = ConversionType::ColorRgb.encode_to_vec(&gobo).unwrap_err();
        assert_eq!(
            err,
            EncodeError::Mismatch {
                expected: ValueKind::Color,
                found: ValueKind::Enum,
            }
        );
    }

    #[test]
    fn test_wrong_output_width() {
        let mut out = [0u8; 3];
        let err = ConversionType::SingleByte
            .encode(&float(0.5), &mut out)
            .unwrap_err();
        assert!(matches!(err, EncodeError::WidthMismatch { expected: 1, actual: 3 }));
        assert_eq!(out, [0, 0, 0]);
    }

    #[test]
    fn test_tags_parse_back() {
        for c in ConversionType::ALL {
            assert_eq!(c.tag().parse::<ConversionType>().unwrap(), c);
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.tag()));
        }
        assert!("FLOAT_TO_TRIPLE".parse::<ConversionType>().is_err());
    }

    #[test]
    fn test_decode_undefined_for_colors() {
        assert!(ConversionType::ColorRgb.decode_percent(&[1, 2, 3]).is_none());
        assert!(ConversionType::SingleByte.decode_percent(&[1, 2]).is_none());
    }
}
