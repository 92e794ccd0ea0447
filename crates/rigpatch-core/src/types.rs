//! Typed parameter values
//!
//! Every device parameter holds one of four value kinds. The DMX encoder only
//! reads these values; interpolation and cue blending live elsewhere.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f32::consts::PI;
use std::fmt;

use crate::{CoreError, Result};

/// Kind of a typed parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Float,
    Enum,
    Color,
    Orientation,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float => write!(f, "float"),
            Self::Enum => write!(f, "enum"),
            Self::Color => write!(f, "color"),
            Self::Orientation => write!(f, "orientation"),
        }
    }
}

/// A typed device parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamValue {
    Float(FloatParam),
    Enum(EnumParam),
    Color(ColorParam),
    Orientation(OrientationParam),
}

impl ParamValue {
    /// Kind of the stored value
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Float(_) => ValueKind::Float,
            Self::Enum(_) => ValueKind::Enum,
            Self::Color(_) => ValueKind::Color,
            Self::Orientation(_) => ValueKind::Orientation,
        }
    }

    pub fn as_float(&self) -> Option<&FloatParam> {
        match self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumParam> {
        match self {
            Self::Enum(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<&ColorParam> {
        match self {
            Self::Color(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_orientation(&self) -> Option<&OrientationParam> {
        match self {
            Self::Orientation(v) => Some(v),
            _ => None,
        }
    }

    /// Restore the value to its declared default
    pub fn reset(&mut self) {
        match self {
            Self::Float(v) => v.value = v.default,
            Self::Enum(v) => v.reset(),
            Self::Color(v) => v.reset(),
            Self::Orientation(v) => v.value = v.default,
        }
    }
}

impl From<FloatParam> for ParamValue {
    fn from(v: FloatParam) -> Self {
        Self::Float(v)
    }
}

impl From<EnumParam> for ParamValue {
    fn from(v: EnumParam) -> Self {
        Self::Enum(v)
    }
}

impl From<ColorParam> for ParamValue {
    fn from(v: ColorParam) -> Self {
        Self::Color(v)
    }
}

impl From<OrientationParam> for ParamValue {
    fn from(v: OrientationParam) -> Self {
        Self::Orientation(v)
    }
}

/// Scalar parameter with a declared range (intensity, zoom, focus...)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatParam {
    pub value: f32,
    #[serde(default)]
    pub default: f32,
    #[serde(default)]
    pub min: f32,
    #[serde(default = "default_float_max")]
    pub max: f32,
}

fn default_float_max() -> f32 {
    1.0
}

impl FloatParam {
    /// Create a value in the default 0.0-1.0 range
    pub fn new(value: f32) -> Self {
        Self {
            value,
            default: 0.0,
            min: 0.0,
            max: 1.0,
        }
    }

    /// Create a value with an explicit range
    pub fn with_range(value: f32, default: f32, min: f32, max: f32) -> Self {
        Self {
            value,
            default,
            min,
            max,
        }
    }

    /// Position of the value within its range. Not clamped.
    pub fn as_percent(&self) -> f32 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.0;
        }
        (self.value - self.min) / span
    }

    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(self.min, self.max);
    }
}

impl Default for FloatParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Angular unit of an orientation parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationUnit {
    #[default]
    Degree,
    Radian,
}

/// Pan or tilt angle with a declared travel range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationParam {
    pub value: f32,
    #[serde(default)]
    pub unit: OrientationUnit,
    #[serde(default)]
    pub default: f32,
    #[serde(default)]
    pub min: f32,
    #[serde(default = "default_orientation_max")]
    pub max: f32,
}

fn default_orientation_max() -> f32 {
    360.0
}

impl OrientationParam {
    /// Angle in degrees over a 0-360 travel
    pub fn degrees(value: f32) -> Self {
        Self::with_range(value, OrientationUnit::Degree, 0.0, 360.0)
    }

    pub fn with_range(value: f32, unit: OrientationUnit, min: f32, max: f32) -> Self {
        Self {
            value,
            unit,
            default: min,
            min,
            max,
        }
    }

    /// Position of the angle within its travel. Not clamped.
    pub fn as_percent(&self) -> f32 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.0;
        }
        (self.value - self.min) / span
    }

    /// Current value expressed in `unit`
    pub fn value_in(&self, unit: OrientationUnit) -> f32 {
        convert_angle(self.value, self.unit, unit)
    }

    /// Switch units, converting value and range
    pub fn set_unit(&mut self, unit: OrientationUnit) {
        if self.unit == unit {
            return;
        }
        self.value = convert_angle(self.value, self.unit, unit);
        self.default = convert_angle(self.default, self.unit, unit);
        self.min = convert_angle(self.min, self.unit, unit);
        self.max = convert_angle(self.max, self.unit, unit);
        self.unit = unit;
    }
}

fn convert_angle(value: f32, from: OrientationUnit, to: OrientationUnit) -> f32 {
    match (from, to) {
        (OrientationUnit::Degree, OrientationUnit::Radian) => value * PI / 180.0,
        (OrientationUnit::Radian, OrientationUnit::Degree) => value * 180.0 / PI,
        _ => value,
    }
}

/// Enumerated parameter (gobo wheel, shutter, color wheel...)
///
/// Each option owns the DMX byte range starting at its `start` value and
/// ending just before the next option's start. `tweak` selects a position
/// inside the active option's range (0.0 = first byte, 1.0 = last byte).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumParam {
    pub options: BTreeMap<String, u8>,
    pub active: String,
    #[serde(default = "default_tweak")]
    pub tweak: f32,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default = "default_range_max")]
    pub range_max: u8,
}

fn default_tweak() -> f32 {
    0.5
}

fn default_range_max() -> u8 {
    255
}

impl EnumParam {
    /// Build an enum from `(name, start)` pairs; the first option is active
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = (S, u8)>,
        S: Into<String>,
    {
        let options: BTreeMap<String, u8> =
            options.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let active = options
            .iter()
            .min_by_key(|(_, start)| **start)
            .map(|(name, _)| name.clone())
            .unwrap_or_default();
        Self {
            options,
            default: Some(active.clone()),
            active,
            tweak: default_tweak(),
            range_max: default_range_max(),
        }
    }

    /// Select the active option
    pub fn set(&mut self, option: &str, tweak: f32) -> Result<()> {
        if !self.options.contains_key(option) {
            return Err(CoreError::UnknownOption(option.to_string()));
        }
        self.active = option.to_string();
        self.tweak = tweak.clamp(0.0, 1.0);
        Ok(())
    }

    /// Inclusive byte range covered by an option
    pub fn option_range(&self, option: &str) -> Option<(u8, u8)> {
        let start = *self.options.get(option)?;
        let end = self
            .options
            .values()
            .filter(|s| **s > start)
            .min()
            .map(|next| next - 1)
            .unwrap_or(self.range_max);
        Some((start, end.max(start)))
    }

    /// DMX byte for the active option and tweak
    pub fn range_value(&self) -> u8 {
        match self.option_range(&self.active) {
            Some((start, end)) => {
                let span = f32::from(end - start);
                let offset = (self.tweak.clamp(0.0, 1.0) * span).round() as u8;
                start.saturating_add(offset).min(end)
            }
            None => 0,
        }
    }

    fn reset(&mut self) {
        if let Some(default) = &self.default {
            self.active = default.clone();
        }
        self.tweak = default_tweak();
    }
}

/// Multi-channel color (RGB, RGBW, or LED-engine specific channels)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorParam {
    pub channels: BTreeMap<String, f64>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl ColorParam {
    /// Color with Red/Green/Blue channels
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::from_channels([("Red", r), ("Green", g), ("Blue", b)])
    }

    /// Color with Red/Green/Blue/White channels
    pub fn rgbw(r: f64, g: f64, b: f64, w: f64) -> Self {
        Self::from_channels([("Red", r), ("Green", g), ("Blue", b), ("White", w)])
    }

    pub fn from_channels<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            channels: channels.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            weight: default_weight(),
        }
    }

    /// Channel value, 0.0 when the color has no such channel
    pub fn channel(&self, name: &str) -> f64 {
        self.channels.get(name).copied().unwrap_or(0.0)
    }

    pub fn set_channel(&mut self, name: &str, value: f64) {
        self.channels.insert(name.to_string(), value.clamp(0.0, 1.0));
    }

    fn reset(&mut self) {
        for v in self.channels.values_mut() {
            *v = 0.0;
        }
        self.weight = default_weight();
    }
}
