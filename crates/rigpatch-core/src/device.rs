//! Devices
//!
//! A device is the abstract representation of one lighting instrument. Its id
//! never changes after creation because patch tables and selections index by it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{
    ColorParam, EnumParam, FloatParam, OrientationParam, ParamValue, ValueKind,
};
use crate::{CoreError, Result};

/// A lighting device with typed parameters and string metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    id: String,
    #[serde(rename = "type", default)]
    device_type: String,
    #[serde(default)]
    params: BTreeMap<String, ParamValue>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl Device {
    /// Create a device with no parameters
    pub fn new(id: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            device_type: device_type.into(),
            params: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    /// Typed value of a parameter, `None` when the device does not have it
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn param_mut(&mut self, name: &str) -> Option<&mut ParamValue> {
        self.params.get_mut(name)
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Insert or replace a parameter
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`Device::set_param`]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set_param(name, value);
        self
    }

    pub fn remove_param(&mut self, name: &str) -> Option<ParamValue> {
        self.params.remove(name)
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    /// Set the value of an existing float parameter
    pub fn set_float(&mut self, name: &str, value: f32) -> Result<()> {
        match self.params.get_mut(name) {
            Some(ParamValue::Float(f)) => {
                f.set(value);
                Ok(())
            }
            Some(other) => Err(kind_mismatch(name, ValueKind::Float, other.kind())),
            None => Err(self.unknown(name)),
        }
    }

    /// Select an option of an existing enum parameter
    pub fn set_enum(&mut self, name: &str, option: &str, tweak: f32) -> Result<()> {
        match self.params.get_mut(name) {
            Some(ParamValue::Enum(e)) => e.set(option, tweak),
            Some(other) => Err(kind_mismatch(name, ValueKind::Enum, other.kind())),
            None => Err(self.unknown(name)),
        }
    }

    /// Set one channel of an existing color parameter
    pub fn set_color_channel(&mut self, name: &str, channel: &str, value: f64) -> Result<()> {
        match self.params.get_mut(name) {
            Some(ParamValue::Color(c)) => {
                c.set_channel(channel, value);
                Ok(())
            }
            Some(other) => Err(kind_mismatch(name, ValueKind::Color, other.kind())),
            None => Err(self.unknown(name)),
        }
    }

    pub fn float(&self, name: &str) -> Option<&FloatParam> {
        self.param(name).and_then(ParamValue::as_float)
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumParam> {
        self.param(name).and_then(ParamValue::as_enum)
    }

    pub fn color(&self, name: &str) -> Option<&ColorParam> {
        self.param(name).and_then(ParamValue::as_color)
    }

    pub fn orientation(&self, name: &str) -> Option<&OrientationParam> {
        self.param(name).and_then(ParamValue::as_orientation)
    }

    /// Convenience accessor for the conventional `intensity` parameter
    pub fn intensity(&self) -> Option<f32> {
        self.float("intensity").map(|f| f.value)
    }

    /// Reset every parameter to its default value
    pub fn reset(&mut self) {
        for value in self.params.values_mut() {
            value.reset();
        }
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn remove_metadata(&mut self, key: &str) -> Option<String> {
        self.metadata.remove(key)
    }

    pub fn metadata_keys(&self) -> impl Iterator<Item = &str> {
        self.metadata.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn unknown(&self, name: &str) -> CoreError {
        CoreError::UnknownParameter {
            device: self.id.clone(),
            param: name.to_string(),
        }
    }
}

fn kind_mismatch(name: &str, expected: ValueKind, found: ValueKind) -> CoreError {
    CoreError::KindMismatch {
        param: name.to_string(),
        expected,
        found,
    }
}
