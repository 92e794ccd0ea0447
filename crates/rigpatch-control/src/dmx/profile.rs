//! Conversion profiles
//!
//! A profile maps device parameter names to a start offset (relative to the
//! device's base address) and a conversion. Profiles are shared by every
//! device of the same type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::conversion::ConversionType;
use super::universe::DMX_UNIVERSE_SIZE;
use crate::error::ConfigError;

/// Where a parameter lives inside a device's footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMapping {
    /// Offset from the device base address
    pub start: u32,
    /// How the value is converted
    pub conversion: ConversionType,
}

impl ParameterMapping {
    pub fn new(start: u32, conversion: ConversionType) -> Self {
        Self { start, conversion }
    }

    /// One past the last offset written, saturating at `u32::MAX`
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.conversion.width() as u32)
    }
}

/// Named parameter layout for a device type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionProfile {
    mappings: BTreeMap<String, ParameterMapping>,
}

impl ConversionProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a parameter mapping, returning the previous one
    pub fn insert(
        &mut self,
        param: impl Into<String>,
        start: u32,
        conversion: ConversionType,
    ) -> Option<ParameterMapping> {
        self.mappings
            .insert(param.into(), ParameterMapping::new(start, conversion))
    }

    /// Builder-style variant of [`ConversionProfile::insert`]
    pub fn with(mut self, param: impl Into<String>, start: u32, conversion: ConversionType) -> Self {
        self.insert(param, start, conversion);
        self
    }

    pub fn get(&self, param: &str) -> Option<&ParameterMapping> {
        self.mappings.get(param)
    }

    pub fn remove(&mut self, param: &str) -> Option<ParameterMapping> {
        self.mappings.remove(param)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterMapping)> {
        self.mappings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Total channels written: the sum of all conversion widths
    pub fn footprint(&self) -> usize {
        self.mappings.values().map(|m| m.conversion.width()).sum()
    }

    /// One past the highest offset written, i.e. the span a device occupies
    pub fn extent(&self) -> u32 {
        self.mappings.values().map(ParameterMapping::end).max().unwrap_or(0)
    }

    /// Reject profiles where two parameters write the same channel, or where
    /// a parameter cannot fit in a universe even at base address 0
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if let Some((param, mapping)) = self
            .iter()
            .find(|(_, m)| m.end() as usize > DMX_UNIVERSE_SIZE)
        {
            return Err(ConfigError::OffsetOutOfRange {
                profile: name.to_string(),
                param: param.to_string(),
                offset: mapping.start,
            });
        }

        let mut spans: Vec<(&str, &ParameterMapping)> = self.iter().collect();
        spans.sort_by_key(|(param, m)| (m.start, *param));

        let mut furthest: Option<(&str, u32)> = None;
        for (param, mapping) in spans {
            if let Some((owner, end)) = furthest {
                if mapping.start < end {
                    return Err(ConfigError::OverlappingChannels {
                        profile: name.to_string(),
                        first: owner.to_string(),
                        second: param.to_string(),
                        offset: mapping.start,
                    });
                }
            }
            if furthest.map_or(true, |(_, end)| mapping.end() > end) {
                furthest = Some((param, mapping.end()));
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, ParameterMapping)> for ConversionProfile {
    fn from_iter<I: IntoIterator<Item = (S, ParameterMapping)>>(iter: I) -> Self {
        Self {
            mappings: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
