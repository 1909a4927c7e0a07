//! Entity - the competing horse as supplied by the caller
//!
//! The engines only ever read snapshot copies of these.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Attribute profile, each value on a 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub base_speed: f64,
    pub stamina: f64,
    pub agility: f64,
    pub intelligence: f64,
    /// Composure: high values are calm, low values are hot-headed
    pub temperament: f64,
}

impl Attributes {
    pub const MAX: f64 = 100.0;

    /// Profile with every attribute set to the same value
    pub fn uniform(value: f64) -> Self {
        Self {
            base_speed: value,
            stamina: value,
            agility: value,
            intelligence: value,
            temperament: value,
        }
    }

    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("base_speed", self.base_speed),
            ("stamina", self.stamina),
            ("agility", self.agility),
            ("intelligence", self.intelligence),
            ("temperament", self.temperament),
        ]
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::uniform(50.0)
    }
}

/// Historical race record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub races: u32,
    pub wins: u32,
}

impl RaceRecord {
    /// Win rate, or `None` without any races on record
    pub fn win_rate(&self) -> Option<f64> {
        if self.races == 0 {
            None
        } else {
            Some(f64::from(self.wins.min(self.races)) / f64::from(self.races))
        }
    }
}

/// A competing horse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub attributes: Attributes,
    #[serde(default)]
    pub record: Option<RaceRecord>,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes,
            record: None,
        }
    }

    pub fn with_record(mut self, record: RaceRecord) -> Self {
        self.record = Some(record);
        self
    }

    /// Check that every attribute is finite and within 0-100
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (attribute, value) in self.attributes.named() {
            if !value.is_finite() || !(0.0..=Attributes::MAX).contains(&value) {
                return Err(ConfigError::AttributeOutOfRange {
                    entity: self.id.clone(),
                    attribute,
                    value,
                });
            }
        }
        Ok(())
    }
}
