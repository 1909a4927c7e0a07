//! Race conditions - surface, weather and track state
//!
//! Each condition carries the multipliers the physics step applies:
//! a speed modifier on the participant's top speed and an energy
//! drain multiplier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unrecognised condition name
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} {value:?}")]
pub struct ParseConditionError {
    kind: &'static str,
    value: String,
}

/// Racing surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    /// Turf
    Soft,
    /// Dirt
    #[default]
    Firm,
    Synthetic,
}

impl Surface {
    /// Top speed multiplier. Agility (0-100) wins back up to half of the loss.
    pub fn speed_modifier(self, agility: f64) -> f64 {
        let base = match self {
            Surface::Firm => 1.0,
            Surface::Synthetic => 0.98,
            Surface::Soft => 0.95,
        };
        base + (1.0 - base) * (agility / 100.0) * 0.5
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    #[default]
    Clear,
    Overcast,
    Rain,
    Wind,
    Storm,
    Drizzle,
    Snow,
}

impl Weather {
    pub fn speed_modifier(self) -> f64 {
        match self {
            Weather::Clear => 1.0,
            Weather::Overcast => 0.98,
            Weather::Rain => 0.85,
            Weather::Wind => 0.92,
            Weather::Storm => 0.80,
            Weather::Drizzle => 0.93,
            Weather::Snow => 0.75,
        }
    }

    pub fn drain_multiplier(self) -> f64 {
        match self {
            Weather::Clear | Weather::Overcast => 1.0,
            Weather::Wind | Weather::Drizzle => 1.1,
            Weather::Rain => 1.3,
            Weather::Snow => 1.35,
            Weather::Storm => 1.4,
        }
    }

    /// Whether random gusts perturb speed
    pub fn is_gusty(self) -> bool {
        matches!(self, Weather::Wind | Weather::Storm)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackCondition {
    #[default]
    Fast,
    Good,
    Soft,
    Heavy,
}

impl TrackCondition {
    pub fn speed_modifier(self) -> f64 {
        match self {
            TrackCondition::Fast => 1.0,
            TrackCondition::Good => 0.95,
            TrackCondition::Soft => 0.88,
            TrackCondition::Heavy => 0.78,
        }
    }

    pub fn drain_multiplier(self) -> f64 {
        match self {
            TrackCondition::Fast => 1.0,
            TrackCondition::Good => 1.05,
            TrackCondition::Soft => 1.15,
            TrackCondition::Heavy => 1.3,
        }
    }

    /// Whether footing is loose enough for random slips
    pub fn is_slippery(self) -> bool {
        matches!(self, TrackCondition::Soft | TrackCondition::Heavy)
    }
}

macro_rules! condition_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseConditionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(ParseConditionError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

condition_names!(Surface, "surface", {
    Soft => "soft",
    Firm => "firm",
    Synthetic => "synthetic",
});

condition_names!(Weather, "weather", {
    Clear => "clear",
    Overcast => "overcast",
    Rain => "rain",
    Wind => "wind",
    Storm => "storm",
    Drizzle => "drizzle",
    Snow => "snow",
});

condition_names!(TrackCondition, "track condition", {
    Fast => "fast",
    Good => "good",
    Soft => "soft",
    Heavy => "heavy",
});
