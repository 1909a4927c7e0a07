//! Configuration - physics tuning, wagering parameters and file loading
//!
//! Every struct has a `Default` matching the stock tuning and uses
//! `#[serde(default)]`, so a config file only needs the keys it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LoadError};
use crate::race_engine::RaceConfiguration;

/// Physics tuning for the tick step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Logical tick length (milliseconds)
    pub tick_interval_ms: u64,
    /// Top speed of a base_speed=100 horse in ideal conditions (m/s)
    pub top_speed_mps: f64,
    /// Lower bound on any participant's top speed (m/s)
    pub min_top_speed_mps: f64,
    /// Maximum speed gain (m/s²)
    pub max_acceleration: f64,
    /// Maximum speed loss (m/s²)
    pub max_deceleration: f64,
    /// Per-tick jitter amplitude for a fully hot-headed horse
    pub speed_variance: f64,
    /// Exponent of the energy-to-speed curve
    pub energy_exponent: f64,
    /// Speed factor floor, also used at zero energy
    pub exhausted_speed_factor: f64,
    /// Energy factor bonus at stamina 100
    pub stamina_speed_bonus: f64,
    /// Energy drained per second at full effort, average stamina
    pub energy_drain_rate: f64,
    /// Drain reduction at temperament 100
    pub temperament_drain_bonus: f64,
    /// Energy regained per second while pacing
    pub recovery_rate: f64,
    pub slip_chance: f64,
    pub slip_range: (f64, f64),
    pub gust_chance: f64,
    pub gust_range: (f64, f64),
    /// Distance (m) under which two runners count as level for live ranking
    pub rank_epsilon: f64,
    /// Tie-break weight of intelligence when runners are level
    pub intelligence_tie_bonus: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 33,
            top_speed_mps: 45.0,
            min_top_speed_mps: 2.0,
            max_acceleration: 6.0,
            max_deceleration: 8.0,
            speed_variance: 0.03,
            energy_exponent: 0.45,
            exhausted_speed_factor: 0.25,
            stamina_speed_bonus: 0.5,
            energy_drain_rate: 1.0,
            temperament_drain_bonus: 0.2,
            recovery_rate: 0.5,
            slip_chance: 0.05,
            slip_range: (0.85, 0.95),
            gust_chance: 0.05,
            gust_range: (0.92, 1.08),
            rank_epsilon: 0.1,
            intelligence_tie_bonus: 0.5,
        }
    }
}

impl PhysicsConfig {
    /// Tick length in seconds
    pub fn tick_seconds(&self) -> f64 {
        self.tick_interval_ms as f64 / 1000.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval);
        }
        for (name, value) in [
            ("top_speed_mps", self.top_speed_mps),
            ("min_top_speed_mps", self.min_top_speed_mps),
            ("max_acceleration", self.max_acceleration),
            ("max_deceleration", self.max_deceleration),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidPhysics(name));
            }
        }
        for (name, chance) in [("slip_chance", self.slip_chance), ("gust_chance", self.gust_chance)] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(ConfigError::InvalidPhysics(name));
            }
        }
        for (name, (lo, hi)) in [("slip_range", self.slip_range), ("gust_range", self.gust_range)] {
            // A zero multiplier would pin speed at 0 every time the effect fires
            if !(lo.is_finite() && hi.is_finite() && 0.0 < lo && lo <= hi) {
                return Err(ConfigError::InvalidPhysics(name));
            }
        }
        if !(self.exhausted_speed_factor > 0.0 && self.exhausted_speed_factor <= 1.0) {
            return Err(ConfigError::InvalidPhysics("exhausted_speed_factor"));
        }
        Ok(())
    }
}

/// Odds model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WageringConfig {
    /// Fraction of the pool retained by the house
    pub house_edge: f64,
    /// Absolute floor on win odds once the market is open
    pub min_win_odds: f64,
    /// Floor on win odds before any money is staked
    pub performance_only_floor: f64,
    pub min_implied_probability: f64,
    /// Weight of the performance score in the implied probability
    pub performance_weight: f64,
    pub place_ratio: f64,
    pub show_ratio: f64,
}

impl Default for WageringConfig {
    fn default() -> Self {
        Self {
            house_edge: 0.15,
            min_win_odds: 1.1,
            performance_only_floor: 1.2,
            min_implied_probability: 0.05,
            performance_weight: 0.3,
            place_ratio: 0.6,
            show_ratio: 0.4,
        }
    }
}

impl WageringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.house_edge) {
            return Err(ConfigError::InvalidHouseEdge(self.house_edge));
        }
        Ok(())
    }
}

/// Everything needed to run and price one race
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub race: RaceConfiguration,
    pub physics: PhysicsConfig,
    pub wagering: WageringConfig,
    /// Seed for the physics RNG
    pub seed: u64,
}

impl SimulatorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let config: SimulatorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.race.validate()?;
        self.physics.validate()?;
        self.wagering.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{TrackCondition, Weather};

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SimulatorConfig::from_json_str(
            r#"{ "race": { "distance": 2400, "weather": "rain" }, "seed": 7 }"#,
        )
        .unwrap();
        assert_eq!(config.race.distance, 2400.0);
        assert_eq!(config.race.weather, Weather::Rain);
        assert_eq!(config.race.track_condition, TrackCondition::Fast);
        assert_eq!(config.physics, PhysicsConfig::default());
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SimulatorConfig::from_json_str(r#"{ "race": { "distance": -1 } }"#).unwrap_err();
        assert!(matches!(err, LoadError::Invalid(ConfigError::InvalidDistance(_))));

        let err = SimulatorConfig::from_json_str(r#"{ "wagering": { "house_edge": 1.5 } }"#)
            .unwrap_err();
        assert!(matches!(err, LoadError::Invalid(ConfigError::InvalidHouseEdge(_))));

        let err = SimulatorConfig::from_json_str(r#"{ "physics": { "tick_interval_ms": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, LoadError::Invalid(ConfigError::InvalidTickInterval)));

        let err = SimulatorConfig::from_json_str(r#"{ "physics": { "slip_range": [0.9, 0.8] } }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid(ConfigError::InvalidPhysics("slip_range"))
        ));
    }

    #[test]
    fn test_zero_perturbation_range_rejected() {
        let err = SimulatorConfig::from_json_str(
            r#"{ "race": { "distance": 100, "track_condition": "heavy" },
                 "physics": { "slip_chance": 1.0, "slip_range": [0.0, 0.0] } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid(ConfigError::InvalidPhysics("slip_range"))
        ));

        let physics = PhysicsConfig {
            gust_range: (0.0, 1.1),
            ..Default::default()
        };
        assert_eq!(physics.validate(), Err(ConfigError::InvalidPhysics("gust_range")));

        let physics = PhysicsConfig {
            slip_chance: 1.0,
            slip_range: (0.01, 0.01),
            ..Default::default()
        };
        assert!(physics.validate().is_ok());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SimulatorConfig::from_json_str("{ race: "),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = SimulatorConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
