//! Race - race configuration and state management
//!
//! Handles field setup, per-tick updates, live ranking and finish detection.

use std::cmp::Ordering;

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::conditions::{Surface, TrackCondition, Weather};
use crate::config::PhysicsConfig;
use crate::entity::Entity;
use crate::error::ConfigError;
use crate::race_engine::participant::{Participant, ParticipantSnapshot, Stride, TickContext};

/// Race configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfiguration {
    /// Total race distance in meters
    pub distance: f64,
    pub surface: Surface,
    pub weather: Weather,
    pub track_condition: TrackCondition,
}

impl Default for RaceConfiguration {
    fn default() -> Self {
        Self {
            distance: 1600.0,
            surface: Surface::Firm,
            weather: Weather::Clear,
            track_condition: TrackCondition::Fast,
        }
    }
}

impl RaceConfiguration {
    pub fn new(
        distance: f64,
        surface: Surface,
        weather: Weather,
        track_condition: TrackCondition,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            distance,
            surface,
            weather,
            track_condition,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.distance.is_finite() && self.distance > 0.0) {
            return Err(ConfigError::InvalidDistance(self.distance));
        }
        Ok(())
    }
}

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    Created,
    Running,
    Finished,
}

/// Final placing of one horse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub rank: usize,
    pub entity_id: String,
    pub entity_name: String,
    /// Seconds
    pub finish_time: f64,
    pub lane: usize,
}

/// Outcome of one race tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Participants that crossed the line this tick
    pub finishers: usize,
    /// Participants recovered by extrapolation this tick
    pub faults: usize,
}

/// Working copy of a race. Only the simulation engine mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Race {
    pub config: RaceConfiguration,
    pub status: RaceStatus,
    pub participants: Vec<Participant>,
    /// Elapsed race time (seconds)
    pub elapsed_time: f64,
    pub tick_count: u64,
    /// Filled in once, when the last horse finishes
    pub results: Vec<RaceResult>,
}

impl Race {
    /// Build the field; lanes follow the entity order
    pub fn new(
        config: RaceConfiguration,
        entities: &[Entity],
        physics: &PhysicsConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if entities.is_empty() {
            return Err(ConfigError::EmptyField);
        }
        for (i, entity) in entities.iter().enumerate() {
            entity.validate()?;
            if entities[..i].iter().any(|e| e.id == entity.id) {
                return Err(ConfigError::DuplicateEntity(entity.id.clone()));
            }
        }

        let participants = entities
            .iter()
            .enumerate()
            .map(|(lane, entity)| {
                Participant::new(
                    entity,
                    lane,
                    config.surface,
                    config.weather,
                    config.track_condition,
                    physics,
                )
            })
            .collect();

        Ok(Self {
            config,
            status: RaceStatus::Created,
            participants,
            elapsed_time: 0.0,
            tick_count: 0,
            results: Vec::new(),
        })
    }

    /// Rebuild every participant's top speed, e.g. after the physics tuning changed
    pub(crate) fn recalibrate(&mut self, entities: &[Entity], physics: &PhysicsConfig) {
        if self.status != RaceStatus::Created {
            return;
        }
        for (lane, entity) in entities.iter().enumerate() {
            if let Some(p) = self.participants.get_mut(lane) {
                *p = Participant::new(
                    entity,
                    lane,
                    self.config.surface,
                    self.config.weather,
                    self.config.track_condition,
                    physics,
                );
            }
        }
    }

    pub fn start(&mut self) {
        if self.status == RaceStatus::Created {
            self.status = RaceStatus::Running;
        }
    }

    /// Advance the race by one tick. A no-op unless the race is running.
    pub fn update<R: Rng + ?Sized>(&mut self, physics: &PhysicsConfig, rng: &mut R) -> TickReport {
        let mut report = TickReport::default();
        if self.status != RaceStatus::Running {
            return report;
        }

        let dt = physics.tick_seconds();
        self.tick_count += 1;
        self.elapsed_time = self.tick_count as f64 * dt;

        let ctx = TickContext {
            physics,
            course: self.config.distance,
            weather: self.config.weather,
            track: self.config.track_condition,
            dt,
        };

        for p in self.participants.iter_mut().filter(|p| !p.is_finished()) {
            if let Err(fault) = Stride::advance(p, &ctx, rng) {
                warn!(
                    "physics fault for {} at tick {} ({:?}), extrapolating",
                    p.id, self.tick_count, fault
                );
                p.coast(dt);
                report.faults += 1;
            }

            if p.cross_line(self.config.distance, self.elapsed_time) {
                debug!("{} finished in {:.3}s", p.name, self.elapsed_time);
                report.finishers += 1;
            }
        }

        self.rank_participants(physics);

        if self.participants.iter().all(Participant::is_finished) {
            self.conclude();
        }
        report
    }

    /// Recompute live positions.
    ///
    /// Finished runners lead in finishing order. The rest are sorted by
    /// distance; any run of neighbours closer than the rank epsilon is then
    /// ordered by speed plus an intelligence bonus.
    pub fn rank_participants(&mut self, physics: &PhysicsConfig) {
        let mut order: Vec<usize> = (0..self.participants.len()).collect();
        let ps = &self.participants;

        order.sort_by(|&a, &b| {
            let (pa, pb) = (&ps[a], &ps[b]);
            match (pa.is_finished(), pb.is_finished()) {
                (true, true) => finish_order(pa, pb),
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => pb
                    .distance
                    .total_cmp(&pa.distance)
                    .then(pa.lane.cmp(&pb.lane)),
            }
        });

        let mut start = order.iter().take_while(|&&i| ps[i].is_finished()).count();
        while start < order.len() {
            let mut end = start + 1;
            while end < order.len()
                && ps[order[end - 1]].distance - ps[order[end]].distance < physics.rank_epsilon
            {
                end += 1;
            }
            if end - start > 1 {
                order[start..end].sort_by(|&a, &b| {
                    let bonus = physics.intelligence_tie_bonus;
                    ps[b].tie_key(bonus)
                        .total_cmp(&ps[a].tie_key(bonus))
                        .then(ps[a].lane.cmp(&ps[b].lane))
                });
            }
            start = end;
        }

        for (rank, idx) in order.into_iter().enumerate() {
            self.participants[idx].position = rank + 1;
        }
    }

    fn conclude(&mut self) {
        let mut finished: Vec<&Participant> = self.participants.iter().collect();
        finished.sort_by(|a, b| finish_order(a, b));

        self.results = finished
            .into_iter()
            .enumerate()
            .map(|(i, p)| RaceResult {
                rank: i + 1,
                entity_id: p.id.clone(),
                entity_name: p.name.clone(),
                finish_time: p.finish_time.unwrap_or(self.elapsed_time),
                lane: p.lane,
            })
            .collect();
        self.status = RaceStatus::Finished;
    }

    /// Immutable snapshot, participants ordered by live position
    pub fn snapshot(&self) -> RaceState {
        let mut participants: Vec<ParticipantSnapshot> =
            self.participants.iter().map(ParticipantSnapshot::from).collect();
        participants.sort_by_key(|p| p.position);

        let finished = self.status == RaceStatus::Finished;
        RaceState {
            tick: self.tick_count,
            elapsed_time: self.elapsed_time,
            distance: self.config.distance,
            surface: self.config.surface,
            weather: self.config.weather,
            track_condition: self.config.track_condition,
            participants,
            finished,
            results: finished.then(|| self.results.clone()),
        }
    }

    /// Current leader on the live ranking
    pub fn leader(&self) -> Option<&Participant> {
        self.participants.iter().min_by_key(|p| p.position)
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }
}

/// Earlier finish first; same-tick finishers by distance run past the line, then lane
fn finish_order(a: &Participant, b: &Participant) -> Ordering {
    let time = |p: &Participant| p.finish_time.unwrap_or(f64::INFINITY);
    time(a)
        .total_cmp(&time(b))
        .then(b.finish_margin.total_cmp(&a.finish_margin))
        .then(a.lane.cmp(&b.lane))
}

/// Full race snapshot, emitted every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceState {
    pub tick: u64,
    pub elapsed_time: f64,
    pub distance: f64,
    pub surface: Surface,
    pub weather: Weather,
    pub track_condition: TrackCondition,
    /// Ordered by live position
    pub participants: Vec<ParticipantSnapshot>,
    pub finished: bool,
    pub results: Option<Vec<RaceResult>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Attributes;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn field(n: usize) -> Vec<Entity> {
        (0..n)
            .map(|i| Entity::new(format!("h{i}"), format!("Horse {i}"), Attributes::uniform(70.0)))
            .collect()
    }

    fn race(n: usize, distance: f64) -> Race {
        let config = RaceConfiguration {
            distance,
            ..Default::default()
        };
        Race::new(config, &field(n), &PhysicsConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_bad_setup() {
        let physics = PhysicsConfig::default();
        let bad = RaceConfiguration {
            distance: 0.0,
            ..Default::default()
        };
        assert_eq!(
            Race::new(bad, &field(2), &physics).unwrap_err(),
            ConfigError::InvalidDistance(0.0)
        );
        assert_eq!(
            Race::new(RaceConfiguration::default(), &[], &physics).unwrap_err(),
            ConfigError::EmptyField
        );

        let mut dup = field(2);
        dup[1].id = dup[0].id.clone();
        assert!(matches!(
            Race::new(RaceConfiguration::default(), &dup, &physics),
            Err(ConfigError::DuplicateEntity(_))
        ));
    }

    #[test]
    fn test_no_movement_before_start() {
        let mut race = race(3, 1000.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let report = race.update(&PhysicsConfig::default(), &mut rng);
        assert_eq!(report, TickReport::default());
        assert_eq!(race.tick_count, 0);
        assert!(race.participants.iter().all(|p| p.distance == 0.0));
    }

    #[test]
    fn test_race_runs_to_completion() {
        let physics = PhysicsConfig::default();
        let mut race = race(4, 400.0);
        let mut rng = Pcg32::seed_from_u64(9);
        race.start();
        while race.status == RaceStatus::Running {
            race.update(&physics, &mut rng);
            assert!(race.tick_count < 100_000);
        }

        assert_eq!(race.results.len(), 4);
        let ranks: Vec<usize> = race.results.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        for pair in race.results.windows(2) {
            assert!(pair[0].finish_time <= pair[1].finish_time);
        }

        // Frozen after the finish
        let ticks = race.tick_count;
        race.update(&physics, &mut rng);
        assert_eq!(race.tick_count, ticks);
    }

    #[test]
    fn test_level_runners_ranked_by_speed_then_intelligence() {
        let physics = PhysicsConfig::default();
        let mut race = race(3, 1000.0);
        race.participants[0].distance = 100.0;
        race.participants[0].current_speed = 20.0;
        race.participants[1].distance = 100.05;
        race.participants[1].current_speed = 18.0;
        race.participants[2].distance = 150.0;
        race.rank_participants(&physics);

        assert_eq!(race.participants[2].position, 1);
        // Within epsilon: the faster horse wins despite being a hair behind
        assert_eq!(race.participants[0].position, 2);
        assert_eq!(race.participants[1].position, 3);

        race.participants[1].current_speed = 20.0;
        race.participants[1].attributes.intelligence = 90.0;
        race.rank_participants(&physics);
        assert_eq!(race.participants[1].position, 2);
    }

    #[test]
    fn test_finished_runners_keep_finishing_order() {
        let physics = PhysicsConfig::default();
        let mut race = race(3, 100.0);
        race.start();
        race.participants[2].attributes.intelligence = 100.0;
        race.participants[0].attributes.intelligence = 0.0;
        race.participants[0].distance = 100.5;
        race.participants[0].cross_line(100.0, 5.0);
        race.participants[2].distance = 100.1;
        race.participants[2].cross_line(100.0, 5.5);
        // Still running, but level with the line
        race.participants[1].distance = 99.95;
        race.participants[1].current_speed = 30.0;
        race.rank_participants(&physics);

        assert_eq!(race.participants[0].position, 1);
        assert_eq!(race.participants[2].position, 2);
        assert_eq!(race.participants[1].position, 3);
    }

    #[test]
    fn test_final_snapshot_order_matches_results() {
        let physics = PhysicsConfig::default();
        let field: Vec<Entity> = (0..6)
            .map(|i| {
                let attrs = Attributes {
                    base_speed: 90.0 - i as f64 * 8.0,
                    intelligence: 10.0 + i as f64 * 15.0,
                    ..Attributes::uniform(70.0)
                };
                Entity::new(format!("h{i}"), format!("Horse {i}"), attrs)
            })
            .collect();
        let config = RaceConfiguration {
            distance: 400.0,
            ..Default::default()
        };
        let mut race = Race::new(config, &field, &physics).unwrap();
        let mut rng = Pcg32::seed_from_u64(3);
        race.start();
        while race.status == RaceStatus::Running {
            race.update(&physics, &mut rng);
        }

        let state = race.snapshot();
        let live: Vec<&str> = state.participants.iter().map(|p| p.id.as_str()).collect();
        let results: Vec<&str> = state
            .results
            .as_ref()
            .unwrap()
            .iter()
            .map(|r| r.entity_id.as_str())
            .collect();
        assert_eq!(live, results);
    }

    #[test]
    fn test_fault_recovered_by_extrapolation() {
        let physics = PhysicsConfig::default();
        let mut race = race(2, 1000.0);
        let mut rng = Pcg32::seed_from_u64(3);
        race.start();
        race.participants[0].current_speed = 15.0;
        race.participants[0].energy = f64::NAN;

        let report = race.update(&physics, &mut rng);
        assert_eq!(report.faults, 1);
        assert_eq!(race.status, RaceStatus::Running);
        let expected = 15.0 * physics.tick_seconds();
        assert!((race.participants[0].distance - expected).abs() < 1e-9);
        // The healthy runner advanced normally
        assert!(race.participants[1].distance > 0.0);
    }

    #[test]
    fn test_same_tick_finish_broken_by_margin() {
        let mut race = race(2, 100.0);
        race.start();
        race.participants[0].distance = 100.2;
        race.participants[1].distance = 100.9;
        race.participants[0].cross_line(100.0, 3.0);
        race.participants[1].cross_line(100.0, 3.0);
        race.conclude();

        assert_eq!(race.results[0].entity_id, "h1");
        assert_eq!(race.results[1].entity_id, "h0");
        assert_eq!(race.results[0].finish_time, race.results[1].finish_time);
    }

    #[test]
    fn test_snapshot_ordering_and_results() {
        let mut race = race(3, 1000.0);
        race.participants[1].distance = 10.0;
        race.rank_participants(&PhysicsConfig::default());
        let state = race.snapshot();
        assert_eq!(state.participants[0].id, "h1");
        assert!(!state.finished);
        assert!(state.results.is_none());
        assert_eq!(race.leader().map(|p| p.id.as_str()), Some("h1"));
        assert!(race.participant("h2").is_some());
        assert!(race.participant("nope").is_none());
    }
}
