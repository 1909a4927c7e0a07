//! Simulation - race engine and tick loop
//!
//! Owns the race working copy, drives it on a fixed logical tick and
//! publishes an immutable snapshot to an observer after every tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::{PhysicsConfig, SimulatorConfig};
use crate::entity::Entity;
use crate::error::ConfigError;
use crate::race_engine::participant::Participant;
use crate::race_engine::race::{Race, RaceConfiguration, RaceResult, RaceState, RaceStatus};

/// Number of recent ticks kept for timing stats
const TICK_TIME_WINDOW: usize = 60;

/// Receives race notifications. Runs synchronously inside the tick.
pub trait RaceObserver {
    /// Called after every tick, including the last one
    fn on_update(&mut self, state: &RaceState);
    /// Called exactly once, when every horse has finished
    fn on_finish(&mut self, results: &[RaceResult]);
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl RaceObserver for NullObserver {
    fn on_update(&mut self, _state: &RaceState) {}
    fn on_finish(&mut self, _results: &[RaceResult]) {}
}

/// Closure-backed observer
pub struct Callbacks<U, F> {
    pub on_update: U,
    pub on_finish: F,
}

impl<U, F> RaceObserver for Callbacks<U, F>
where
    U: FnMut(&RaceState),
    F: FnMut(&[RaceResult]),
{
    fn on_update(&mut self, state: &RaceState) {
        (self.on_update)(state)
    }

    fn on_finish(&mut self, results: &[RaceResult]) {
        (self.on_finish)(results)
    }
}

/// Cancellation signal, checked between ticks
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a paced run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Finished(Vec<RaceResult>),
    /// Stopped between ticks; state is kept as is
    Stopped,
}

/// Engine statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStats {
    pub tick_rate: f64,
    pub ticks: u64,
    pub faults_recovered: u64,
    /// Participants that have crossed the line
    pub finished: usize,
    pub avg_tick_time_ms: f64,
    pub participant_count: usize,
    pub status: RaceStatus,
}

/// Race simulation engine
pub struct SimulationEngine {
    race: Race,
    /// Field snapshot, kept to rebuild participants when tuning changes
    entities: Vec<Entity>,
    physics: PhysicsConfig,
    seed: u64,
    rng: Pcg32,
    /// Recent tick compute times (ms)
    tick_times: Vec<f64>,
    faults: u64,
    finishers: usize,
    finish_notified: bool,
}

impl SimulationEngine {
    /// Create an engine for the given field with stock physics and seed 0
    pub fn new(entities: &[Entity], config: RaceConfiguration) -> Result<Self, ConfigError> {
        let physics = PhysicsConfig::default();
        let race = Race::new(config, entities, &physics)?;
        Ok(Self {
            race,
            entities: entities.to_vec(),
            physics,
            seed: 0,
            rng: Pcg32::seed_from_u64(0),
            tick_times: Vec::with_capacity(TICK_TIME_WINDOW),
            faults: 0,
            finishers: 0,
            finish_notified: false,
        })
    }

    /// Create an engine from a full simulator config
    pub fn from_config(entities: &[Entity], config: &SimulatorConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(entities, config.race.clone())?
            .with_physics(config.physics.clone())?
            .with_seed(config.seed))
    }

    /// Replace the physics tuning. Only allowed before the race starts.
    pub fn with_physics(mut self, physics: PhysicsConfig) -> Result<Self, ConfigError> {
        physics.validate()?;
        if self.race.status != RaceStatus::Created {
            warn!("physics change ignored: race already started");
            return Ok(self);
        }
        self.race.recalibrate(&self.entities, &physics);
        self.physics = physics;
        Ok(self)
    }

    /// Reseed the physics RNG. Only allowed before the race starts.
    pub fn with_seed(mut self, seed: u64) -> Self {
        if self.race.status != RaceStatus::Created {
            warn!("reseed ignored: race already started");
            return self;
        }
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self
    }

    /// Created -> Running
    pub fn start_race(&mut self) {
        match self.race.status {
            RaceStatus::Created => {
                self.race.start();
                info!(
                    "Race started: {} runners over {}m ({}, {} going, {} surface, seed {})",
                    self.race.participants.len(),
                    self.race.config.distance,
                    self.race.config.weather,
                    self.race.config.track_condition,
                    self.race.config.surface,
                    self.seed
                );
            }
            status => warn!("start_race ignored in state {:?}", status),
        }
    }

    /// Perform a single simulation tick. Returns `None` unless the race is running.
    pub fn tick(&mut self) -> Option<RaceState> {
        if self.race.status != RaceStatus::Running {
            return None;
        }

        let tick_start = Instant::now();
        let report = self.race.update(&self.physics, &mut self.rng);
        self.faults += report.faults as u64;
        if report.finishers > 0 {
            self.finishers += report.finishers;
            debug!(
                "tick {}: {} of {} home",
                self.race.tick_count,
                self.finishers,
                self.race.participants.len()
            );
        }

        let tick_time = tick_start.elapsed().as_secs_f64() * 1000.0;
        self.tick_times.push(tick_time);
        if self.tick_times.len() > TICK_TIME_WINDOW {
            self.tick_times.remove(0);
        }

        if self.race.status == RaceStatus::Finished {
            if let Some(winner) = self.race.results.first() {
                info!(
                    "Race finished after {} ticks ({:.2}s): {} wins in {:.3}s",
                    self.race.tick_count,
                    self.race.elapsed_time,
                    winner.entity_name,
                    winner.finish_time
                );
            }
        }

        Some(self.race.snapshot())
    }

    /// Tick once and notify the observer. Returns false once there is nothing left to run.
    pub fn step<O: RaceObserver + ?Sized>(&mut self, observer: &mut O) -> bool {
        let Some(state) = self.tick() else {
            return false;
        };
        observer.on_update(&state);

        if state.finished && !self.finish_notified {
            self.finish_notified = true;
            observer.on_finish(&self.race.results);
        }
        !state.finished
    }

    /// Run to completion on the logical clock, without sleeping
    pub fn run<O: RaceObserver + ?Sized>(&mut self, observer: &mut O) -> Vec<RaceResult> {
        if self.race.status == RaceStatus::Created {
            self.start_race();
        }
        while self.step(observer) {}
        self.race.results.clone()
    }

    /// Run paced on the wall clock, one tick per tick interval, until the
    /// race finishes or `stop` is signalled.
    pub fn run_realtime<O: RaceObserver + ?Sized>(
        &mut self,
        observer: &mut O,
        stop: &StopHandle,
    ) -> RunOutcome {
        if self.race.status == RaceStatus::Created {
            self.start_race();
        }
        let interval = Duration::from_millis(self.physics.tick_interval_ms);

        loop {
            if self.race.status == RaceStatus::Finished {
                return RunOutcome::Finished(self.race.results.clone());
            }
            if stop.is_stopped() {
                info!("Race stopped at tick {}", self.race.tick_count);
                return RunOutcome::Stopped;
            }

            let started = Instant::now();
            if !self.step(observer) && self.race.status != RaceStatus::Finished {
                // Not running and not finished: nothing to drive
                return RunOutcome::Stopped;
            }
            if self.race.status != RaceStatus::Finished {
                thread::sleep(interval.saturating_sub(started.elapsed()));
            }
        }
    }

    pub fn status(&self) -> RaceStatus {
        self.race.status
    }

    /// Current race snapshot without advancing the simulation
    pub fn snapshot(&self) -> RaceState {
        self.race.snapshot()
    }

    /// Final results, once the race has finished
    pub fn results(&self) -> Option<&[RaceResult]> {
        (self.race.status == RaceStatus::Finished).then_some(self.race.results.as_slice())
    }

    pub fn leader(&self) -> Option<&Participant> {
        self.race.leader()
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.race.participant(id)
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stats(&self) -> SimulationStats {
        let avg_tick_time = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f64>() / self.tick_times.len() as f64
        };

        SimulationStats {
            tick_rate: 1000.0 / self.physics.tick_interval_ms as f64,
            ticks: self.race.tick_count,
            faults_recovered: self.faults,
            finished: self.finishers,
            avg_tick_time_ms: avg_tick_time,
            participant_count: self.race.participants.len(),
            status: self.race.status,
        }
    }
}
