//! Participant - per-horse race state and the tick physics
//!
//! Each participant carries speed, energy and distance covered.
//! The simulation advances every unfinished participant once per tick.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::conditions::{Surface, TrackCondition, Weather};
use crate::config::PhysicsConfig;
use crate::entity::{Attributes, Entity};

/// Race phase by fraction of the course covered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Below 30%
    Early,
    /// 30% to 70%
    Middle,
    /// Above 70%
    Late,
}

impl Phase {
    pub fn from_progress(progress: f64) -> Self {
        if progress < 0.3 {
            Phase::Early
        } else if progress <= 0.7 {
            Phase::Middle
        } else {
            Phase::Late
        }
    }
}

/// Complete race-time state for a single horse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    /// Starting lane, fixed for the race
    pub lane: usize,
    pub attributes: Attributes,
    /// Top speed after conditions are applied (m/s)
    pub max_speed: f64,
    /// Current speed (m/s)
    pub current_speed: f64,
    /// 0-100
    pub energy: f64,
    /// Distance covered (meters)
    pub distance: f64,
    /// Live rank, 1 = leading
    pub position: usize,
    /// Elapsed race time when the line was crossed
    pub finish_time: Option<f64>,
    /// Distance run past the line on the finishing tick
    pub finish_margin: f64,
}

impl Participant {
    /// Create a participant in the given lane, deriving top speed from conditions
    pub fn new(
        entity: &Entity,
        lane: usize,
        surface: Surface,
        weather: Weather,
        track: TrackCondition,
        physics: &PhysicsConfig,
    ) -> Self {
        let attrs = entity.attributes;
        let max_speed = (attrs.base_speed / 100.0)
            * physics.top_speed_mps
            * weather.speed_modifier()
            * track.speed_modifier()
            * surface.speed_modifier(attrs.agility);

        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            lane,
            attributes: attrs,
            max_speed: max_speed.max(physics.min_top_speed_mps),
            current_speed: 0.0,
            energy: 100.0,
            distance: 0.0,
            position: lane + 1,
            finish_time: None,
            finish_margin: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finish_time.is_some()
    }

    /// Fraction of the course covered
    pub fn progress(&self, course: f64) -> f64 {
        (self.distance / course).clamp(0.0, 1.0)
    }

    /// Record the finish once the line is reached. Returns true only on the crossing tick.
    pub fn cross_line(&mut self, course: f64, elapsed: f64) -> bool {
        if self.is_finished() || self.distance < course {
            return false;
        }
        self.finish_margin = self.distance - course;
        self.finish_time = Some(elapsed);
        self.distance = course;
        self.current_speed = 0.0;
        true
    }

    /// Straight-line extrapolation at the last known speed
    pub fn coast(&mut self, dt: f64) {
        if self.current_speed.is_finite() && self.current_speed > 0.0 {
            self.distance += self.current_speed * dt;
        }
    }

    /// Key used to separate runners that are level on distance
    pub fn tie_key(&self, intelligence_bonus: f64) -> f64 {
        self.current_speed + (self.attributes.intelligence / 100.0) * intelligence_bonus
    }
}

/// Everything the physics step needs besides the participant itself
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub physics: &'a PhysicsConfig,
    pub course: f64,
    pub weather: Weather,
    pub track: TrackCondition,
    pub dt: f64,
}

/// The step produced a non-finite value; nothing was written back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsFault {
    pub speed: f64,
    pub distance: f64,
    pub energy: f64,
}

/// Participant physics
pub struct Stride;

impl Stride {
    /// Advance a single participant by one tick.
    ///
    /// Finished participants are left untouched. On a fault the participant
    /// is not modified and the caller decides how to recover.
    pub fn advance<R: Rng + ?Sized>(
        p: &mut Participant,
        ctx: &TickContext<'_>,
        rng: &mut R,
    ) -> Result<(), PhysicsFault> {
        if p.is_finished() {
            return Ok(());
        }
        let cfg = ctx.physics;
        let dt = ctx.dt;

        let phase = Phase::from_progress(p.progress(ctx.course));
        let target = Self::strategic_speed(p, phase) * Self::energy_factor(p, cfg);

        // Bounded acceleration
        let diff = target - p.current_speed;
        let limit = if diff >= 0.0 {
            cfg.max_acceleration * dt
        } else {
            cfg.max_deceleration * dt
        };
        let mut speed = p.current_speed + diff.clamp(-limit, limit);

        let volatility = 1.0 - p.attributes.temperament / 100.0;
        if cfg.speed_variance > 0.0 && volatility > 0.0 {
            speed *= 1.0 + rng.gen_range(-1.0..=1.0) * cfg.speed_variance * volatility;
        }

        // Slips and gusts
        if ctx.track.is_slippery() && rng.gen_bool(cfg.slip_chance) {
            speed *= rng.gen_range(cfg.slip_range.0..=cfg.slip_range.1);
        }
        if ctx.weather.is_gusty() && rng.gen_bool(cfg.gust_chance) {
            speed *= rng.gen_range(cfg.gust_range.0..=cfg.gust_range.1);
        }
        // Not `max`: a NaN speed has to reach the fault check below
        let speed = if speed < 0.0 { 0.0 } else { speed };

        let distance = p.distance + speed * dt;
        let energy = Self::next_energy(p, speed, ctx);

        if !(speed.is_finite() && distance.is_finite() && energy.is_finite()) {
            return Err(PhysicsFault {
                speed,
                distance,
                energy,
            });
        }

        p.current_speed = speed;
        p.distance = distance;
        p.energy = energy;
        Ok(())
    }

    /// Phase-dependent target speed before energy is applied
    pub fn strategic_speed(p: &Participant, phase: Phase) -> f64 {
        let intelligence = p.attributes.intelligence / 100.0;
        let temperament = p.attributes.temperament / 100.0;

        match phase {
            // Clever horses settle, hot-headed ones go out fast
            Phase::Early => {
                let early_pace = intelligence * 0.7 + (1.0 - temperament) * 0.5;
                p.max_speed * (0.6 + early_pace * 0.3)
            }
            Phase::Middle => p.max_speed * 0.85,
            Phase::Late => {
                let final_kick = (p.energy / 100.0) * intelligence;
                p.max_speed * (0.9 + final_kick * 0.2)
            }
        }
    }

    /// Fraction of target speed reachable on the current energy.
    ///
    /// Stamina scales the energy curve by up to +50%, but the result is capped
    /// at 1.0: a fresh horse gains nothing from it, and the bonus only shows
    /// once energy drops below about 51 (stamina 70).
    pub fn energy_factor(p: &Participant, cfg: &PhysicsConfig) -> f64 {
        let floor = cfg.exhausted_speed_factor;
        if p.energy <= 0.0 {
            return floor;
        }
        let stamina_bonus = 1.0 + cfg.stamina_speed_bonus * (p.attributes.stamina / 100.0);
        ((p.energy / 100.0).powf(cfg.energy_exponent) * stamina_bonus).clamp(floor, 1.0)
    }

    fn next_energy(p: &Participant, speed: f64, ctx: &TickContext<'_>) -> f64 {
        let cfg = ctx.physics;
        let attrs = &p.attributes;

        let effort = speed / p.max_speed;
        let stamina_cost = 2.0 - attrs.stamina / 100.0;
        let composure = 1.0 - cfg.temperament_drain_bonus * (attrs.temperament / 100.0);
        let drain = effort * effort
            * stamina_cost
            * ctx.weather.drain_multiplier()
            * ctx.track.drain_multiplier()
            * composure
            * cfg.energy_drain_rate
            * ctx.dt;

        let recovery = if effort < 0.7 && p.energy < 90.0 {
            cfg.recovery_rate * ctx.dt
        } else {
            0.0
        };

        (p.energy - drain + recovery).clamp(0.0, 100.0)
    }
}

/// Compact participant state for snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSnapshot {
    pub id: String,
    pub name: String,
    pub lane: usize,
    pub position: usize,
    pub distance: f64,
    pub speed: f64,
    pub energy: f64,
    pub finish_time: Option<f64>,
}

impl From<&Participant> for ParticipantSnapshot {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            lane: p.lane,
            position: p.position,
            distance: p.distance,
            speed: p.current_speed,
            energy: p.energy,
            finish_time: p.finish_time,
        }
    }
}
