//! Race Engine Module
//!
//! Fixed-tick race simulation: participant physics, live ranking,
//! finish detection and the tick loop that publishes race snapshots.

pub mod participant;
pub mod race;
pub mod simulation;

pub use participant::{Participant, ParticipantSnapshot, Phase, Stride};
pub use race::{Race, RaceConfiguration, RaceResult, RaceState, RaceStatus};
pub use simulation::{
    Callbacks, NullObserver, RaceObserver, RunOutcome, SimulationEngine, SimulationStats,
    StopHandle,
};
