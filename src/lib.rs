//! Derby Engine - race simulation and wagering
//!
//! Core modules:
//! - `race_engine`: fixed-tick race simulation (physics, ranking, finish detection)
//! - `wagering`: dynamic odds, bet ledger and settlement
//! - `meeting`: one race plus its betting window, driven in order
//! - `config`: physics and wagering tuning, JSON loading
//!
//! # Example
//!
//! ```no_run
//! use derby_engine::{Attributes, Entity, NullObserver, RaceConfiguration, SimulationEngine};
//! use derby_engine::{WagerClass, WageringEngine};
//!
//! let field = vec![
//!     Entity::new("h1", "Comet", Attributes::uniform(72.0)),
//!     Entity::new("h2", "Drift", Attributes::uniform(68.0)),
//! ];
//!
//! let mut book = WageringEngine::default();
//! book.place_bet("h1", WagerClass::Win, 100.0).unwrap();
//!
//! let mut engine = SimulationEngine::new(&field, RaceConfiguration::default())
//!     .unwrap()
//!     .with_seed(42);
//! let results = engine.run(&mut NullObserver);
//!
//! for outcome in book.settle(&results, &field) {
//!     println!("ticket {} paid {:.2}", outcome.bet.ticket, outcome.payout);
//! }
//! ```

pub mod conditions;
pub mod config;
pub mod entity;
pub mod error;
pub mod meeting;
pub mod race_engine;
pub mod wagering;

pub use conditions::{Surface, TrackCondition, Weather};
pub use config::{PhysicsConfig, SimulatorConfig, WageringConfig};
pub use entity::{Attributes, Entity, RaceRecord};
pub use error::{ConfigError, LoadError, WagerError};
pub use meeting::{MeetingState, RaceMeeting};
pub use race_engine::{
    Callbacks, NullObserver, ParticipantSnapshot, RaceConfiguration, RaceObserver, RaceResult,
    RaceState, RaceStatus, RunOutcome, SimulationEngine, SimulationStats, StopHandle,
};
pub use wagering::{
    create_shared_wagering, BetOutcome, BetRecord, OddsQuote, SharedWagering, WagerClass,
    WageringEngine,
};
