//! Race meeting - one race and its betting window
//!
//! Ties the simulation and the betting book together in the order a
//! caller drives them: card the field, quote and take bets, run the race,
//! settle, then reset for the next race.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::SimulatorConfig;
use crate::entity::Entity;
use crate::error::{ConfigError, WagerError};
use crate::race_engine::{
    RaceObserver, RaceResult, RaceState, RaceStatus, RunOutcome, SimulationEngine,
    SimulationStats, StopHandle,
};
use crate::wagering::{BetOutcome, OddsQuote, WagerClass, WageringEngine};

/// Where the meeting is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeetingState {
    Idle,
    /// Field carded, betting open
    Betting,
    Racing,
    Results,
}

/// One race with its betting book
pub struct RaceMeeting {
    config: SimulatorConfig,
    field: Vec<Entity>,
    engine: Option<SimulationEngine>,
    book: WageringEngine,
}

impl RaceMeeting {
    pub fn new(config: SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let book = WageringEngine::new(config.wagering.clone())?;
        Ok(Self {
            config,
            field: Vec::new(),
            engine: None,
            book,
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn field(&self) -> &[Entity] {
        &self.field
    }

    /// Card a new field. Opens betting on a fresh book.
    pub fn init_race(&mut self, field: Vec<Entity>) -> Result<(), ConfigError> {
        let engine = SimulationEngine::from_config(&field, &self.config)?;
        self.book.reset();
        self.engine = Some(engine);
        self.field = field;
        info!("Race carded with {} runners", self.field.len());
        Ok(())
    }

    pub fn state(&self) -> MeetingState {
        match self.engine.as_ref().map(SimulationEngine::status) {
            None => MeetingState::Idle,
            Some(RaceStatus::Created) => MeetingState::Betting,
            Some(RaceStatus::Running) => MeetingState::Racing,
            Some(RaceStatus::Finished) => MeetingState::Results,
        }
    }

    pub fn odds(&self) -> Vec<OddsQuote> {
        self.book.calculate_odds(&self.field)
    }

    /// Take a bet while betting is open
    pub fn place_bet(
        &mut self,
        entity_id: &str,
        class: WagerClass,
        stake: f64,
    ) -> Result<Option<u64>, WagerError> {
        if self.state() != MeetingState::Betting {
            warn!("bet on {} refused: betting is closed", entity_id);
            return Ok(None);
        }
        self.book.place_bet(entity_id, class, stake).map(Some)
    }

    /// Close betting and start the race
    pub fn start_race(&mut self) {
        if let Some(engine) = &mut self.engine {
            engine.start_race();
        }
    }

    /// Advance one tick
    pub fn tick(&mut self) -> Option<RaceState> {
        self.engine.as_mut().and_then(SimulationEngine::tick)
    }

    /// Run the race to the end
    pub fn run<O: RaceObserver + ?Sized>(&mut self, observer: &mut O) -> Option<Vec<RaceResult>> {
        self.engine.as_mut().map(|engine| engine.run(observer))
    }

    /// Run the race paced on the wall clock until it finishes or `stop` fires
    pub fn run_realtime<O: RaceObserver + ?Sized>(
        &mut self,
        observer: &mut O,
        stop: &StopHandle,
    ) -> Option<RunOutcome> {
        self.engine
            .as_mut()
            .map(|engine| engine.run_realtime(observer, stop))
    }

    pub fn snapshot(&self) -> Option<RaceState> {
        self.engine.as_ref().map(SimulationEngine::snapshot)
    }

    pub fn results(&self) -> Option<&[RaceResult]> {
        self.engine.as_ref().and_then(SimulationEngine::results)
    }

    pub fn stats(&self) -> Option<SimulationStats> {
        self.engine.as_ref().map(SimulationEngine::stats)
    }

    pub fn book(&self) -> &WageringEngine {
        &self.book
    }

    /// Settle the book, once the race has finished
    pub fn settle(&self) -> Option<Vec<BetOutcome>> {
        let results = self.results()?;
        Some(self.book.settle(results, &self.field))
    }

    /// Back to idle with an empty book
    pub fn reset(&mut self) {
        self.engine = None;
        self.field.clear();
        self.book.reset();
        info!("Meeting reset");
    }
}
