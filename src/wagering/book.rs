//! Betting book - the per-race wager ledger
//!
//! Accumulates bets for one race's betting window, quotes odds from the
//! ledger, and settles against final results. Payouts are reported, never
//! credited: balances belong to the caller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::WageringConfig;
use crate::entity::Entity;
use crate::error::{ConfigError, WagerError};
use crate::race_engine::RaceResult;
use crate::wagering::odds::{performance_score, quote, OddsQuote, WagerClass};

/// A placed bet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRecord {
    pub ticket: u64,
    pub entity_id: String,
    pub class: WagerClass,
    pub stake: f64,
}

/// Money staked on one horse, per class
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub win: f64,
    pub place: f64,
    pub show: f64,
}

impl PoolEntry {
    pub fn total(&self) -> f64 {
        self.win + self.place + self.show
    }

    fn add(&mut self, class: WagerClass, stake: f64) {
        match class {
            WagerClass::Win => self.win += stake,
            WagerClass::Place => self.place += stake,
            WagerClass::Show => self.show += stake,
        }
    }
}

/// Settlement of one bet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetOutcome {
    pub bet: BetRecord,
    pub won: bool,
    pub payout: f64,
}

/// Wagering engine
#[derive(Debug, Clone)]
pub struct WageringEngine {
    config: WageringConfig,
    bets: Vec<BetRecord>,
    pools: HashMap<String, PoolEntry>,
    total_pool: f64,
    next_ticket: u64,
}

impl WageringEngine {
    pub fn new(config: WageringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            bets: Vec::new(),
            pools: HashMap::new(),
            total_pool: 0.0,
            next_ticket: 1,
        })
    }

    pub fn config(&self) -> &WageringConfig {
        &self.config
    }

    /// Quote odds for every horse in the field
    pub fn calculate_odds(&self, field: &[Entity]) -> Vec<OddsQuote> {
        let total_win_pool: f64 = self.pools.values().map(|p| p.win).sum();
        field
            .iter()
            .map(|entity| self.quote_with_pool(entity, total_win_pool))
            .collect()
    }

    /// Quote odds for a single horse
    pub fn quote_for(&self, entity: &Entity) -> OddsQuote {
        let total_win_pool: f64 = self.pools.values().map(|p| p.win).sum();
        self.quote_with_pool(entity, total_win_pool)
    }

    fn quote_with_pool(&self, entity: &Entity, total_win_pool: f64) -> OddsQuote {
        let pool = self.pool_for(&entity.id);
        let market_share = (total_win_pool > 0.0).then(|| pool.win / total_win_pool);
        quote(
            &entity.id,
            performance_score(entity),
            market_share,
            pool.total(),
            &self.config,
        )
    }

    /// Record a bet. Returns the ticket number.
    pub fn place_bet(
        &mut self,
        entity_id: &str,
        class: WagerClass,
        stake: f64,
    ) -> Result<u64, WagerError> {
        if !(stake.is_finite() && stake > 0.0) {
            warn!("rejected {:?} bet on {} with stake {}", class, entity_id, stake);
            return Err(WagerError::NonPositiveStake(stake));
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        self.pools
            .entry(entity_id.to_string())
            .or_default()
            .add(class, stake);
        self.total_pool += stake;
        self.bets.push(BetRecord {
            ticket,
            entity_id: entity_id.to_string(),
            class,
            stake,
        });

        debug!("ticket {}: {:?} {} on {}", ticket, class, stake, entity_id);
        Ok(ticket)
    }

    /// Settle every recorded bet against the final results.
    ///
    /// Odds are computed now, from the current ledger and the supplied
    /// field. Bets on horses missing from the field settle as lost.
    pub fn settle(&self, results: &[RaceResult], field: &[Entity]) -> Vec<BetOutcome> {
        let quotes: HashMap<&str, OddsQuote> = self
            .calculate_odds(field)
            .into_iter()
            .zip(field)
            .map(|(q, e)| (e.id.as_str(), q))
            .collect();
        let ranks: HashMap<&str, usize> = results
            .iter()
            .map(|r| (r.entity_id.as_str(), r.rank))
            .collect();

        let outcomes: Vec<BetOutcome> = self
            .bets
            .iter()
            .map(|bet| {
                let id = bet.entity_id.as_str();
                let payout = match (quotes.get(id), ranks.get(id)) {
                    (Some(q), Some(&rank)) if bet.class.pays(rank) => {
                        Some(bet.stake * q.odds_for(bet.class))
                    }
                    _ => None,
                };
                BetOutcome {
                    bet: bet.clone(),
                    won: payout.is_some(),
                    payout: payout.unwrap_or(0.0),
                }
            })
            .collect();

        let paid: f64 = outcomes.iter().map(|o| o.payout).sum();
        info!(
            "Settled {} bets: {} winners, {:.2} paid from a {:.2} pool",
            outcomes.len(),
            outcomes.iter().filter(|o| o.won).count(),
            paid,
            self.total_pool
        );
        outcomes
    }

    /// Clear the ledger for the next race
    pub fn reset(&mut self) {
        self.bets.clear();
        self.pools.clear();
        self.total_pool = 0.0;
        info!("Betting book reset");
    }

    pub fn total_pool(&self) -> f64 {
        self.total_pool
    }

    pub fn bets(&self) -> &[BetRecord] {
        &self.bets
    }

    pub fn pool_for(&self, entity_id: &str) -> PoolEntry {
        self.pools.get(entity_id).copied().unwrap_or_default()
    }
}

impl Default for WageringEngine {
    fn default() -> Self {
        Self {
            config: WageringConfig::default(),
            bets: Vec::new(),
            pools: HashMap::new(),
            total_pool: 0.0,
            next_ticket: 1,
        }
    }
}

/// Wagering engine behind a mutex, for callers sharing one book across threads
pub type SharedWagering = Arc<Mutex<WageringEngine>>;

/// Create a new shared wagering engine
pub fn create_shared_wagering(config: WageringConfig) -> Result<SharedWagering, ConfigError> {
    Ok(Arc::new(Mutex::new(WageringEngine::new(config)?)))
}
