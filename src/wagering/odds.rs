//! Odds model
//!
//! Win odds come from the performance score alone until money is in the
//! win pool, then from a blend of market share and performance:
//!
//! ```text
//! implied = max(min_implied, market_share + score * performance_weight)
//! win     = max(min_win_odds, (1 / implied) * (1 - house_edge))
//! ```
//!
//! Place and show odds are fixed fractions of the win odds.

use serde::{Deserialize, Serialize};

use crate::config::WageringConfig;
use crate::entity::Entity;

/// Wager class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagerClass {
    /// First only
    Win,
    /// First or second
    Place,
    /// First, second or third
    Show,
}

impl WagerClass {
    /// Worst finishing rank that still pays
    pub fn paying_rank(self) -> usize {
        match self {
            WagerClass::Win => 1,
            WagerClass::Place => 2,
            WagerClass::Show => 3,
        }
    }

    pub fn pays(self, rank: usize) -> bool {
        (1..=self.paying_rank()).contains(&rank)
    }
}

/// Quoted odds for one horse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsQuote {
    pub entity_id: String,
    pub win_odds: f64,
    pub place_odds: f64,
    pub show_odds: f64,
    /// Staked on this horse across all classes
    pub total_staked: f64,
}

impl OddsQuote {
    pub fn odds_for(&self, class: WagerClass) -> f64 {
        match class {
            WagerClass::Win => self.win_odds,
            WagerClass::Place => self.place_odds,
            WagerClass::Show => self.show_odds,
        }
    }
}

/// Proxy for win likelihood in [0.1, 0.9]
///
/// Attribute score: speed 40%, stamina 30%, agility 20%, intelligence 10%.
/// Blended 30/70 with the historical win rate (0.5 without history).
pub fn performance_score(entity: &Entity) -> f64 {
    let a = &entity.attributes;
    let attribute_score =
        (a.base_speed * 0.4 + a.stamina * 0.3 + a.agility * 0.2 + a.intelligence * 0.1) / 100.0;
    let win_rate = entity
        .record
        .and_then(|r| r.win_rate())
        .unwrap_or(0.5);

    (win_rate * 0.7 + attribute_score * 0.3).clamp(0.1, 0.9)
}

/// Unrounded win odds.
///
/// `market_share` is this horse's share of the win pool, or `None`
/// while the win pool is empty.
pub fn win_odds(score: f64, market_share: Option<f64>, config: &WageringConfig) -> f64 {
    match market_share {
        None => (10.0 - score * 8.0).max(config.performance_only_floor),
        Some(share) => {
            let implied =
                (share + score * config.performance_weight).max(config.min_implied_probability);
            ((1.0 / implied) * (1.0 - config.house_edge)).max(config.min_win_odds)
        }
    }
}

/// Build a quote, rounding all odds to one decimal place
pub fn quote(
    entity_id: &str,
    score: f64,
    market_share: Option<f64>,
    total_staked: f64,
    config: &WageringConfig,
) -> OddsQuote {
    let win = win_odds(score, market_share, config);
    OddsQuote {
        entity_id: entity_id.to_string(),
        win_odds: round_tenths(win),
        place_odds: round_tenths(win * config.place_ratio),
        show_odds: round_tenths(win * config.show_ratio),
        total_staked,
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
