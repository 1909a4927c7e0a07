//! Wagering Module
//!
//! Parimutuel-style odds from attributes and bet volume, bet placement
//! and settlement against a finished race.

pub mod book;
pub mod odds;

pub use book::{
    create_shared_wagering, BetOutcome, BetRecord, PoolEntry, SharedWagering, WageringEngine,
};
pub use odds::{performance_score, win_odds, OddsQuote, WagerClass};
