//! Error types
//!
//! Configuration problems are rejected at the call that introduced them.
//! Nothing in here is raised once a race is running.

use std::path::PathBuf;

use thiserror::Error;

/// Rejected race or simulator configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("race distance must be positive and finite, got {0}")]
    InvalidDistance(f64),

    #[error("a race needs at least one entity")]
    EmptyField,

    #[error("duplicate entity id {0:?} in field")]
    DuplicateEntity(String),

    #[error("attribute {attribute} of entity {entity:?} must be within 0-100, got {value}")]
    AttributeOutOfRange {
        entity: String,
        attribute: &'static str,
        value: f64,
    },

    #[error("tick interval must be at least 1 ms")]
    InvalidTickInterval,

    #[error("invalid physics setting {0}")]
    InvalidPhysics(&'static str),

    #[error("house edge must be within [0, 1), got {0}")]
    InvalidHouseEdge(f64),
}

/// Rejected wager
#[derive(Debug, Error, PartialEq)]
pub enum WagerError {
    #[error("stake must be positive and finite, got {0}")]
    NonPositiveStake(f64),
}

/// Failure loading a simulator config file
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
