// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeasonflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: task '{order}' lists preceding codes that do not sort before it: {offending:?}")]
    OrderingViolation {
        order: String,
        offending: Vec<String>,
    },

    #[error("Cycle detected in template graph: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Date propagation did not settle after {passes} passes")]
    PropagationNonTermination { passes: usize },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SeasonflowError {
    /// Whether this error describes a request the caller can fix by changing
    /// its input (bad date, incomplete predecessors, ordering, cycles).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SeasonflowError::Validation(_)
                | SeasonflowError::OrderingViolation { .. }
                | SeasonflowError::CycleDetected { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SeasonflowError>;
