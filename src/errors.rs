//! Error types for the spin service
//!
//! `SpinError` is what a single spin can fail with; `ConfigurationError`
//! covers startup.

use crate::games::types::BetLevel;
use crate::upstream::UpstreamError;

/// Why a spin did not complete
#[derive(Debug, thiserror::Error)]
pub enum SpinError {
    #[error("ClientID, PlayerID, BetID, GameID must not be empty")]
    MissingField,

    #[error("Invalid bet level, allowed values are 1, 2, 3")]
    InvalidBetLevel(i64),

    #[error("Invalid bet amount for level {level}, valid amounts: {}", format_amounts(.valid))]
    InvalidBetAmount {
        amount: f64,
        level: BetLevel,
        valid: Vec<f64>,
    },

    #[error("Failed to retrieve game settings: {0}")]
    Rtp(#[source] UpstreamError),

    #[error("Failed to retrieve RNG outcome: {0}")]
    Verdict(#[source] UpstreamError),

    /// The engine produced a board that contradicts its own corpus. Never
    /// degraded into a silent loss.
    #[error("Internal error: {0}")]
    InvariantViolation(String),
}

impl SpinError {
    /// Locally detected, caller's fault, no upstream call was spent on it
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            SpinError::MissingField | SpinError::InvalidBetLevel(_) | SpinError::InvalidBetAmount { .. }
        )
    }

    /// Short label for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            SpinError::MissingField => "missing_field",
            SpinError::InvalidBetLevel(_) => "invalid_bet_level",
            SpinError::InvalidBetAmount { .. } => "invalid_bet_amount",
            SpinError::Rtp(_) => "settings_unavailable",
            SpinError::Verdict(_) => "rng_unavailable",
            SpinError::InvariantViolation(_) => "invariant_violation",
        }
    }
}

fn format_amounts(amounts: &[f64]) -> String {
    let joined: Vec<String> = amounts.iter().map(|a| a.to_string()).collect();
    format!("[{}]", joined.join(" "))
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Missing required field: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
