//! API Request and Response Models

use crate::games::types::{reels_to_strings, SpinOutcome};
use serde::{Deserialize, Serialize};

/// Body of `POST /spin/:game`.
///
/// Missing fields fall back to empty/zero so they are reported by validation
/// with a specific message instead of a generic parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpinRequest {
    pub client_id: String,
    pub game_id: String,
    pub player_id: String,
    pub bet_id: String,
    pub bet_amount: f64,
    /// 1, 2 or 3 (paytable selection)
    pub bet_level: i64,
}

/// Body of every `/spin` response, success or error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpinResponse {
    pub status: String,
    pub message: String,
    pub reels: Vec<String>,
    pub win_amount: f64,
    pub winning_combination: String,
    pub paytable_used: u8,
    pub bet_level: u8,
}

impl SpinResponse {
    pub fn success(outcome: &SpinOutcome) -> Self {
        Self {
            status: "success".to_string(),
            message: String::new(),
            reels: reels_to_strings(&outcome.reels),
            win_amount: outcome.win_amount,
            winning_combination: outcome.winning_combination.clone(),
            paytable_used: outcome.bet_level.get(),
            bet_level: outcome.bet_level.get(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            reels: Vec::new(),
            win_amount: 0.0,
            winning_combination: String::new(),
            paytable_used: 0,
            bet_level: 0,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Service status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub game: String,
    pub version: String,
}
