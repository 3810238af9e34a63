//! Upstream collaborators
//!
//! The spin engine depends on two remote services: the settings service that
//! knows a player's RTP, and the RNG service that decides win or loss. Both
//! sit behind traits so the engine can be driven by mocks in tests; the
//! `reqwest` implementations live in the submodules.

pub mod rng;
pub mod settings;

pub use rng::RngClient;
pub use settings::SettingsClient;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Failures talking to an upstream service
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API call failed with status {status}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("invalid RTP value '{0}'")]
    InvalidRtp(String),

    /// Reported by non-HTTP implementations
    #[error("{0}")]
    Unavailable(String),
}

/// Identifies the player whose RTP is being looked up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerRef {
    pub client_id: String,
    pub game_id: String,
    pub player_id: String,
}

/// Everything the RNG service is told about a spin. The candidate board
/// itself is never sent, only its payout multiplier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerdictQuery {
    pub client_id: String,
    pub game_id: String,
    pub player_id: String,
    pub bet_id: String,
    pub rtp: f64,
    pub payout_multiplier: f64,
    pub bet_amount: f64,
    pub ip_address: String,
    pub user_agent: String,
}

/// RNG service answer. Only `pref_outcome` decides the spin.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VerdictResponse {
    /// Absent means loss
    #[serde(default)]
    pub pref_outcome: String,
    #[serde(default)]
    pub win_amount: f64,
    #[serde(default)]
    pub win_prob: f64,
}

/// Source of a player's return-to-player setting
#[async_trait]
pub trait RtpProvider: Send + Sync {
    async fn fetch_rtp(&self, player: &PlayerRef) -> Result<f64, UpstreamError>;
}

/// Authority deciding whether a spin wins
#[async_trait]
pub trait VerdictProvider: Send + Sync {
    async fn fetch_verdict(&self, query: &VerdictQuery) -> Result<VerdictResponse, UpstreamError>;
}

/// Exponential backoff with jitter for retried upstream calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            multiplier: 1.5,
        }
    }
}

impl RetryPolicy {
    /// No retries, one attempt only
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Base delay before retry number `attempt` (0-based), before jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let scale = self.multiplier.powi(attempt as i32);
        let millis = (self.initial_backoff.as_millis() as f64 * scale).min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(millis as u64)
    }

    /// Longest total sleep across all retries
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_retries).map(|attempt| self.backoff(attempt)).sum()
    }

    /// Delay before retry `attempt`, jittered into [backoff/2, backoff]
    pub fn jittered_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self.backoff(attempt).as_millis() as u64;
        if backoff_ms <= 1 {
            return Duration::from_millis(backoff_ms);
        }
        let half_ms = backoff_ms / 2;
        let jitter_ms = rand::thread_rng().gen_range(0..=half_ms);
        Duration::from_millis(half_ms.saturating_add(jitter_ms))
    }
}
