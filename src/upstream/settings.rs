//! Settings service client (player RTP lookup)

use super::{PlayerRef, RetryPolicy, RtpProvider, UpstreamError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SettingsResponse {
    data: SettingsData,
}

#[derive(Debug, Deserialize)]
struct SettingsData {
    #[serde(default)]
    game_rtp: String,
}

/// POSTs `{client_id, game_id, player_id}` and reads `data.game_rtp`
#[derive(Clone)]
pub struct SettingsClient {
    http_client: reqwest::Client,
    service_url: String,
    retry: RetryPolicy,
}

impl SettingsClient {
    pub fn new(http_client: reqwest::Client, service_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            http_client,
            service_url: service_url.into(),
            retry,
        }
    }

    async fn request_once(&self, player: &PlayerRef) -> Result<SettingsResponse, UpstreamError> {
        let response = self.http_client.post(&self.service_url).json(player).send().await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(UpstreamError::Status {
                service: "Settings",
                status: response.status(),
            });
        }

        Ok(response.json::<SettingsResponse>().await?)
    }
}

/// Parse the string-encoded RTP the settings service returns
pub fn parse_rtp(raw: &str) -> Result<f64, UpstreamError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|rtp| rtp.is_finite())
        .ok_or_else(|| UpstreamError::InvalidRtp(raw.to_string()))
}

#[async_trait]
impl RtpProvider for SettingsClient {
    async fn fetch_rtp(&self, player: &PlayerRef) -> Result<f64, UpstreamError> {
        debug!("Settings request for player {} ({})", player.player_id, self.service_url);

        let mut attempt = 0;
        let settings = loop {
            match self.request_once(player).await {
                Ok(settings) => break settings,
                Err(e) if attempt < self.retry.max_retries => {
                    let delay = self.retry.jittered_backoff(attempt);
                    warn!("Settings call failed (attempt {}): {}; retrying in {:?}", attempt + 1, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!("Settings call failed after {} attempts: {}", attempt + 1, e);
                    return Err(e);
                }
            }
        };

        parse_rtp(&settings.data.game_rtp)
    }
}
