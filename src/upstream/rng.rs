//! RNG service client (win/loss verdict)

use super::{UpstreamError, VerdictProvider, VerdictQuery, VerdictResponse};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

/// Wire body: the query plus a fresh salt
#[derive(Debug, Serialize)]
struct VerdictRequest<'a> {
    #[serde(flatten)]
    query: &'a VerdictQuery,
    request_salt: String,
}

/// One POST per verdict; no retries
#[derive(Clone)]
pub struct RngClient {
    http_client: reqwest::Client,
    service_url: String,
}

impl RngClient {
    pub fn new(http_client: reqwest::Client, service_url: impl Into<String>) -> Self {
        Self {
            http_client,
            service_url: service_url.into(),
        }
    }
}

#[async_trait]
impl VerdictProvider for RngClient {
    async fn fetch_verdict(&self, query: &VerdictQuery) -> Result<VerdictResponse, UpstreamError> {
        let request = VerdictRequest {
            query,
            request_salt: Uuid::new_v4().to_string(),
        };
        debug!(
            "RNG request for bet {} (salt {}, multiplier {})",
            query.bet_id, request.request_salt, query.payout_multiplier
        );

        let response = self.http_client.post(&self.service_url).json(&request).send().await?;

        if response.status() != reqwest::StatusCode::OK {
            warn!("RNG API returned non-200 status: {}", response.status());
            return Err(UpstreamError::Status {
                service: "RNG",
                status: response.status(),
            });
        }

        Ok(response.json::<VerdictResponse>().await?)
    }
}
