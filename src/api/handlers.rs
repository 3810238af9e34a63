//! Request Handlers

use super::{
    errors::ApiError,
    middleware::{client_ip, user_agent, Environment, RequestId},
    models::{HealthResponse, SpinRequest, SpinResponse, StatusResponse},
    monitoring::MetricsRegistry,
};
use crate::config::GameConfig;
use crate::games::{BetRequest, OutcomeArbiter, SpinContext};
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, State},
    http::HeaderMap,
    Extension, Json,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Spins whose Origin does not mention "test"
    pub production: OutcomeArbiter,
    pub test: OutcomeArbiter,
    pub game: GameConfig,
    pub version: String,
    pub metrics: Arc<MetricsRegistry>,
    /// Resolve the client IP from X-Forwarded-For
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub fn arbiter(&self, environment: Environment) -> &OutcomeArbiter {
        match environment {
            Environment::Production => &self.production,
            Environment::Test => &self.test,
        }
    }
}

/// Health check handler
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
    })
}

/// GET /status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        game: state.game.display_name.clone(),
        version: state.version.clone(),
    })
}

/// Play one spin
/// POST /spin/:game
pub async fn spin_handler(
    Path(game): Path<String>,
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<SpinRequest>, JsonRejection>,
) -> Result<Json<SpinResponse>, ApiError> {
    if game != state.game.name {
        return Err(ApiError::not_found(request_id.0, format!("Unknown game '{}'", game)));
    }

    let Json(request) = payload.map_err(|rejection| {
        warn!(request_id = %request_id.0, error = %rejection, "rejected spin body");
        state.metrics.rejected_spins_total.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        ApiError::bad_request(request_id.0.clone(), "Invalid request body".to_string())
    })?;

    let environment = Environment::from_headers(&headers);
    let context = SpinContext {
        client_id: request.client_id,
        game_id: request.game_id,
        player_id: request.player_id,
        bet_id: request.bet_id,
        ip_address: client_ip(
            &headers,
            connect_info.map(|ConnectInfo(addr)| addr),
            state.trust_forwarded_for,
        ),
        user_agent: user_agent(&headers),
    };
    let bet = BetRequest {
        bet_amount: request.bet_amount,
        bet_level: request.bet_level,
    };

    info!(
        request_id = %request_id.0,
        %environment,
        bet_id = %context.bet_id,
        bet_amount = bet.bet_amount,
        bet_level = bet.bet_level,
        "spin requested"
    );

    match state.arbiter(environment).spin(&context, &bet).await {
        Ok(report) => {
            info!(
                request_id = %request_id.0,
                rtp = report.rtp,
                win_amount = report.outcome.win_amount,
                "spin resolved"
            );
            state.metrics.record_spin(&report, bet.bet_amount);
            Ok(Json(SpinResponse::success(&report.outcome)))
        }
        Err(failure) => {
            warn!(
                request_id = %request_id.0,
                stage = %failure.stage,
                reason = failure.error.reason(),
                "spin failed"
            );
            state.metrics.record_failure(&failure.error);
            Err(ApiError::from_spin(request_id.0, &failure.error))
        }
    }
}
