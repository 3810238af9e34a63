//! End-to-end tests for the spin HTTP surface, driven through the full
//! middleware stack with counting mock collaborators.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{Request, Response, StatusCode},
    routing::post,
    Router,
};
use kongspin::api::{build_state, create_app, handlers::AppState, models::SpinResponse, monitoring::MetricsRegistry};
use kongspin::config::{self, GameConfig, ServerConfig, ServiceConfig};
use kongspin::games::{OutcomeArbiter, ReelGenerator, SharedRng};
use kongspin::upstream::{PlayerRef, RtpProvider, UpstreamError, VerdictProvider, VerdictQuery, VerdictResponse};
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};
use tower::ServiceExt;

struct MockRtp {
    rtp: Option<f64>,
    calls: AtomicUsize,
}

#[async_trait]
impl RtpProvider for MockRtp {
    async fn fetch_rtp(&self, _player: &PlayerRef) -> Result<f64, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rtp
            .ok_or_else(|| UpstreamError::Unavailable("settings service down".to_string()))
    }
}

struct MockVerdict {
    outcome: Option<&'static str>,
    queries: Mutex<Vec<VerdictQuery>>,
}

impl MockVerdict {
    fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    fn last_query(&self) -> VerdictQuery {
        self.queries.lock().unwrap().last().cloned().expect("no verdict query recorded")
    }
}

#[async_trait]
impl VerdictProvider for MockVerdict {
    async fn fetch_verdict(&self, query: &VerdictQuery) -> Result<VerdictResponse, UpstreamError> {
        self.queries.lock().unwrap().push(query.clone());
        match self.outcome {
            Some(outcome) => Ok(VerdictResponse {
                pref_outcome: outcome.to_string(),
                win_amount: 0.0,
                win_prob: 0.5,
            }),
            None => Err(UpstreamError::Unavailable("rng service down".to_string())),
        }
    }
}

struct Pair {
    rtp: Arc<MockRtp>,
    verdict: Arc<MockVerdict>,
}

impl Pair {
    fn new(rtp: Option<f64>, outcome: Option<&'static str>) -> Self {
        Self {
            rtp: Arc::new(MockRtp {
                rtp,
                calls: AtomicUsize::new(0),
            }),
            verdict: Arc::new(MockVerdict {
                outcome,
                queries: Mutex::new(Vec::new()),
            }),
        }
    }

    fn arbiter(&self, seed: u64) -> OutcomeArbiter {
        OutcomeArbiter::new(
            self.rtp.clone(),
            self.verdict.clone(),
            ReelGenerator::new(Arc::new(SharedRng::seeded(seed))),
        )
    }

    fn rtp_calls(&self) -> usize {
        self.rtp.calls.load(Ordering::SeqCst)
    }
}

struct Harness {
    app: Router,
    production: Pair,
    test: Pair,
}

impl Harness {
    fn new(production: Pair) -> Self {
        Self::with_pairs(production, Pair::new(Some(90.0), Some("win")))
    }

    fn with_pairs(production: Pair, test: Pair) -> Self {
        Self::build(production, test, false)
    }

    /// Deployed behind a proxy that sets X-Forwarded-For
    fn behind_proxy(production: Pair) -> Self {
        Self::build(production, Pair::new(Some(90.0), Some("win")), true)
    }

    fn build(production: Pair, test: Pair, trust_forwarded_for: bool) -> Self {
        let state = Arc::new(AppState {
            production: production.arbiter(1),
            test: test.arbiter(2),
            game: GameConfig::default(),
            version: "0.0.0-test".to_string(),
            metrics: Arc::new(MetricsRegistry::new()),
            trust_forwarded_for,
        });
        Self {
            app: create_app(state, &ServerConfig::default()),
            production,
            test,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

fn spin_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/spin/funkykingkong")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_body(bet_amount: f64, bet_level: i64) -> Value {
    json!({
        "client_id": "client-1",
        "game_id": "game-1",
        "player_id": "player-1",
        "bet_id": "bet-1",
        "bet_amount": bet_amount,
        "bet_level": bet_level,
    })
}

async fn read_spin(response: Response<Body>) -> SpinResponse {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_winning_spin_pays_candidate() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("win")));

    let response = harness.send(spin_request(valid_body(0.01, 1))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_spin(response).await;
    assert_eq!(body.status, "success");
    assert_eq!(body.reels.len(), 3);
    assert!(body.win_amount > 0.0);
    assert!(!body.winning_combination.is_empty());
    assert_eq!(body.bet_level, 1);
    assert_eq!(body.paytable_used, 1);

    assert_eq!(harness.production.rtp_calls(), 1);
    assert_eq!(harness.production.verdict.calls(), 1);

    let query = harness.production.verdict.last_query();
    assert_eq!(query.rtp, 96.0);
    assert_eq!(query.bet_amount, 0.01);
    assert!((query.payout_multiplier - body.win_amount / 0.01).abs() < 1e-9);
}

#[tokio::test]
async fn test_losing_spin_pays_nothing() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("loss")));

    let response = harness.send(spin_request(valid_body(0.75, 3))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_spin(response).await;
    assert_eq!(body.status, "success");
    assert_eq!(body.reels.len(), 3);
    assert_eq!(body.win_amount, 0.0);
    assert_eq!(body.winning_combination, "");
    assert_eq!(body.bet_level, 3);

    // The candidate was still priced and sent
    assert!(harness.production.verdict.last_query().payout_multiplier > 0.0);
}

#[tokio::test]
async fn test_unrecognised_outcome_is_a_loss() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("WIN")));

    let body = read_spin(harness.send(spin_request(valid_body(0.2, 2))).await).await;
    assert_eq!(body.status, "success");
    assert_eq!(body.win_amount, 0.0);
}

#[tokio::test]
async fn test_invalid_level_rejected_before_upstream() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("win")));

    let response = harness.send(spin_request(valid_body(0.01, 4))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_spin(response).await;
    assert_eq!(body.status, "error");
    assert_eq!(body.message, "Invalid bet level, allowed values are 1, 2, 3");
    assert!(body.reels.is_empty());

    assert_eq!(harness.production.rtp_calls(), 0);
    assert_eq!(harness.production.verdict.calls(), 0);
}

#[tokio::test]
async fn test_invalid_amount_lists_valid_amounts() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("win")));

    let response = harness.send(spin_request(valid_body(0.07, 1))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_spin(response).await;
    assert_eq!(
        body.message,
        "Invalid bet amount for level x1, valid amounts: [0.01 0.05 0.1 0.2 0.25]"
    );
    assert_eq!(harness.production.rtp_calls(), 0);
}

#[tokio::test]
async fn test_amount_from_other_level_rejected() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("win")));

    let response = harness.send(spin_request(valid_body(0.02, 1))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_identifier_rejected() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("win")));

    let mut body = valid_body(0.01, 1);
    body["bet_id"] = json!("");
    let response = harness.send(spin_request(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_spin(response).await.message,
        "ClientID, PlayerID, BetID, GameID must not be empty"
    );
    assert_eq!(harness.production.rtp_calls(), 0);
}

#[tokio::test]
async fn test_missing_identifier_rejected() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("win")));

    let response = harness
        .send(spin_request(json!({"client_id": "c", "bet_amount": 0.01, "bet_level": 1})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_spin(response).await.message,
        "ClientID, PlayerID, BetID, GameID must not be empty"
    );
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("win")));

    let request = Request::builder()
        .method("POST")
        .uri("/spin/funkykingkong")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = harness.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_spin(response).await.message, "Invalid request body");

    let wrong_type = spin_request(json!({"bet_amount": "lots", "bet_level": 1}));
    let response = harness.send(wrong_type).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_spin(response).await.message, "Invalid request body");

    assert_eq!(harness.production.rtp_calls(), 0);
}

#[tokio::test]
async fn test_settings_failure_skips_rng() {
    let harness = Harness::new(Pair::new(None, Some("win")));

    let response = harness.send(spin_request(valid_body(0.01, 1))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = read_spin(response).await;
    assert_eq!(body.status, "error");
    assert_eq!(
        body.message,
        "Failed to retrieve game settings: settings service down"
    );
    assert_eq!(harness.production.verdict.calls(), 0);
}

#[tokio::test]
async fn test_rng_failure_is_internal_error() {
    let harness = Harness::new(Pair::new(Some(96.0), None));

    let response = harness.send(spin_request(valid_body(0.01, 1))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_spin(response).await.message,
        "Failed to retrieve RNG outcome: rng service down"
    );
}

#[tokio::test]
async fn test_test_origin_uses_test_services() {
    let harness = Harness::with_pairs(
        Pair::new(Some(96.0), Some("win")),
        Pair::new(Some(80.0), Some("loss")),
    );

    let mut request = spin_request(valid_body(0.01, 1));
    request
        .headers_mut()
        .insert("origin", "https://test.casino.example".parse().unwrap());
    let body = read_spin(harness.send(request).await).await;

    assert_eq!(body.win_amount, 0.0);
    assert_eq!(harness.test.rtp_calls(), 1);
    assert_eq!(harness.test.verdict.last_query().rtp, 80.0);
    assert_eq!(harness.production.rtp_calls(), 0);
    assert_eq!(harness.production.verdict.calls(), 0);
}

/// Spin from `peer` carrying a client-supplied X-Forwarded-For
fn forwarded_spin(peer: &str) -> Request<Body> {
    let mut request = spin_request(valid_body(0.01, 1));
    let headers = request.headers_mut();
    headers.insert("x-forwarded-for", "198.51.100.4, 10.0.0.2".parse().unwrap());
    headers.insert("user-agent", "kong-client/2.1".parse().unwrap());
    let peer: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

#[tokio::test]
async fn test_client_details_use_peer_address() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("loss")));
    harness.send(forwarded_spin("192.0.2.10:40000")).await;

    let query = harness.production.verdict.last_query();
    assert_eq!(query.ip_address, "192.0.2.10");
    assert_eq!(query.user_agent, "kong-client/2.1");
    assert_eq!(query.bet_id, "bet-1");
}

#[tokio::test]
async fn test_client_details_forwarded_behind_proxy() {
    let harness = Harness::behind_proxy(Pair::new(Some(96.0), Some("loss")));
    harness.send(forwarded_spin("10.0.0.2:40000")).await;

    let query = harness.production.verdict.last_query();
    assert_eq!(query.ip_address, "198.51.100.4");
    assert_eq!(query.user_agent, "kong-client/2.1");
}

#[tokio::test]
async fn test_unknown_game_not_found() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("win")));

    let request = Request::builder()
        .method("POST")
        .uri("/spin/otherslot")
        .header("content-type", "application/json")
        .body(Body::from(valid_body(0.01, 1).to_string()))
        .unwrap();
    let response = harness.send(request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_spin(response).await.status, "error");
    assert_eq!(harness.production.rtp_calls(), 0);
}

#[tokio::test]
async fn test_request_id_header() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("win")));

    let response = harness.send(spin_request(valid_body(0.01, 1))).await;
    let generated = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());

    let mut request = spin_request(valid_body(0.01, 9));
    request
        .headers_mut()
        .insert("x-request-id", "req-abc".parse().unwrap());
    let response = harness.send(request).await;
    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-abc");
}

#[tokio::test]
async fn test_status_health_and_metrics() {
    let harness = Harness::new(Pair::new(Some(96.0), Some("win")));

    let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = harness.send(get("/status")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let status: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(status["status"], "ok");
    assert_eq!(status["game"], "funky-king-kong");
    assert_eq!(status["version"], "0.0.0-test");

    let response = harness.send(get("/health")).await;
    let health: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(health["status"], "Running");

    harness.send(spin_request(valid_body(0.01, 1))).await;
    harness.send(spin_request(valid_body(0.01, 7))).await;

    let response = harness.send(get("/metrics")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
    assert!(text.contains("kongspin_spins_total 1\n"));
    assert!(text.contains("kongspin_spins_won_total 1\n"));
    assert!(text.contains("kongspin_rejected_spins_total 1\n"));
}

#[tokio::test]
async fn test_concurrent_spins() {
    let harness = Arc::new(Harness::new(Pair::new(Some(96.0), Some("win"))));

    let mut handles = Vec::new();
    for i in 0..32 {
        let harness = harness.clone();
        handles.push(tokio::spawn(async move {
            let amount = [0.01, 0.05, 0.1, 0.2, 0.25][i % 5];
            let response = harness.send(spin_request(valid_body(amount, 1))).await;
            assert_eq!(response.status(), StatusCode::OK);
            read_spin(response).await
        }));
    }

    for handle in handles {
        let body = handle.await.unwrap();
        assert!(body.win_amount > 0.0);
    }
    assert_eq!(harness.production.rtp_calls(), 32);
    assert_eq!(harness.production.verdict.calls(), 32);
}

#[tokio::test]
async fn test_hung_settings_service_reports_error() {
    // Accepts the connection, never answers
    let settings = Router::new().route("/", post(|| std::future::pending::<StatusCode>()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, settings).await.unwrap();
    });

    let mut service = ServiceConfig::default();
    service.upstream.production.settings_url = format!("http://{}/", addr);
    service.upstream.timeout_secs = 1;
    service.upstream.settings_max_retries = 0;
    service.server.request_timeout_secs = 3;
    config::validate(&service).unwrap();

    let app = create_app(build_state(&service).unwrap(), &service.server);

    let started = Instant::now();
    let response = app.clone().oneshot(spin_request(valid_body(0.01, 1))).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = read_spin(response).await;
    assert_eq!(body.status, "error");
    assert!(body.message.starts_with("Failed to retrieve game settings:"), "{}", body.message);

    let metrics = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.oneshot(metrics).await.unwrap();
    let text = String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
    assert!(text.contains("kongspin_settings_failures_total 1\n"));
}
