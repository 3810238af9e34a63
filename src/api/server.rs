//! API Server
//!
//! Wires the upstream clients into two arbiters (production and test), puts
//! them behind the router and serves until a shutdown signal arrives.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    monitoring::MetricsRegistry,
    routes::create_router,
};
use crate::config::{Endpoints, LoggingConfig, ServerConfig, ServiceConfig};
use crate::games::{OutcomeArbiter, ReelGenerator};
use crate::upstream::{RngClient, SettingsClient};
use std::{fs::OpenOptions, net::SocketAddr, sync::Arc, sync::Mutex, time::Duration};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. With a log file configured,
/// output is appended there without ANSI colours.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.log_file.as_deref().filter(|path| !path.is_empty()) {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).try_init()?;
        }
        None => builder.try_init()?,
    }
    Ok(())
}

pub struct ApiServer {
    config: ServiceConfig,
}

impl ApiServer {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Start the API server
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let state = build_state(&self.config)?;
        let app = create_app(state, &self.config.server);
        let addr = self.get_socket_addr()?;

        info!("Starting {} spin server", self.config.game.display_name);
        self.log_server_info(addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped gracefully");
        Ok(())
    }

    fn get_socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.config.server.host.parse::<std::net::IpAddr>()?,
            self.config.server.port,
        )))
    }

    fn log_server_info(&self, addr: SocketAddr) {
        let upstream = &self.config.upstream;
        info!("   Listen: http://{}", addr);
        info!("   Game: {} ({})", self.config.game.name, self.config.game.display_name);
        info!("   Production settings: {}", upstream.production.settings_url);
        info!("   Production RNG: {}", upstream.production.rng_url);
        info!("   Test settings: {}", upstream.test.settings_url);
        info!("   Test RNG: {}", upstream.test.rng_url);
        info!(
            "   Upstream timeout: {}s (worst case {:?}, request timeout {}s)",
            upstream.timeout_secs,
            upstream.worst_case_duration(),
            self.config.server.request_timeout_secs
        );
        info!("   Trust X-Forwarded-For: {}", self.config.server.trust_forwarded_for);
        info!("   CORS: {:?}", self.config.server.allowed_origins);
        info!("   POST /spin/{}", self.config.game.name);
    }
}

/// Build both arbiters over one HTTP client and one reel generator
pub fn build_state(config: &ServiceConfig) -> Result<Arc<AppState>, reqwest::Error> {
    let http_client = reqwest::Client::builder()
        .timeout(config.upstream.timeout())
        .build()?;
    let retry = config.upstream.retry_policy();
    let reels = ReelGenerator::from_entropy();

    let arbiter = |endpoints: &Endpoints| {
        OutcomeArbiter::new(
            Arc::new(SettingsClient::new(
                http_client.clone(),
                endpoints.settings_url.clone(),
                retry,
            )),
            Arc::new(RngClient::new(http_client.clone(), endpoints.rng_url.clone())),
            reels.clone(),
        )
    };

    Ok(Arc::new(AppState {
        production: arbiter(&config.upstream.production),
        test: arbiter(&config.upstream.test),
        game: config.game.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        metrics: Arc::new(MetricsRegistry::new()),
        trust_forwarded_for: config.server.trust_forwarded_for,
    }))
}

/// Router plus the middleware stack
pub fn create_app(state: Arc<AppState>, config: &ServerConfig) -> axum::Router {
    // Outermost first: trace, timeout, CORS (handles preflight), request id
    create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(create_cors_layer(config.allowed_origins.clone()))
            .layer(axum::middleware::from_fn(request_id_middleware)),
    )
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
