//! Kongspin Server Binary

use clap::Parser;
use kongspin::api::{init_tracing, ApiServer};
use kongspin::config::{self, ConfigLoader};

#[derive(Parser, Debug)]
#[command(name = "kongspin")]
#[command(about = "Funky King Kong spin server", long_about = None)]
struct Args {
    /// TOML configuration file (environment variables still override it)
    #[arg(long)]
    config: Option<String>,

    /// Listen host
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(long)]
    port: Option<u16>,

    /// Allowed CORS origins (comma-separated, use * for all)
    #[arg(long)]
    cors_origins: Option<String>,

    /// Log to stdout instead of the configured log file
    #[arg(long)]
    stdout: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match args.config {
        Some(ref path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(origins) = args.cors_origins {
        config.server.allowed_origins = origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if args.stdout {
        config.logging.log_file = None;
    }
    config::validate(&config)?;

    init_tracing(&config.logging).map_err(|e| format!("failed to initialize logging: {}", e))?;

    ApiServer::new(config).run().await
}
