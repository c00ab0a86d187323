use std::sync::Arc;

use fieldwatch_gateway::cli::Cli;
use fieldwatch_gateway::config::Config;
use fieldwatch_gateway::handler::{build_router, AppState};
use fieldwatch_gateway::metrics::Metrics;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse_args();

    let mut config = match Config::from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(upstream) = cli.upstream.clone() {
        config.upstream.base_url = upstream;
    }

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    if cli.validate_config {
        println!("Config valid: {}", cli.config.display());
        std::process::exit(0);
    }

    tracing::info!(
        config = %cli.config.display(),
        upstream = %config.upstream.base_url,
        "Starting fieldwatch gateway"
    );
    tracing::info!("Serving {} route(s)", config.routes.len());

    let metrics = match Metrics::new() {
        Ok(m) => Arc::new(m),
        Err(e) => {
            eprintln!("Failed to create metrics: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = match AppState::new(config, metrics) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let app = build_router(Arc::new(app_state));

    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Gateway listening on http://{}", addr);

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    });
}
