use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bites::api::{create_router, AppState};
use bites::config::Config;
use bites::llm::LlmProvider;

#[derive(Parser)]
#[command(name = "bites")]
#[command(about = "Seoul restaurant discovery and dining chat assistant")]
struct Args {
    /// Listen address, overrides BITES_HOST
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides BITES_PORT
    #[arg(long)]
    port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bites=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    match &config.llm {
        Some(llm_config) => {
            tracing::info!("Initializing LLM provider: {}...", llm_config.model);
            if llm_config.api_key.is_none() {
                tracing::warn!(
                    "LLM_API_KEY is not set - hosted providers will reject every request"
                );
            }
        }
        None => tracing::warn!("LLM_MODEL is not set - searches and chat will answer with apologies"),
    }

    let llm = LlmProvider::new(config.llm.as_ref());
    if !llm.is_available() {
        tracing::warn!("LLM unavailable - backend calls will fail gracefully");
    }

    tracing::info!(
        city = %config.locale.city,
        country = %config.locale.country,
        "Scoping searches to locale"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, llm);
    let app = create_router(state);

    tracing::info!("Bites starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
