//! citeproxy gateway: HTTP front for the cited-answer orchestrator.
//! Holds the upstream key; the browser only ever talks to `/api/chat`.

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use citeproxy_core::{AssistantsClient, Orchestrator, ProxyConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::routes::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[citeproxy-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ProxyConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!("configuration error: {}", e);
            eprintln!("[citeproxy-gateway] Set OPENAI_API_KEY and ASSISTANT_ID in .env or the environment.");
            std::process::exit(1);
        }
    };

    let backend = Arc::new(AssistantsClient::from_config(&config));
    let orchestrator = Arc::new(Orchestrator::new(backend, Arc::clone(&config)));
    let app = routes::build_app(AppState { orchestrator }, &config.static_dir);

    let addr = SocketAddr::new(config.bind_addr, config.port);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "citeproxy v{} listening on http://{} (assistant {}, static dir {})",
        citeproxy_core::version(),
        addr,
        config.assistant_id,
        config.static_dir.display()
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown initiated (Ctrl+C received)");
}
