mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use sailvenue_detect::{DetectionEngine, InMemoryRegistry};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, rate_limit_state_from_config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = sailvenue_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting sailvenue server");

    let registry = Arc::new(InMemoryRegistry::from_file(&config.venues_path)?);
    let venue_count = registry.len();
    let engine = Arc::new(DetectionEngine::from_registry(
        registry,
        config.agent().as_ref(),
        config.detect.clone(),
    )?);

    let _scheduler = scheduler::build_scheduler(Arc::clone(&engine)).await?;

    let state = AppState {
        engine,
        venue_count,
    };
    let app = build_app(state, rate_limit_state_from_config(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
