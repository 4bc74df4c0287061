//! Survival Games Server - hosts timed survival matches
//!
//! This is the main entry point. It handles:
//! - Configuration from the environment and an optional settings file
//! - Tracing setup
//! - A demo driver that plays matches with simulated players
//! - Graceful shutdown, closing every game

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use survival_games::app::{demo, AppState};
use survival_games::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Survival Games Server");
    info!(game = %config.game_name, players = config.demo_players, "Demo configuration");

    let state = AppState::new(config);

    // Spawn the demo driver
    let driver_state = state.clone();
    let driver = tokio::spawn(async move {
        if let Err(err) = demo::run(driver_state).await {
            error!(error = %err, "Demo driver failed");
        }
    });

    shutdown_signal().await;

    driver.abort();
    state.registry.close_all();

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
