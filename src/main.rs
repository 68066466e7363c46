//! King of the Hill dedicated host
//!
//! Runs a simulated lobby playing the King of the Hill mode and serves
//! its live standings over HTTP:
//! - `GET /health` for uptime and whether the match has ended
//! - `GET /standings` for the sorted leaderboard and hill rotation

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use koth_server::app::AppState;
use koth_server::config::Config;
use koth_server::http::build_router;
use koth_server::session::{SessionSettings, SimSession, StatusBoard};
use koth_server::util::time::{init_server_time, unix_millis};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    let settings = SessionSettings::from_config(&config, unix_millis());
    info!(
        score_limit = settings.match_config.score_limit,
        hill_duration_ms = settings.match_config.hill_duration_ms,
        zone_scale = settings.match_config.zone_scale,
        team_mode = settings.match_config.team_mode,
        peers = settings.peers,
        "Starting King of the Hill host"
    );

    let session = SimSession::new(settings);
    let board = StatusBoard::new(session.id());
    let state = AppState::new(config.clone(), board.clone(), session.ended_flag());

    // Run the session until it is decided or the host shuts down
    let (stop_tx, stop_rx) = watch::channel(false);
    let session_task = tokio::spawn(session.run(board, stop_rx));

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.status_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Status server listening on {}", addr);
    info!("Standings: http://{}/standings", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    stop_tx.send(true).ok();
    match session_task.await? {
        Some(decision) => info!(winner = ?decision.winner, reason = ?decision.reason, "Match decided"),
        None => info!("Match stopped without a winner"),
    }

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
