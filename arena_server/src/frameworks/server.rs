// Framework bootstrap for the arena server runtime.

use crate::domain::GameTuning;
use crate::frameworks::config;
use crate::interface_adapters::net::{
    ConnectionHub, health_handler, list_rooms_handler, ws_handler,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{Arena, ArenaCommand, arena_task};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::mpsc;

fn init_runtime() {
    // A missing .env is normal outside local development.
    let _ = dotenvy::dotenv();
    init_tracing();
    install_panic_hook();
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().with_current_span(true).init(),
        _ => builder.compact().init(),
    }
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state();
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/rooms", get(list_rooms_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_addr(), config::http_port());

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Arc<AppState> {
    let mut tuning = GameTuning::default();
    if let Some(tick_ms) = config::tick_interval_ms() {
        tuning.matches.tick_interval_ms = tick_ms;
    }
    let seed = config::rng_seed();
    tracing::debug!(
        tick_ms = tuning.matches.tick_interval_ms,
        seeded = seed.is_some(),
        "arena configured"
    );

    let (arena_tx, arena_rx) = mpsc::channel::<ArenaCommand>(config::ARENA_COMMAND_CAPACITY);
    let hub = Arc::new(ConnectionHub::new());

    // The arena task owns every room; it stops once all senders are dropped.
    tokio::spawn(arena_task(Arena::new(tuning, seed), arena_rx, hub.clone()));

    Arc::new(AppState { arena_tx, hub })
}
