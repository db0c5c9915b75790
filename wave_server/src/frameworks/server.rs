// Framework bootstrap for the wave server runtime.

use crate::domain::Level;
use crate::domain::tuning::WorldTuning;
use crate::frameworks::config;
use crate::interface_adapters::level::load_level;
use crate::interface_adapters::net::{
    door_handler, doors_handler, spawn_world_serializers, ws_handler,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::IdAllocator;
use crate::use_cases::{WorldSettings, spawn_world};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    // build state
    let state = build_state()?;
    // Start the Web Server
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/doors", get(doors_handler))
        .route("/doors/{door_id}", get(door_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Result<Arc<AppState>> {
    let level = match config::level_path() {
        Some(path) => load_level(&path).map_err(|e| {
            std::io::Error::other(format!("failed to load level {}: {e}", path.display()))
        })?,
        None => {
            tracing::info!("no LEVEL_PATH set; using built-in demo level");
            Level::demo()
        }
    };

    let settings = WorldSettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        world_broadcast_capacity: config::WORLD_BROADCAST_CAPACITY,
        tick_interval: config::tick_interval(),
        tuning: WorldTuning::default(),
    };
    tracing::debug!(
        tick_interval_ms = settings.tick_interval.as_millis(),
        doors = level.doors.len(),
        reflectors = level.reflectors.len(),
        "world configured"
    );

    // Spawn the authoritative world task plus the shared serializers.
    let world = spawn_world(level, &settings);
    spawn_world_serializers(&world);

    Ok(Arc::new(AppState {
        world,
        // 0 is reserved for the server as pushable holder.
        player_ids: IdAllocator::starting_at(1),
        conn_ids: IdAllocator::starting_at(1),
    }))
}
