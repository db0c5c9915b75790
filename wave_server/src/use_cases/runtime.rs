// Spawning and addressing the single authoritative world.

use crate::domain::Level;
use crate::domain::tuning::WorldTuning;
use crate::use_cases::game::world_task;
use crate::use_cases::world::World;
use crate::use_cases::{GameEvent, ReplaySnapshot, WorldUpdate};
use axum::extract::ws::Utf8Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc, watch};

/// Settings applied when the world task is spawned.
#[derive(Debug, Clone)]
pub struct WorldSettings {
    /// Capacity for inbound player events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast world updates.
    pub world_broadcast_capacity: usize,
    /// Fixed tick interval for the world loop.
    pub tick_interval: Duration,
    pub tuning: WorldTuning,
}

/// Channels into and out of the world task.
#[derive(Clone)]
pub struct WorldHandle {
    /// Sender for player events into the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for raw per-tick updates.
    pub world_tx: broadcast::Sender<WorldUpdate>,
    /// Broadcast sender for serialized per-tick updates.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Retained state for late joiners (domain form).
    pub replay_tx: watch::Sender<ReplaySnapshot>,
    /// Retained state for late joiners and lag recovery (serialized).
    pub replay_bytes_tx: watch::Sender<Utf8Bytes>,
    shutdown: Arc<Notify>,
}

impl WorldHandle {
    /// Stops the world loop after its current tick.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

/// Builds the world from `level` and spawns its loop on the current runtime.
pub fn spawn_world(level: Level, settings: &WorldSettings) -> WorldHandle {
    let world = World::new(
        level,
        settings.tuning,
        settings.tick_interval.as_secs_f32(),
    );
    let initial_replay = world.replay_snapshot();

    // Channel wiring for the world loop.
    let (input_tx, input_rx) = mpsc::channel::<GameEvent>(settings.input_channel_capacity);
    let (world_tx, _world_rx) =
        broadcast::channel::<WorldUpdate>(settings.world_broadcast_capacity);
    let (world_bytes_tx, _world_bytes_rx) =
        broadcast::channel::<Utf8Bytes>(settings.world_broadcast_capacity);
    let (replay_tx, _replay_rx) = watch::channel::<ReplaySnapshot>(initial_replay);
    let (replay_bytes_tx, _replay_bytes_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
    let shutdown = Arc::new(Notify::new());

    tokio::spawn(world_task(
        world,
        input_rx,
        world_tx.clone(),
        replay_tx.clone(),
        settings.tick_interval,
        shutdown.clone(),
    ));

    WorldHandle {
        input_tx,
        world_tx,
        world_bytes_tx,
        replay_tx,
        replay_bytes_tx,
        shutdown,
    }
}
