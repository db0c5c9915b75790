use super::types::{GameEvent, ReplaySnapshot, WorldUpdate};
use super::world::World;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tracing::{debug, info};

/// Authoritative loop: sole owner of the `World`, so no locking is needed anywhere.
pub async fn world_task(
    mut world: World,
    mut input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    replay_tx: watch::Sender<ReplaySnapshot>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    // Drive the fixed-step loop at the configured tick rate.
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let dt = tick_interval.as_secs_f32();

    info!(tick_ms = tick_interval.as_millis() as u64, "world loop started");

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!(tick = world.tick(), "world loop stopping");
                break;
            }
            _ = interval.tick() => {}
        }

        while let Ok(ev) = input_rx.try_recv() {
            world.handle_event(ev);
        }

        world.fixed_step();
        world.frame_step(dt);

        if let Some(snapshot) = world.take_replay_if_changed() {
            replay_tx.send_replace(snapshot);
        }

        // No receivers is normal while nobody is connected.
        if world_tx.send(world.drain_update()).is_err() {
            debug!(tick = world.tick(), "no world update subscribers");
        }
    }
}
