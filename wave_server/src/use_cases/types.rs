// Use-case level inputs/outputs for the world loop.

use glam::Vec2;

use crate::systems::DespawnReason;
use crate::domain::{ArcId, DoorId, PickupId, PlayerId, PushableId, TargetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterMode {
    Arc,
    Cone,
}

#[derive(Debug, Clone)]
pub enum GameEvent {
    Join {
        player_id: PlayerId,
    },
    Leave {
        player_id: PlayerId,
    },
    /// Owner-reported position of the player body; it is also the emission source.
    Pose {
        player_id: PlayerId,
        position: Vec2,
    },
    /// Position of a shared pushable, accepted only from its current holder.
    PushablePose {
        player_id: PlayerId,
        pushable_id: PushableId,
        position: Vec2,
    },
    EmitStart {
        player_id: PlayerId,
        aim: Vec2,
        mode: EmitterMode,
    },
    EmitUpdateAim {
        player_id: PlayerId,
        aim: Vec2,
    },
    EmitStop {
        player_id: PlayerId,
    },
}

/// Authority-to-observer state changes produced during one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Broadcast {
    ArcInit {
        arc_id: ArcId,
        owner: PlayerId,
        origin: Vec2,
        dir: Vec2,
        spawn_tick: u64,
    },
    ArcDespawn {
        arc_id: ArcId,
        reason: DespawnReason,
    },
    ConeState {
        owner: PlayerId,
        origin: Vec2,
        aim: Vec2,
        half_angle: f32,
        effective_range: f32,
    },
    ConeStop {
        owner: PlayerId,
    },
    DoorState {
        door_id: DoorId,
        is_open: bool,
    },
    OwnershipChanged {
        pushable_id: PushableId,
        holder: PlayerId,
    },
    PushablePose {
        pushable_id: PushableId,
        position: Vec2,
    },
    PlayerPose {
        player_id: PlayerId,
        position: Vec2,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    BatteryState {
        player_id: PlayerId,
        value: f32,
        max: f32,
        version: u64,
    },
    TargetState {
        target_id: TargetId,
        hp: f32,
    },
    PickupTaken {
        pickup_id: PickupId,
        player_id: PlayerId,
    },
}

/// Everything that changed during one fixed step.
#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    pub events: Vec<Broadcast>,
}

/// Retained state a late joiner needs before live updates make sense.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySnapshot {
    pub tick: u64,
    pub tick_delta: f32,
    /// Retained broadcasts in a stable order (per-door send order is preserved).
    pub events: Vec<Broadcast>,
}
