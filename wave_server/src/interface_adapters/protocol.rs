// Wire protocol DTOs and conversions for public wave server messages.

use crate::systems::DespawnReason;
use crate::domain::{ArcId, DoorId, PickupId, PlayerId, PushableId, TargetId};
use crate::use_cases::{Broadcast, EmitterMode, ReplaySnapshot, WorldUpdate};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity for the connection after Join is accepted.
    Identity { player_id: PlayerId },
    // Retained state sent after Identity and again on lag recovery.
    Replay(ReplayDto),
    // Changes produced by one authoritative tick.
    WorldUpdate(WorldUpdateDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Initial handshake; must be the first message.
    Join(JoinPayload),
    Pose(PointDto),
    PushablePose(PushablePoseDto),
    EmitStart(EmitStartDto),
    EmitUpdateAim(AimDto),
    EmitStop,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinPayload {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointDto {
    pub x: f32,
    pub y: f32,
}

impl From<PointDto> for Vec2 {
    fn from(p: PointDto) -> Self {
        Vec2::new(p.x, p.y)
    }
}

impl From<Vec2> for PointDto {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushablePoseDto {
    pub id: PushableId,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmitterModeDto {
    Arc,
    Cone,
}

impl From<EmitterModeDto> for EmitterMode {
    fn from(mode: EmitterModeDto) -> Self {
        match mode {
            EmitterModeDto::Arc => EmitterMode::Arc,
            EmitterModeDto::Cone => EmitterMode::Cone,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmitStartDto {
    pub aim: PointDto,
    #[serde(default = "default_mode")]
    pub mode: EmitterModeDto,
}

fn default_mode() -> EmitterModeDto {
    EmitterModeDto::Arc
}

#[derive(Debug, Clone, Deserialize)]
pub struct AimDto {
    pub aim: PointDto,
}

/// Flattened broadcast for wire transmission.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum EventDto {
    ArcInit {
        arc_id: ArcId,
        owner: PlayerId,
        origin: PointDto,
        dir: PointDto,
        spawn_tick: u64,
    },
    ArcDespawn {
        arc_id: ArcId,
        reason: &'static str,
    },
    ConeState {
        owner: PlayerId,
        origin: PointDto,
        aim: PointDto,
        half_angle: f32,
        effective_range: f32,
    },
    ConeStop {
        owner: PlayerId,
    },
    DoorState(DoorStateDto),
    OwnershipChanged {
        pushable_id: PushableId,
        holder: PlayerId,
    },
    PushablePose {
        pushable_id: PushableId,
        position: PointDto,
    },
    PlayerPose {
        player_id: PlayerId,
        position: PointDto,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorStateDto {
    pub door_id: DoorId,
    pub is_open: bool,
}

fn despawn_reason(reason: DespawnReason) -> &'static str {
    match reason {
        DespawnReason::MaxRadius => "max_radius",
        DespawnReason::Occluded => "occluded",
        DespawnReason::Deflected => "deflected",
        DespawnReason::OwnerLeft => "owner_left",
    }
}

impl From<&Broadcast> for EventDto {
    fn from(event: &Broadcast) -> Self {
        match *event {
            Broadcast::ArcInit {
                arc_id,
                owner,
                origin,
                dir,
                spawn_tick,
            } => EventDto::ArcInit {
                arc_id,
                owner,
                origin: origin.into(),
                dir: dir.into(),
                spawn_tick,
            },
            Broadcast::ArcDespawn { arc_id, reason } => EventDto::ArcDespawn {
                arc_id,
                reason: despawn_reason(reason),
            },
            Broadcast::ConeState {
                owner,
                origin,
                aim,
                half_angle,
                effective_range,
            } => EventDto::ConeState {
                owner,
                origin: origin.into(),
                aim: aim.into(),
                half_angle,
                effective_range,
            },
            Broadcast::ConeStop { owner } => EventDto::ConeStop { owner },
            Broadcast::DoorState { door_id, is_open } => {
                EventDto::DoorState(DoorStateDto { door_id, is_open })
            }
            Broadcast::OwnershipChanged {
                pushable_id,
                holder,
            } => EventDto::OwnershipChanged {
                pushable_id,
                holder,
            },
            Broadcast::PushablePose {
                pushable_id,
                position,
            } => EventDto::PushablePose {
                pushable_id,
                position: position.into(),
            },
            Broadcast::PlayerPose {
                player_id,
                position,
            } => EventDto::PlayerPose {
                player_id,
                position: position.into(),
            },
            Broadcast::PlayerLeft { player_id } => EventDto::PlayerLeft { player_id },
            Broadcast::BatteryState {
                player_id,
                value,
                max,
                version,
            } => EventDto::BatteryState {
                player_id,
                value,
                max,
                version,
            },
            Broadcast::TargetState { target_id, hp } => EventDto::TargetState { target_id, hp },
            Broadcast::PickupTaken {
                pickup_id,
                player_id,
            } => EventDto::PickupTaken {
                pickup_id,
                player_id,
            },
        }
    }
}

/// Per-tick update sent to clients.
#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub events: Vec<EventDto>,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            events: update.events.iter().map(EventDto::from).collect(),
        }
    }
}

/// Retained state for late joiners.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayDto {
    pub tick: u64,
    pub tick_delta: f32,
    pub events: Vec<EventDto>,
}

impl From<&ReplaySnapshot> for ReplayDto {
    fn from(snapshot: &ReplaySnapshot) -> Self {
        Self {
            tick: snapshot.tick,
            tick_delta: snapshot.tick_delta,
            events: snapshot.events.iter().map(EventDto::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_messages_use_type_data_framing() {
        let start: ClientMessage = serde_json::from_value(json!({
            "type": "EmitStart",
            "data": { "aim": { "x": 0.0, "y": 1.0 }, "mode": "Cone" }
        }))
        .expect("emit start parses");
        assert!(matches!(
            start,
            ClientMessage::EmitStart(EmitStartDto {
                mode: EmitterModeDto::Cone,
                ..
            })
        ));

        let stop: ClientMessage =
            serde_json::from_value(json!({ "type": "EmitStop" })).expect("emit stop parses");
        assert!(matches!(stop, ClientMessage::EmitStop));

        let join: ClientMessage =
            serde_json::from_value(json!({ "type": "Join", "data": {} })).expect("join parses");
        assert!(matches!(join, ClientMessage::Join(p) if p.display_name.is_empty()));
    }

    #[test]
    fn door_state_serializes_as_nested_event() {
        let update = WorldUpdate {
            tick: 7,
            events: vec![Broadcast::DoorState {
                door_id: 3,
                is_open: true,
            }],
        };
        let msg = ServerMessage::WorldUpdate(update.into());
        let value = serde_json::to_value(&msg).expect("serializes");
        assert_eq!(
            value,
            json!({
                "type": "WorldUpdate",
                "data": {
                    "tick": 7,
                    "events": [
                        { "type": "DoorState", "data": { "door_id": 3, "is_open": true } }
                    ]
                }
            })
        );
    }
}
