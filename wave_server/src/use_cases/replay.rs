// Retained broadcast state for late joiners and lag recovery.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::domain::{ArcId, DoorId, PickupId, PlayerId, PushableId, TargetId};
use crate::use_cases::types::{Broadcast, ReplaySnapshot};

/// Latest value of every retained stream, keyed so replay order is stable.
#[derive(Debug, Default)]
pub struct ReplayLog {
    doors: BTreeMap<DoorId, bool>,
    arcs: BTreeMap<ArcId, Broadcast>,
    cones: BTreeMap<PlayerId, Broadcast>,
    holders: BTreeMap<PushableId, PlayerId>,
    pushables: BTreeMap<PushableId, Vec2>,
    players: BTreeMap<PlayerId, Vec2>,
    batteries: BTreeMap<PlayerId, Broadcast>,
    targets: BTreeMap<TargetId, f32>,
    pickups_taken: BTreeMap<PickupId, PlayerId>,
    dirty: bool,
}

impl ReplayLog {
    /// Every known door starts out closed.
    pub fn new(doors: impl IntoIterator<Item = DoorId>) -> Self {
        Self {
            doors: doors.into_iter().map(|id| (id, false)).collect(),
            dirty: true,
            ..Self::default()
        }
    }

    pub fn record(&mut self, broadcast: &Broadcast) {
        match broadcast {
            Broadcast::ArcInit { arc_id, .. } => {
                self.arcs.insert(*arc_id, broadcast.clone());
            }
            Broadcast::ArcDespawn { arc_id, .. } => {
                self.arcs.remove(arc_id);
            }
            Broadcast::ConeState { owner, .. } => {
                self.cones.insert(*owner, broadcast.clone());
            }
            Broadcast::ConeStop { owner } => {
                self.cones.remove(owner);
            }
            Broadcast::DoorState { door_id, is_open } => {
                self.doors.insert(*door_id, *is_open);
            }
            Broadcast::OwnershipChanged {
                pushable_id,
                holder,
            } => {
                self.holders.insert(*pushable_id, *holder);
            }
            Broadcast::PushablePose {
                pushable_id,
                position,
            } => {
                self.pushables.insert(*pushable_id, *position);
            }
            Broadcast::PlayerPose {
                player_id,
                position,
            } => {
                self.players.insert(*player_id, *position);
            }
            Broadcast::PlayerLeft { player_id } => {
                self.players.remove(player_id);
                self.batteries.remove(player_id);
                self.cones.remove(player_id);
            }
            Broadcast::BatteryState { player_id, .. } => {
                self.batteries.insert(*player_id, broadcast.clone());
            }
            Broadcast::TargetState { target_id, hp } => {
                self.targets.insert(*target_id, *hp);
            }
            Broadcast::PickupTaken {
                pickup_id,
                player_id,
            } => {
                self.pickups_taken.insert(*pickup_id, *player_id);
            }
        }
        self.dirty = true;
    }

    pub fn door_states(&self) -> impl Iterator<Item = (DoorId, bool)> + '_ {
        self.doors.iter().map(|(id, open)| (*id, *open))
    }

    /// True once after any change since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn snapshot(&self, tick: u64, tick_delta: f32) -> ReplaySnapshot {
        let mut events = Vec::new();
        events.extend(
            self.doors
                .iter()
                .map(|(door_id, is_open)| Broadcast::DoorState {
                    door_id: *door_id,
                    is_open: *is_open,
                }),
        );
        events.extend(
            self.players
                .iter()
                .map(|(player_id, position)| Broadcast::PlayerPose {
                    player_id: *player_id,
                    position: *position,
                }),
        );
        events.extend(self.batteries.values().cloned());
        events.extend(
            self.holders
                .iter()
                .map(|(pushable_id, holder)| Broadcast::OwnershipChanged {
                    pushable_id: *pushable_id,
                    holder: *holder,
                }),
        );
        events.extend(
            self.pushables
                .iter()
                .map(|(pushable_id, position)| Broadcast::PushablePose {
                    pushable_id: *pushable_id,
                    position: *position,
                }),
        );
        events.extend(
            self.targets
                .iter()
                .map(|(target_id, hp)| Broadcast::TargetState {
                    target_id: *target_id,
                    hp: *hp,
                }),
        );
        events.extend(
            self.pickups_taken
                .iter()
                .map(|(pickup_id, player_id)| Broadcast::PickupTaken {
                    pickup_id: *pickup_id,
                    player_id: *player_id,
                }),
        );
        events.extend(self.arcs.values().cloned());
        events.extend(self.cones.values().cloned());

        ReplaySnapshot {
            tick,
            tick_delta,
            events,
        }
    }
}
