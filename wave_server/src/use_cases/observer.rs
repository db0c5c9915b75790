// Observer-side replica: rebuilds presentation state from broadcasts alone.

use std::collections::{BTreeMap, HashMap};

use crate::domain::geometry::{ArcGeometry, Polygon};
use crate::systems::cone_wave::cone_fan;
use crate::systems::{ArcWave, ConeState};
use crate::domain::tuning::{ArcTuning, ConeTuning};
use crate::domain::{ArcId, DoorId, PlayerId, Replicated, SimClock, TickClock, WallSet};
use crate::use_cases::types::{Broadcast, ReplaySnapshot, WorldUpdate};

/// Presentation hooks invoked when replicated state changes on an observer.
pub trait DoorPresenter {
    fn apply_door_local(&mut self, door_id: DoorId, is_open: bool);

    fn battery_changed(&mut self, _player_id: PlayerId, _value: f32, _max: f32) {}
}

/// Never mutates authoritative state; arcs are replayed without occlusion.
pub struct ObserverReplica {
    clock: SimClock,
    arc_tuning: ArcTuning,
    cone_tuning: ConeTuning,
    no_walls: WallSet,
    arcs: BTreeMap<ArcId, ArcWave>,
    cones: BTreeMap<PlayerId, ConeState>,
    doors: BTreeMap<DoorId, bool>,
    batteries: HashMap<PlayerId, Replicated<f32>>,
}

impl ObserverReplica {
    pub fn new(tick_delta: f32, arc_tuning: ArcTuning, cone_tuning: ConeTuning) -> Self {
        Self {
            clock: SimClock::new(tick_delta),
            arc_tuning,
            cone_tuning,
            no_walls: WallSet::default(),
            arcs: BTreeMap::new(),
            cones: BTreeMap::new(),
            doors: BTreeMap::new(),
            batteries: HashMap::new(),
        }
    }

    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    pub fn apply_snapshot<P: DoorPresenter>(&mut self, snapshot: &ReplaySnapshot, presenter: &mut P) {
        self.clock = SimClock::at(snapshot.tick, snapshot.tick_delta);
        for event in &snapshot.events {
            self.apply(event, presenter);
        }
        self.rebuild();
    }

    pub fn apply_update<P: DoorPresenter>(&mut self, update: &WorldUpdate, presenter: &mut P) {
        self.clock.sync_to(update.tick);
        for event in &update.events {
            self.apply(event, presenter);
        }
        self.rebuild();
    }

    pub fn apply<P: DoorPresenter>(&mut self, event: &Broadcast, presenter: &mut P) {
        match event {
            Broadcast::ArcInit {
                arc_id,
                owner,
                origin,
                dir,
                spawn_tick,
            } => {
                let arc = ArcWave::new(*arc_id, *owner, *origin, *dir, *spawn_tick, self.arc_tuning);
                self.arcs.insert(*arc_id, arc);
            }
            Broadcast::ArcDespawn { arc_id, .. } => {
                self.arcs.remove(arc_id);
            }
            Broadcast::ConeState {
                owner,
                origin,
                aim,
                half_angle,
                effective_range,
            } => {
                // Most recent wins.
                self.cones.insert(
                    *owner,
                    ConeState {
                        origin: *origin,
                        aim: *aim,
                        half_angle: *half_angle,
                        effective_range: *effective_range,
                    },
                );
            }
            Broadcast::ConeStop { owner } => {
                self.cones.remove(owner);
            }
            Broadcast::DoorState { door_id, is_open } => {
                let previous = self.doors.insert(*door_id, *is_open);
                if previous != Some(*is_open) {
                    presenter.apply_door_local(*door_id, *is_open);
                }
            }
            Broadcast::BatteryState {
                player_id,
                value,
                max,
                version,
            } => {
                let battery = self
                    .batteries
                    .entry(*player_id)
                    .or_insert_with(|| Replicated::new(*max));
                if let Some(change) = battery.apply_remote(*value, *version) {
                    presenter.battery_changed(*player_id, change.value, *max);
                }
            }
            Broadcast::PlayerLeft { player_id } => {
                self.batteries.remove(player_id);
                self.cones.remove(player_id);
            }
            Broadcast::OwnershipChanged { .. }
            | Broadcast::PushablePose { .. }
            | Broadcast::PlayerPose { .. }
            | Broadcast::TargetState { .. }
            | Broadcast::PickupTaken { .. } => {}
        }
    }

    /// Recomputes arc bands for the current tick.
    fn rebuild(&mut self) {
        for arc in self.arcs.values_mut() {
            arc.step(&self.clock, &self.no_walls);
        }
        self.arcs.retain(|_, arc| arc.is_alive());
    }

    pub fn arc_geometry(&self, arc_id: ArcId) -> Option<&ArcGeometry> {
        self.arcs.get(&arc_id).and_then(|a| a.geometry())
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn cone_polygon(&self, owner: PlayerId) -> Option<Polygon> {
        self.cones
            .get(&owner)
            .map(|state| cone_fan(state, &self.cone_tuning))
    }

    pub fn door(&self, door_id: DoorId) -> Option<bool> {
        self.doors.get(&door_id).copied()
    }

    pub fn battery(&self, player_id: PlayerId) -> Option<f32> {
        self.batteries.get(&player_id).map(|b| *b.get())
    }
}
