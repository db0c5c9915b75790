// Authoritative world state and the per-tick passes that mutate it.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use glam::Vec2;
use tracing::{debug, info, warn};

use crate::domain::level::{Level, TargetSpawn};
use crate::domain::overlap::{
    ColliderCategory, ColliderKey, OverlapEvent, OverlapPhase, OverlapSubject, OverlapTracker,
};
use crate::systems::{
    ArcStep, ArcWave, Battery, ConeWave, DeflectionResolver, DespawnReason, DoorTransition,
    PuzzleDependencyEngine, PushableOwnership,
};
use crate::domain::tuning::WorldTuning;
use crate::domain::{
    ArcId, PickupId, PlayerId, Polygon, PositionProvider, PushableId, ResourcePool, SERVER_HOLDER,
    SimClock, SourceId, TargetId, TickClock,
};
use crate::use_cases::replay::ReplayLog;
use crate::use_cases::shooter::{
    EmissionOutcome, ResourcePools, ShooterSessionRegistry, StopReason,
};
use crate::use_cases::types::{Broadcast, EmitterMode, GameEvent, ReplaySnapshot, WorldUpdate};

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub position: Vec2,
    pub battery: Battery,
}

/// Connected players; doubles as the emission host (positions and battery pools).
#[derive(Debug, Default)]
pub struct Players {
    by_id: HashMap<PlayerId, PlayerState>,
}

impl Players {
    pub fn get(&self, id: PlayerId) -> Option<&PlayerState> {
        self.by_id.get(&id)
    }

    fn sorted_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl PositionProvider for Players {
    fn position(&self, source: SourceId) -> Option<Vec2> {
        self.by_id.get(&source).map(|p| p.position)
    }
}

impl ResourcePools for Players {
    fn pool_mut(&mut self, owner: PlayerId) -> Option<&mut dyn ResourcePool> {
        self.by_id
            .get_mut(&owner)
            .map(|p| &mut p.battery as &mut dyn ResourcePool)
    }
}

#[derive(Debug, Clone)]
struct PushableBody {
    ownership: PushableOwnership,
    position: Vec2,
}

#[derive(Debug, Clone)]
struct TargetBody {
    spawn: TargetSpawn,
    hp: f32,
}

impl TargetBody {
    fn is_alive(&self) -> bool {
        self.hp > 0.0
    }
}

/// Damage, pulse and deflection requests gathered while wave overlaps are borrowed.
enum WaveAction {
    Deflect { arc_id: ArcId, reflector: usize },
    Pulse { button: usize },
    Damage { target_id: TargetId, amount: f32 },
}

pub struct World {
    clock: SimClock,
    tuning: WorldTuning,
    level: Level,
    players: Players,
    joined_count: usize,
    shooters: ShooterSessionRegistry,
    arcs: BTreeMap<ArcId, ArcWave>,
    next_arc_id: ArcId,
    cones: BTreeMap<PlayerId, ConeWave>,
    deflection: DeflectionResolver,
    puzzle: PuzzleDependencyEngine,
    pushables: BTreeMap<PushableId, PushableBody>,
    targets: BTreeMap<TargetId, TargetBody>,
    pickups_taken: HashSet<PickupId>,
    overlaps: OverlapTracker,
    replay: ReplayLog,
    pending: Vec<Broadcast>,
}

impl World {
    pub fn new(level: Level, tuning: WorldTuning, tick_delta: f32) -> Self {
        let puzzle = PuzzleDependencyEngine::new(level.doors.clone(), &tuning.puzzle);
        let mut replay = ReplayLog::new(level.doors.iter().map(|d| d.door_id));
        // Doors with no requirements start open.
        for door in puzzle.doors().iter().filter(|d| d.is_open) {
            replay.record(&Broadcast::DoorState {
                door_id: door.config.door_id,
                is_open: true,
            });
        }

        let pushables = level
            .pushables
            .iter()
            .map(|p| {
                (
                    p.id,
                    PushableBody {
                        ownership: PushableOwnership::new(
                            SERVER_HOLDER,
                            tuning.ownership.min_switch_interval,
                        ),
                        position: p.position,
                    },
                )
            })
            .collect();
        let targets = level
            .targets
            .iter()
            .map(|t| {
                (
                    t.id,
                    TargetBody {
                        spawn: t.clone(),
                        hp: t.hp,
                    },
                )
            })
            .collect();

        Self {
            clock: SimClock::new(tick_delta),
            deflection: DeflectionResolver::new(&tuning.deflector),
            shooters: ShooterSessionRegistry::new(tuning.shooter),
            tuning,
            level,
            players: Players::default(),
            joined_count: 0,
            arcs: BTreeMap::new(),
            next_arc_id: 1,
            cones: BTreeMap::new(),
            puzzle,
            pushables,
            targets,
            pickups_taken: HashSet::new(),
            overlaps: OverlapTracker::new(),
            replay,
            pending: Vec::new(),
        }
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    pub fn now(&self) -> f64 {
        self.clock.now_seconds()
    }

    pub fn players(&self) -> &Players {
        &self.players
    }

    pub fn arcs(&self) -> impl Iterator<Item = &ArcWave> {
        self.arcs.values()
    }

    pub fn cone(&self, owner: PlayerId) -> Option<&ConeWave> {
        self.cones.get(&owner)
    }

    pub fn shooters(&self) -> &ShooterSessionRegistry {
        &self.shooters
    }

    pub fn puzzle(&self) -> &PuzzleDependencyEngine {
        &self.puzzle
    }

    pub fn holder_of(&self, pushable: PushableId) -> Option<PlayerId> {
        self.pushables
            .get(&pushable)
            .map(|p| p.ownership.holder())
    }

    pub fn pushable_position(&self, pushable: PushableId) -> Option<Vec2> {
        self.pushables.get(&pushable).map(|p| p.position)
    }

    pub fn target_hp(&self, target: TargetId) -> Option<f32> {
        self.targets.get(&target).map(|t| t.hp)
    }

    pub fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Join { player_id } => self.join(player_id),
            GameEvent::Leave { player_id } => self.leave(player_id),
            GameEvent::Pose {
                player_id,
                position,
            } => {
                if !position.is_finite() {
                    debug!(player_id, "non-finite pose ignored");
                    return;
                }
                let Some(player) = self.players.by_id.get_mut(&player_id) else {
                    return;
                };
                player.position = position;
                self.emit(Broadcast::PlayerPose {
                    player_id,
                    position,
                });
            }
            GameEvent::PushablePose {
                player_id,
                pushable_id,
                position,
            } => self.move_pushable(player_id, pushable_id, position),
            GameEvent::EmitStart {
                player_id,
                aim,
                mode,
            } => self.start_emitting(player_id, aim, mode),
            GameEvent::EmitUpdateAim { player_id, aim } => {
                self.shooters.update_aim(player_id, aim);
                if let Some(cone) = self.cones.get_mut(&player_id) {
                    cone.set_aim(aim);
                }
            }
            GameEvent::EmitStop { player_id } => {
                self.shooters.stop_session(player_id);
                self.stop_cone(player_id);
            }
        }
    }

    /// Fixed-step pass: tick clock, wave fronts, overlaps, ownership and puzzle expiry.
    pub fn fixed_step(&mut self) {
        self.clock.advance();
        let now = self.now();

        self.step_arcs();
        self.step_cones(now);
        self.resolve_wave_overlaps(now);
        self.resolve_body_overlaps(now);

        let expired = self.puzzle.sweep(now);
        self.emit_doors(expired);
        self.deflection.prune(now);
    }

    /// Variable-step pass: emitter sessions, battery recharge and battery broadcasts.
    pub fn frame_step(&mut self, dt: f32) {
        let now = self.now();

        for outcome in self.shooters.poll_due(now, &mut self.players) {
            match outcome {
                EmissionOutcome::Fired(emission) => match emission.mode {
                    EmitterMode::Arc => {
                        self.spawn_arc(emission.owner, emission.origin, emission.aim);
                    }
                    EmitterMode::Cone => {
                        let cone_tuning = self.tuning.cone;
                        let cone = self
                            .cones
                            .entry(emission.owner)
                            .or_insert_with(|| {
                                ConeWave::new(emission.owner, emission.origin, cone_tuning)
                            });
                        cone.set_aim(emission.aim);
                        if !cone.is_active() {
                            cone.set_active(true);
                            cone.set_desired_range(cone_tuning.max_range);
                        }
                    }
                },
                EmissionOutcome::Stopped { owner, mode, reason } => {
                    if reason != StopReason::Exhausted {
                        warn!(owner, ?reason, "emitter session aborted");
                    }
                    if mode == EmitterMode::Cone {
                        self.stop_cone(owner);
                    }
                }
            }
        }

        let recharge_keys: Vec<ColliderKey> = (0..self.level.recharge_zones.len())
            .map(|i| ColliderKey::new(ColliderCategory::RechargeZone, i as u64))
            .collect();
        for id in self.players.sorted_ids() {
            let in_zone = recharge_keys
                .iter()
                .any(|key| self.overlaps.is_touching(OverlapSubject::Player(id), *key));
            let Some(player) = self.players.by_id.get_mut(&id) else {
                continue;
            };
            if in_zone {
                player.battery.recharge_tick(dt);
            }
            if let Some((value, version)) = player.battery.take_broadcast(now) {
                let max = player.battery.max();
                self.emit(Broadcast::BatteryState {
                    player_id: id,
                    value,
                    max,
                    version,
                });
            }
        }
    }

    /// Everything broadcast since the previous call.
    pub fn drain_update(&mut self) -> WorldUpdate {
        WorldUpdate {
            tick: self.clock.tick(),
            events: std::mem::take(&mut self.pending),
        }
    }

    /// Snapshot of retained state, only when something changed since the last call.
    pub fn take_replay_if_changed(&mut self) -> Option<ReplaySnapshot> {
        self.replay
            .take_dirty()
            .then(|| self.replay_snapshot())
    }

    pub fn replay_snapshot(&self) -> ReplaySnapshot {
        self.replay
            .snapshot(self.clock.tick(), self.clock.tick_delta())
    }

    fn emit(&mut self, broadcast: Broadcast) {
        self.replay.record(&broadcast);
        self.pending.push(broadcast);
    }

    fn emit_doors(&mut self, transitions: Vec<DoorTransition>) {
        for t in transitions {
            info!(door_id = t.door_id, is_open = t.is_open, "door state changed");
            self.emit(Broadcast::DoorState {
                door_id: t.door_id,
                is_open: t.is_open,
            });
        }
    }

    fn join(&mut self, player_id: PlayerId) {
        if self.players.by_id.contains_key(&player_id) {
            warn!(player_id, "duplicate join ignored");
            return;
        }
        let position = self.level.spawn_point(self.joined_count);
        self.joined_count += 1;

        let battery = Battery::new(&self.tuning.battery);
        let (value, max, version) = (battery.value(), battery.max(), battery.version());
        self.players
            .by_id
            .insert(player_id, PlayerState { position, battery });
        info!(player_id, x = position.x, y = position.y, "player joined");

        self.emit(Broadcast::PlayerPose {
            player_id,
            position,
        });
        self.emit(Broadcast::BatteryState {
            player_id,
            value,
            max,
            version,
        });
    }

    fn leave(&mut self, player_id: PlayerId) {
        if self.players.by_id.remove(&player_id).is_none() {
            return;
        }
        info!(player_id, "player left");
        let now = self.now();

        self.shooters.stop_session(player_id);
        self.stop_cone(player_id);
        self.cones.remove(&player_id);
        self.overlaps.forget(OverlapSubject::Cone(player_id));

        let owned: Vec<ArcId> = self
            .arcs
            .values()
            .filter(|a| a.owner() == player_id)
            .map(|a| a.id())
            .collect();
        for arc_id in owned {
            self.despawn_arc(arc_id, DespawnReason::OwnerLeft);
        }

        // Plates the player stood on are released.
        let ended = self.overlaps.forget(OverlapSubject::Player(player_id));
        self.apply_body_events(&ended, now);

        let mut reclaimed = Vec::new();
        for (id, body) in &mut self.pushables {
            if body.ownership.holder() == player_id
                && body.ownership.reclaim(SERVER_HOLDER, now).is_some()
            {
                reclaimed.push(*id);
            }
        }
        for pushable_id in reclaimed {
            self.emit(Broadcast::OwnershipChanged {
                pushable_id,
                holder: SERVER_HOLDER,
            });
        }

        self.emit(Broadcast::PlayerLeft { player_id });
    }

    fn move_pushable(&mut self, player_id: PlayerId, pushable_id: PushableId, position: Vec2) {
        let Some(body) = self.pushables.get_mut(&pushable_id) else {
            warn!(player_id, pushable_id, "pose for unknown pushable");
            return;
        };
        if body.ownership.holder() != player_id {
            debug!(
                player_id,
                pushable_id,
                holder = body.ownership.holder(),
                "pushable pose from non-holder ignored"
            );
            return;
        }
        if !position.is_finite() {
            return;
        }
        body.position = position;
        self.emit(Broadcast::PushablePose {
            pushable_id,
            position,
        });
    }

    fn start_emitting(&mut self, player_id: PlayerId, aim: Vec2, mode: EmitterMode) {
        if !self.players.by_id.contains_key(&player_id) {
            warn!(player_id, "emit start from unknown player");
            return;
        }
        if mode == EmitterMode::Arc {
            self.stop_cone(player_id);
        }
        let now = self.now();
        self.shooters
            .start_session(player_id, player_id, aim, mode, now);
        if let Some(cone) = self.cones.get_mut(&player_id) {
            cone.set_aim(aim);
        }
    }

    fn stop_cone(&mut self, owner: PlayerId) {
        let Some(cone) = self.cones.get_mut(&owner) else {
            return;
        };
        if !cone.is_active() {
            return;
        }
        cone.set_active(false);
        let ended = self.overlaps.forget(OverlapSubject::Cone(owner));
        debug!(owner, contacts = ended.len(), "cone stopped");
        self.emit(Broadcast::ConeStop { owner });
    }

    fn spawn_arc(&mut self, owner: PlayerId, origin: Vec2, dir: Vec2) -> ArcId {
        let arc_id = self.next_arc_id;
        self.next_arc_id += 1;
        let spawn_tick = self.clock.tick();
        let arc = ArcWave::new(arc_id, owner, origin, dir, spawn_tick, self.tuning.arc);
        let dir = arc.dir();
        self.arcs.insert(arc_id, arc);
        self.emit(Broadcast::ArcInit {
            arc_id,
            owner,
            origin,
            dir,
            spawn_tick,
        });
        arc_id
    }

    fn despawn_arc(&mut self, arc_id: ArcId, reason: DespawnReason) {
        let Some(mut arc) = self.arcs.remove(&arc_id) else {
            return;
        };
        arc.despawn(reason);
        self.overlaps.forget(OverlapSubject::Arc(arc_id));
        self.emit(Broadcast::ArcDespawn { arc_id, reason });
    }

    fn step_arcs(&mut self) {
        let mut gone = Vec::new();
        for arc in self.arcs.values_mut() {
            if let ArcStep::Despawned(reason) = arc.step(&self.clock, &self.level.walls) {
                gone.push((arc.id(), reason));
            }
        }
        for (arc_id, reason) in gone {
            self.despawn_arc(arc_id, reason);
        }
    }

    fn step_cones(&mut self, now: f64) {
        let dt = self.clock.tick_delta();
        let mut states = Vec::new();
        for (owner, cone) in &mut self.cones {
            let Some(source) = self.players.position(*owner) else {
                continue;
            };
            if let Some(state) = cone.step(source, dt, now, &self.level.walls) {
                states.push(Broadcast::ConeState {
                    owner: *owner,
                    origin: state.origin,
                    aim: state.aim,
                    half_angle: state.half_angle,
                    effective_range: state.effective_range,
                });
            }
        }
        for state in states {
            self.emit(state);
        }
    }

    fn wave_contacts(&self, shape: &Polygon, deflects: bool) -> BTreeSet<ColliderKey> {
        let mut touching = BTreeSet::new();
        if deflects {
            for (i, reflector) in self.level.reflectors.iter().enumerate() {
                if shape.intersects_aabb(&reflector.bounds) {
                    touching.insert(ColliderKey::new(ColliderCategory::Reflector, i as u64));
                }
            }
        }
        for (i, button) in self.level.buttons.iter().enumerate() {
            if shape.intersects_aabb(&button.bounds) {
                touching.insert(ColliderKey::new(ColliderCategory::Button, i as u64));
            }
        }
        for (id, target) in &self.targets {
            if target.is_alive()
                && shape.intersects_circle(target.spawn.position, target.spawn.radius)
            {
                touching.insert(ColliderKey::new(ColliderCategory::Damageable, *id));
            }
        }
        touching
    }

    fn resolve_wave_overlaps(&mut self, now: f64) {
        let mut actions = Vec::new();

        let arc_ids: Vec<ArcId> = self.arcs.keys().copied().collect();
        for arc_id in arc_ids {
            let touching = match self.arcs.get(&arc_id).and_then(|a| a.geometry()) {
                Some(geometry) => self.wave_contacts(&geometry.polygon, true),
                None => continue,
            };
            let events = self.overlaps.update(OverlapSubject::Arc(arc_id), touching);
            for event in events {
                self.arc_contact(arc_id, event, now, &mut actions);
            }
        }

        let owners: Vec<PlayerId> = self.cones.keys().copied().collect();
        let dt = self.clock.tick_delta();
        for owner in owners {
            let touching = match self.cones.get(&owner) {
                Some(cone) if cone.is_active() => self.wave_contacts(cone.polygon(), false),
                _ => continue,
            };
            let dps = self.tuning.cone.damage_per_second;
            for event in self.overlaps.update(OverlapSubject::Cone(owner), touching) {
                match (event.collider.category, event.phase) {
                    (ColliderCategory::Damageable, OverlapPhase::Begin | OverlapPhase::Stay) => {
                        actions.push(WaveAction::Damage {
                            target_id: event.collider.index as TargetId,
                            amount: dps * dt,
                        });
                    }
                    _ => {}
                }
            }
        }

        for action in actions {
            match action {
                WaveAction::Deflect { arc_id, reflector } => self.deflect(arc_id, reflector, now),
                WaveAction::Pulse { button } => {
                    let Some(button) = self.level.buttons.get(button) else {
                        continue;
                    };
                    let seconds = button
                        .press_seconds
                        .unwrap_or(self.tuning.puzzle.button_press_seconds);
                    let transitions = self.puzzle.pulse(button.plate_id, seconds, now);
                    self.emit_doors(transitions);
                }
                WaveAction::Damage { target_id, amount } => self.damage_target(target_id, amount),
            }
        }
    }

    fn arc_contact(
        &mut self,
        arc_id: ArcId,
        event: OverlapEvent,
        now: f64,
        actions: &mut Vec<WaveAction>,
    ) {
        let index = event.collider.index;
        match (event.collider.category, event.phase) {
            (ColliderCategory::Reflector, OverlapPhase::Begin | OverlapPhase::Stay) => {
                actions.push(WaveAction::Deflect {
                    arc_id,
                    reflector: index as usize,
                });
            }
            // Re-pulsing on Stay keeps the plate live for as long as the band covers it.
            (ColliderCategory::Button, OverlapPhase::Begin | OverlapPhase::Stay) => {
                actions.push(WaveAction::Pulse {
                    button: index as usize,
                });
            }
            (ColliderCategory::Damageable, OverlapPhase::Begin | OverlapPhase::Stay) => {
                let Some(amount) = self
                    .arcs
                    .get_mut(&arc_id)
                    .and_then(|arc| arc.take_damage_tick(now))
                else {
                    return;
                };
                actions.push(WaveAction::Damage {
                    target_id: index as TargetId,
                    amount,
                });
            }
            _ => {}
        }
    }

    fn deflect(&mut self, arc_id: ArcId, reflector_index: usize, now: f64) {
        let Some(reflector) = self.level.reflectors.get(reflector_index) else {
            return;
        };
        let Some(arc) = self.arcs.get_mut(&arc_id) else {
            return;
        };
        if !arc.is_alive() {
            return;
        }
        let Some(reflected) = self
            .deflection
            .try_deflect(arc_id, reflector, arc.dir(), now)
        else {
            return;
        };
        if !arc.begin_deflection() {
            return;
        }

        let contact = reflector.contact_point(arc.origin());
        let origin = contact + reflected * arc.deflect_offset();
        let owner = arc.owner();
        debug!(arc_id, reflector = reflector.id, "arc deflected");

        self.despawn_arc(arc_id, DespawnReason::Deflected);
        self.spawn_arc(owner, origin, reflected);
    }

    fn damage_target(&mut self, target_id: TargetId, amount: f32) {
        let Some(target) = self.targets.get_mut(&target_id) else {
            return;
        };
        if !target.is_alive() || amount <= 0.0 {
            return;
        }
        target.hp = (target.hp - amount).max(0.0);
        let hp = target.hp;
        if hp == 0.0 {
            // Dead targets drop out of the next contact sets.
            info!(target_id, "target destroyed");
        }
        self.emit(Broadcast::TargetState { target_id, hp });
    }

    fn body_contacts(&self, position: Vec2, radius: f32, is_player: bool) -> BTreeSet<ColliderKey> {
        let mut touching = BTreeSet::new();
        for plate in &self.level.plates {
            if plate.bounds.intersects_circle(position, radius) {
                touching.insert(ColliderKey::new(ColliderCategory::Plate, plate.plate_id));
            }
        }
        if !is_player {
            return touching;
        }

        for (i, zone) in self.level.recharge_zones.iter().enumerate() {
            if zone.intersects_circle(position, radius) {
                touching.insert(ColliderKey::new(ColliderCategory::RechargeZone, i as u64));
            }
        }
        for pickup in &self.level.pickups {
            if !self.pickups_taken.contains(&pickup.id)
                && pickup.bounds.intersects_circle(position, radius)
            {
                touching.insert(ColliderKey::new(ColliderCategory::Pickup, pickup.id));
            }
        }
        let reach = radius + self.tuning.ownership.pushable_radius;
        for (id, body) in &self.pushables {
            if body.position.distance_squared(position) <= reach * reach {
                touching.insert(ColliderKey::new(ColliderCategory::AuthorityObject, *id));
            }
        }
        touching
    }

    fn resolve_body_overlaps(&mut self, now: f64) {
        let player_radius = self.tuning.ownership.player_radius;
        for id in self.players.sorted_ids() {
            let Some(position) = self.players.position(id) else {
                continue;
            };
            let touching = self.body_contacts(position, player_radius, true);
            let events = self.overlaps.update(OverlapSubject::Player(id), touching);
            self.apply_body_events(&events, now);
        }

        let pushable_radius = self.tuning.ownership.pushable_radius;
        let bodies: Vec<(PushableId, Vec2)> = self
            .pushables
            .iter()
            .map(|(id, body)| (*id, body.position))
            .collect();
        for (id, position) in bodies {
            let touching = self.body_contacts(position, pushable_radius, false);
            let events = self.overlaps.update(OverlapSubject::Pushable(id), touching);
            self.apply_body_events(&events, now);
        }
    }

    fn apply_body_events(&mut self, events: &[OverlapEvent], now: f64) {
        for event in events {
            let index = event.collider.index;
            match (event.collider.category, event.phase) {
                (ColliderCategory::Plate, OverlapPhase::Begin) => {
                    let transitions = self.puzzle.set_presence(index as u32, true, now);
                    self.emit_doors(transitions);
                }
                (ColliderCategory::Plate, OverlapPhase::End) => {
                    let transitions = self.puzzle.set_presence(index as u32, false, now);
                    self.emit_doors(transitions);
                }
                (ColliderCategory::Pickup, OverlapPhase::Begin) => {
                    if let OverlapSubject::Player(player_id) = event.subject {
                        self.take_pickup(player_id, index as PickupId);
                    }
                }
                (ColliderCategory::AuthorityObject, OverlapPhase::Begin | OverlapPhase::Stay) => {
                    if let OverlapSubject::Player(player_id) = event.subject {
                        self.contact_pushable(player_id, index as PushableId, now);
                    }
                }
                _ => {}
            }
        }
    }

    fn take_pickup(&mut self, player_id: PlayerId, pickup_id: PickupId) {
        if !self.pickups_taken.insert(pickup_id) {
            return;
        }
        let restore = self
            .level
            .pickups
            .iter()
            .find(|p| p.id == pickup_id)
            .and_then(|p| p.restore)
            .unwrap_or(self.tuning.battery.pickup_restore);
        if let Some(player) = self.players.by_id.get_mut(&player_id) {
            player.battery.add(restore);
        }
        debug!(player_id, pickup_id, restore, "pickup taken");
        self.emit(Broadcast::PickupTaken {
            pickup_id,
            player_id,
        });
    }

    fn contact_pushable(&mut self, player_id: PlayerId, pushable_id: PushableId, now: f64) {
        let Some(body) = self.pushables.get_mut(&pushable_id) else {
            return;
        };
        let Some(handoff) = body.ownership.on_contact(player_id, now) else {
            return;
        };
        info!(
            pushable_id,
            from = handoff.from,
            to = handoff.to,
            "pushable ownership changed"
        );
        self.emit(Broadcast::OwnershipChanged {
            pushable_id,
            holder: handoff.to,
        });
    }
}
