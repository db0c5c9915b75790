// Per-owner emitter sessions and their cancellable emission tasks.

use std::collections::HashMap;

use glam::Vec2;
use tracing::{debug, warn};

use crate::domain::geometry::normalize_or_right;
use crate::domain::tuning::ShooterTuning;
use crate::domain::{PlayerId, PositionProvider, ResourcePool, SourceId};
use crate::use_cases::types::EmitterMode;

/// Lookup of the pool each owner pays emissions from.
pub trait ResourcePools {
    fn pool_mut(&mut self, owner: PlayerId) -> Option<&mut dyn ResourcePool>;
}

/// Handle to a session's periodic firing schedule.
///
/// Replacing a session always cancels the old handle first, so a stale generation can
/// never fire.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionTask {
    generation: u64,
    next_fire_at: f64,
    interval: f64,
    cancelled: bool,
}

impl EmissionTask {
    fn new(generation: u64, first_fire_at: f64, interval: f64) -> Self {
        Self {
            generation,
            next_fire_at: first_fire_at,
            interval,
            cancelled: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn next_fire_at(&self) -> f64 {
        self.next_fire_at
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    fn is_due(&self, now: f64) -> bool {
        !self.cancelled && now >= self.next_fire_at
    }

    fn schedule_next(&mut self, now: f64) {
        // Skip missed slots instead of bursting after a stall.
        self.next_fire_at = (self.next_fire_at + self.interval).max(now);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShooterSession {
    pub owner: PlayerId,
    pub source: SourceId,
    pub aim: Vec2,
    pub mode: EmitterMode,
    task: EmissionTask,
}

impl ShooterSession {
    pub fn task(&self) -> &EmissionTask {
        &self.task
    }
}

/// One paid firing, with source position and aim read at firing time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    pub owner: PlayerId,
    pub mode: EmitterMode,
    pub origin: Vec2,
    pub aim: Vec2,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Exhausted,
    MissingPool,
    MissingSource,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmissionOutcome {
    Fired(Emission),
    Stopped {
        owner: PlayerId,
        mode: EmitterMode,
        reason: StopReason,
    },
}

pub struct ShooterSessionRegistry {
    sessions: HashMap<PlayerId, ShooterSession>,
    next_generation: u64,
    tuning: ShooterTuning,
}

impl ShooterSessionRegistry {
    pub fn new(tuning: ShooterTuning) -> Self {
        Self {
            sessions: HashMap::new(),
            next_generation: 1,
            tuning,
        }
    }

    /// Opens or refreshes the owner's session. Any existing task is cancelled and replaced,
    /// so an owner never has two live tasks. A fresh session fires immediately; a refreshed
    /// one keeps the old schedule so restarting cannot outpace `fire_interval`.
    pub fn start_session(
        &mut self,
        owner: PlayerId,
        source: SourceId,
        aim: Vec2,
        mode: EmitterMode,
        now: f64,
    ) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        let interval = f64::from(self.tuning.fire_interval.max(0.001));
        let aim = normalize_or_right(aim);

        match self.sessions.get_mut(&owner) {
            Some(session) => {
                session.task.cancel();
                // Unlike a fresh session, a restart does not fire immediately: it inherits the
                // pending fire time so start/stop spam cannot outpace fire_interval.
                let first = session.task.next_fire_at.max(now);
                session.task = EmissionTask::new(generation, first, interval);
                session.source = source;
                session.aim = aim;
                session.mode = mode;
                debug!(owner, generation, ?mode, "emitter session restarted");
            }
            None => {
                self.sessions.insert(
                    owner,
                    ShooterSession {
                        owner,
                        source,
                        aim,
                        mode,
                        task: EmissionTask::new(generation, now, interval),
                    },
                );
                debug!(owner, generation, ?mode, "emitter session started");
            }
        }
        generation
    }

    /// No-op without a session.
    pub fn update_aim(&mut self, owner: PlayerId, aim: Vec2) -> bool {
        match self.sessions.get_mut(&owner) {
            Some(session) => {
                session.aim = normalize_or_right(aim);
                true
            }
            None => false,
        }
    }

    /// Cancels and removes the session. Safe to call repeatedly.
    pub fn stop_session(&mut self, owner: PlayerId) -> Option<ShooterSession> {
        let mut session = self.sessions.remove(&owner)?;
        session.task.cancel();
        debug!(owner, generation = session.task.generation, "emitter session stopped");
        Some(session)
    }

    pub fn session(&self, owner: PlayerId) -> Option<&ShooterSession> {
        self.sessions.get(&owner)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Tasks that may still fire.
    pub fn active_task_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| !s.task.is_cancelled())
            .count()
    }

    /// Runs every due task once. Sessions that cannot pay or have lost their source stop
    /// themselves and are reported as `Stopped`.
    pub fn poll_due<H>(&mut self, now: f64, host: &mut H) -> Vec<EmissionOutcome>
    where
        H: PositionProvider + ResourcePools,
    {
        let mut due: Vec<PlayerId> = self
            .sessions
            .values()
            .filter(|s| s.task.is_due(now))
            .map(|s| s.owner)
            .collect();
        // Stable order keeps arc ids deterministic.
        due.sort_unstable();

        let mut outcomes = Vec::with_capacity(due.len());
        for owner in due {
            let Some(session) = self.sessions.get_mut(&owner) else {
                continue;
            };
            let mode = session.mode;
            let cost = match mode {
                EmitterMode::Arc => self.tuning.arc_cost,
                EmitterMode::Cone => self.tuning.cone_cost,
            };

            let Some(origin) = host.position(session.source) else {
                warn!(owner, source = session.source, "emission source missing; stopping session");
                self.stop_with(owner, mode, StopReason::MissingSource, &mut outcomes);
                continue;
            };

            let paid = match host.pool_mut(owner) {
                Some(pool) => pool.try_consume(cost),
                None => {
                    warn!(owner, "resource pool missing; stopping session");
                    self.stop_with(owner, mode, StopReason::MissingPool, &mut outcomes);
                    continue;
                }
            };
            if !paid {
                debug!(owner, cost, "emitter exhausted");
                self.stop_with(owner, mode, StopReason::Exhausted, &mut outcomes);
                continue;
            }

            let Some(session) = self.sessions.get_mut(&owner) else {
                continue;
            };
            session.task.schedule_next(now);
            outcomes.push(EmissionOutcome::Fired(Emission {
                owner,
                mode,
                origin,
                aim: session.aim,
                generation: session.task.generation,
            }));
        }
        outcomes
    }

    fn stop_with(
        &mut self,
        owner: PlayerId,
        mode: EmitterMode,
        reason: StopReason,
        outcomes: &mut Vec<EmissionOutcome>,
    ) {
        self.stop_session(owner);
        outcomes.push(EmissionOutcome::Stopped {
            owner,
            mode,
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::Battery;
    use crate::domain::tuning::BatteryTuning;

    struct Host {
        position: Option<Vec2>,
        battery: Option<Battery>,
    }

    impl Host {
        fn with_battery(value: f32) -> Self {
            let mut battery = Battery::new(&BatteryTuning::default());
            battery.try_consume(battery.max() - value);
            Self {
                position: Some(Vec2::new(1.0, 2.0)),
                battery: Some(battery),
            }
        }
    }

    impl PositionProvider for Host {
        fn position(&self, _source: SourceId) -> Option<Vec2> {
            self.position
        }
    }

    impl ResourcePools for Host {
        fn pool_mut(&mut self, _owner: PlayerId) -> Option<&mut dyn ResourcePool> {
            self.battery.as_mut().map(|b| b as &mut dyn ResourcePool)
        }
    }

    fn fired(outcomes: &[EmissionOutcome]) -> usize {
        outcomes
            .iter()
            .filter(|o| matches!(o, EmissionOutcome::Fired(_)))
            .count()
    }

    #[test]
    fn when_started_twice_then_one_session_and_one_task() {
        let mut registry = ShooterSessionRegistry::new(ShooterTuning::default());
        let first = registry.start_session(7, 7, Vec2::X, EmitterMode::Arc, 0.0);
        let second = registry.start_session(7, 7, Vec2::X, EmitterMode::Arc, 0.0);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.active_task_count(), 1);
        assert_ne!(first, second);
        assert_eq!(
            registry.session(7).map(|s| s.task().generation()),
            Some(second)
        );

        let mut host = Host::with_battery(100.0);
        assert_eq!(fired(&registry.poll_due(0.0, &mut host)), 1);
    }

    #[test]
    fn when_restarted_then_schedule_is_not_reset() {
        let mut registry = ShooterSessionRegistry::new(ShooterTuning::default());
        let mut host = Host::with_battery(100.0);
        registry.start_session(7, 7, Vec2::X, EmitterMode::Arc, 0.0);
        assert_eq!(fired(&registry.poll_due(0.0, &mut host)), 1);

        registry.start_session(7, 7, Vec2::Y, EmitterMode::Arc, 0.02);
        assert_eq!(fired(&registry.poll_due(0.02, &mut host)), 0);
        assert_eq!(fired(&registry.poll_due(0.09, &mut host)), 1);
    }

    #[test]
    fn fires_at_most_once_per_interval_with_current_aim_and_position() {
        let mut registry = ShooterSessionRegistry::new(ShooterTuning::default());
        let mut host = Host::with_battery(100.0);
        registry.start_session(1, 1, Vec2::X, EmitterMode::Arc, 0.0);
        assert_eq!(fired(&registry.poll_due(0.0, &mut host)), 1);
        assert_eq!(fired(&registry.poll_due(0.05, &mut host)), 0);

        registry.update_aim(1, Vec2::new(0.0, 3.0));
        host.position = Some(Vec2::new(5.0, 5.0));
        let outcomes = registry.poll_due(0.1, &mut host);
        match outcomes.as_slice() {
            [EmissionOutcome::Fired(e)] => {
                assert_eq!(e.aim, Vec2::Y);
                assert_eq!(e.origin, Vec2::new(5.0, 5.0));
            }
            other => panic!("unexpected outcomes: {other:?}"),
        }
        // Two shots at 2 each.
        assert_eq!(host.battery.as_ref().map(|b| b.value()), Some(96.0));
    }

    #[test]
    fn when_pool_runs_dry_then_session_stops_cleanly() {
        let mut registry = ShooterSessionRegistry::new(ShooterTuning::default());
        let mut host = Host::with_battery(3.0);
        registry.start_session(1, 1, Vec2::X, EmitterMode::Arc, 0.0);

        assert_eq!(fired(&registry.poll_due(0.0, &mut host)), 1);
        let outcomes = registry.poll_due(0.1, &mut host);
        assert_eq!(
            outcomes,
            vec![EmissionOutcome::Stopped {
                owner: 1,
                mode: EmitterMode::Arc,
                reason: StopReason::Exhausted
            }]
        );
        assert!(registry.session(1).is_none());
    }

    #[test]
    fn missing_pool_or_source_stops_session() {
        let mut registry = ShooterSessionRegistry::new(ShooterTuning::default());
        let mut host = Host {
            position: Some(Vec2::ZERO),
            battery: None,
        };
        registry.start_session(1, 1, Vec2::X, EmitterMode::Cone, 0.0);
        let outcomes = registry.poll_due(0.0, &mut host);
        assert!(matches!(
            outcomes.as_slice(),
            [EmissionOutcome::Stopped {
                reason: StopReason::MissingPool,
                ..
            }]
        ));

        let mut host = Host {
            position: None,
            ..Host::with_battery(100.0)
        };
        registry.start_session(1, 1, Vec2::X, EmitterMode::Arc, 0.0);
        let outcomes = registry.poll_due(0.0, &mut host);
        assert!(matches!(
            outcomes.as_slice(),
            [EmissionOutcome::Stopped {
                reason: StopReason::MissingSource,
                ..
            }]
        ));
    }

    #[test]
    fn stop_and_update_without_session_are_noops() {
        let mut registry = ShooterSessionRegistry::new(ShooterTuning::default());
        assert!(!registry.update_aim(3, Vec2::Y));
        assert!(registry.stop_session(3).is_none());
        registry.start_session(3, 3, Vec2::X, EmitterMode::Arc, 0.0);
        assert!(registry.stop_session(3).is_some());
        assert!(registry.stop_session(3).is_none());
        assert!(registry.is_empty());
    }
}
