// Plate inputs and the door groups that depend on them.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::state::{DoorId, PlateId};
use crate::domain::tuning::PuzzleTuning;

/// Sustained presence plus an optional timed pulse.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlateInput {
    pub presence: u32,
    pub pulse_until: Option<f64>,
}

impl PlateInput {
    pub fn is_active(&self, now: f64) -> bool {
        self.presence > 0 || self.pulse_until.is_some_and(|until| now < until)
    }
}

/// Static door definition loaded from level data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorConfig {
    pub door_id: DoorId,
    pub required: Vec<PlateId>,
    pub stay_open_once_opened: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorGroup {
    pub config: DoorConfig,
    pub is_open: bool,
    /// Sticky: set the first time the requirements are met, never cleared.
    pub ever_opened: bool,
}

/// Emitted only when a door's open state flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorTransition {
    pub door_id: DoorId,
    pub is_open: bool,
}

pub struct PuzzleDependencyEngine {
    plates: HashMap<PlateId, PlateInput>,
    doors: Vec<DoorGroup>,
    min_pulse: f64,
    idle_sweep: f64,
    next_sweep_at: f64,
}

impl PuzzleDependencyEngine {
    pub fn new(doors: Vec<DoorConfig>, tuning: &PuzzleTuning) -> Self {
        let doors = doors
            .into_iter()
            .map(|config| DoorGroup {
                config,
                is_open: false,
                ever_opened: false,
            })
            .collect();

        let mut engine = Self {
            plates: HashMap::new(),
            doors,
            min_pulse: f64::from(tuning.min_pulse_seconds),
            idle_sweep: tuning.idle_sweep_seconds,
            next_sweep_at: tuning.idle_sweep_seconds,
        };
        // Doors with no requirements open immediately. Nobody has joined yet, so the
        // transitions only matter through the retained door state.
        let _ = engine.recompute(0.0);
        engine
    }

    /// Adjusts the presence counter. Unmatched releases clamp at zero.
    pub fn set_presence(&mut self, plate: PlateId, pressed: bool, now: f64) -> Vec<DoorTransition> {
        let input = self.plates.entry(plate).or_default();
        if pressed {
            input.presence = input.presence.saturating_add(1);
        } else {
            input.presence = input.presence.saturating_sub(1);
        }
        debug!(plate, pressed, presence = input.presence, "plate presence changed");
        self.recompute(now)
    }

    /// Extends the plate's active window; a pulse never shortens it.
    pub fn pulse(&mut self, plate: PlateId, duration: f32, now: f64) -> Vec<DoorTransition> {
        let until = now + f64::from(duration).max(self.min_pulse);
        let input = self.plates.entry(plate).or_default();
        let expiry = input.pulse_until.map_or(until, |current| current.max(until));
        input.pulse_until = Some(expiry);
        self.next_sweep_at = self.next_sweep_at.min(expiry);
        self.recompute(now)
    }

    /// Clears expired pulses. Does nothing before the scheduled sweep time.
    pub fn sweep(&mut self, now: f64) -> Vec<DoorTransition> {
        if now < self.next_sweep_at {
            return Vec::new();
        }

        let mut expired = false;
        let mut soonest: Option<f64> = None;
        for input in self.plates.values_mut() {
            match input.pulse_until {
                Some(until) if until <= now => {
                    input.pulse_until = None;
                    expired = true;
                }
                Some(until) => {
                    soonest = Some(soonest.map_or(until, |s: f64| s.min(until)));
                }
                None => {}
            }
        }

        self.next_sweep_at = soonest.unwrap_or(now + self.idle_sweep);
        if expired {
            self.recompute(now)
        } else {
            Vec::new()
        }
    }

    pub fn next_sweep_at(&self) -> f64 {
        self.next_sweep_at
    }

    pub fn is_plate_active(&self, plate: PlateId, now: f64) -> bool {
        self.plates
            .get(&plate)
            .is_some_and(|input| input.is_active(now))
    }

    pub fn presence(&self, plate: PlateId) -> u32 {
        self.plates.get(&plate).map_or(0, |input| input.presence)
    }

    pub fn pulse_until(&self, plate: PlateId) -> Option<f64> {
        self.plates.get(&plate).and_then(|input| input.pulse_until)
    }

    pub fn door(&self, door_id: DoorId) -> Option<&DoorGroup> {
        self.doors.iter().find(|d| d.config.door_id == door_id)
    }

    pub fn doors(&self) -> &[DoorGroup] {
        &self.doors
    }

    fn recompute(&mut self, now: f64) -> Vec<DoorTransition> {
        let plates = &self.plates;
        let mut transitions = Vec::new();

        for door in &mut self.doors {
            let satisfied = door.config.required.iter().all(|plate| {
                plates
                    .get(plate)
                    .is_some_and(|input| input.is_active(now))
            });
            if satisfied {
                door.ever_opened = true;
            }

            let should_open = if door.config.stay_open_once_opened {
                door.ever_opened || satisfied
            } else {
                satisfied
            };

            if should_open != door.is_open {
                door.is_open = should_open;
                transitions.push(DoorTransition {
                    door_id: door.config.door_id,
                    is_open: should_open,
                });
            }
        }

        transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const A: PlateId = 1;
    const B: PlateId = 2;
    const D1: DoorId = 10;

    fn engine(required: Vec<PlateId>, sticky: bool) -> PuzzleDependencyEngine {
        PuzzleDependencyEngine::new(
            vec![DoorConfig {
                door_id: D1,
                required,
                stay_open_once_opened: sticky,
            }],
            &PuzzleTuning::default(),
        )
    }

    #[test]
    fn pulse_only_extends_expiry() {
        let mut engine = engine(vec![A], false);
        engine.pulse(A, 0.12, 1.0);
        assert_relative_eq!(engine.pulse_until(A).unwrap_or_default(), 1.12, epsilon = 1e-6);
        engine.pulse(A, 0.12, 1.05);
        assert_relative_eq!(engine.pulse_until(A).unwrap_or_default(), 1.17, epsilon = 1e-6);
        engine.pulse(A, 0.01, 1.06);
        assert_relative_eq!(engine.pulse_until(A).unwrap_or_default(), 1.17, epsilon = 1e-6);
    }

    #[test]
    fn when_sticky_door_requirements_met_then_it_stays_open() {
        let mut engine = engine(vec![A, B], true);

        assert!(engine.set_presence(A, true, 0.0).is_empty());
        assert!(!engine.door(D1).is_some_and(|d| d.is_open));

        let opened = engine.set_presence(B, true, 0.1);
        assert_eq!(
            opened,
            vec![DoorTransition {
                door_id: D1,
                is_open: true
            }]
        );
        assert!(engine.door(D1).is_some_and(|d| d.is_open && d.ever_opened));

        assert!(engine.set_presence(A, false, 0.2).is_empty());
        assert!(engine.door(D1).is_some_and(|d| d.is_open));
    }

    #[test]
    fn when_plain_door_loses_plate_then_it_closes_once() {
        let mut engine = engine(vec![A], false);
        assert_eq!(engine.set_presence(A, true, 0.0).len(), 1);
        // A second presser is not an edge.
        assert!(engine.set_presence(A, true, 0.0).is_empty());
        assert!(engine.set_presence(A, false, 0.1).is_empty());
        let closed = engine.set_presence(A, false, 0.2);
        assert_eq!(
            closed,
            vec![DoorTransition {
                door_id: D1,
                is_open: false
            }]
        );
    }

    #[test]
    fn when_pulse_expires_then_sweep_closes_door() {
        let mut engine = engine(vec![A], false);
        assert_eq!(engine.pulse(A, 0.12, 1.0).len(), 1);
        assert_relative_eq!(engine.next_sweep_at(), 1.12, epsilon = 1e-6);

        assert!(engine.sweep(1.1).is_empty());
        assert!(engine.door(D1).is_some_and(|d| d.is_open));

        let closed = engine.sweep(1.2);
        assert_eq!(closed.len(), 1);
        assert!(!closed[0].is_open);
        assert_eq!(engine.pulse_until(A), None);
        assert_relative_eq!(engine.next_sweep_at(), 1.2 + 999.0, epsilon = 1e-6);
    }

    #[test]
    fn empty_requirement_list_is_always_satisfied() {
        let engine = engine(Vec::new(), false);
        assert!(engine.door(D1).is_some_and(|d| d.is_open));
    }

    #[test]
    fn unknown_plate_is_inactive() {
        let engine = engine(vec![A], false);
        assert!(!engine.is_plate_active(99, 0.0));
        assert_eq!(engine.presence(99), 0);
    }

    proptest! {
        #[test]
        fn presence_never_underflows(events in proptest::collection::vec(any::<bool>(), 0..128)) {
            let mut engine = engine(vec![A], false);
            let mut expected: u32 = 0;
            for (i, pressed) in events.into_iter().enumerate() {
                engine.set_presence(A, pressed, i as f64 * 0.01);
                expected = if pressed { expected + 1 } else { expected.saturating_sub(1) };
                prop_assert_eq!(engine.presence(A), expected);
                prop_assert_eq!(engine.door(D1).is_some_and(|d| d.is_open), expected > 0);
            }
        }
    }
}
