// Identifiers and the authoritative tick clock.

use crate::domain::ports::TickClock;

pub type PlayerId = u64;
pub type ArcId = u64;
/// Emission sources are the owning player's reported pose.
pub type SourceId = PlayerId;
pub type PlateId = u32;
pub type DoorId = u32;
pub type PushableId = u32;
pub type TargetId = u32;
pub type PickupId = u32;

/// Holder id used while no client owns a shared object.
pub const SERVER_HOLDER: PlayerId = 0;

/// Fixed-step tick counter shared by every tick-derived computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    tick: u64,
    tick_delta: f32,
}

impl SimClock {
    pub fn new(tick_delta: f32) -> Self {
        Self {
            tick: 0,
            tick_delta,
        }
    }

    pub fn at(tick: u64, tick_delta: f32) -> Self {
        Self { tick, tick_delta }
    }

    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Observers jump straight to the authority's tick.
    pub fn sync_to(&mut self, tick: u64) {
        self.tick = tick;
    }
}

impl TickClock for SimClock {
    fn tick(&self) -> u64 {
        self.tick
    }

    fn tick_delta(&self) -> f32 {
        self.tick_delta
    }
}
