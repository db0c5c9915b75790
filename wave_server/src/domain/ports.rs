use glam::Vec2;

use crate::domain::state::SourceId;

// Port for reading where an emission source currently is.
pub trait PositionProvider {
    fn position(&self, source: SourceId) -> Option<Vec2>;
}

// Port for the budget an emitter spends per firing.
pub trait ResourcePool {
    fn has(&self, amount: f32) -> bool;
    fn try_consume(&mut self, amount: f32) -> bool;
    fn add(&mut self, amount: f32);
}

// Port for the single authoritative tick source.
pub trait TickClock {
    fn tick(&self) -> u64;
    /// Fixed duration of one tick in seconds.
    fn tick_delta(&self) -> f32;

    fn now_seconds(&self) -> f64 {
        self.tick() as f64 * f64::from(self.tick_delta())
    }
}

// Port for occlusion queries against static wall geometry.
pub trait WallQuery {
    /// Distance to the nearest wall along `dir` within `max_dist`, if any.
    fn raycast(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<f32>;
}
