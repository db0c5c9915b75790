/// Tuning for the per-player battery pool.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryTuning {
    pub max: f32,
    pub min: f32,

    /// Units restored per second while inside a recharge zone.
    pub recharge_per_second: f32,

    /// Units restored by a pickup.
    pub pickup_restore: f32,

    /// Minimum seconds between two battery broadcasts for the same player.
    pub broadcast_interval: f32,
}

impl Default for BatteryTuning {
    fn default() -> Self {
        Self {
            max: 100.0,
            min: 0.0,
            recharge_per_second: 25.0,
            pickup_restore: 35.0,
            broadcast_interval: 0.1,
        }
    }
}
