/// Tuning for emitter sessions.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShooterTuning {
    /// Seconds between two firings of one session.
    pub fire_interval: f32,

    /// Battery debited for every arc spawned.
    pub arc_cost: f32,

    /// Battery debited for every firing that keeps a cone alive.
    pub cone_cost: f32,
}

impl Default for ShooterTuning {
    fn default() -> Self {
        Self {
            fire_interval: 0.08,
            arc_cost: 2.0,
            cone_cost: 0.5,
        }
    }
}
