/// Tuning for plates, doors, deflectors and shared pushables.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PuzzleTuning {
    /// Default pulse length for arc buttons that do not set their own.
    pub button_press_seconds: f32,

    /// Shortest pulse ever recorded.
    pub min_pulse_seconds: f32,

    /// Sweep interval used while no pulse is outstanding.
    pub idle_sweep_seconds: f64,
}

impl Default for PuzzleTuning {
    fn default() -> Self {
        Self {
            button_press_seconds: 0.12,
            min_pulse_seconds: 0.01,
            idle_sweep_seconds: 999.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeflectorTuning {
    /// Seconds before the same arc may deflect again.
    pub per_arc_cooldown_seconds: f32,
}

impl Default for DeflectorTuning {
    fn default() -> Self {
        Self {
            per_arc_cooldown_seconds: 0.08,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwnershipTuning {
    /// How often ownership may change while contacted (prevents thrashing when both push).
    pub min_switch_interval: f32,

    /// Collision radius of a player body.
    pub player_radius: f32,

    /// Collision radius of a pushable body.
    pub pushable_radius: f32,
}

impl Default for OwnershipTuning {
    fn default() -> Self {
        Self {
            min_switch_interval: 0.2,
            player_radius: 0.4,
            pushable_radius: 0.5,
        }
    }
}
