/// Gameplay tuning for the held cone wave front.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeTuning {
    pub max_range: f32,

    /// Linear growth of the front in units per second.
    pub growth_speed: f32,

    /// Full opening angle in degrees before width capping.
    pub max_angle_degrees: f32,

    /// Narrow the cone as it grows so its chord never exceeds `max_width_at_full_range`.
    pub cap_by_max_width: bool,
    pub max_width_at_full_range: f32,

    /// Occlusion rays per step (at least 3 are cast).
    pub ray_count: usize,

    /// Boundary gaps of the fan polygon (at least 6).
    pub fan_segments: usize,

    /// Minimum seconds between two state broadcasts.
    pub broadcast_interval: f32,

    pub damage_per_second: f32,
}

impl Default for ConeTuning {
    fn default() -> Self {
        Self {
            max_range: 8.0,
            growth_speed: 18.0,
            max_angle_degrees: 45.0,
            cap_by_max_width: true,
            max_width_at_full_range: 5.0,
            ray_count: 9,
            fan_segments: 32,
            broadcast_interval: 0.05,
            damage_per_second: 10.0,
        }
    }
}
