/// Gameplay tuning for the expanding arc wave front.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcTuning {
    /// Angular gaps sampled per tick; the arc has `segments + 1` samples.
    pub segments: usize,

    /// Half-angle in degrees (total arc = 2x).
    pub half_angle_degrees: f32,

    /// Radial thickness of the hit band in world units.
    pub thickness: f32,

    /// If > 0, caps the outer arc length in world units so it stops getting longer.
    pub max_arc_length: f32,

    /// The arc despawns when its radius reaches this.
    pub max_radius: f32,

    /// Initial outward speed (units/sec).
    pub start_speed: f32,

    /// Outward acceleration (units/sec^2).
    pub acceleration: f32,

    /// Max outward speed (units/sec).
    pub max_speed: f32,

    pub clip_on_walls: bool,

    /// Small inset to avoid flicker at collider edges.
    pub wall_skin: f32,

    /// How far past the reflector contact a deflected successor starts.
    pub deflect_offset: f32,

    pub damage_per_second: f32,

    /// Minimum seconds between two damage applications by the same arc.
    pub damage_interval: f32,
}

impl ArcTuning {
    /// Clamps values into the ranges the kinematics and sampling assume.
    pub fn sanitized(mut self) -> Self {
        self.segments = self.segments.max(4);
        self.thickness = self.thickness.max(0.001);
        self.max_radius = self.max_radius.max(0.01);
        self.max_speed = self.max_speed.max(0.01);
        self.start_speed = self.start_speed.max(0.0);
        self.wall_skin = self.wall_skin.max(0.0);
        self
    }
}

impl Default for ArcTuning {
    fn default() -> Self {
        Self {
            segments: 24,
            half_angle_degrees: 35.0,
            thickness: 0.5,
            max_arc_length: 0.0,
            max_radius: 8.0,
            start_speed: 6.0,
            acceleration: 18.0,
            max_speed: 12.0,
            clip_on_walls: true,
            wall_skin: 0.02,
            deflect_offset: 0.05,
            damage_per_second: 10.0,
            damage_interval: 0.1,
        }
    }
}
