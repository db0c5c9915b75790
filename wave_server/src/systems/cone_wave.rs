// Held cone wave front: linear growth toward a desired range, width capping, and a throttled
// four-value state that observers turn back into the same fan.

use glam::Vec2;

use crate::domain::geometry::{EPSILON, Polygon, fan, move_toward};
use crate::domain::occlusion::blocked_range;
use crate::domain::ports::WallQuery;
use crate::domain::state::PlayerId;
use crate::domain::tuning::ConeTuning;

/// Everything an observer needs to rebuild the fan without raycasting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeState {
    pub origin: Vec2,
    pub aim: Vec2,
    pub half_angle: f32,
    pub effective_range: f32,
}

/// Half-angle in radians for a front at `front`, narrowed so the chord stays under the cap.
pub fn cone_half_angle(tuning: &ConeTuning, front: f32) -> f32 {
    let base = tuning.max_angle_degrees.to_radians() * 0.5;
    if tuning.cap_by_max_width && front > 0.01 {
        let max_half_width = tuning.max_width_at_full_range * 0.5;
        base.min(max_half_width.atan2(front))
    } else {
        base
    }
}

/// Fan polygon for a state; shared by the authority hitbox and observer replicas.
pub fn cone_fan(state: &ConeState, tuning: &ConeTuning) -> Polygon {
    fan(
        state.origin,
        state.aim,
        state.half_angle,
        state.effective_range,
        tuning.fan_segments.max(6),
    )
}

#[derive(Debug, Clone)]
pub struct ConeWave {
    owner: PlayerId,
    tuning: ConeTuning,
    origin: Vec2,
    aim: Vec2,
    active: bool,
    current_front: f32,
    desired_front: f32,
    half_angle: f32,
    effective_range: f32,
    polygon: Polygon,
    next_broadcast_at: f64,
}

impl ConeWave {
    pub fn new(owner: PlayerId, origin: Vec2, tuning: ConeTuning) -> Self {
        Self {
            owner,
            tuning,
            origin,
            aim: Vec2::X,
            active: false,
            current_front: 0.0,
            desired_front: 0.0,
            half_angle: cone_half_angle(&tuning, 0.0),
            effective_range: 0.0,
            polygon: Polygon::default(),
            next_broadcast_at: 0.0,
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn current_front(&self) -> f32 {
        self.current_front
    }

    pub fn desired_front(&self) -> f32 {
        self.desired_front
    }

    pub fn effective_range(&self) -> f32 {
        self.effective_range
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// Near-zero aims are ignored.
    pub fn set_aim(&mut self, aim: Vec2) {
        if aim.is_finite() && aim.length_squared() >= EPSILON {
            self.aim = aim.normalize();
        }
    }

    pub fn set_desired_range(&mut self, range: f32) {
        self.desired_front = range.clamp(0.0, self.tuning.max_range);
    }

    /// Deactivating collapses the cone back to zero.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.current_front = 0.0;
            self.desired_front = 0.0;
            self.effective_range = 0.0;
            self.polygon = Polygon::default();
        }
    }

    pub fn state(&self) -> ConeState {
        ConeState {
            origin: self.origin,
            aim: self.aim,
            half_angle: self.half_angle,
            effective_range: self.effective_range,
        }
    }

    /// Advances the cone by `dt` seconds. Returns the state when a broadcast is due.
    pub fn step<W: WallQuery + ?Sized>(
        &mut self,
        source: Vec2,
        dt: f32,
        now: f64,
        walls: &W,
    ) -> Option<ConeState> {
        self.origin = source;
        if !self.active {
            return None;
        }

        self.current_front = move_toward(
            self.current_front,
            self.desired_front.clamp(0.0, self.tuning.max_range),
            self.tuning.growth_speed * dt,
        )
        .max(0.0);

        self.half_angle = cone_half_angle(&self.tuning, self.current_front);
        let blocked = blocked_range(
            walls,
            self.origin,
            self.aim,
            self.half_angle,
            self.current_front,
            self.tuning.ray_count,
        );
        self.effective_range = self.current_front.min(blocked);
        self.polygon = cone_fan(&self.state(), &self.tuning);

        if now >= self.next_broadcast_at {
            self.next_broadcast_at = now + f64::from(self.tuning.broadcast_interval);
            return Some(self.state());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Segment;
    use crate::domain::occlusion::WallSet;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn width_cap_narrows_half_angle() {
        let tuning = ConeTuning::default();
        let half = cone_half_angle(&tuning, 10.0);
        assert_relative_eq!(half.to_degrees(), 14.036, epsilon = 1e-2);
        assert!(half < 22.5_f32.to_radians());

        let uncapped = ConeTuning {
            cap_by_max_width: false,
            ..ConeTuning::default()
        };
        assert_relative_eq!(
            cone_half_angle(&uncapped, 10.0),
            22.5_f32.to_radians(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn front_grows_linearly_and_clamps_to_max_range() {
        let walls = WallSet::default();
        let mut cone = ConeWave::new(1, Vec2::ZERO, ConeTuning::default());
        cone.set_active(true);
        cone.set_desired_range(100.0);
        assert_eq!(cone.desired_front(), 8.0);

        cone.step(Vec2::ZERO, DT, 0.0, &walls);
        assert_relative_eq!(cone.current_front(), 18.0 * DT, epsilon = 1e-5);

        for i in 0..120 {
            cone.step(Vec2::ZERO, DT, f64::from(i) * f64::from(DT), &walls);
        }
        assert_relative_eq!(cone.current_front(), 8.0, epsilon = 1e-5);
        assert_relative_eq!(cone.effective_range(), 8.0, epsilon = 1e-5);
    }

    #[test]
    fn walls_shorten_effective_range() {
        let walls = WallSet::new(vec![Segment::new(
            Vec2::new(3.0, -5.0),
            Vec2::new(3.0, 5.0),
        )]);
        let mut cone = ConeWave::new(1, Vec2::ZERO, ConeTuning::default());
        cone.set_active(true);
        cone.set_desired_range(8.0);
        for i in 0..60 {
            cone.step(Vec2::ZERO, DT, f64::from(i) * f64::from(DT), &walls);
        }
        assert_relative_eq!(cone.current_front(), 8.0, epsilon = 1e-5);
        assert_relative_eq!(cone.effective_range(), 3.0, epsilon = 1e-4);
    }

    #[test]
    fn deactivate_resets_front() {
        let walls = WallSet::default();
        let mut cone = ConeWave::new(1, Vec2::ZERO, ConeTuning::default());
        cone.set_active(true);
        cone.set_desired_range(8.0);
        cone.step(Vec2::ZERO, 0.1, 0.0, &walls);
        assert!(cone.current_front() > 0.0);

        cone.set_active(false);
        assert_eq!(cone.current_front(), 0.0);
        assert_eq!(cone.effective_range(), 0.0);
        assert!(cone.step(Vec2::ZERO, 0.1, 1.0, &walls).is_none());
        assert_eq!(cone.current_front(), 0.0);
    }

    #[test]
    fn broadcasts_are_throttled() {
        let walls = WallSet::default();
        let mut cone = ConeWave::new(1, Vec2::ZERO, ConeTuning::default());
        cone.set_active(true);
        cone.set_desired_range(8.0);

        let sent = (0..30)
            .filter(|i| {
                cone.step(Vec2::ZERO, DT, f64::from(*i) * f64::from(DT), &walls)
                    .is_some()
            })
            .count();
        // 0.5 s of steps at a 0.05 s interval.
        assert!((9..=11).contains(&sent), "sent {sent}");
    }

    #[test]
    fn observer_fan_matches_authority_polygon() {
        let walls = WallSet::default();
        let tuning = ConeTuning::default();
        let mut cone = ConeWave::new(1, Vec2::new(1.0, 2.0), tuning);
        cone.set_aim(Vec2::new(0.0, 3.0));
        cone.set_active(true);
        cone.set_desired_range(6.0);
        let state = cone
            .step(Vec2::new(1.0, 2.0), 0.1, 0.0, &walls)
            .expect("first step broadcasts");

        assert_eq!(&cone_fan(&state, &tuning), cone.polygon());
    }
}
