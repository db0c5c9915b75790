// Expanding arc wave front.
//
// The radius is a closed-form function of ticks elapsed since spawn, so the authority and every
// observer rebuild the same arc from `(origin, dir, spawn_tick)` alone.

use glam::Vec2;

use crate::domain::geometry::{
    AngularWindow, ArcGeometry, EPSILON, angle_of, arc_band, normalize_or_right,
};
use crate::domain::occlusion::{longest_visible_run, sample_visibility};
use crate::domain::ports::{TickClock, WallQuery};
use crate::domain::state::{ArcId, PlayerId};
use crate::domain::tuning::ArcTuning;

/// Radius after `t` seconds: constant acceleration from `start_speed` up to `max_speed`, then
/// constant speed.
pub fn radius_at(tuning: &ArcTuning, t: f32) -> f32 {
    let t = t.max(0.0);
    let v0 = tuning.start_speed;
    let a = tuning.acceleration;
    let vmax = v0.max(tuning.max_speed);

    if a <= EPSILON || v0 >= vmax {
        return v0 * t;
    }

    let t_to_max = (vmax - v0) / a;
    if t <= t_to_max {
        return v0 * t + 0.5 * a * t * t;
    }

    let dist_accel = v0 * t_to_max + 0.5 * a * t_to_max * t_to_max;
    dist_accel + vmax * (t - t_to_max)
}

/// Seconds elapsed since `spawn_tick`; zero if the clock has not reached it yet.
pub fn elapsed_seconds(spawn_tick: u64, now_tick: u64, tick_delta: f32) -> f32 {
    if now_tick >= spawn_tick {
        (now_tick - spawn_tick) as f32 * tick_delta
    } else {
        0.0
    }
}

/// Half-angle in radians, narrowed when an outer arc length cap is configured.
pub fn used_half_angle(tuning: &ArcTuning, radius: f32) -> f32 {
    let configured = tuning.half_angle_degrees.to_radians();
    if tuning.max_arc_length > EPSILON && radius > EPSILON {
        configured.min((tuning.max_arc_length / radius) * 0.5)
    } else {
        configured
    }
}

/// Samples visibility and builds the band for the longest visible run.
///
/// Returns `None` when the run has at most one sample (no meaningful extent).
pub fn build_arc<W: WallQuery + ?Sized>(
    origin: Vec2,
    dir: Vec2,
    radius: f32,
    tuning: &ArcTuning,
    walls: &W,
) -> Option<ArcGeometry> {
    let window = AngularWindow {
        base_angle: angle_of(dir),
        half_angle: used_half_angle(tuning, radius),
        segments: tuning.segments,
    };

    let visible = if tuning.clip_on_walls {
        let ray_len = (radius - tuning.wall_skin).max(0.0);
        sample_visibility(walls, origin, &window, ray_len)
    } else {
        vec![true; window.sample_count()]
    };

    let run = longest_visible_run(&visible)?;
    if run.len <= 1 {
        return None;
    }

    Some(arc_band(origin, &window, run, radius, tuning.thickness))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcPhase {
    Growing,
    Deflected,
    Despawned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DespawnReason {
    MaxRadius,
    Occluded,
    Deflected,
    OwnerLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcStep {
    Visible,
    Despawned(DespawnReason),
    /// The arc was already gone before this step.
    Inactive,
}

#[derive(Debug, Clone)]
pub struct ArcWave {
    id: ArcId,
    owner: PlayerId,
    origin: Vec2,
    dir: Vec2,
    spawn_tick: u64,
    tuning: ArcTuning,
    phase: ArcPhase,
    despawn_reason: Option<DespawnReason>,
    radius: f32,
    geometry: Option<ArcGeometry>,
    next_damage_at: f64,
}

impl ArcWave {
    pub fn new(
        id: ArcId,
        owner: PlayerId,
        origin: Vec2,
        dir: Vec2,
        spawn_tick: u64,
        tuning: ArcTuning,
    ) -> Self {
        Self {
            id,
            owner,
            origin,
            dir: normalize_or_right(dir),
            spawn_tick,
            tuning: tuning.sanitized(),
            phase: ArcPhase::Growing,
            despawn_reason: None,
            radius: 0.0,
            geometry: None,
            next_damage_at: 0.0,
        }
    }

    pub fn id(&self) -> ArcId {
        self.id
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn dir(&self) -> Vec2 {
        self.dir
    }

    pub fn spawn_tick(&self) -> u64 {
        self.spawn_tick
    }

    pub fn phase(&self) -> ArcPhase {
        self.phase
    }

    pub fn despawn_reason(&self) -> Option<DespawnReason> {
        self.despawn_reason
    }

    pub fn is_alive(&self) -> bool {
        self.phase == ArcPhase::Growing
    }

    /// Radius computed by the most recent step.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn geometry(&self) -> Option<&ArcGeometry> {
        self.geometry.as_ref()
    }

    pub fn radius_for<C: TickClock + ?Sized>(&self, clock: &C) -> f32 {
        radius_at(
            &self.tuning,
            elapsed_seconds(self.spawn_tick, clock.tick(), clock.tick_delta()),
        )
    }

    /// Per-tick pass: kinematics, occlusion and geometry rebuild.
    pub fn step<C, W>(&mut self, clock: &C, walls: &W) -> ArcStep
    where
        C: TickClock + ?Sized,
        W: WallQuery + ?Sized,
    {
        if !self.is_alive() {
            return ArcStep::Inactive;
        }

        let radius = self.radius_for(clock);
        self.radius = radius;

        if radius >= self.tuning.max_radius {
            self.despawn(DespawnReason::MaxRadius);
            return ArcStep::Despawned(DespawnReason::MaxRadius);
        }

        match build_arc(self.origin, self.dir, radius, &self.tuning, walls) {
            Some(geometry) => {
                self.geometry = Some(geometry);
                ArcStep::Visible
            }
            None => {
                self.despawn(DespawnReason::Occluded);
                ArcStep::Despawned(DespawnReason::Occluded)
            }
        }
    }

    /// Growing -> Deflected. The caller spawns the successor and then despawns this arc.
    pub fn begin_deflection(&mut self) -> bool {
        if self.phase != ArcPhase::Growing {
            return false;
        }
        self.phase = ArcPhase::Deflected;
        true
    }

    /// Terminal; later calls keep the first reason.
    pub fn despawn(&mut self, reason: DespawnReason) {
        if self.phase == ArcPhase::Despawned {
            return;
        }
        self.phase = ArcPhase::Despawned;
        self.despawn_reason = Some(reason);
        self.geometry = None;
    }

    /// Damage dealt this step, if the per-arc damage interval has elapsed.
    pub fn take_damage_tick(&mut self, now: f64) -> Option<f32> {
        if !self.is_alive() || now < self.next_damage_at {
            return None;
        }
        self.next_damage_at = now + f64::from(self.tuning.damage_interval);
        Some(self.tuning.damage_per_second * self.tuning.damage_interval)
    }

    pub fn deflect_offset(&self) -> f32 {
        self.tuning.deflect_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Segment;
    use crate::domain::occlusion::WallSet;
    use crate::domain::state::SimClock;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const TICK: f32 = 1.0 / 60.0;

    #[test]
    fn radius_accelerates_then_cruises() {
        let tuning = ArcTuning::default();
        assert_relative_eq!(radius_at(&tuning, 0.2), 1.56, epsilon = 1e-4);
        // t_to_max = (12 - 6) / 18; distance there is 2 + 1.
        assert_relative_eq!(radius_at(&tuning, 1.0 / 3.0), 3.0, epsilon = 1e-4);
        assert_relative_eq!(radius_at(&tuning, 1.0 / 3.0 + 0.25), 6.0, epsilon = 1e-4);
    }

    #[test]
    fn radius_is_linear_without_acceleration() {
        let tuning = ArcTuning {
            acceleration: 0.0,
            ..ArcTuning::default()
        };
        assert_relative_eq!(radius_at(&tuning, 0.5), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn arc_length_cap_narrows_window() {
        let tuning = ArcTuning {
            max_arc_length: 2.0,
            ..ArcTuning::default()
        };
        // Uncapped at small radius, capped at (2 / 4) / 2 = 0.25 rad at radius 4.
        assert_relative_eq!(
            used_half_angle(&tuning, 1.0),
            35.0_f32.to_radians(),
            epsilon = 1e-6
        );
        assert_relative_eq!(used_half_angle(&tuning, 4.0), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn arc_despawns_at_max_radius_and_stays_despawned() {
        let walls = WallSet::default();
        let mut arc = ArcWave::new(1, 7, Vec2::ZERO, Vec2::X, 0, ArcTuning::default());

        let mut clock = SimClock::new(TICK);
        clock.advance();
        assert_eq!(arc.step(&clock, &walls), ArcStep::Visible);
        assert!(arc.geometry().is_some());

        // 0.75 s reaches the default max radius of 8.
        let clock = SimClock::at(46, TICK);
        assert_eq!(
            arc.step(&clock, &walls),
            ArcStep::Despawned(DespawnReason::MaxRadius)
        );
        assert_eq!(arc.phase(), ArcPhase::Despawned);
        assert!(arc.geometry().is_none());

        let clock = SimClock::at(2, TICK);
        assert_eq!(arc.step(&clock, &walls), ArcStep::Inactive);
        assert_eq!(arc.despawn_reason(), Some(DespawnReason::MaxRadius));
    }

    #[test]
    fn arc_despawns_when_wall_covers_whole_window() {
        let walls = WallSet::new(vec![Segment::new(
            Vec2::new(1.0, -10.0),
            Vec2::new(1.0, 10.0),
        )]);
        let mut arc = ArcWave::new(1, 7, Vec2::ZERO, Vec2::X, 0, ArcTuning::default());

        // Radius 1.56 at 0.2 s: every ray crosses the wall at x = 1.
        let clock = SimClock::at(12, TICK);
        assert_eq!(
            arc.step(&clock, &walls),
            ArcStep::Despawned(DespawnReason::Occluded)
        );
    }

    #[test]
    fn partial_occlusion_keeps_longest_run_polygon() {
        let walls = WallSet::new(vec![Segment::new(
            Vec2::new(1.0, 0.2),
            Vec2::new(1.0, 10.0),
        )]);
        let tuning = ArcTuning::default();
        let geometry = build_arc(Vec2::ZERO, Vec2::X, 2.0, &tuning, &walls).expect("visible");
        let samples = tuning.segments + 1;
        assert!(geometry.outer.len() > 1 && geometry.outer.len() < samples);
        assert_eq!(geometry.polygon.points.len(), geometry.outer.len() * 2);
        // The surviving run is the lower part of the window.
        assert!(geometry.outer.iter().all(|p| p.y < 0.5));
    }

    #[test]
    fn deflection_is_a_one_way_transition() {
        let mut arc = ArcWave::new(1, 7, Vec2::ZERO, Vec2::Y, 0, ArcTuning::default());
        assert!(arc.begin_deflection());
        assert!(!arc.begin_deflection());
        arc.despawn(DespawnReason::Deflected);
        assert_eq!(arc.phase(), ArcPhase::Despawned);
        assert!(!arc.begin_deflection());
    }

    #[test]
    fn damage_ticks_are_rate_limited() {
        let mut arc = ArcWave::new(1, 7, Vec2::ZERO, Vec2::Y, 0, ArcTuning::default());
        let first = arc.take_damage_tick(1.0).expect("first tick");
        assert_relative_eq!(first, 1.0, epsilon = 1e-6);
        assert!(arc.take_damage_tick(1.05).is_none());
        assert!(arc.take_damage_tick(1.2).is_some());
    }

    proptest! {
        #[test]
        fn radius_never_decreases_over_ticks(
            start_speed in 0.0f32..20.0,
            acceleration in 0.0f32..50.0,
            max_speed in 0.0f32..30.0,
            ticks in 1u64..400,
        ) {
            let tuning = ArcTuning { start_speed, acceleration, max_speed, ..ArcTuning::default() };
            let mut previous = 0.0f32;
            for tick in 0..ticks {
                let r = radius_at(&tuning, elapsed_seconds(0, tick, TICK));
                prop_assert!(r >= previous - 1e-4, "radius shrank: {} -> {}", previous, r);
                previous = r;
            }
        }
    }
}
