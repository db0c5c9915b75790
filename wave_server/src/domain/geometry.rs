// Planar geometry shared by the wave fronts, deflectors and overlap checks.

use glam::Vec2;

use crate::domain::occlusion::SampleRun;

/// Tolerance for degenerate lengths, speeds and ranges.
pub const EPSILON: f32 = 1e-4;

/// Smallest inner radius an arc band is allowed to collapse to.
pub const MIN_INNER_RADIUS: f32 = 0.01;

/// Unit vector for an angle in radians (0 = +X, counter-clockwise).
#[inline]
pub fn dir_from_angle(rad: f32) -> Vec2 {
    Vec2::new(rad.cos(), rad.sin())
}

#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

#[inline]
pub fn rotate(v: Vec2, rad: f32) -> Vec2 {
    let (s, c) = rad.sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

#[inline]
pub fn reflect(dir: Vec2, normal: Vec2) -> Vec2 {
    dir - 2.0 * dir.dot(normal) * normal
}

/// Normalizes `v`, falling back to +X for near-zero input.
pub fn normalize_or_right(v: Vec2) -> Vec2 {
    if v.is_finite() && v.length_squared() > EPSILON {
        v.normalize()
    } else {
        Vec2::X
    }
}

/// Moves `current` toward `target` by at most `max_delta`.
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// A wall or reflector edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
}

impl Segment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    /// Distance along the ray to this segment, if the ray reaches it within `max_dist`.
    ///
    /// `dir` must be normalized for the result to be a world-space distance.
    pub fn ray_hit(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<f32> {
        let edge = self.b - self.a;
        let denom = dir.perp_dot(edge);
        if denom.abs() < 1e-8 {
            // Parallel (or degenerate) edges never block.
            return None;
        }

        let w = self.a - origin;
        let t = w.perp_dot(edge) / denom;
        let u = w.perp_dot(dir) / denom;
        if t >= 0.0 && t <= max_dist && (0.0..=1.0).contains(&u) {
            Some(t)
        } else {
            None
        }
    }

    pub fn intersects(&self, other: &Segment) -> bool {
        let r = self.b - self.a;
        let s = other.b - other.a;
        let denom = r.perp_dot(s);
        let w = other.a - self.a;
        if denom.abs() < 1e-8 {
            // Collinear overlap is covered by the containment checks of the callers.
            return false;
        }
        let t = w.perp_dot(s) / denom;
        let u = w.perp_dot(r) / denom;
        (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
    }

    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        let edge = self.b - self.a;
        let len_sq = edge.length_squared();
        if len_sq <= f32::EPSILON {
            return self.a;
        }
        let t = ((p - self.a).dot(edge) / len_sq).clamp(0.0, 1.0);
        self.a + edge * t
    }
}

/// Axis-aligned box used for triggers, reflectors and box walls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        self.closest_point(center).distance_squared(center) <= radius * radius
    }

    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }

    pub fn edges(&self) -> [Segment; 4] {
        let [a, b, c, d] = self.corners();
        [
            Segment::new(a, b),
            Segment::new(b, c),
            Segment::new(c, d),
            Segment::new(d, a),
        ]
    }
}

/// Closed polygon in world space, used as a hit-test shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    pub points: Vec<Vec2>,
}

impl Polygon {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.len() < 3
    }

    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| Segment::new(self.points[i], self.points[(i + 1) % n]))
    }

    /// Even-odd point containment.
    pub fn contains(&self, p: Vec2) -> bool {
        if self.is_empty() {
            return false;
        }
        let mut inside = false;
        let n = self.points.len();
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.points[i];
            let pj = self.points[j];
            if (pi.y > p.y) != (pj.y > p.y) && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    pub fn intersects_aabb(&self, bounds: &Aabb) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.points.iter().any(|p| bounds.contains(*p)) {
            return true;
        }
        if bounds.corners().iter().any(|c| self.contains(*c)) {
            return true;
        }
        let box_edges = bounds.edges();
        self.edges()
            .any(|edge| box_edges.iter().any(|b| edge.intersects(b)))
    }

    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.contains(center) {
            return true;
        }
        let r_sq = radius * radius;
        self.edges()
            .any(|edge| edge.closest_point(center).distance_squared(center) <= r_sq)
    }
}

/// Evenly spaced angular samples around a base direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularWindow {
    /// World angle of the window center (radians).
    pub base_angle: f32,
    /// Half of the sampled window (radians).
    pub half_angle: f32,
    /// Number of gaps between samples; the window has `segments + 1` samples.
    pub segments: usize,
}

impl AngularWindow {
    pub fn sample_count(&self) -> usize {
        self.segments + 1
    }

    /// World angle of sample `i`, linearly from `-half_angle` to `+half_angle`.
    pub fn angle_at(&self, i: usize) -> f32 {
        let u = if self.segments == 0 {
            0.5
        } else {
            i as f32 / self.segments as f32
        };
        self.base_angle + lerp(-self.half_angle, self.half_angle, u)
    }

    pub fn dir_at(&self, i: usize) -> Vec2 {
        dir_from_angle(self.angle_at(i))
    }
}

/// Rendered outline and hit polygon of an arc fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcGeometry {
    /// Visible outer points at the full radius, in sample order.
    pub outer: Vec<Vec2>,
    /// Outer points followed by the inner points in reverse (annulus-wedge fragment).
    pub polygon: Polygon,
}

/// Builds the band polygon for the visible run of an arc.
pub fn arc_band(
    origin: Vec2,
    window: &AngularWindow,
    run: SampleRun,
    radius: f32,
    thickness: f32,
) -> ArcGeometry {
    let outer: Vec<Vec2> = (run.start..=run.end())
        .map(|i| origin + window.dir_at(i) * radius)
        .collect();

    let inner_radius = (radius - thickness).max(MIN_INNER_RADIUS);
    let mut points = Vec::with_capacity(run.len * 2);
    points.extend_from_slice(&outer);
    points.extend(
        (run.start..=run.end())
            .rev()
            .map(|i| origin + window.dir_at(i) * inner_radius),
    );

    ArcGeometry {
        outer,
        polygon: Polygon::new(points),
    }
}

/// Builds a fan polygon: origin followed by `segments + 1` boundary points at `range`.
pub fn fan(origin: Vec2, aim: Vec2, half_angle: f32, range: f32, segments: usize) -> Polygon {
    let mut points = Vec::with_capacity(segments + 2);
    points.push(origin);
    for i in 0..=segments {
        let t = i as f32 / segments.max(1) as f32;
        let a = lerp(-half_angle, half_angle, t);
        points.push(origin + rotate(aim, a) * range);
    }
    Polygon::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn ray_hits_segment_in_front() {
        let wall = Segment::new(Vec2::new(2.0, -1.0), Vec2::new(2.0, 1.0));
        let hit = wall.ray_hit(Vec2::ZERO, Vec2::X, 10.0).expect("should hit");
        assert_relative_eq!(hit, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn ray_ignores_segment_behind_or_out_of_reach() {
        let wall = Segment::new(Vec2::new(2.0, -1.0), Vec2::new(2.0, 1.0));
        assert!(wall.ray_hit(Vec2::ZERO, -Vec2::X, 10.0).is_none());
        assert!(wall.ray_hit(Vec2::ZERO, Vec2::X, 1.5).is_none());
        assert!(wall.ray_hit(Vec2::ZERO, Vec2::Y, 10.0).is_none());
    }

    #[test]
    fn reflect_flips_normal_component() {
        let out = reflect(Vec2::new(1.0, -1.0).normalize(), Vec2::Y);
        assert_relative_eq!(out.x, std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
        assert_relative_eq!(out.y, std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
    }

    #[test]
    fn move_toward_never_overshoots() {
        assert_eq!(move_toward(0.0, 10.0, 3.0), 3.0);
        assert_eq!(move_toward(9.0, 10.0, 3.0), 10.0);
        assert_eq!(move_toward(5.0, 0.0, 2.0), 3.0);
    }

    #[test]
    fn polygon_contains_and_overlaps_box() {
        let square = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ]);
        assert!(square.contains(Vec2::new(1.0, 1.0)));
        assert!(!square.contains(Vec2::new(3.0, 1.0)));
        assert!(square.intersects_aabb(&Aabb::new(Vec2::new(1.5, 1.5), Vec2::new(4.0, 4.0))));
        assert!(!square.intersects_aabb(&Aabb::new(Vec2::new(3.0, 3.0), Vec2::new(4.0, 4.0))));
        assert!(square.intersects_circle(Vec2::new(2.5, 1.0), 0.6));
    }

    #[test]
    fn fan_starts_at_origin_and_spans_window() {
        let poly = fan(Vec2::ZERO, Vec2::X, FRAC_PI_2 / 2.0, 4.0, 8);
        assert_eq!(poly.points.len(), 10);
        assert_eq!(poly.points[0], Vec2::ZERO);
        for p in &poly.points[1..] {
            assert_relative_eq!(p.length(), 4.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn arc_band_reverses_inner_edge() {
        let window = AngularWindow {
            base_angle: 0.0,
            half_angle: 0.5,
            segments: 4,
        };
        let geo = arc_band(Vec2::ZERO, &window, SampleRun { start: 1, len: 3 }, 5.0, 1.0);
        assert_eq!(geo.outer.len(), 3);
        assert_eq!(geo.polygon.points.len(), 6);
        // Last outer point and first inner point share the same sample angle.
        let last_outer = geo.outer[2];
        let first_inner = geo.polygon.points[3];
        assert_relative_eq!(last_outer.normalize().dot(first_inner.normalize()), 1.0, epsilon = 1e-5);
        assert_relative_eq!(first_inner.length(), 4.0, epsilon = 1e-4);
    }
}
