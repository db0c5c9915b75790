// Ray-sampled visibility for the arc and cone wave fronts.

use glam::Vec2;

use crate::domain::geometry::{Aabb, AngularWindow, Segment, rotate};
use crate::domain::ports::WallQuery;

/// Static wall geometry; every box wall is stored as its four edges.
#[derive(Debug, Clone, Default)]
pub struct WallSet {
    segments: Vec<Segment>,
}

impl WallSet {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn push_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn push_box(&mut self, bounds: Aabb) {
        self.segments.extend(bounds.edges());
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl WallQuery for WallSet {
    fn raycast(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<f32> {
        self.segments
            .iter()
            .filter_map(|s| s.ray_hit(origin, dir, max_dist))
            .min_by(f32::total_cmp)
    }
}

/// Contiguous run of visible samples: indices `start..start + len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRun {
    pub start: usize,
    pub len: usize,
}

impl SampleRun {
    pub fn end(&self) -> usize {
        self.start + self.len - 1
    }
}

/// Casts one ray per sample; a sample is visible iff nothing blocks it within `ray_len`.
pub fn sample_visibility<W: WallQuery + ?Sized>(
    walls: &W,
    origin: Vec2,
    window: &AngularWindow,
    ray_len: f32,
) -> Vec<bool> {
    (0..window.sample_count())
        .map(|i| walls.raycast(origin, window.dir_at(i), ray_len).is_none())
        .collect()
}

/// Longest run of `true` by linear scan (no wraparound); the first run wins ties.
pub fn longest_visible_run(visible: &[bool]) -> Option<SampleRun> {
    let mut best: Option<SampleRun> = None;
    let mut current: Option<SampleRun> = None;

    for (i, &v) in visible.iter().enumerate() {
        if v {
            current = Some(match current {
                Some(run) => SampleRun {
                    start: run.start,
                    len: run.len + 1,
                },
                None => SampleRun { start: i, len: 1 },
            });
        } else if let Some(run) = current.take() {
            if best.is_none_or(|b| run.len > b.len) {
                best = Some(run);
            }
        }
    }
    if let Some(run) = current {
        if best.is_none_or(|b| run.len > b.len) {
            best = Some(run);
        }
    }

    best
}

/// Shortest wall distance across `max(3, ray_count)` rays spread over the cone, capped at `range`.
pub fn blocked_range<W: WallQuery + ?Sized>(
    walls: &W,
    origin: Vec2,
    aim: Vec2,
    half_angle: f32,
    range: f32,
    ray_count: usize,
) -> f32 {
    if range <= 0.01 {
        return 0.0;
    }

    let count = ray_count.max(3);
    let mut best = range;
    for i in 0..count {
        let t = i as f32 / (count - 1) as f32;
        let angle = -half_angle + (2.0 * half_angle) * t;
        let dir = rotate(aim, angle);
        if let Some(hit) = walls.raycast(origin, dir, range) {
            best = best.min(hit);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wall_at_x(x: f32, y0: f32, y1: f32) -> WallSet {
        WallSet::new(vec![Segment::new(Vec2::new(x, y0), Vec2::new(x, y1))])
    }

    #[test]
    fn longest_run_prefers_first_on_ties() {
        let vis = [true, true, false, true, true, false];
        assert_eq!(longest_visible_run(&vis), Some(SampleRun { start: 0, len: 2 }));
    }

    #[test]
    fn longest_run_does_not_wrap() {
        let vis = [true, false, true, true, false, true, true, true];
        assert_eq!(longest_visible_run(&vis), Some(SampleRun { start: 5, len: 3 }));
        assert_eq!(longest_visible_run(&[false, false]), None);
    }

    #[test]
    fn nearest_wall_wins() {
        let mut walls = wall_at_x(5.0, -1.0, 1.0);
        walls.push_segment(Segment::new(Vec2::new(3.0, -1.0), Vec2::new(3.0, 1.0)));
        let hit = walls.raycast(Vec2::ZERO, Vec2::X, 10.0).expect("hit");
        assert_relative_eq!(hit, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn partial_wall_blocks_only_covered_samples() {
        // Wall covers the upper half of the window only.
        let walls = wall_at_x(2.0, 0.05, 5.0);
        let window = AngularWindow {
            base_angle: 0.0,
            half_angle: 0.6,
            segments: 6,
        };
        let vis = sample_visibility(&walls, Vec2::ZERO, &window, 4.0);
        assert_eq!(vis.len(), 7);
        assert!(vis[0] && vis[1] && vis[2] && vis[3]);
        assert!(!vis[4] && !vis[5] && !vis[6]);
    }

    #[test]
    fn blocked_range_is_min_hit_or_full_range() {
        let open = WallSet::default();
        assert_relative_eq!(blocked_range(&open, Vec2::ZERO, Vec2::X, 0.3, 6.0, 9), 6.0);

        let walls = wall_at_x(4.0, -10.0, 10.0);
        let range = blocked_range(&walls, Vec2::ZERO, Vec2::X, 0.3, 6.0, 9);
        assert_relative_eq!(range, 4.0, epsilon = 1e-4);

        assert_eq!(blocked_range(&walls, Vec2::ZERO, Vec2::X, 0.3, 0.005, 9), 0.0);
    }
}
