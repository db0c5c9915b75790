// Reflectors and the deflection cooldown ledger.

use std::collections::HashMap;

use glam::Vec2;

use crate::domain::geometry::{Aabb, normalize_or_right, reflect};
use crate::domain::state::ArcId;
use crate::domain::tuning::DeflectorTuning;

/// Eight-way facing of a reflector's front face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Up,
    Down,
    Left,
    #[default]
    Right,
    UpRight,
    UpLeft,
    DownRight,
    DownLeft,
}

impl Facing {
    pub fn normal(self) -> Vec2 {
        let n = match self {
            Facing::Up => Vec2::Y,
            Facing::Down => Vec2::NEG_Y,
            Facing::Left => Vec2::NEG_X,
            Facing::Right => Vec2::X,
            Facing::UpRight => Vec2::new(1.0, 1.0),
            Facing::UpLeft => Vec2::new(-1.0, 1.0),
            Facing::DownRight => Vec2::new(1.0, -1.0),
            Facing::DownLeft => Vec2::new(-1.0, -1.0),
        };
        n.normalize()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reflector {
    pub id: u32,
    pub bounds: Aabb,
    pub facing: Facing,
    /// Only reflect arcs travelling into the front face.
    pub front_face_only: bool,
}

impl Reflector {
    pub fn normal(&self) -> Vec2 {
        self.facing.normal()
    }

    /// Closest point on the reflector to `from`.
    pub fn contact_point(&self, from: Vec2) -> Vec2 {
        self.bounds.closest_point(from)
    }
}

/// Reflection math plus a cooldown keyed by arc instance.
///
/// The ledger is shared by every reflector, so an arc deflects at most once per cooldown window
/// even while it overlaps several reflectors at the same time.
#[derive(Debug, Clone)]
pub struct DeflectionResolver {
    cooldown: f64,
    last_deflect: HashMap<ArcId, f64>,
}

impl DeflectionResolver {
    pub fn new(tuning: &DeflectorTuning) -> Self {
        Self {
            cooldown: f64::from(tuning.per_arc_cooldown_seconds),
            last_deflect: HashMap::new(),
        }
    }

    /// Reflected direction on success. Fails closed (no mutation) while the instance is cooling
    /// down or when the incoming direction does not oppose the reflector normal.
    pub fn try_deflect(
        &mut self,
        instance: ArcId,
        reflector: &Reflector,
        incoming: Vec2,
        now: f64,
    ) -> Option<Vec2> {
        if let Some(last) = self.last_deflect.get(&instance)
            && now - last < self.cooldown
        {
            return None;
        }

        let dir = normalize_or_right(incoming);
        let normal = reflector.normal();
        if reflector.front_face_only && dir.dot(normal) >= 0.0 {
            return None;
        }

        let reflected = normalize_or_right(reflect(dir, normal));
        self.last_deflect.insert(instance, now);
        Some(reflected)
    }

    pub fn last_deflect_at(&self, instance: ArcId) -> Option<f64> {
        self.last_deflect.get(&instance).copied()
    }

    /// Drops ledger entries whose cooldown has elapsed.
    pub fn prune(&mut self, now: f64) {
        let cooldown = self.cooldown;
        self.last_deflect.retain(|_, last| now - *last < cooldown);
    }
}
