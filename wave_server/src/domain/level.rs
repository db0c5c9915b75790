// Static level content: walls, puzzle pieces and spawn data.

use std::collections::HashSet;

use glam::Vec2;

use crate::domain::geometry::{Aabb, Segment};
use crate::domain::occlusion::WallSet;
use crate::domain::state::{DoorId, PickupId, PlateId, PushableId, TargetId};
use crate::systems::{DoorConfig, Facing, Reflector};

/// Arc-triggered button that pulses a plate.
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub plate_id: PlateId,
    pub bounds: Aabb,
    /// Overrides the default pulse length.
    pub press_seconds: Option<f32>,
}

/// Floor plate pressed by players and pushables.
#[derive(Debug, Clone, PartialEq)]
pub struct Plate {
    pub plate_id: PlateId,
    pub bounds: Aabb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushableSpawn {
    pub id: PushableId,
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpawn {
    pub id: TargetId,
    pub position: Vec2,
    pub radius: f32,
    pub hp: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: PickupId,
    pub bounds: Aabb,
    /// Overrides the default restore amount.
    pub restore: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct Level {
    pub walls: WallSet,
    pub reflectors: Vec<Reflector>,
    pub buttons: Vec<Button>,
    pub plates: Vec<Plate>,
    pub doors: Vec<DoorConfig>,
    pub pushables: Vec<PushableSpawn>,
    pub targets: Vec<TargetSpawn>,
    pub recharge_zones: Vec<Aabb>,
    pub pickups: Vec<Pickup>,
    pub spawn_points: Vec<Vec2>,
}

impl Level {
    /// Door requirements that name a plate no button or plate provides.
    pub fn unknown_plate_refs(&self) -> Vec<(DoorId, PlateId)> {
        let known: HashSet<PlateId> = self
            .buttons
            .iter()
            .map(|b| b.plate_id)
            .chain(self.plates.iter().map(|p| p.plate_id))
            .collect();

        self.doors
            .iter()
            .flat_map(|door| {
                door.required
                    .iter()
                    .filter(|plate| !known.contains(plate))
                    .map(move |plate| (door.door_id, *plate))
            })
            .collect()
    }

    /// Spawn point for the n-th player, cycling through the list.
    pub fn spawn_point(&self, n: usize) -> Vec2 {
        if self.spawn_points.is_empty() {
            return Vec2::ZERO;
        }
        self.spawn_points[n % self.spawn_points.len()]
    }

    /// Built-in room used when no level file is configured.
    pub fn demo() -> Self {
        let mut walls = WallSet::default();
        // Outer room, 24 x 16.
        let corners = [
            Vec2::new(-12.0, -8.0),
            Vec2::new(12.0, -8.0),
            Vec2::new(12.0, 8.0),
            Vec2::new(-12.0, 8.0),
        ];
        for i in 0..corners.len() {
            walls.push_segment(Segment::new(corners[i], corners[(i + 1) % corners.len()]));
        }
        // Pillar in the middle.
        walls.push_box(Aabb::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0)));

        Self {
            walls,
            reflectors: vec![Reflector {
                id: 1,
                bounds: Aabb::new(Vec2::new(8.0, -2.0), Vec2::new(8.5, 2.0)),
                facing: Facing::Left,
                front_face_only: true,
            }],
            buttons: vec![Button {
                plate_id: 1,
                bounds: Aabb::new(Vec2::new(-0.5, 6.0), Vec2::new(0.5, 7.0)),
                press_seconds: None,
            }],
            plates: vec![
                Plate {
                    plate_id: 2,
                    bounds: Aabb::new(Vec2::new(-9.0, -7.0), Vec2::new(-7.0, -5.0)),
                },
                Plate {
                    plate_id: 3,
                    bounds: Aabb::new(Vec2::new(7.0, -7.0), Vec2::new(9.0, -5.0)),
                },
            ],
            doors: vec![
                DoorConfig {
                    door_id: 1,
                    required: vec![1],
                    stay_open_once_opened: false,
                },
                DoorConfig {
                    door_id: 2,
                    required: vec![2, 3],
                    stay_open_once_opened: true,
                },
            ],
            pushables: vec![PushableSpawn {
                id: 1,
                position: Vec2::new(4.0, -4.0),
            }],
            targets: vec![TargetSpawn {
                id: 1,
                position: Vec2::new(-8.0, 4.0),
                radius: 0.6,
                hp: 20.0,
            }],
            recharge_zones: vec![Aabb::new(Vec2::new(-11.5, -1.0), Vec2::new(-10.0, 1.0))],
            pickups: vec![Pickup {
                id: 1,
                bounds: Aabb::from_center(Vec2::new(10.0, 6.0), Vec2::splat(0.6)),
                restore: None,
            }],
            spawn_points: vec![
                Vec2::new(-5.0, 0.0),
                Vec2::new(5.0, 0.0),
                Vec2::new(0.0, -5.0),
                Vec2::new(0.0, 4.0),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_level_references_only_known_plates() {
        let level = Level::demo();
        assert!(level.unknown_plate_refs().is_empty());
        assert!(!level.walls.is_empty());
    }

    #[test]
    fn unknown_plate_refs_are_reported_per_door() {
        let mut level = Level::demo();
        level.doors.push(DoorConfig {
            door_id: 9,
            required: vec![2, 42],
            stay_open_once_opened: false,
        });
        assert_eq!(level.unknown_plate_refs(), vec![(9, 42)]);
    }

    #[test]
    fn spawn_points_cycle() {
        let level = Level::demo();
        assert_eq!(level.spawn_point(0), level.spawn_point(4));
        assert_eq!(Level::default().spawn_point(3), Vec2::ZERO);
    }
}
