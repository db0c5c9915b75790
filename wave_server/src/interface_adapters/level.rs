// JSON level files: DTOs, validation and conversion into the domain `Level`.

use crate::domain::geometry::{Aabb, Segment};
use crate::domain::level::{Button, Pickup, Plate, PushableSpawn, TargetSpawn};
use crate::systems::{DoorConfig, Facing, Reflector};
use crate::domain::{DoorId, Level, PickupId, PlateId, PushableId, TargetId, WallSet};
use crate::interface_adapters::protocol::PointDto;
use glam::Vec2;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug)]
pub enum LevelError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Io(e) => write!(f, "failed to read level: {e}"),
            LevelError::Parse(e) => write!(f, "failed to parse level: {e}"),
            LevelError::Invalid(reason) => write!(f, "invalid level: {reason}"),
        }
    }
}

impl std::error::Error for LevelError {}

impl From<std::io::Error> for LevelError {
    fn from(e: std::io::Error) -> Self {
        LevelError::Io(e)
    }
}

impl From<serde_json::Error> for LevelError {
    fn from(e: serde_json::Error) -> Self {
        LevelError::Parse(e)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoxDto {
    pub min: PointDto,
    pub max: PointDto,
}

impl BoxDto {
    fn to_aabb(self) -> Aabb {
        Aabb::new(self.min.into(), self.max.into())
    }

    fn is_finite(&self) -> bool {
        Vec2::from(self.min).is_finite() && Vec2::from(self.max).is_finite()
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SegmentDto {
    pub a: PointDto,
    pub b: PointDto,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WallsDto {
    #[serde(default)]
    pub segments: Vec<SegmentDto>,
    #[serde(default)]
    pub boxes: Vec<BoxDto>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum FacingDto {
    Up,
    Down,
    Left,
    Right,
    UpRight,
    UpLeft,
    DownRight,
    DownLeft,
}

impl From<FacingDto> for Facing {
    fn from(f: FacingDto) -> Self {
        match f {
            FacingDto::Up => Facing::Up,
            FacingDto::Down => Facing::Down,
            FacingDto::Left => Facing::Left,
            FacingDto::Right => Facing::Right,
            FacingDto::UpRight => Facing::UpRight,
            FacingDto::UpLeft => Facing::UpLeft,
            FacingDto::DownRight => Facing::DownRight,
            FacingDto::DownLeft => Facing::DownLeft,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReflectorDto {
    pub id: u32,
    pub bounds: BoxDto,
    pub facing: FacingDto,
    #[serde(default = "default_true")]
    pub front_face_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ButtonDto {
    pub plate_id: PlateId,
    pub bounds: BoxDto,
    #[serde(default)]
    pub press_seconds: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlateDto {
    pub plate_id: PlateId,
    pub bounds: BoxDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoorDto {
    pub door_id: DoorId,
    #[serde(default)]
    pub required: Vec<PlateId>,
    #[serde(default)]
    pub stay_open_once_opened: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushableDto {
    pub id: PushableId,
    pub position: PointDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetDto {
    pub id: TargetId,
    pub position: PointDto,
    pub radius: f32,
    pub hp: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PickupDto {
    pub id: PickupId,
    pub bounds: BoxDto,
    #[serde(default)]
    pub restore: Option<f32>,
}

/// On-disk level layout. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LevelDto {
    #[serde(default)]
    pub walls: WallsDto,
    #[serde(default)]
    pub reflectors: Vec<ReflectorDto>,
    #[serde(default)]
    pub buttons: Vec<ButtonDto>,
    #[serde(default)]
    pub plates: Vec<PlateDto>,
    #[serde(default)]
    pub doors: Vec<DoorDto>,
    #[serde(default)]
    pub pushables: Vec<PushableDto>,
    #[serde(default)]
    pub targets: Vec<TargetDto>,
    #[serde(default)]
    pub recharge_zones: Vec<BoxDto>,
    #[serde(default)]
    pub pickups: Vec<PickupDto>,
    #[serde(default)]
    pub spawn_points: Vec<PointDto>,
}

fn ensure_unique<T: fmt::Display>(
    what: &str,
    ids: impl IntoIterator<Item = T>,
) -> Result<(), LevelError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.to_string()) {
            return Err(LevelError::Invalid(format!("duplicate {what} id {id}")));
        }
    }
    Ok(())
}

impl TryFrom<LevelDto> for Level {
    type Error = LevelError;

    fn try_from(dto: LevelDto) -> Result<Self, Self::Error> {
        ensure_unique("door", dto.doors.iter().map(|d| d.door_id))?;
        ensure_unique("reflector", dto.reflectors.iter().map(|r| r.id))?;
        ensure_unique("pushable", dto.pushables.iter().map(|p| p.id))?;
        ensure_unique("target", dto.targets.iter().map(|t| t.id))?;
        ensure_unique("pickup", dto.pickups.iter().map(|p| p.id))?;

        let all_boxes = dto
            .walls
            .boxes
            .iter()
            .chain(dto.reflectors.iter().map(|r| &r.bounds))
            .chain(dto.buttons.iter().map(|b| &b.bounds))
            .chain(dto.plates.iter().map(|p| &p.bounds))
            .chain(dto.recharge_zones.iter())
            .chain(dto.pickups.iter().map(|p| &p.bounds));
        for b in all_boxes {
            if !b.is_finite() {
                return Err(LevelError::Invalid("non-finite box coordinates".into()));
            }
        }
        for t in &dto.targets {
            if !(t.radius > 0.0 && t.hp > 0.0) {
                return Err(LevelError::Invalid(format!(
                    "target {} needs positive radius and hp",
                    t.id
                )));
            }
        }

        let mut walls = WallSet::default();
        for s in &dto.walls.segments {
            walls.push_segment(Segment::new(s.a.into(), s.b.into()));
        }
        for b in &dto.walls.boxes {
            walls.push_box(b.to_aabb());
        }

        Ok(Level {
            walls,
            reflectors: dto
                .reflectors
                .into_iter()
                .map(|r| Reflector {
                    id: r.id,
                    bounds: r.bounds.to_aabb(),
                    facing: r.facing.into(),
                    front_face_only: r.front_face_only,
                })
                .collect(),
            buttons: dto
                .buttons
                .into_iter()
                .map(|b| Button {
                    plate_id: b.plate_id,
                    bounds: b.bounds.to_aabb(),
                    press_seconds: b.press_seconds,
                })
                .collect(),
            plates: dto
                .plates
                .into_iter()
                .map(|p| Plate {
                    plate_id: p.plate_id,
                    bounds: p.bounds.to_aabb(),
                })
                .collect(),
            doors: dto
                .doors
                .into_iter()
                .map(|d| DoorConfig {
                    door_id: d.door_id,
                    required: d.required,
                    stay_open_once_opened: d.stay_open_once_opened,
                })
                .collect(),
            pushables: dto
                .pushables
                .into_iter()
                .map(|p| PushableSpawn {
                    id: p.id,
                    position: p.position.into(),
                })
                .collect(),
            targets: dto
                .targets
                .into_iter()
                .map(|t| TargetSpawn {
                    id: t.id,
                    position: t.position.into(),
                    radius: t.radius,
                    hp: t.hp,
                })
                .collect(),
            recharge_zones: dto.recharge_zones.iter().map(|b| b.to_aabb()).collect(),
            pickups: dto
                .pickups
                .into_iter()
                .map(|p| Pickup {
                    id: p.id,
                    bounds: p.bounds.to_aabb(),
                    restore: p.restore,
                })
                .collect(),
            spawn_points: dto.spawn_points.into_iter().map(Vec2::from).collect(),
        })
    }
}

/// Parses and validates level JSON. Unknown plate references are warned about, not rejected.
pub fn parse_level(json: &str) -> Result<Level, LevelError> {
    let dto: LevelDto = serde_json::from_str(json)?;
    let level = Level::try_from(dto)?;
    for (door_id, plate_id) in level.unknown_plate_refs() {
        warn!(door_id, plate_id, "door requires a plate no button or plate provides");
    }
    Ok(level)
}

pub fn load_level(path: &Path) -> Result<Level, LevelError> {
    let json = std::fs::read_to_string(path)?;
    let level = parse_level(&json)?;
    info!(
        path = %path.display(),
        walls = level.walls.len(),
        doors = level.doors.len(),
        "level loaded"
    );
    Ok(level)
}
