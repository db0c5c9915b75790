// Domain layer: core simulation types and rules.

pub mod geometry;
pub mod level;
pub mod occlusion;
pub mod overlap;
pub mod ports;
pub mod replicated;
pub mod state;
pub mod tuning;

pub use geometry::{Aabb, Polygon, Segment};
pub use level::Level;
pub use occlusion::WallSet;
pub use ports::{PositionProvider, ResourcePool, TickClock, WallQuery};
pub use replicated::Replicated;
pub use state::{
    ArcId, DoorId, PickupId, PlateId, PlayerId, PushableId, SERVER_HOLDER, SimClock, SourceId,
    TargetId,
};
