// Simulation systems driven by the authoritative world loop.

pub mod arc_wave;
pub mod battery;
pub mod cone_wave;
pub mod deflection;
pub mod ownership;
pub mod puzzle;

pub use arc_wave::{ArcPhase, ArcStep, ArcWave, DespawnReason};
pub use battery::Battery;
pub use cone_wave::{ConeState, ConeWave};
pub use deflection::{DeflectionResolver, Facing, Reflector};
pub use ownership::{Handoff, PushableOwnership};
pub use puzzle::{DoorConfig, DoorGroup, DoorTransition, PuzzleDependencyEngine};
