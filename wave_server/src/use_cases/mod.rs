// Use cases layer: application workflows for the wave server.

pub mod game;
pub mod observer;
pub mod replay;
pub mod runtime;
pub mod shooter;
pub mod types;
pub mod world;

pub use runtime::{WorldHandle, WorldSettings, spawn_world};
pub use types::{Broadcast, EmitterMode, GameEvent, ReplaySnapshot, WorldUpdate};
