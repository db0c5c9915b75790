// Network adapter modules split by client sockets vs HTTP query routes.

pub mod client;
pub mod internal;

pub use client::{spawn_world_serializers, ws_handler};
pub use internal::{door_handler, doors_handler};
