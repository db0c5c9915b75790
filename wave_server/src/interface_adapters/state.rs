use crate::interface_adapters::utils::ids::IdAllocator;
use crate::use_cases::WorldHandle;

pub struct AppState {
    // Channels into and out of the authoritative world task.
    pub world: WorldHandle,
    // Player ids handed out on Join (never SERVER_HOLDER).
    pub player_ids: IdAllocator,
    // Connection ids for log correlation before a player id exists.
    pub conn_ids: IdAllocator,
}
