use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{DoorStateDto, EventDto};
use crate::interface_adapters::state::AppState;
use crate::use_cases::Broadcast;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

fn retained_doors(state: &AppState) -> Vec<DoorStateDto> {
    // Clone out of the watch so the borrow is not held while responding.
    let snapshot = state.world.replay_tx.borrow().clone();
    snapshot
        .events
        .iter()
        .filter(|e| matches!(e, Broadcast::DoorState { .. }))
        .filter_map(|e| match EventDto::from(e) {
            EventDto::DoorState(door) => Some(door),
            _ => None,
        })
        .collect()
}

/// Current state of every door, as a late joiner would receive it.
pub async fn doors_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(retained_doors(&state))
}

pub async fn door_handler(
    State(state): State<Arc<AppState>>,
    Path(door_id): Path<u32>,
) -> impl IntoResponse {
    match retained_doors(&state)
        .into_iter()
        .find(|d| d.door_id == door_id)
    {
        Some(door) => (StatusCode::OK, Json(door)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "door not found".to_string(),
            }),
        )
            .into_response(),
    }
}
