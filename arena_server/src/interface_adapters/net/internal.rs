use crate::frameworks::config;
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::RoomSummaryDto;
use crate::interface_adapters::state::AppState;
use crate::use_cases::ArenaCommand;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tokio::sync::oneshot;

fn unavailable(error: &str) -> axum::response::Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

/// Lists live rooms with their phase, member count and scores.
pub async fn list_rooms_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    if state
        .arena_tx
        .send(ArenaCommand::ListRooms { reply })
        .await
        .is_err()
    {
        return unavailable("arena unavailable");
    }

    // The arena answers between ticks; a slow answer means it is overloaded.
    match tokio::time::timeout(config::ROOM_LIST_TIMEOUT, rx).await {
        Ok(Ok(summaries)) => {
            let rooms: Vec<RoomSummaryDto> = summaries.iter().map(RoomSummaryDto::from).collect();
            (StatusCode::OK, Json(rooms)).into_response()
        }
        Ok(Err(_)) => unavailable("arena unavailable"),
        Err(_) => {
            tracing::warn!("room listing timed out");
            unavailable("arena busy")
        }
    }
}

pub async fn health_handler() -> &'static str {
    "ok"
}
