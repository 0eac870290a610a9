mod handler;
mod origin;

pub use origin::OriginPolicy;

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use pollroom_core::observability::GatewayMetricsSnapshot;
use pollroom_core::room::validate_room_name;
use pollroom_core::AppState;
use serde::Serialize;

pub fn gateway_router() -> Router<AppState> {
    Router::new()
        .route("/rooms/{room}", get(ws_upgrade))
        .route("/health", get(health))
}

async fn ws_upgrade(
    State(state): State<AppState>,
    Path(room): Path<String>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    if !OriginPolicy::new(&state.config).permits(&headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    if let Err(e) = validate_room_name(&room) {
        tracing::debug!("refusing websocket upgrade: {}", e);
        return StatusCode::BAD_REQUEST.into_response();
    }

    let max_size = state.config.max_message_size;
    ws.max_message_size(max_size)
        .max_frame_size(max_size)
        .on_upgrade(move |socket| handler::handle_connection(socket, state, room))
        .into_response()
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    rooms: usize,
    #[serde(flatten)]
    metrics: GatewayMetricsSnapshot,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        rooms: state.rooms.room_count(),
        metrics: state.metrics.snapshot(),
    })
}
