use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use pollroom_core::room::SnapshotFrame;
use pollroom_core::{AppState, Outcome, Room};
use pollroom_models::decode_command;
use std::num::NonZeroU32;
use uuid::Uuid;

type WsSink = SplitSink<WebSocket, Message>;

fn command_limiter(state: &AppState) -> DefaultDirectRateLimiter {
    let per_second = NonZeroU32::new(state.config.commands_per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(state.config.command_burst).unwrap_or(per_second);
    RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst))
}

async fn send_frame(sink: &mut WsSink, frame: &SnapshotFrame) -> bool {
    sink.send(Message::Text(frame.as_ref().into())).await.is_ok()
}

pub(crate) async fn handle_connection(socket: WebSocket, state: AppState, room_name: String) {
    let connection_id = Uuid::new_v4();
    let membership = match state.rooms.join(&room_name) {
        Ok(membership) => membership,
        Err(e) => {
            tracing::warn!(room = %room_name, %connection_id, "join failed: {}", e);
            return;
        }
    };
    state.metrics.connection_open();
    tracing::info!(room = %room_name, %connection_id, "participant joined");

    let room = membership.room;
    let mut updates = membership.updates;
    let (mut sink, mut stream) = socket.split();
    let limiter = command_limiter(&state);

    if send_frame(&mut sink, &membership.snapshot).await {
        loop {
            tokio::select! {
                update = room.next_frame(&mut updates) => match update {
                    Ok(Some(frame)) => {
                        if !send_frame(&mut sink, &frame).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => tracing::error!(room = %room_name, %connection_id, "snapshot encoding failed: {}", e),
                },
                inbound = stream.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if limiter.check().is_ok() {
                            handle_text(&state, &room, text.as_str());
                        } else {
                            state.metrics.command_throttled();
                            tracing::debug!(room = %room_name, %connection_id, "command throttled");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Binary frames carry no commands; pings are answered by axum.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(room = %room_name, %connection_id, "websocket read error: {}", e);
                        break;
                    }
                },
            }
        }
    }

    drop(updates);
    state.rooms.leave(&room_name);
    state.metrics.connection_close();
    tracing::info!(room = %room_name, %connection_id, "participant left");
}

/// Decode and apply one inbound frame. Nothing is ever sent back to the sender
/// directly; accepted commands reach everyone through the room broadcast.
fn handle_text(state: &AppState, room: &Room, text: &str) {
    let command = match decode_command(text) {
        Ok(Some(command)) => command,
        Ok(None) => {
            state.metrics.command_ignored();
            tracing::debug!(room = %room.name(), "ignoring unrecognized command type");
            return;
        }
        Err(e) => {
            state.metrics.command_malformed();
            tracing::debug!(room = %room.name(), "dropping inbound frame: {}", e);
            return;
        }
    };

    match room.dispatch(&command) {
        Ok(outcome) => {
            state.metrics.command_outcome(outcome);
            if let Outcome::Rejected(reason) = outcome {
                tracing::debug!(
                    room = %room.name(),
                    command = command.kind(),
                    poll_id = command.poll_id(),
                    ?reason,
                    "command rejected"
                );
            }
        }
        Err(e) => tracing::error!(room = %room.name(), "failed to resync room state: {}", e),
    }
}
