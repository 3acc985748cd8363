//! Inbound frame decoding and routing by message tag.

use log::debug;
use shared::{GameSnapshot, JoinedState, PlayerId, RoomSnapshot, ServerMessage};
use std::time::Instant;

/// Receiver of routed server messages.
pub trait MessageHandler {
    fn on_joined_room(
        &mut self,
        player_id: PlayerId,
        room_id: String,
        state: JoinedState,
        now: Instant,
    );
    fn on_operation_error(&mut self, message: String);
    fn on_room_update(&mut self, room: RoomSnapshot, now: Instant);
    fn on_game_update(&mut self, game: GameSnapshot, now: Instant);
    fn on_pong(&mut self) {}
}

/// Decodes one text frame. Malformed frames yield `None` and are dropped.
pub fn decode(text: &str) -> Option<ServerMessage> {
    match ServerMessage::from_json(text) {
        Ok(message) => Some(message),
        Err(e) => {
            debug!("Dropping malformed frame: {}", e);
            None
        }
    }
}

/// Routes a decoded message to exactly one handler method.
pub fn dispatch<H: MessageHandler>(message: ServerMessage, handler: &mut H, now: Instant) {
    match message {
        ServerMessage::JoinedRoom {
            player_id,
            room_id,
            state,
        } => handler.on_joined_room(player_id, room_id, state, now),
        ServerMessage::Error { message } => handler.on_operation_error(message),
        ServerMessage::RoomUpdate { room } => handler.on_room_update(room, now),
        ServerMessage::GameUpdate { game } => handler.on_game_update(game, now),
        ServerMessage::Pong => handler.on_pong(),
        ServerMessage::Unknown => debug!("Ignoring unknown message type"),
    }
}
