//! Builders for the outbound frames the bot injects into the client->server
//! stream. Each helper returns a complete frame, length prefix included, so
//! callers can write it straight to the server socket.

use prost::Message;

use crate::envelope::GameMessage;
use crate::payloads::{
    InteractiveUseRequest, MapChangeRequest, MapMovementConfirmRequest, MapMovementRequest,
};
use crate::{type_urls, varint};

fn request_frame(type_url: &str, payload: impl Message) -> Vec<u8> {
    let message = GameMessage::request(type_url, payload.encode_to_vec());
    varint::frame(&message.encode_to_vec())
}

/// Movement request along an already-compressed path.
pub fn map_movement_request(key_cells: &[i32], map_id: i32, cautious: bool) -> Vec<u8> {
    request_frame(
        type_urls::MAP_MOVEMENT_REQUEST,
        MapMovementRequest {
            key_cells: key_cells.to_vec(),
            map_id,
            cautious,
        },
    )
}

/// Tells the server the client finished walking the accepted path.
pub fn map_movement_confirm_request() -> Vec<u8> {
    request_frame(
        type_urls::MAP_MOVEMENT_CONFIRM_REQUEST,
        MapMovementConfirmRequest {},
    )
}

pub fn map_change_request(map_id: i32, auto_pilot: bool) -> Vec<u8> {
    request_frame(
        type_urls::MAP_CHANGE_REQUEST,
        MapChangeRequest { map_id, auto_pilot },
    )
}

pub fn interactive_use_request(element_id: i32, skill_instance_uid: i32) -> Vec<u8> {
    request_frame(
        type_urls::INTERACTIVE_USE_REQUEST,
        InteractiveUseRequest {
            element_id,
            skill_instance_uid,
        },
    )
}
