//! Wire-level building blocks for the Gridghost proxy: the uvarint length
//! prefix and frame cursor, the `GameMessage`/`LoginMessage` envelope schema,
//! the payload messages the dispatcher understands, and forge helpers that
//! build outbound frames from scratch.
//!
//! Messages are hand-written `prost` derives; there is no build-time codegen.

pub mod envelope;
pub mod forge;
pub mod payloads;
pub mod varint;

pub use envelope::{
    game_message, login_message, Envelope, Event, GameMessage, LoginMessage, Request, Response,
};
pub use varint::{decode_uvarint, encode_uvarint, frame, FrameBuffer, VarintError};

/// Type identifiers carried in [`Envelope::type_url`], grouped by the
/// envelope branch they travel in.
pub mod type_urls {
    // Client -> server requests.
    pub const MAP_MOVEMENT_REQUEST: &str = "type.ankama.com/ifv";
    pub const MAP_MOVEMENT_CONFIRM_REQUEST: &str = "type.ankama.com/ifx";
    pub const MAP_CHANGE_REQUEST: &str = "type.ankama.com/iga";
    pub const MAP_INFORMATION_REQUEST: &str = "type.ankama.com/ige";
    pub const CHAT_CHANNEL_MESSAGE_REQUEST: &str = "type.ankama.com/iyb";
    pub const INTERACTIVE_USE_REQUEST: &str = "type.ankama.com/hzk";
    pub const PING_REQUEST: &str = "type.ankama.com/iwu";

    // Server -> client responses.
    pub const MAP_MOVEMENT_CONFIRM_RESPONSE: &str = "type.ankama.com/egj";

    // Server -> client events.
    pub const MAP_MOVEMENT_EVENT: &str = "type.ankama.com/igg";
    pub const MAP_CHANGE_ORIENTATION_EVENT: &str = "type.ankama.com/igh";
    pub const MAP_CURRENT_EVENT: &str = "type.ankama.com/igi";
    pub const MAP_COMPLEMENTARY_INFORMATION_EVENT: &str = "type.ankama.com/igr";
    pub const SHOW_ACTORS_EVENT: &str = "type.ankama.com/igs";
    pub const INTERACTIVE_USED_EVENT: &str = "type.ankama.com/hzj";
    pub const INTERACTIVE_USE_ENDED_EVENT: &str = "type.ankama.com/hzn";
    pub const INTERACTIVE_USE_ERROR_EVENT: &str = "type.ankama.com/hzl";
    pub const INTERACTIVE_ELEMENT_UPDATED_EVENT: &str = "type.ankama.com/hzq";
    pub const STATED_ELEMENT_UPDATED_EVENT: &str = "type.ankama.com/hzr";
    pub const TREASURE_HUNT_EVENT: &str = "type.ankama.com/hem";
    pub const TREASURE_HUNT_LEGENDARY_EVENT: &str = "type.ankama.com/hzm";
    pub const CHAT_CHANNEL_MESSAGE_EVENT: &str = "type.ankama.com/iyc";
    pub const PONG_EVENT: &str = "type.ankama.com/iwv";
    pub const TIME_EVENT: &str = "type.ankama.com/jps";
    pub const CHARACTER_CHARACTERISTICS_EVENT: &str = "type.ankama.com/iyp";

    /// Any event whose type identifier ends with this suffix announces the
    /// start of a fight.
    pub const COMBAT_START_SUFFIX: &str = "jaz";
}
