//! Envelope schema: every frame is either a `LoginMessage` (connection
//! phase) or a `GameMessage` (after server selection). Both are tagged
//! unions; game payloads travel as an `Any`-style pair of type identifier
//! and opaque bytes so unknown message kinds pass through untouched.

use prost::Message;

/// `Any`-style wrapper: a type identifier plus the encoded payload bytes.
#[derive(Clone, PartialEq, Message)]
pub struct Envelope {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Request {
    #[prost(message, optional, tag = "1")]
    pub content: Option<Envelope>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Response {
    #[prost(message, optional, tag = "1")]
    pub content: Option<Envelope>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Event {
    #[prost(message, optional, tag = "1")]
    pub content: Option<Envelope>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GameMessage {
    #[prost(oneof = "game_message::Content", tags = "1, 2, 3")]
    pub content: Option<game_message::Content>,
}

pub mod game_message {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Content {
        #[prost(message, tag = "1")]
        Request(super::Request),
        #[prost(message, tag = "2")]
        Response(super::Response),
        #[prost(message, tag = "3")]
        Event(super::Event),
    }
}

// Connection-phase messages. Decoded for logging and the server-selection
// transition only; their inner fields are irrelevant to the proxy, so they
// are modelled as empty markers. Unknown fields survive transit through the
// re-encode length check in the dispatcher, which forwards the original
// bytes on any mismatch.

#[derive(Clone, PartialEq, Message)]
pub struct PingRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct IdentificationRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct SelectServerRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct PongResponse {}

#[derive(Clone, PartialEq, Message)]
pub struct IdentificationResponse {}

#[derive(Clone, PartialEq, Message)]
pub struct SelectServerResponse {}

#[derive(Clone, PartialEq, Message)]
pub struct ConnectionRequest {
    #[prost(oneof = "connection_request::Content", tags = "1, 2, 3")]
    pub content: Option<connection_request::Content>,
}

pub mod connection_request {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Content {
        #[prost(message, tag = "1")]
        Ping(super::PingRequest),
        #[prost(message, tag = "2")]
        Identification(super::IdentificationRequest),
        #[prost(message, tag = "3")]
        SelectServer(super::SelectServerRequest),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct ConnectionResponse {
    #[prost(oneof = "connection_response::Content", tags = "1, 2, 3")]
    pub content: Option<connection_response::Content>,
}

pub mod connection_response {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Content {
        #[prost(message, tag = "1")]
        Pong(super::PongResponse),
        #[prost(message, tag = "2")]
        Identification(super::IdentificationResponse),
        #[prost(message, tag = "3")]
        SelectServer(super::SelectServerResponse),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct LoginMessage {
    #[prost(oneof = "login_message::Content", tags = "1, 2")]
    pub content: Option<login_message::Content>,
}

pub mod login_message {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Content {
        #[prost(message, tag = "1")]
        Request(super::ConnectionRequest),
        #[prost(message, tag = "2")]
        Response(super::ConnectionResponse),
    }
}

impl GameMessage {
    /// Builds a request envelope around already-encoded payload bytes.
    pub fn request(type_url: &str, value: Vec<u8>) -> Self {
        GameMessage {
            content: Some(game_message::Content::Request(Request {
                content: Some(Envelope {
                    type_url: type_url.to_owned(),
                    value,
                }),
            })),
        }
    }
}
