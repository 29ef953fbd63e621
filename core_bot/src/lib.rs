//! Gridghost: an intercepting proxy that sits between a game client and its
//! server, decodes the length-prefixed protobuf stream in both directions,
//! mirrors the session state the frames describe, and drives an autonomous
//! farming loop that forges movement and harvest requests of its own.

pub mod bot;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod geometry;
pub mod map;
pub mod path;
pub mod relay;
pub mod schedule;
pub mod session;
pub mod timing;

pub use bot::FarmingBot;
pub use config::ProxyConfig;
pub use data::{DataError, GameData};
pub use dispatch::{Dispatcher, FrameDisposition};
pub use geometry::{Direction, GridPoint};
pub use map::GameMap;
pub use path::PathStep;
pub use relay::{Proxy, SessionRegistry};
pub use schedule::{BotHandle, OutboundSink};
pub use session::Session;
