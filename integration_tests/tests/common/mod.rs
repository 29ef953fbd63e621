#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use prost::Message;

use core_bot::geometry::{self, GridPoint, CELL_COUNT};
use core_bot::map::{GameMap, MapCell};
use core_bot::{GameData, OutboundSink};
use wire_proto::envelope::{game_message, Envelope, Event, GameMessage, Request, Response};
use wire_proto::{varint, FrameBuffer};

/// Outbound sink that records forged frames instead of writing to a socket.
#[derive(Default)]
pub struct RecordingSink {
    frames: Mutex<Vec<Vec<u8>>>,
}

impl RecordingSink {
    pub fn new() -> Arc<RecordingSink> {
        Arc::new(RecordingSink::default())
    }

    pub fn take_frames(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.frames.lock().expect("sink mutex poisoned"))
    }

    /// Polls until a frame shows up or the timeout passes.
    pub fn wait_for_frame(&self, timeout: Duration) -> Option<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut frames = self.frames.lock().expect("sink mutex poisoned");
                if !frames.is_empty() {
                    return Some(frames.remove(0));
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }
}

/// Local wrapper so the foreign `OutboundSink` trait can be implemented
/// for a shared `RecordingSink` without violating the orphan rules.
pub struct SinkHandle(pub Arc<RecordingSink>);

impl OutboundSink for SinkHandle {
    fn send_frame(&self, frame: &[u8]) -> io::Result<()> {
        self.0
            .frames
            .lock()
            .expect("sink mutex poisoned")
            .push(frame.to_vec());
        Ok(())
    }
}

/// A fully walkable, flat, single-zone cell table.
pub fn open_cells() -> Arc<Vec<MapCell>> {
    Arc::new(
        (0..CELL_COUNT)
            .map(|cell_id| MapCell {
                cell_id,
                position: geometry::coord_from_cell(cell_id),
                walkable: true,
                ..MapCell::default()
            })
            .collect(),
    )
}

/// A cell table where only the listed cells are walkable.
pub fn corridor_cells(walkable: &[i32]) -> Arc<Vec<MapCell>> {
    Arc::new(
        (0..CELL_COUNT)
            .map(|cell_id| MapCell {
                cell_id,
                position: geometry::coord_from_cell(cell_id),
                walkable: walkable.contains(&cell_id),
                ..MapCell::default()
            })
            .collect(),
    )
}

pub fn open_map(map_id: i32) -> GameMap {
    GameMap::new(
        map_id,
        GridPoint::new(0, 0),
        open_cells(),
        Arc::new(Vec::new()),
    )
}

/// Game data with in-memory cell tables and no world graph.
pub fn data_with_maps(maps: &[(i32, Arc<Vec<MapCell>>)]) -> Arc<GameData> {
    let cells = maps
        .iter()
        .map(|(map_id, cells)| (*map_id, Arc::clone(cells)))
        .collect::<HashMap<_, _>>();
    Arc::new(GameData::with_tables(HashMap::new(), HashMap::new(), cells))
}

pub fn request_frame(type_url: &str, payload: &impl Message) -> Vec<u8> {
    let message = GameMessage {
        content: Some(game_message::Content::Request(Request {
            content: Some(envelope(type_url, payload)),
        })),
    };
    varint::frame(&message.encode_to_vec())
}

pub fn response_frame(type_url: &str, payload: &impl Message) -> Vec<u8> {
    let message = GameMessage {
        content: Some(game_message::Content::Response(Response {
            content: Some(envelope(type_url, payload)),
        })),
    };
    varint::frame(&message.encode_to_vec())
}

pub fn event_frame(type_url: &str, payload: &impl Message) -> Vec<u8> {
    let message = GameMessage {
        content: Some(game_message::Content::Event(Event {
            content: Some(envelope(type_url, payload)),
        })),
    };
    varint::frame(&message.encode_to_vec())
}

fn envelope(type_url: &str, payload: &impl Message) -> Envelope {
    Envelope {
        type_url: type_url.to_owned(),
        value: payload.encode_to_vec(),
    }
}

/// Strips the length prefix from a framed message.
pub fn unframe(frame: &[u8]) -> Vec<u8> {
    let mut frames = FrameBuffer::new();
    frames.extend(frame);
    frames
        .next_frame()
        .expect("well-formed frame")
        .expect("complete frame")
}

/// Type identifier of the request inside a framed forged message.
pub fn request_type_url(frame: &[u8]) -> String {
    let mut frames = FrameBuffer::new();
    frames.extend(frame);
    let payload = frames
        .next_frame()
        .expect("well-formed frame")
        .expect("complete frame");
    let message = GameMessage::decode(payload.as_slice()).expect("valid game message");
    match message.content {
        Some(game_message::Content::Request(request)) => {
            request.content.expect("request envelope").type_url
        }
        other => panic!("not a request frame: {other:?}"),
    }
}

/// The decoded request payload inside a framed forged message, checked
/// against the expected type identifier.
pub fn decode_request<T: Message + Default>(frame: &[u8], type_url: &str) -> T {
    let mut frames = FrameBuffer::new();
    frames.extend(frame);
    let payload = frames
        .next_frame()
        .expect("well-formed frame")
        .expect("complete frame");
    let message = GameMessage::decode(payload.as_slice()).expect("valid game message");
    match message.content {
        Some(game_message::Content::Request(request)) => {
            let envelope = request.content.expect("request envelope");
            assert_eq!(envelope.type_url, type_url);
            T::decode(envelope.value.as_slice()).expect("valid request payload")
        }
        other => panic!("not a request frame: {other:?}"),
    }
}
