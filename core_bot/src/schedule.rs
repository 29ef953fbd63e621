//! Cross-thread coordination between the dispatcher (relay threads) and the
//! decision loop: one mutex over the session plus a sorted deadline list and
//! a condvar. The dispatcher holds the lock for a whole frame; the decision
//! loop sleeps on the condvar until either a deadline fires or a handler
//! marks the session updated.

use std::io::{self, Write};
use std::net::TcpStream;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, info, warn};

use wire_proto::forge;

use crate::session::Session;

/// Where forged frames go. The real sink is the server-side socket; tests
/// plug in a recorder.
pub trait OutboundSink: Send + Sync {
    fn send_frame(&self, frame: &[u8]) -> io::Result<()>;
}

impl OutboundSink for TcpStream {
    fn send_frame(&self, frame: &[u8]) -> io::Result<()> {
        let mut stream = self;
        stream.write_all(frame)
    }
}

/// State behind the session mutex.
pub struct Shared {
    pub session: Session,
    /// Pending wake-up deadlines, ascending.
    timers: Vec<Instant>,
}

pub struct BotHandle {
    shared: Mutex<Shared>,
    condvar: Condvar,
    sink: Box<dyn OutboundSink>,
}

impl BotHandle {
    pub fn new(session: Session, sink: Box<dyn OutboundSink>) -> BotHandle {
        BotHandle {
            shared: Mutex::new(Shared {
                session,
                timers: Vec::new(),
            }),
            condvar: Condvar::new(),
            sink,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().expect("session mutex poisoned")
    }

    /// Sweeps deadlines into the actor states, rebuilds the occupancy
    /// overlay, optionally arms a wake-up timer, and pokes the decision
    /// loop. Handlers call this after every state change.
    pub fn mark_updated(&self, shared: &mut Shared, wake_at: Option<Instant>) {
        let now = Instant::now();
        let session = &mut shared.session;

        for player in session.other_players.values_mut() {
            player.update_state(now);
        }
        for monster in session.monsters.values_mut() {
            monster.update_state(now);
        }

        if let Some(map) = session.map.as_mut() {
            map.clear_occupancy();
            let player_id = session.player.id;
            for actor in session.actors.values_mut() {
                if actor.id == player_id {
                    continue;
                }
                actor.update_state(now);
                if !actor.moving {
                    map.set_occupied(actor.current_cell, true);
                }
            }
        }

        if let Some(wake_at) = wake_at {
            if wake_at > now {
                let index = shared.timers.partition_point(|timer| *timer <= wake_at);
                shared.timers.insert(index, wake_at);
                if let Some(first) = shared.timers.first() {
                    debug!(
                        target: "gridghost::bot",
                        next_ms = first.saturating_duration_since(now).as_millis() as u64,
                        "next scheduled wake-up"
                    );
                }
            }
        }

        self.condvar.notify_one();
    }

    /// Wakes the decision loop without touching state (shutdown path).
    /// Taking the lock first orders the notify after any wait that is
    /// about to park; a notify against a waiter that holds the lock but
    /// has not parked yet would be lost.
    pub fn wake(&self) {
        let _guard = self.lock();
        self.condvar.notify_one();
    }

    /// Blocks until a handler marks the session updated or the earliest
    /// pending deadline fires. Already-passed deadlines are dropped before
    /// waiting. If the wait ends with the player overdue at its arrival
    /// deadline while the automation is driving, the movement confirmation
    /// the real client would have sent is forged here.
    pub fn wait_for_update(&self) -> MutexGuard<'_, Shared> {
        let mut guard = self.lock();

        let now = Instant::now();
        guard.timers.retain(|timer| *timer >= now);

        guard = match guard.timers.first().copied() {
            Some(deadline) => {
                let (guard, _timeout) = self
                    .condvar
                    .wait_timeout(guard, deadline.saturating_duration_since(now))
                    .expect("session mutex poisoned");
                guard
            }
            None => self.condvar.wait(guard).expect("session mutex poisoned"),
        };

        let now = Instant::now();
        let session = &guard.session;
        if session.active
            && session.player.moving
            && session.player.arrival.map_or(false, |arrival| arrival <= now)
        {
            info!(target: "gridghost::bot", "movement finished, confirming");
            self.send(&forge::map_movement_confirm_request(), "movement confirm");
        }

        guard
    }

    /// Map-change reset: new map incoming, old actors and timers are stale.
    pub fn clear_state(&self, shared: &mut Shared) {
        shared.session.reset();
        shared.timers.clear();
    }

    /// Walks the player toward `cell_id` along the client-accurate shortest
    /// path and forges the matching movement request. Diagonal steps are
    /// only used out of combat.
    pub fn move_to(&self, shared: &mut Shared, cell_id: i32) {
        let session = &mut shared.session;
        let map = match session.map.as_ref() {
            Some(map) => map,
            None => return,
        };

        let current_cell = session.player.current_cell;
        let path = map.shortest_path(current_cell, cell_id, !session.in_combat);
        if path.is_empty() {
            info!(
                target: "gridghost::bot",
                from = current_cell,
                to = cell_id,
                "no usable path, skipping move"
            );
            return;
        }

        info!(target: "gridghost::bot", from = current_cell, to = cell_id, "moving");

        // The arrival deadline stays unknown until the server echoes the
        // movement back; an unknown deadline never triggers a confirm.
        session.player.moving = true;
        session.player.target_cell = cell_id;
        session.player.arrival = None;

        let key_cells: Vec<i32> = path.iter().map(|step| step.to_compressed()).collect();
        let frame = forge::map_movement_request(&key_cells, map.id(), false);
        self.send(&frame, "movement request");
    }

    /// Forges the harvest request for a collectible and marks the player
    /// interacting with it.
    pub fn interact(&self, shared: &mut Shared, element_id: i32, skill_instance_uid: i32) {
        shared.session.player.set_interacting(element_id, None);
        info!(target: "gridghost::bot", element_id, skill_instance_uid, "interacting");
        self.send(
            &forge::interactive_use_request(element_id, skill_instance_uid),
            "interactive use request",
        );
    }

    /// Forges a map-change request toward a neighboring map.
    pub fn change_map(&self, shared: &mut Shared, map_id: i32) {
        if shared.session.map.is_none() {
            return;
        }
        info!(target: "gridghost::bot", map_id, "changing maps");
        shared.session.changing_maps = true;
        self.send(&forge::map_change_request(map_id, false), "map change request");
    }

    fn send(&self, frame: &[u8], what: &str) {
        if let Err(err) = self.sink.send_frame(frame) {
            warn!(target: "gridghost::bot", error = %err, "failed to send forged {what}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{self, GridPoint};
    use crate::map::{GameMap, MapCell};
    use crate::session::Actor;
    use prost::Message;
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;
    use wire_proto::envelope::{game_message, GameMessage};
    use wire_proto::{type_urls, FrameBuffer};

    #[derive(Default)]
    struct RecordingSink {
        frames: StdMutex<Vec<Vec<u8>>>,
    }

    impl OutboundSink for Arc<RecordingSink> {
        fn send_frame(&self, frame: &[u8]) -> io::Result<()> {
            self.frames
                .lock()
                .expect("sink mutex poisoned")
                .push(frame.to_vec());
            Ok(())
        }
    }

    fn open_map(map_id: i32) -> GameMap {
        let cells = (0..geometry::CELL_COUNT)
            .map(|cell_id| MapCell {
                cell_id,
                position: geometry::coord_from_cell(cell_id),
                walkable: true,
                ..MapCell::default()
            })
            .collect::<Vec<_>>();
        GameMap::new(map_id, GridPoint::new(0, 0), Arc::new(cells), Arc::new(Vec::new()))
    }

    fn request_type_url(frame: &[u8]) -> String {
        let mut frames = FrameBuffer::new();
        frames.extend(frame);
        let payload = frames
            .next_frame()
            .expect("well-formed frame")
            .expect("complete frame");
        let message = GameMessage::decode(payload.as_slice()).expect("decode");
        match message.content {
            Some(game_message::Content::Request(request)) => {
                request.content.expect("envelope").type_url
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    fn handle_with_sink() -> (BotHandle, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let handle = BotHandle::new(Session::new(69_420, "SneakySneaky"), Box::new(Arc::clone(&sink)));
        (handle, sink)
    }

    #[test]
    fn move_to_forges_a_movement_request_and_marks_the_player_moving() {
        let (handle, sink) = handle_with_sink();
        {
            let mut shared = handle.lock();
            shared.session.map = Some(open_map(42));
            shared.session.player.current_cell = 62;
            handle.move_to(&mut shared, 183);
            assert!(shared.session.player.moving);
            assert_eq!(shared.session.player.target_cell, 183);
            assert_eq!(shared.session.player.arrival, None);
        }
        let frames = sink.frames.lock().expect("sink mutex poisoned");
        assert_eq!(frames.len(), 1);
        assert_eq!(request_type_url(&frames[0]), type_urls::MAP_MOVEMENT_REQUEST);
    }

    #[test]
    fn move_to_without_a_map_or_path_sends_nothing() {
        let (handle, sink) = handle_with_sink();
        {
            let mut shared = handle.lock();
            handle.move_to(&mut shared, 183);
            shared.session.map = Some(open_map(42));
            shared.session.player.current_cell = 62;
            // Same-cell destination yields an empty path.
            handle.move_to(&mut shared, 62);
        }
        assert!(sink.frames.lock().expect("sink mutex poisoned").is_empty());
    }

    #[test]
    fn occupancy_rebuild_skips_the_player_and_movers() {
        let (handle, _sink) = handle_with_sink();
        let mut shared = handle.lock();
        shared.session.map = Some(open_map(42));
        shared.session.player.current_cell = 10;
        shared
            .session
            .actors
            .insert(69_420, Actor::generic(69_420, 10));
        shared.session.actors.insert(1, Actor::generic(1, 20));
        let mut mover = Actor::generic(2, 30);
        mover.begin_move(30, 31, Some(Instant::now() + Duration::from_secs(60)));
        shared.session.actors.insert(2, mover);

        handle.mark_updated(&mut shared, None);

        let map = shared.session.map.as_ref().expect("map");
        assert!(!map.is_occupied(10), "the player never blocks cells");
        assert!(map.is_occupied(20));
        assert!(!map.is_occupied(30), "movers do not block cells");
    }

    #[test]
    fn overdue_timer_wakes_the_loop_and_confirms_movement() {
        let (handle, sink) = handle_with_sink();
        {
            let mut shared = handle.lock();
            shared.session.active = true;
            // The arrival is already overdue; even a spurious wake-up must
            // produce the confirm.
            shared.session.player.begin_move(
                62,
                183,
                Some(Instant::now() - Duration::from_millis(1)),
            );
            let wake_at = Instant::now() + Duration::from_millis(10);
            handle.mark_updated(&mut shared, Some(wake_at));
        }

        // The wait returns via timeout; by then the arrival has passed and
        // the confirm goes out.
        let shared = handle.wait_for_update();
        drop(shared);
        let frames = sink.frames.lock().expect("sink mutex poisoned");
        assert_eq!(frames.len(), 1);
        assert_eq!(
            request_type_url(&frames[0]),
            type_urls::MAP_MOVEMENT_CONFIRM_REQUEST
        );
    }

    #[test]
    fn clear_state_drops_timers_and_map_population() {
        let (handle, _sink) = handle_with_sink();
        let mut shared = handle.lock();
        shared.session.actors.insert(1, Actor::generic(1, 20));
        shared.timers.push(Instant::now() + Duration::from_secs(60));
        handle.clear_state(&mut shared);
        assert!(shared.session.actors.is_empty());
        assert!(shared.timers.is_empty());
    }
}
