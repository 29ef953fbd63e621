//! Frame dispatch. Every frame the relay pulls out of either stream lands
//! here: it is decoded, folded into the session, and then forwarded
//! byte-for-byte unless one of the suppression rules eats it. Decoding is
//! diagnostic; the forwarded bytes are always the original ones, so unknown
//! fields and unknown message kinds survive transit untouched.

use std::sync::Arc;
use std::time::{Duration, Instant};

use prost::Message;
use tracing::{debug, info, warn};

use wire_proto::envelope::{
    connection_request, connection_response, game_message, login_message, Envelope, GameMessage,
    LoginMessage,
};
use wire_proto::payloads::{
    actor_position_information, ActorPositionInformation, ChatChannelMessageEvent,
    ChatChannelMessageRequest, InteractiveElement, InteractiveElementUpdatedEvent,
    InteractiveUseEndedEvent, InteractiveUseErrorEvent, InteractiveUseRequest,
    InteractiveUsedEvent, MapChangeOrientationEvent, MapChangeRequest,
    MapComplementaryInformationEvent, MapCurrentEvent, MapMovementEvent, MapMovementRequest,
    ShowActorsEvent, StatedElement, StatedElementUpdatedEvent,
};
use wire_proto::{type_urls, varint};

use crate::data::GameData;
use crate::path::PathStep;
use crate::schedule::{BotHandle, Shared};
use crate::session::{Actor, Collectible, CollectibleSkill, CollectibleState};
use crate::timing;

/// What the relay should do with the frame it just handed over.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameDisposition {
    /// Send these bytes on to the peer.
    Forward(Vec<u8>),
    /// Drop the frame; the peer never sees it.
    Suppress,
}

pub struct Dispatcher {
    data: Arc<GameData>,
}

impl Dispatcher {
    pub fn new(data: Arc<GameData>) -> Dispatcher {
        Dispatcher { data }
    }

    /// Handles one decoded frame payload. The session lock is held for the
    /// whole frame so the decision loop never observes a half-applied
    /// update.
    pub fn handle_frame(&self, payload: &[u8], bot: &BotHandle) -> FrameDisposition {
        let mut shared = bot.lock();

        if !shared.session.connected {
            self.handle_login_frame(payload, &mut shared);
            return FrameDisposition::Forward(varint::frame(payload));
        }

        let message = match GameMessage::decode(payload) {
            Ok(message) => message,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "undecodable frame, forwarding as-is");
                return FrameDisposition::Forward(varint::frame(payload));
            }
        };

        let suppress = match &message.content {
            Some(game_message::Content::Request(request)) => match &request.content {
                Some(envelope) => self.handle_request(envelope, bot, &mut shared),
                None => false,
            },
            Some(game_message::Content::Response(response)) => {
                if let Some(envelope) = &response.content {
                    self.handle_response(envelope, bot, &mut shared);
                }
                false
            }
            Some(game_message::Content::Event(event)) => {
                if let Some(envelope) = &event.content {
                    self.handle_event(envelope, bot, &mut shared);
                }
                false
            }
            None => false,
        };

        if suppress {
            return FrameDisposition::Suppress;
        }

        // Round-trip check: a re-encode that differs from the wire bytes
        // means the local schema dropped something.
        let reencoded = message.encode_to_vec();
        if reencoded.len() != payload.len() {
            warn!(
                target: "gridghost::dispatch",
                wire_len = payload.len(),
                reencoded_len = reencoded.len(),
                "re-encoded frame length differs from the wire"
            );
        } else if let Some(position) = reencoded.iter().zip(payload).position(|(a, b)| a != b) {
            warn!(
                target: "gridghost::dispatch",
                position,
                "re-encoded frame differs from the wire"
            );
        }

        FrameDisposition::Forward(varint::frame(payload))
    }

    fn handle_login_frame(&self, payload: &[u8], shared: &mut Shared) {
        let message = match LoginMessage::decode(payload) {
            Ok(message) => message,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "undecodable login frame, forwarding as-is");
                return;
            }
        };

        match message.content {
            Some(login_message::Content::Request(request)) => {
                let what = match request.content {
                    Some(connection_request::Content::Ping(_)) => "ping",
                    Some(connection_request::Content::Identification(_)) => "identification",
                    Some(connection_request::Content::SelectServer(_)) => "select server",
                    None => "unknown",
                };
                info!(target: "gridghost::dispatch", "connection request: {what}");
            }
            Some(login_message::Content::Response(response)) => {
                let what = match response.content {
                    Some(connection_response::Content::Pong(_)) => "pong",
                    Some(connection_response::Content::Identification(_)) => "identification",
                    Some(connection_response::Content::SelectServer(_)) => {
                        // Past this point the streams carry game messages.
                        shared.session.connected = true;
                        "select server"
                    }
                    None => "unknown",
                };
                info!(target: "gridghost::dispatch", "connection response: {what}");
            }
            None => {}
        }
    }

    /// Returns true when the request must not reach the server.
    fn handle_request(&self, envelope: &Envelope, bot: &BotHandle, shared: &mut Shared) -> bool {
        let value = envelope.value.as_slice();
        match envelope.type_url.as_str() {
            type_urls::MAP_MOVEMENT_REQUEST => self.handle_movement_request(value, shared),
            type_urls::MAP_CHANGE_REQUEST => self.handle_map_change_request(value, shared),
            type_urls::MAP_MOVEMENT_CONFIRM_REQUEST => {
                self.handle_movement_confirm_request(bot, shared)
            }
            type_urls::CHAT_CHANNEL_MESSAGE_REQUEST => {
                self.handle_chat_request(value, bot, shared);
                false
            }
            type_urls::INTERACTIVE_USE_REQUEST => {
                self.handle_interactive_use_request(value, bot, shared);
                false
            }
            type_urls::MAP_INFORMATION_REQUEST => {
                debug!(target: "gridghost::dispatch", "map information request");
                false
            }
            type_urls::PING_REQUEST => {
                debug!(target: "gridghost::dispatch", "ping request");
                false
            }
            other => {
                debug!(
                    target: "gridghost::dispatch",
                    type_url = other,
                    len = value.len(),
                    "unhandled request"
                );
                false
            }
        }
    }

    fn handle_movement_request(&self, value: &[u8], shared: &mut Shared) -> bool {
        if shared.session.active {
            info!(
                target: "gridghost::dispatch",
                "ignoring client movement request, automation is driving; type 'stop' in chat to regain control"
            );
            return true;
        }

        let request = match MapMovementRequest::decode(value) {
            Ok(request) => request,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode movement request");
                return false;
            }
        };

        debug!(
            target: "gridghost::dispatch",
            map_id = request.map_id,
            cautious = request.cautious,
            key_cells = ?request.key_cells,
            "movement request"
        );

        // Recompute the client's path between the endpoints and compare;
        // a divergence means the local engine no longer matches the game.
        if let (Some(map), Some(first), Some(last)) = (
            shared.session.map.as_ref(),
            request.key_cells.first(),
            request.key_cells.last(),
        ) {
            let start = PathStep::from_compressed(*first).cell_id;
            let end = PathStep::from_compressed(*last).cell_id;
            let ours: Vec<i32> = map
                .shortest_path(start, end, true)
                .iter()
                .map(|step| step.to_compressed())
                .collect();
            if ours == request.key_cells {
                debug!(target: "gridghost::dispatch", "client path matches the local engine");
            } else {
                warn!(
                    target: "gridghost::dispatch",
                    client = ?request.key_cells,
                    local = ?ours,
                    "client path differs from the local engine"
                );
            }
        }

        false
    }

    fn handle_map_change_request(&self, value: &[u8], shared: &mut Shared) -> bool {
        if shared.session.active {
            info!(target: "gridghost::dispatch", "ignoring client map change request, automation is driving");
            return true;
        }

        match MapChangeRequest::decode(value) {
            Ok(request) => {
                info!(
                    target: "gridghost::dispatch",
                    map_id = request.map_id,
                    auto_pilot = request.auto_pilot,
                    "map change request"
                );
                shared.session.changing_maps = true;
            }
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode map change request");
            }
        }

        false
    }

    fn handle_movement_confirm_request(&self, bot: &BotHandle, shared: &mut Shared) -> bool {
        // When the automation drives, the scheduler sends its own confirm
        // at the predicted arrival time; the client's one is dropped.
        if shared.session.active {
            return true;
        }

        debug!(target: "gridghost::dispatch", "movement confirm request");
        let player = &mut shared.session.player;
        player.moving = false;
        player.current_cell = player.target_cell;
        player.arrival = None;
        bot.mark_updated(shared, None);
        false
    }

    fn handle_chat_request(&self, value: &[u8], bot: &BotHandle, shared: &mut Shared) {
        let request = match ChatChannelMessageRequest::decode(value) {
            Ok(request) => request,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode chat request");
                return;
            }
        };

        debug!(
            target: "gridghost::dispatch",
            channel = request.channel,
            content = %request.content,
            "chat request"
        );

        let updated = match request.content.as_str() {
            "start" => {
                info!(target: "gridghost::dispatch", "automation started from chat");
                shared.session.active = true;
                true
            }
            "stop" => {
                info!(target: "gridghost::dispatch", "automation stopped from chat");
                shared.session.active = false;
                true
            }
            "skip" => {
                info!(target: "gridghost::dispatch", "skipping the current map's collectibles");
                shared.session.collectibles.clear();
                true
            }
            content => match content.strip_prefix("mt ") {
                Some(cell) => match cell.trim().parse::<i32>() {
                    Ok(cell_id) => {
                        bot.move_to(shared, cell_id);
                        true
                    }
                    Err(_) => {
                        info!(target: "gridghost::dispatch", "unparsable mt command: {content}");
                        false
                    }
                },
                None => false,
            },
        };

        if updated {
            bot.mark_updated(shared, None);
        }
    }

    fn handle_interactive_use_request(&self, value: &[u8], bot: &BotHandle, shared: &mut Shared) {
        let request = match InteractiveUseRequest::decode(value) {
            Ok(request) => request,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode interactive use request");
                return;
            }
        };

        debug!(
            target: "gridghost::dispatch",
            element_id = request.element_id,
            skill_instance_uid = request.skill_instance_uid,
            "interactive use request"
        );

        shared.session.player.set_interacting(request.element_id, None);
        bot.mark_updated(shared, None);
    }

    fn handle_response(&self, envelope: &Envelope, bot: &BotHandle, shared: &mut Shared) {
        match envelope.type_url.as_str() {
            type_urls::MAP_MOVEMENT_CONFIRM_RESPONSE => {
                debug!(target: "gridghost::dispatch", "position confirmed");
                let player = &mut shared.session.player;
                player.moving = false;
                player.current_cell = player.target_cell;
                player.arrival = None;
                bot.mark_updated(shared, None);
            }
            other => {
                debug!(
                    target: "gridghost::dispatch",
                    type_url = other,
                    len = envelope.value.len(),
                    "unhandled response"
                );
            }
        }
    }

    fn handle_event(&self, envelope: &Envelope, bot: &BotHandle, shared: &mut Shared) {
        if envelope.type_url.ends_with(type_urls::COMBAT_START_SUFFIX) {
            info!(target: "gridghost::dispatch", "combat started, disabling automation");
            shared.session.active = false;
            shared.session.in_combat = true;
            return;
        }

        let value = envelope.value.as_slice();
        match envelope.type_url.as_str() {
            type_urls::MAP_MOVEMENT_EVENT => self.handle_movement_event(value, bot, shared),
            type_urls::MAP_CURRENT_EVENT => self.handle_map_current_event(value, bot, shared),
            type_urls::MAP_COMPLEMENTARY_INFORMATION_EVENT => {
                self.handle_complementary_information_event(value, bot, shared)
            }
            type_urls::MAP_CHANGE_ORIENTATION_EVENT => {
                self.handle_orientation_event(value, bot, shared)
            }
            type_urls::SHOW_ACTORS_EVENT => self.handle_show_actors_event(value, bot, shared),
            type_urls::INTERACTIVE_USED_EVENT => {
                self.handle_interactive_used_event(value, bot, shared)
            }
            type_urls::INTERACTIVE_USE_ENDED_EVENT => {
                self.handle_interactive_use_ended_event(value, bot, shared)
            }
            type_urls::INTERACTIVE_USE_ERROR_EVENT => {
                self.handle_interactive_use_error_event(value, bot, shared)
            }
            type_urls::INTERACTIVE_ELEMENT_UPDATED_EVENT => {
                self.handle_element_updated_event(value, bot, shared)
            }
            type_urls::STATED_ELEMENT_UPDATED_EVENT => {
                self.handle_stated_updated_event(value, bot, shared)
            }
            type_urls::CHAT_CHANNEL_MESSAGE_EVENT => match ChatChannelMessageEvent::decode(value) {
                Ok(event) => {
                    info!(
                        target: "gridghost::dispatch",
                        channel = event.channel,
                        sender = %event.sender_name,
                        "chat: {}",
                        event.content
                    );
                }
                Err(err) => {
                    warn!(target: "gridghost::dispatch", error = %err, "failed to decode chat event");
                }
            },
            type_urls::PONG_EVENT => debug!(target: "gridghost::dispatch", "pong event"),
            type_urls::TIME_EVENT => debug!(target: "gridghost::dispatch", "time event"),
            type_urls::CHARACTER_CHARACTERISTICS_EVENT => {
                debug!(target: "gridghost::dispatch", "character characteristics event");
            }
            type_urls::TREASURE_HUNT_EVENT | type_urls::TREASURE_HUNT_LEGENDARY_EVENT => {}
            other => {
                debug!(
                    target: "gridghost::dispatch",
                    type_url = other,
                    len = value.len(),
                    "unhandled event"
                );
            }
        }
    }

    fn handle_movement_event(&self, value: &[u8], bot: &BotHandle, shared: &mut Shared) {
        let event = match MapMovementEvent::decode(value) {
            Ok(event) => event,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode movement event");
                return;
            }
        };

        // A path shorter than two cells is not a move.
        let (first, last) = match (event.cells.first(), event.cells.last()) {
            (Some(first), Some(last)) if event.cells.len() >= 2 => (*first, *last),
            _ => return,
        };

        let arrival = Instant::now() + timing::movement_duration(&event.cells, event.cautious);
        let session = &mut shared.session;

        if session.player.id == event.actor_id {
            session.player.begin_move(first, last, Some(arrival));
        } else if let Some(other) = session.other_players.get_mut(&event.actor_id) {
            other.begin_move(first, last, Some(arrival));
        } else if let Some(monster) = session.monsters.get_mut(&event.actor_id) {
            monster.begin_move(first, last, Some(arrival));
        } else {
            debug!(
                target: "gridghost::dispatch",
                actor_id = event.actor_id,
                "movement event for an actor that is not on the map"
            );
            return;
        }

        if let Some(actor) = session.actors.get_mut(&event.actor_id) {
            actor.begin_move(first, last, Some(arrival));
        }

        bot.mark_updated(shared, Some(arrival));
    }

    fn handle_map_current_event(&self, value: &[u8], bot: &BotHandle, shared: &mut Shared) {
        let event = match MapCurrentEvent::decode(value) {
            Ok(event) => event,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode map current event");
                return;
            }
        };

        bot.clear_state(shared);

        match self.data.map(event.map_id) {
            Ok(map) => {
                info!(
                    target: "gridghost::dispatch",
                    map_id = event.map_id,
                    coordinates = ?map.coordinates(),
                    "now on a new map"
                );
                shared.session.map = Some(map);
            }
            Err(err) => {
                warn!(
                    target: "gridghost::dispatch",
                    map_id = event.map_id,
                    error = %err,
                    "entered a map with no local data"
                );
                shared.session.map = None;
            }
        }

        bot.mark_updated(shared, None);
    }

    fn handle_complementary_information_event(
        &self,
        value: &[u8],
        bot: &BotHandle,
        shared: &mut Shared,
    ) {
        let event = match MapComplementaryInformationEvent::decode(value) {
            Ok(event) => event,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode complementary information");
                return;
            }
        };

        let mut modified = register_actors(&event.actors, shared);
        modified |= register_interactive_elements(&event.interactive_elements, shared);
        modified |= register_stated_elements(&event.stated_elements, shared);

        // This event is the tail end of a map change.
        shared.session.changing_maps = false;

        if !event.obstacles.is_empty() {
            debug!(
                target: "gridghost::dispatch",
                obstacles = event.obstacles.len(),
                "map has obstacles"
            );
        }

        info!(
            target: "gridghost::dispatch",
            players = shared.session.other_players.len(),
            monsters = shared.session.monsters.len(),
            collectibles = shared.session.collectibles.len(),
            "map population"
        );

        if modified {
            bot.mark_updated(shared, None);
        }
    }

    fn handle_orientation_event(&self, value: &[u8], bot: &BotHandle, shared: &mut Shared) {
        let event = match MapChangeOrientationEvent::decode(value) {
            Ok(event) => event,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode orientation event");
                return;
            }
        };

        // An actor turning toward a map border is leaving it.
        shared.session.other_players.remove(&event.actor_id);
        shared.session.actors.remove(&event.actor_id);
        bot.mark_updated(shared, None);
    }

    fn handle_show_actors_event(&self, value: &[u8], bot: &BotHandle, shared: &mut Shared) {
        let event = match ShowActorsEvent::decode(value) {
            Ok(event) => event,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode show actors event");
                return;
            }
        };

        if register_actors(&event.actors, shared) {
            bot.mark_updated(shared, None);
        }
    }

    fn handle_interactive_used_event(&self, value: &[u8], bot: &BotHandle, shared: &mut Shared) {
        let event = match InteractiveUsedEvent::decode(value) {
            Ok(event) => event,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode interactive used event");
                return;
            }
        };

        // Only the element the player targeted matters; other actors use
        // elements all the time.
        if shared.session.player.interacting_element() != Some(event.element_id) {
            return;
        }

        // Durations come in tenths of a second; the value is
        // server-controlled, so a negative one clamps to zero.
        let deadline = Instant::now()
            + Duration::from_millis((event.duration.max(0) as u64).saturating_mul(100));
        shared
            .session
            .player
            .set_interacting(event.element_id, Some(deadline));
        bot.mark_updated(shared, Some(deadline));
    }

    fn handle_interactive_use_ended_event(
        &self,
        value: &[u8],
        bot: &BotHandle,
        shared: &mut Shared,
    ) {
        let event = match InteractiveUseEndedEvent::decode(value) {
            Ok(event) => event,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode interactive use ended event");
                return;
            }
        };

        debug!(
            target: "gridghost::dispatch",
            element_id = event.element_id,
            "interactive use ended"
        );

        let now = Instant::now();
        if let Some(deadline) = shared.session.player.interaction_deadline() {
            if deadline > now {
                debug!(
                    target: "gridghost::dispatch",
                    early_ms = deadline.saturating_duration_since(now).as_millis() as u64,
                    "use ended before the predicted deadline"
                );
            }
        }

        shared.session.player.clear_interacting();
        bot.mark_updated(shared, None);
    }

    fn handle_interactive_use_error_event(
        &self,
        value: &[u8],
        bot: &BotHandle,
        shared: &mut Shared,
    ) {
        let event = match InteractiveUseErrorEvent::decode(value) {
            Ok(event) => event,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode interactive use error event");
                return;
            }
        };

        info!(
            target: "gridghost::dispatch",
            element_id = event.element_id,
            "interactive use error"
        );

        if let Some(collectible) = shared.session.collectibles.get_mut(&event.element_id) {
            collectible.state = CollectibleState::Unknown;
        }

        shared.session.player.clear_interacting();
        bot.mark_updated(shared, None);
    }

    fn handle_element_updated_event(&self, value: &[u8], bot: &BotHandle, shared: &mut Shared) {
        let event = match InteractiveElementUpdatedEvent::decode(value) {
            Ok(event) => event,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode element updated event");
                return;
            }
        };

        let element = match event.element {
            Some(element) => element,
            None => return,
        };

        match shared.session.collectibles.get_mut(&element.id) {
            Some(collectible) => {
                collectible.enabled_skills = convert_skills(&element.enabled_skills);
                collectible.disabled_skills = convert_skills(&element.disabled_skills);
                debug!(
                    target: "gridghost::dispatch",
                    element_id = element.id,
                    element_type_id = collectible.element_type_id,
                    "collectible skills updated"
                );
                bot.mark_updated(shared, None);
            }
            None => {
                debug!(
                    target: "gridghost::dispatch",
                    element_id = element.id,
                    "update for an unknown interactive element"
                );
            }
        }
    }

    fn handle_stated_updated_event(&self, value: &[u8], bot: &BotHandle, shared: &mut Shared) {
        let event = match StatedElementUpdatedEvent::decode(value) {
            Ok(event) => event,
            Err(err) => {
                warn!(target: "gridghost::dispatch", error = %err, "failed to decode stated element updated event");
                return;
            }
        };

        let element = match event.element {
            Some(element) => element,
            None => return,
        };

        match shared.session.collectibles.get_mut(&element.id) {
            Some(collectible) => {
                collectible.state = CollectibleState::from_code(element.state);
                collectible.cell_id = element.cell_id;
                debug!(
                    target: "gridghost::dispatch",
                    element_id = element.id,
                    state = ?collectible.state,
                    "collectible state updated"
                );
                bot.mark_updated(shared, None);
            }
            None => {
                debug!(
                    target: "gridghost::dispatch",
                    element_id = element.id,
                    "state update for an unknown collectible"
                );
            }
        }
    }
}

fn convert_skills(skills: &[wire_proto::payloads::ElementSkill]) -> Vec<CollectibleSkill> {
    skills
        .iter()
        .map(|skill| CollectibleSkill {
            skill_id: skill.skill_id,
            skill_instance_uid: skill.skill_instance_uid,
        })
        .collect()
}

/// Folds a batch of actor registrations into the session. Returns whether
/// anything changed.
fn register_actors(actors: &[ActorPositionInformation], shared: &mut Shared) -> bool {
    use actor_position_information::Kind;

    let session = &mut shared.session;
    if actors.is_empty() || session.map.is_none() {
        return false;
    }

    let mut modified = false;
    for actor in actors {
        let kind = match &actor.kind {
            Some(kind) => kind,
            None => continue,
        };
        let cell_id = match actor.disposition.as_ref().and_then(|d| d.cell_id) {
            Some(cell_id) => cell_id,
            None => continue,
        };

        session
            .actors
            .entry(actor.actor_id)
            .or_insert_with(|| Actor::generic(actor.actor_id, cell_id));
        modified = true;

        match kind {
            Kind::Humanoid(humanoid) => {
                if actor.actor_id == session.player.id {
                    session.player.current_cell = cell_id;
                    continue;
                }
                let mut player = Actor::player(actor.actor_id, humanoid.name.clone());
                player.current_cell = cell_id;
                player.target_cell = cell_id;
                session.other_players.entry(actor.actor_id).or_insert(player);
            }
            Kind::MonsterGroup(group) => {
                let enemy_count = 1 + group.underlings.len() as u32;
                let total_level = group.main_creature.as_ref().map_or(0, |c| c.level)
                    + group.underlings.iter().map(|c| c.level).sum::<i32>();
                session
                    .monsters
                    .entry(actor.actor_id)
                    .or_insert_with(|| {
                        Actor::monster(actor.actor_id, cell_id, enemy_count, total_level)
                    });
            }
            Kind::Npc(_) => {
                session
                    .npcs
                    .entry(actor.actor_id)
                    .or_insert_with(|| Actor::generic(actor.actor_id, cell_id));
            }
            Kind::Portal(_) | Kind::Fighter(_) => {}
        }
    }

    modified
}

fn register_interactive_elements(elements: &[InteractiveElement], shared: &mut Shared) -> bool {
    let session = &mut shared.session;
    let mut modified = false;

    // Interactive elements arrive before the stated elements that carry
    // their cell and availability; register them with unknown state.
    for element in elements {
        if !element.on_current_map {
            continue;
        }
        session.collectibles.entry(element.id).or_insert(Collectible {
            id: element.id,
            element_type_id: element.element_type_id,
            cell_id: -1,
            state: CollectibleState::Unknown,
            enabled_skills: convert_skills(&element.enabled_skills),
            disabled_skills: convert_skills(&element.disabled_skills),
        });
        modified = true;
    }

    modified
}

fn register_stated_elements(elements: &[StatedElement], shared: &mut Shared) -> bool {
    let session = &mut shared.session;
    let mut modified = false;

    for element in elements {
        if !element.on_current_map {
            continue;
        }
        if let Some(collectible) = session.collectibles.get_mut(&element.id) {
            collectible.cell_id = element.cell_id;
            collectible.state = CollectibleState::from_code(element.state);
            modified = true;
        }
    }

    modified
}
