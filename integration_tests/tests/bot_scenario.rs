mod common;

use std::sync::Arc;
use std::time::Duration;

use common::RecordingSink;
use core_bot::geometry;
use core_bot::path::PathStep;
use core_bot::{BotHandle, Dispatcher, FarmingBot, ProxyConfig};
use wire_proto::payloads::{
    actor_position_information, ActorDisposition, ActorPositionInformation,
    ChatChannelMessageRequest, ElementSkill, HumanoidInfo, InteractiveElement,
    InteractiveUseRequest, MapComplementaryInformationEvent, MapCurrentEvent, MapMovementRequest,
    StatedElement,
};
use wire_proto::type_urls;

const PLAYER_ID: i64 = 69_420;

fn start_bot() -> (FarmingBot, Arc<BotHandle>, Arc<RecordingSink>, Dispatcher) {
    let data = common::data_with_maps(&[(7, common::open_cells())]);
    let sink = RecordingSink::new();
    let mut bot = FarmingBot::new(
        &ProxyConfig::default(),
        Arc::clone(&data),
        Box::new(common::SinkHandle(Arc::clone(&sink))),
    );
    bot.start();
    let handle = bot.handle();
    handle.lock().session.connected = true;
    let dispatcher = Dispatcher::new(data);
    (bot, handle, sink, dispatcher)
}

fn feed(dispatcher: &Dispatcher, handle: &BotHandle, frame: &[u8]) {
    dispatcher.handle_frame(&common::unframe(frame), handle);
}

fn map_setup_frames(player_cell: i32, collectible_cell: i32) -> Vec<Vec<u8>> {
    let complementary = MapComplementaryInformationEvent {
        map_id: 7,
        actors: vec![ActorPositionInformation {
            actor_id: PLAYER_ID,
            disposition: Some(ActorDisposition {
                cell_id: Some(player_cell),
            }),
            kind: Some(actor_position_information::Kind::Humanoid(HumanoidInfo {
                name: "SneakySneaky".to_owned(),
            })),
        }],
        interactive_elements: vec![InteractiveElement {
            id: 9000,
            element_type_id: 1,
            enabled_skills: vec![ElementSkill {
                skill_id: 1,
                skill_instance_uid: 424,
            }],
            disabled_skills: Vec::new(),
            on_current_map: true,
        }],
        stated_elements: vec![StatedElement {
            id: 9000,
            cell_id: collectible_cell,
            state: 0,
            on_current_map: true,
        }],
        obstacles: Vec::new(),
    };

    vec![
        common::event_frame(type_urls::MAP_CURRENT_EVENT, &MapCurrentEvent { map_id: 7 }),
        common::event_frame(
            type_urls::MAP_COMPLEMENTARY_INFORMATION_EVENT,
            &complementary,
        ),
        common::request_frame(
            type_urls::CHAT_CHANNEL_MESSAGE_REQUEST,
            &ChatChannelMessageRequest {
                channel: 0,
                content: "start".to_owned(),
            },
        ),
    ]
}

#[test]
fn bot_walks_toward_an_available_collectible() {
    let (mut bot, handle, sink, dispatcher) = start_bot();

    for frame in map_setup_frames(62, 100) {
        feed(&dispatcher, &handle, &frame);
    }

    let forged = sink
        .wait_for_frame(Duration::from_secs(2))
        .expect("the bot should forge a movement request");
    let request: MapMovementRequest =
        common::decode_request(&forged, type_urls::MAP_MOVEMENT_REQUEST);

    assert_eq!(request.map_id, 7);
    assert!(!request.cautious);
    let last_key = *request.key_cells.last().expect("non-empty path");
    let destination = PathStep::from_compressed(last_key).cell_id;
    // The walk ends next to the collectible, not on top of it.
    assert_ne!(destination, 100);
    assert!(
        geometry::euclidean_distance(
            geometry::coord_from_cell(destination),
            geometry::coord_from_cell(100),
        ) < 2.0
    );
    assert!(handle.lock().session.player.moving);

    bot.stop();
}

#[test]
fn bot_harvests_when_already_in_position() {
    let (mut bot, handle, sink, dispatcher) = start_bot();

    let approach = {
        let data = common::data_with_maps(&[(7, common::open_cells())]);
        let map = data.map(7).expect("fixture map");
        map.nearest_approach_cell(62, 100)
            .expect("approach cell on an open map")
    };

    for frame in map_setup_frames(approach, 100) {
        feed(&dispatcher, &handle, &frame);
    }

    let forged = sink
        .wait_for_frame(Duration::from_secs(2))
        .expect("the bot should forge a harvest request");
    let request: InteractiveUseRequest =
        common::decode_request(&forged, type_urls::INTERACTIVE_USE_REQUEST);
    assert_eq!(request.element_id, 9000);
    assert_eq!(request.skill_instance_uid, 424);
    assert!(handle.lock().session.player.is_interacting());

    bot.stop();
}

#[test]
fn bot_with_nothing_to_do_deactivates_instead_of_spinning() {
    let (mut bot, handle, sink, dispatcher) = start_bot();

    // A map with no collectibles and no tour configured.
    feed(
        &dispatcher,
        &handle,
        &common::event_frame(type_urls::MAP_CURRENT_EVENT, &MapCurrentEvent { map_id: 7 }),
    );
    feed(
        &dispatcher,
        &handle,
        &common::request_frame(
            type_urls::CHAT_CHANNEL_MESSAGE_REQUEST,
            &ChatChannelMessageRequest {
                channel: 0,
                content: "start".to_owned(),
            },
        ),
    );

    // The loop should switch itself off rather than forging anything.
    assert!(sink.wait_for_frame(Duration::from_millis(300)).is_none());
    assert!(!handle.lock().session.active);

    bot.stop();
}
