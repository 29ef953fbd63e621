//! The farming loop. One background thread per connection: it sleeps on
//! the scheduler, and whenever the session changes it picks the next thing
//! to do — harvest the closest wanted collectible, walk to it, or follow
//! the configured map tour when the current map is picked clean.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::config::ProxyConfig;
use crate::data::GameData;
use crate::geometry;
use crate::schedule::{BotHandle, OutboundSink};
use crate::session::{CollectibleState, Session};

/// One decision, computed under the session lock and then executed.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    Idle,
    Interact {
        element_id: i32,
        skill_instance_uid: i32,
    },
    MoveTo {
        cell_id: i32,
    },
    ChangeMap {
        map_id: i32,
    },
    Deactivate {
        reason: &'static str,
    },
}

pub struct FarmingBot {
    handle: Arc<BotHandle>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    tour: Vec<i32>,
    wanted: HashSet<i32>,
    data: Arc<GameData>,
}

impl FarmingBot {
    pub fn new(config: &ProxyConfig, data: Arc<GameData>, sink: Box<dyn OutboundSink>) -> FarmingBot {
        let session = Session::new(config.player_id, &config.player_name);
        FarmingBot {
            handle: Arc::new(BotHandle::new(session, sink)),
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
            tour: config.tour.clone(),
            wanted: config.wanted_resources.iter().copied().collect(),
            data,
        }
    }

    pub fn handle(&self) -> Arc<BotHandle> {
        Arc::clone(&self.handle)
    }

    /// Spawns the decision thread. Automation starts switched off; the
    /// operator enables it with the `start` chat command.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        info!(target: "gridghost::bot", "starting farming bot");
        {
            let mut shared = self.handle.lock();
            shared.session.active = false;
            shared.session.in_combat = false;
            shared.session.changing_maps = false;
        }

        let handle = Arc::clone(&self.handle);
        let running = Arc::clone(&self.running);
        let tour = self.tour.clone();
        let wanted = self.wanted.clone();
        let data = Arc::clone(&self.data);
        self.thread = Some(thread::spawn(move || {
            run_loop(&handle, &running, &tour, &wanted, &data);
        }));
    }

    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!(target: "gridghost::bot", "stopping farming bot");
        self.handle.wake();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for FarmingBot {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    handle: &BotHandle,
    running: &AtomicBool,
    tour: &[i32],
    wanted: &HashSet<i32>,
    data: &GameData,
) {
    let mut tour_index = 0usize;

    while running.load(Ordering::SeqCst) {
        let mut shared = handle.wait_for_update();

        if !running.load(Ordering::SeqCst) {
            break;
        }

        let session = &shared.session;
        if !session.active
            || session.map.is_none()
            || session.player.moving
            || session.player.is_interacting()
            || session.changing_maps
        {
            continue;
        }

        let action = decide(session, tour, &mut tour_index, wanted, data);
        match action {
            Action::Idle => {}
            Action::Interact {
                element_id,
                skill_instance_uid,
            } => handle.interact(&mut shared, element_id, skill_instance_uid),
            Action::MoveTo { cell_id } => handle.move_to(&mut shared, cell_id),
            Action::ChangeMap { map_id } => handle.change_map(&mut shared, map_id),
            Action::Deactivate { reason } => {
                warn!(target: "gridghost::bot", reason, "deactivating automation");
                shared.session.active = false;
            }
        }
    }

    info!(target: "gridghost::bot", "farming bot stopped");
}

fn decide(
    session: &Session,
    tour: &[i32],
    tour_index: &mut usize,
    wanted: &HashSet<i32>,
    data: &GameData,
) -> Action {
    let map = match session.map.as_ref() {
        Some(map) => map,
        None => return Action::Idle,
    };
    let current_cell = session.player.current_cell;

    // Closest harvestable collectible, by straight-line distance to the
    // cell we would harvest it from.
    let mut best = None;
    let mut closest_distance = f64::MAX;
    for collectible in session.collectibles.values() {
        if collectible.state != CollectibleState::Available
            || !wanted.contains(&collectible.element_type_id)
        {
            continue;
        }

        let harvest_cell = match map.nearest_approach_cell(current_cell, collectible.cell_id) {
            Some(cell) => cell,
            None => continue,
        };

        if harvest_cell == current_cell {
            // Already in position; nothing can beat that.
            best = Some((collectible, harvest_cell));
            break;
        }

        let distance = geometry::euclidean_distance(
            geometry::coord_from_cell(current_cell),
            geometry::coord_from_cell(harvest_cell),
        );
        if distance < closest_distance {
            closest_distance = distance;
            best = Some((collectible, harvest_cell));
        }
    }

    if let Some((collectible, harvest_cell)) = best {
        if harvest_cell == current_cell {
            info!(
                target: "gridghost::bot",
                element_id = collectible.id,
                "harvesting collectible"
            );
            return match collectible.enabled_skills.as_slice() {
                [skill] => Action::Interact {
                    element_id: collectible.id,
                    skill_instance_uid: skill.skill_instance_uid,
                },
                _ => {
                    info!(
                        target: "gridghost::bot",
                        element_id = collectible.id,
                        skills = collectible.enabled_skills.len(),
                        "no single usable skill for this collectible"
                    );
                    Action::Idle
                }
            };
        }

        info!(
            target: "gridghost::bot",
            element_id = collectible.id,
            element_type_id = collectible.element_type_id,
            cell_id = collectible.cell_id,
            harvest_cell,
            "walking to a collectible"
        );
        return Action::MoveTo {
            cell_id: harvest_cell,
        };
    }

    // Nothing left here; follow the tour to the next map.
    if tour.is_empty() {
        return Action::Deactivate {
            reason: "map is picked clean and no tour is configured",
        };
    }

    let mut target_map = tour[(*tour_index + 1) % tour.len()];
    if map.id() == target_map {
        *tour_index = (*tour_index + 1) % tour.len();
        target_map = tour[(*tour_index + 1) % tour.len()];
    }

    let edge = match map.edge_to(target_map) {
        Some(edge) => edge,
        None => {
            return Action::Deactivate {
                reason: "no route to the next map on the tour",
            }
        }
    };
    let transition = &edge.transitions[0];

    if current_cell == transition.cell_id {
        return Action::ChangeMap {
            map_id: transition.target_map_id,
        };
    }

    debug!(
        target: "gridghost::bot",
        from = ?map.coordinates(),
        to = ?data.coordinates(target_map),
        "touring toward the next map"
    );
    Action::MoveTo {
        cell_id: transition.cell_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GridPoint, CELL_COUNT};
    use crate::map::{GameMap, MapCell, Transition, WorldGraphEdge};
    use crate::session::{Collectible, CollectibleSkill, CollectibleState};
    use std::collections::HashMap;

    struct NullSink;

    impl OutboundSink for NullSink {
        fn send_frame(&self, _frame: &[u8]) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn open_map(map_id: i32, edges: Vec<WorldGraphEdge>) -> GameMap {
        let cells = (0..CELL_COUNT)
            .map(|cell_id| MapCell {
                cell_id,
                position: geometry::coord_from_cell(cell_id),
                walkable: true,
                ..MapCell::default()
            })
            .collect::<Vec<_>>();
        GameMap::new(
            map_id,
            GridPoint::new(0, 0),
            Arc::new(cells),
            Arc::new(edges),
        )
    }

    fn test_data() -> GameData {
        GameData::with_tables(HashMap::new(), HashMap::new(), HashMap::new())
    }

    fn collectible(id: i32, element_type_id: i32, cell_id: i32) -> Collectible {
        Collectible {
            id,
            element_type_id,
            cell_id,
            state: CollectibleState::Available,
            enabled_skills: vec![CollectibleSkill {
                skill_id: 1,
                skill_instance_uid: 77,
            }],
            disabled_skills: Vec::new(),
        }
    }

    fn session_on_map(map: GameMap) -> Session {
        let mut session = Session::new(69_420, "SneakySneaky");
        session.active = true;
        session.map = Some(map);
        session
    }

    #[test]
    fn stop_always_unblocks_the_idle_decision_loop() {
        // With no timers pending the loop parks on the condvar with no
        // timeout; stop() must get it out of that wait every time, even
        // when it fires while the loop holds the lock but has not parked
        // yet.
        for _ in 0..20 {
            let mut bot = FarmingBot::new(
                &ProxyConfig::default(),
                Arc::new(test_data()),
                Box::new(NullSink),
            );
            bot.start();
            bot.stop();
        }
    }

    #[test]
    fn walks_to_the_closest_wanted_collectible() {
        let mut session = session_on_map(open_map(1, Vec::new()));
        session.player.current_cell = 62;
        session.collectibles.insert(10, collectible(10, 1, 100));
        session.collectibles.insert(11, collectible(11, 1, 347));
        // Unwanted type, even though it is closer.
        session.collectibles.insert(12, collectible(12, 99, 76));

        let data = test_data();
        let wanted = HashSet::from([1]);
        let mut tour_index = 0;

        match decide(&session, &[], &mut tour_index, &wanted, &data) {
            Action::MoveTo { cell_id } => {
                // An approach cell adjacent to collectible 10, which is far
                // closer than 11.
                let target = geometry::coord_from_cell(100);
                let approach = geometry::coord_from_cell(cell_id);
                assert!(geometry::euclidean_distance(target, approach) < 2.0);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn harvests_when_standing_on_the_approach_cell() {
        let mut session = session_on_map(open_map(1, Vec::new()));
        session.collectibles.insert(10, collectible(10, 1, 100));
        let map = session.map.as_ref().expect("map");
        let approach = map
            .nearest_approach_cell(62, 100)
            .expect("approach cell on an open map");
        session.player.current_cell = approach;

        let data = test_data();
        let wanted = HashSet::from([1]);
        let mut tour_index = 0;

        assert_eq!(
            decide(&session, &[], &mut tour_index, &wanted, &data),
            Action::Interact {
                element_id: 10,
                skill_instance_uid: 77
            }
        );
    }

    #[test]
    fn missing_skill_blocks_the_harvest() {
        let mut session = session_on_map(open_map(1, Vec::new()));
        let mut broken = collectible(10, 1, 100);
        broken.enabled_skills.clear();
        session.collectibles.insert(10, broken);
        let approach = session
            .map
            .as_ref()
            .expect("map")
            .nearest_approach_cell(62, 100)
            .expect("approach cell");
        session.player.current_cell = approach;

        let data = test_data();
        let wanted = HashSet::from([1]);
        let mut tour_index = 0;

        assert_eq!(
            decide(&session, &[], &mut tour_index, &wanted, &data),
            Action::Idle
        );
    }

    #[test]
    fn empty_map_without_a_tour_deactivates() {
        let session = session_on_map(open_map(1, Vec::new()));
        let data = test_data();
        let mut tour_index = 0;

        assert!(matches!(
            decide(&session, &[], &mut tour_index, &HashSet::new(), &data),
            Action::Deactivate { .. }
        ));
    }

    #[test]
    fn tour_moves_to_the_transition_cell_then_changes_map() {
        let edge = WorldGraphEdge {
            target_map_id: 2,
            target_zone_id: 0,
            transitions: vec![Transition {
                kind: 0,
                direction: 0,
                skill_id: -1,
                target_map_id: 2,
                cell_id: 195,
            }],
        };
        let mut session = session_on_map(open_map(1, vec![edge]));
        session.player.current_cell = 62;

        let data = test_data();
        let tour = [1, 2];
        let mut tour_index = 0;

        assert_eq!(
            decide(&session, &tour, &mut tour_index, &HashSet::new(), &data),
            Action::MoveTo { cell_id: 195 }
        );

        session.player.current_cell = 195;
        assert_eq!(
            decide(&session, &tour, &mut tour_index, &HashSet::new(), &data),
            Action::ChangeMap { map_id: 2 }
        );
    }

    #[test]
    fn tour_advances_past_the_map_we_are_on() {
        let mut session = session_on_map(open_map(2, Vec::new()));
        session.player.current_cell = 62;

        let data = test_data();
        let tour = [1, 2, 3];
        // tour[(0 + 1) % 3] == 2, which is where we already are; the index
        // advances and the route lookup targets map 3. No edge exists, so
        // the automation shuts off rather than looping.
        let mut tour_index = 0;

        assert!(matches!(
            decide(&session, &tour, &mut tour_index, &HashSet::new(), &data),
            Action::Deactivate { .. }
        ));
        assert_eq!(tour_index, 1);
    }
}
