//! Per-connection session state: the tracked actors, the collectibles on
//! the current map, and the automation flags. Everything here is owned by
//! the session mutex in [`crate::schedule::BotHandle`]; nothing is shared
//! across connections.

use std::collections::HashMap;
use std::time::Instant;

use crate::map::GameMap;

pub type ActorId = i64;

/// Element type ids of the resources the default configuration farms.
pub mod element_types {
    pub const ASH: i32 = 1;
    pub const WHEAT: i32 = 38;
    pub const BARLEY: i32 = 43;
    pub const NETTLE: i32 = 254;
}

/// Kind-specific actor data. Every tracked actor also lives in the generic
/// set; the kind is what the registration events knew about it.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ActorKind {
    #[default]
    Generic,
    Player {
        name: String,
        interacting: bool,
        interacting_element: i32,
        interaction_deadline: Option<Instant>,
    },
    Monster {
        enemy_count: u32,
        total_level: i32,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub current_cell: i32,
    pub target_cell: i32,
    pub moving: bool,
    /// Set while `moving`; `None` means the deadline is not known yet (the
    /// server has not echoed the path back).
    pub arrival: Option<Instant>,
    pub kind: ActorKind,
}

impl Actor {
    pub fn generic(id: ActorId, current_cell: i32) -> Self {
        Actor {
            id,
            current_cell,
            target_cell: current_cell,
            ..Actor::default()
        }
    }

    pub fn player(id: ActorId, name: String) -> Self {
        Actor {
            id,
            kind: ActorKind::Player {
                name,
                interacting: false,
                interacting_element: 0,
                interaction_deadline: None,
            },
            ..Actor::default()
        }
    }

    pub fn monster(id: ActorId, current_cell: i32, enemy_count: u32, total_level: i32) -> Self {
        Actor {
            id,
            current_cell,
            target_cell: current_cell,
            kind: ActorKind::Monster {
                enemy_count,
                total_level,
            },
            ..Actor::default()
        }
    }

    /// Folds passed deadlines into the state: a mover whose arrival time has
    /// passed snaps to its target cell, a player whose interaction deadline
    /// has passed stops interacting. Idempotent; applying a deadline twice
    /// changes nothing.
    pub fn update_state(&mut self, now: Instant) {
        if let ActorKind::Player {
            interacting,
            interaction_deadline,
            ..
        } = &mut self.kind
        {
            if *interacting && interaction_deadline.map_or(false, |deadline| deadline <= now) {
                *interacting = false;
                *interaction_deadline = None;
            }
        }
        if self.moving && self.arrival.map_or(false, |arrival| arrival <= now) {
            self.current_cell = self.target_cell;
            self.moving = false;
            self.arrival = None;
        }
    }

    pub fn begin_move(&mut self, from_cell: i32, to_cell: i32, arrival: Option<Instant>) {
        self.moving = true;
        self.current_cell = from_cell;
        self.target_cell = to_cell;
        self.arrival = arrival;
    }

    pub fn is_interacting(&self) -> bool {
        matches!(self.kind, ActorKind::Player { interacting, .. } if interacting)
    }

    pub fn set_interacting(&mut self, element_id: i32, deadline: Option<Instant>) {
        if let ActorKind::Player {
            interacting,
            interacting_element,
            interaction_deadline,
            ..
        } = &mut self.kind
        {
            *interacting = true;
            *interacting_element = element_id;
            *interaction_deadline = deadline;
        }
    }

    pub fn clear_interacting(&mut self) {
        if let ActorKind::Player {
            interacting,
            interaction_deadline,
            ..
        } = &mut self.kind
        {
            *interacting = false;
            *interaction_deadline = None;
        }
    }

    pub fn interacting_element(&self) -> Option<i32> {
        match self.kind {
            ActorKind::Player {
                interacting_element,
                ..
            } => Some(interacting_element),
            _ => None,
        }
    }

    pub fn interaction_deadline(&self) -> Option<Instant> {
        match self.kind {
            ActorKind::Player {
                interaction_deadline,
                ..
            } => interaction_deadline,
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectibleState {
    Available,
    InCooldown,
    Unknown,
}

impl CollectibleState {
    pub fn from_code(code: i32) -> CollectibleState {
        match code {
            0 => CollectibleState::Available,
            1 => CollectibleState::InCooldown,
            _ => CollectibleState::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectibleSkill {
    pub skill_id: i32,
    pub skill_instance_uid: i32,
}

/// An interactive element we may want to harvest. Registered from the
/// interactive-element list; the cell and availability arrive separately
/// with the stated-element list.
#[derive(Clone, Debug)]
pub struct Collectible {
    pub id: i32,
    pub element_type_id: i32,
    pub cell_id: i32,
    pub state: CollectibleState,
    pub enabled_skills: Vec<CollectibleSkill>,
    pub disabled_skills: Vec<CollectibleSkill>,
}

/// Everything the proxy knows about one game session.
#[derive(Debug, Default)]
pub struct Session {
    /// The automation switch, toggled by the `start`/`stop` chat commands.
    pub active: bool,
    pub in_combat: bool,
    pub changing_maps: bool,
    /// Flips when the server-selection response goes through; before that,
    /// frames decode as connection-phase messages.
    pub connected: bool,
    pub player: Actor,
    pub map: Option<GameMap>,
    pub other_players: HashMap<ActorId, Actor>,
    pub monsters: HashMap<ActorId, Actor>,
    pub npcs: HashMap<ActorId, Actor>,
    pub actors: HashMap<ActorId, Actor>,
    pub collectibles: HashMap<i32, Collectible>,
}

impl Session {
    pub fn new(player_id: ActorId, player_name: &str) -> Session {
        Session {
            player: Actor::player(player_id, player_name.to_owned()),
            ..Session::default()
        }
    }

    /// Drops everything tied to the previous map. Automation stays in
    /// whatever state the operator left it; the connection flag is
    /// untouched.
    pub fn reset(&mut self) {
        self.in_combat = false;
        self.other_players.clear();
        self.monsters.clear();
        self.npcs.clear();
        self.actors.clear();
        self.collectibles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn passed_arrival_deadline_snaps_once() {
        let mut actor = Actor::generic(7, 100);
        actor.begin_move(100, 250, Some(Instant::now() - Duration::from_millis(5)));

        let now = Instant::now();
        actor.update_state(now);
        assert!(!actor.moving);
        assert_eq!(actor.current_cell, 250);
        assert_eq!(actor.arrival, None);

        // Applying the sweep again with the deadline still in the past is a
        // no-op.
        let snapshot = actor.clone();
        actor.update_state(now + Duration::from_millis(50));
        assert_eq!(actor, snapshot);
    }

    #[test]
    fn future_arrival_deadline_is_left_alone() {
        let mut actor = Actor::generic(7, 100);
        actor.begin_move(100, 250, Some(Instant::now() + Duration::from_secs(60)));
        actor.update_state(Instant::now());
        assert!(actor.moving);
        assert_eq!(actor.current_cell, 100);
    }

    #[test]
    fn unknown_arrival_deadline_never_snaps() {
        let mut actor = Actor::generic(7, 100);
        actor.begin_move(100, 250, None);
        actor.update_state(Instant::now() + Duration::from_secs(3600));
        assert!(actor.moving);
    }

    #[test]
    fn interaction_deadline_clears_interacting() {
        let mut player = Actor::player(1, "Miner".to_owned());
        player.set_interacting(9000, Some(Instant::now() - Duration::from_millis(1)));
        assert!(player.is_interacting());
        player.update_state(Instant::now());
        assert!(!player.is_interacting());
        // The element id survives; only the flag and deadline clear.
        assert_eq!(player.interacting_element(), Some(9000));
    }

    #[test]
    fn reset_keeps_the_operator_switches() {
        let mut session = Session::new(69_420, "SneakySneaky");
        session.active = true;
        session.connected = true;
        session.in_combat = true;
        session.monsters.insert(5, Actor::monster(5, 10, 3, 120));
        session.reset();
        assert!(session.active);
        assert!(session.connected);
        assert!(!session.in_combat);
        assert!(session.monsters.is_empty());
    }

    #[test]
    fn collectible_state_codes_decode_leniently() {
        assert_eq!(CollectibleState::from_code(0), CollectibleState::Available);
        assert_eq!(CollectibleState::from_code(1), CollectibleState::InCooldown);
        assert_eq!(CollectibleState::from_code(42), CollectibleState::Unknown);
    }
}
