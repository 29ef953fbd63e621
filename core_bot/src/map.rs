//! Per-map model: the immutable cell table shared across sessions, the
//! world-graph edges leaving the map, and a per-session occupancy overlay
//! the scheduler rebuilds from the actor sets.

use std::sync::Arc;

use tracing::warn;

use crate::geometry::{self, Direction, GridPoint, CELL_COUNT};

/// Static properties of one cell, straight from the map data files.
#[derive(Clone, Debug, Default)]
pub struct MapCell {
    pub cell_id: i32,
    pub position: GridPoint,
    pub walkable: bool,
    pub non_walkable_during_fight: bool,
    pub line_of_sight: bool,
    pub visible: bool,
    pub farm_cell: bool,
    pub speed: i32,
    pub floor: i32,
    pub move_zone: i32,
    pub linked_zone: i32,
    pub special_effects: i32,
    pub map_change_data: i32,
}

/// One way of leaving a map through a world-graph edge.
#[derive(Clone, Debug)]
pub struct Transition {
    pub kind: i32,
    pub direction: i32,
    pub skill_id: i32,
    pub target_map_id: i32,
    pub cell_id: i32,
}

/// World-graph edge from this map to a neighboring one.
#[derive(Clone, Debug)]
pub struct WorldGraphEdge {
    pub target_map_id: i32,
    pub target_zone_id: i32,
    pub transitions: Vec<Transition>,
}

/// A loaded map plus the mutable occupancy overlay for one session.
#[derive(Clone, Debug)]
pub struct GameMap {
    map_id: i32,
    coordinates: GridPoint,
    cells: Arc<Vec<MapCell>>,
    edges: Arc<Vec<WorldGraphEdge>>,
    occupied: Vec<bool>,
}

impl GameMap {
    pub fn new(
        map_id: i32,
        coordinates: GridPoint,
        cells: Arc<Vec<MapCell>>,
        edges: Arc<Vec<WorldGraphEdge>>,
    ) -> Self {
        debug_assert_eq!(cells.len(), CELL_COUNT as usize);
        GameMap {
            map_id,
            coordinates,
            cells,
            edges,
            occupied: vec![false; CELL_COUNT as usize],
        }
    }

    pub fn id(&self) -> i32 {
        self.map_id
    }

    /// World-atlas coordinates of the map itself, for logging.
    pub fn coordinates(&self) -> GridPoint {
        self.coordinates
    }

    pub fn cell(&self, cell_id: i32) -> Option<&MapCell> {
        if !geometry::is_valid_cell(cell_id) {
            return None;
        }
        self.cells.get(cell_id as usize)
    }

    /// Cell lookup by rotated-frame coordinates.
    pub fn cell_at(&self, point: GridPoint) -> Option<&MapCell> {
        geometry::cell_from_coord(point).and_then(|cell_id| self.cell(cell_id))
    }

    pub fn is_walkable(&self, cell_id: i32) -> bool {
        self.cell(cell_id).map_or(false, |cell| cell.walkable)
    }

    pub fn is_occupied(&self, cell_id: i32) -> bool {
        geometry::is_valid_cell(cell_id) && self.occupied[cell_id as usize]
    }

    pub fn set_occupied(&mut self, cell_id: i32, occupied: bool) {
        if geometry::is_valid_cell(cell_id) {
            self.occupied[cell_id as usize] = occupied;
        }
    }

    pub fn clear_occupancy(&mut self) {
        self.occupied.fill(false);
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|o| **o).count()
    }

    /// The single usable edge toward `target_map_id`, if one exists. Edges
    /// with anything other than exactly one transition are unusable and are
    /// reported once per lookup.
    pub fn edge_to(&self, target_map_id: i32) -> Option<&WorldGraphEdge> {
        let edge = self
            .edges
            .iter()
            .find(|edge| edge.target_map_id == target_map_id)?;
        if edge.transitions.len() != 1 {
            warn!(
                target: "gridghost::bot",
                map_id = self.map_id,
                target_map_id,
                transitions = edge.transitions.len(),
                "world-graph edge is not a single transition, ignoring it"
            );
            return None;
        }
        Some(edge)
    }

    pub fn edges(&self) -> &[WorldGraphEdge] {
        &self.edges
    }
}
