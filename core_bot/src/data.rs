//! Game data loaded from the extracted client files: per-map cell tables
//! under `maps/`, the world graph, and the world-atlas coordinates. The
//! coordinate and graph tables load once at startup; cell tables load
//! lazily and are cached behind a mutex, shared between sessions as
//! immutable `Arc`s.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::geometry::{self, GridPoint};
use crate::map::{GameMap, MapCell, Transition, WorldGraphEdge};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("no cell data for map {0}")]
    MapNotFound(i32),
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One cell record as the extractor writes it. Boolean-ish fields are
/// stored as integers in the files.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellRecord {
    cell_number: i32,
    speed: i32,
    map_change_data: i32,
    move_zone: i32,
    linked_zone: i32,
    mov: i32,
    los: i32,
    non_walkable_during_fight: i32,
    farm_cell: i32,
    visible: i32,
    #[serde(default)]
    floor: i32,
    #[serde(default)]
    special_effects: i32,
}

impl CellRecord {
    fn into_cell(self) -> MapCell {
        MapCell {
            cell_id: self.cell_number,
            position: geometry::coord_from_cell(self.cell_number),
            walkable: self.mov != 0,
            non_walkable_during_fight: self.non_walkable_during_fight != 0,
            line_of_sight: self.los != 0,
            visible: self.visible != 0,
            farm_cell: self.farm_cell != 0,
            speed: self.speed,
            floor: self.floor,
            move_zone: self.move_zone,
            linked_zone: self.linked_zone,
            special_effects: self.special_effects,
            map_change_data: self.map_change_data,
        }
    }
}

// The world graph file nests everything in serialized-dictionary wrappers;
// field names mirror the file.

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct WorldGraphFile {
    m_edges: ValuesWrapper<ArrayWrapper<ArrayWrapper<EdgeRecord>>>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct ValuesWrapper<T> {
    m_values: T,
}

#[derive(Debug, Deserialize)]
struct ArrayWrapper<T> {
    #[serde(rename = "Array")]
    array: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct EdgeRecord {
    m_from: VertexRecord,
    m_to: VertexRecord,
    m_transitions: ArrayWrapper<TransitionRecord>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct VertexRecord {
    m_mapId: i32,
    #[serde(default)]
    m_zoneId: i32,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct TransitionRecord {
    m_type: i32,
    m_direction: i32,
    m_skillId: i32,
    m_transitionMapId: i32,
    m_cellId: i32,
}

#[derive(Debug, Deserialize)]
struct CoordinateRecord {
    #[serde(rename = "map-ids")]
    map_ids: Vec<i32>,
    position: PositionRecord,
}

#[derive(Debug, Deserialize)]
struct PositionRecord {
    x: i32,
    y: i32,
}

/// The loaded data tables. Cheap to share behind an `Arc`.
pub struct GameData {
    root: PathBuf,
    map_coordinates: HashMap<i32, GridPoint>,
    world_graph: HashMap<i32, Arc<Vec<WorldGraphEdge>>>,
    cells: Mutex<HashMap<i32, Arc<Vec<MapCell>>>>,
    empty_edges: Arc<Vec<WorldGraphEdge>>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let raw = fs::read_to_string(path).map_err(|source| DataError::Read {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DataError::Parse {
        path: path.to_owned(),
        source,
    })
}

impl GameData {
    /// Loads the coordinate and world-graph tables from `root`.
    pub fn load(root: impl Into<PathBuf>) -> Result<GameData, DataError> {
        let root = root.into();

        let coordinate_records: Vec<CoordinateRecord> =
            read_json(&root.join("map-coordinates.json"))?;
        let mut map_coordinates = HashMap::new();
        for record in coordinate_records {
            let position = GridPoint::new(record.position.x, record.position.y);
            for map_id in record.map_ids {
                map_coordinates.insert(map_id, position);
            }
        }

        let graph_file: WorldGraphFile = read_json(&root.join("worldgraph.json"))?;
        let mut edges_by_map: HashMap<i32, Vec<WorldGraphEdge>> = HashMap::new();
        for outer in graph_file.m_edges.m_values.array {
            for record in outer.array {
                let edge = WorldGraphEdge {
                    target_map_id: record.m_to.m_mapId,
                    target_zone_id: record.m_to.m_zoneId,
                    transitions: record
                        .m_transitions
                        .array
                        .into_iter()
                        .map(|t| Transition {
                            kind: t.m_type,
                            direction: t.m_direction,
                            skill_id: t.m_skillId,
                            target_map_id: t.m_transitionMapId,
                            cell_id: t.m_cellId,
                        })
                        .collect(),
                };
                edges_by_map
                    .entry(record.m_from.m_mapId)
                    .or_default()
                    .push(edge);
            }
        }
        let world_graph = edges_by_map
            .into_iter()
            .map(|(map_id, edges)| (map_id, Arc::new(edges)))
            .collect::<HashMap<_, _>>();

        info!(
            target: "gridghost::bot",
            coordinates = map_coordinates.len(),
            graph_maps = world_graph.len(),
            "game data loaded"
        );

        Ok(GameData {
            root,
            map_coordinates,
            world_graph,
            cells: Mutex::new(HashMap::new()),
            empty_edges: Arc::new(Vec::new()),
        })
    }

    /// Builds a data set from in-memory tables. Used by tests that need
    /// maps without a data directory on disk.
    pub fn with_tables(
        map_coordinates: HashMap<i32, GridPoint>,
        world_graph: HashMap<i32, Arc<Vec<WorldGraphEdge>>>,
        cells: HashMap<i32, Arc<Vec<MapCell>>>,
    ) -> GameData {
        GameData {
            root: PathBuf::new(),
            map_coordinates,
            world_graph,
            cells: Mutex::new(cells),
            empty_edges: Arc::new(Vec::new()),
        }
    }

    /// A fresh session view of a map. The cell table is cached after the
    /// first load; maps missing from the world graph get an empty edge
    /// list, which disables travel away from them.
    pub fn map(&self, map_id: i32) -> Result<GameMap, DataError> {
        let cells = {
            let mut cache = self.cells.lock().expect("cell cache mutex poisoned");
            match cache.get(&map_id) {
                Some(cells) => Arc::clone(cells),
                None => {
                    let path = self.root.join("maps").join(format!("map_{map_id}.json"));
                    if !path.exists() {
                        return Err(DataError::MapNotFound(map_id));
                    }
                    let records: Vec<CellRecord> = read_json(&path)?;
                    let cells: Arc<Vec<MapCell>> =
                        Arc::new(records.into_iter().map(CellRecord::into_cell).collect());
                    cache.insert(map_id, Arc::clone(&cells));
                    cells
                }
            }
        };

        let edges = match self.world_graph.get(&map_id) {
            Some(edges) => Arc::clone(edges),
            None => {
                warn!(
                    target: "gridghost::bot",
                    map_id,
                    "map is not in the world graph, travel away from it is unavailable"
                );
                Arc::clone(&self.empty_edges)
            }
        };

        Ok(GameMap::new(map_id, self.coordinates(map_id), cells, edges))
    }

    /// World-atlas coordinates of a map, `(0, 0)` when unknown.
    pub fn coordinates(&self, map_id: i32) -> GridPoint {
        self.map_coordinates
            .get(&map_id)
            .copied()
            .unwrap_or_default()
    }
}
