mod common;

use core_bot::geometry::{Direction, GridPoint};
use core_bot::map::GameMap;
use core_bot::path::{compress_path, PathStep};
use std::sync::Arc;

fn step(cell_id: i32, direction: Direction) -> PathStep {
    PathStep { cell_id, direction }
}

fn corridor_map(walkable: &[i32]) -> GameMap {
    GameMap::new(
        1,
        GridPoint::new(0, 0),
        common::corridor_cells(walkable),
        Arc::new(Vec::new()),
    )
}

#[test]
fn open_map_diagonal_run_compresses_to_two_steps() {
    let map = common::open_map(1);
    let path = map.shortest_path(62, 183, true);
    assert_eq!(
        path,
        vec![step(62, Direction::SouthWest), step(183, Direction::SouthWest)]
    );
}

#[test]
fn open_map_single_step_keeps_both_ends() {
    let map = common::open_map(1);
    let path = map.shortest_path(144, 142, true);
    assert_eq!(path, vec![step(144, Direction::West), step(142, Direction::West)]);
}

#[test]
fn corridor_path_bends_at_direction_changes() {
    // A walkable lane from 347 up to 195; everything else is blocked, so
    // the path has to follow it and the key cells mark each bend.
    let lane = [347, 319, 291, 277, 264, 250, 237, 223, 195];
    let map = corridor_map(&lane);

    let path = map.shortest_path(347, 195, true);
    assert_eq!(
        path,
        vec![
            step(347, Direction::North),
            step(291, Direction::NorthEast),
            step(223, Direction::North),
            step(195, Direction::North),
        ]
    );
}

#[test]
fn unreachable_destination_yields_no_path_when_blocking_matters() {
    let lane = [347, 319, 291];
    let map = corridor_map(&lane);
    // Cell 100 is a wall in this fixture.
    assert!(map.shortest_path_through(347, 100, true, false).is_empty());
}

#[test]
fn same_cell_yields_no_path() {
    let map = common::open_map(1);
    assert!(map.shortest_path(62, 62, true).is_empty());
}

#[test]
fn produced_paths_are_compression_fixpoints() {
    let map = common::open_map(1);
    for (from, to) in [(62, 183), (347, 195), (0, 559), (144, 142)] {
        let path = map.shortest_path(from, to, true);
        assert!(!path.is_empty(), "no path {from} -> {to}");
        assert_eq!(compress_path(&path), path, "path {from} -> {to} not compressed");
    }
}

#[test]
fn compressed_wire_keys_round_trip() {
    let map = common::open_map(1);
    for original in map.shortest_path(347, 195, true) {
        let key = original.to_compressed();
        assert_eq!(PathStep::from_compressed(key), original);
    }
}
