//! Weighted A* over the diamond grid, plus the path post-processing the
//! client applies before a movement request goes on the wire: diagonal
//! smoothing of the parent chain, direction-run compression, and the
//! compressed step encoding.
//!
//! The cost model reproduces the client's own pathfinder so that paths the
//! bot forges are indistinguishable from paths the real client would send.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::warn;

use crate::geometry::{self, Direction, GridPoint};
use crate::map::GameMap;

const HV_COST: i32 = 10;
const DIAG_COST: i32 = 15;
const HEURISTIC_COST: f32 = 10.0;
const ELEVATION_TOLERANCE: i32 = 11;

/// One step of a movement path: the cell the step starts from and the
/// direction walked out of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathStep {
    pub cell_id: i32,
    pub direction: Direction,
}

impl PathStep {
    /// Decodes the wire form: cell id in the low bits, direction in bits
    /// 12-14.
    pub fn from_compressed(key: i32) -> PathStep {
        PathStep {
            cell_id: key & 0xfff,
            direction: Direction::from_index((key >> 12) & 7),
        }
    }

    pub fn to_compressed(self) -> i32 {
        (self.direction.index() & 7) << 12 | (self.cell_id & 0xfff)
    }
}

/// Drops every step that continues in the same direction as the one before
/// it, keeping the first step of each straight run and the destination.
pub fn compress_path(steps: &[PathStep]) -> Vec<PathStep> {
    if steps.len() < 3 {
        return steps.to_vec();
    }
    let mut out = Vec::with_capacity(steps.len());
    out.push(steps[0]);
    for index in 1..steps.len() - 1 {
        if steps[index].direction != steps[index - 1].direction {
            out.push(steps[index]);
        }
    }
    out.push(steps[steps.len() - 1]);
    out
}

struct OpenEntry {
    f_cost: f32,
    cell_id: i32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost && self.cell_id == other.cell_id
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    // Inverted so the max-heap pops the cheapest node first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.f_cost.total_cmp(&self.f_cost)
    }
}

impl GameMap {
    /// Shortest path with the client's default options (movement through
    /// occupied cells is allowed but heavily penalized).
    pub fn shortest_path(&self, start_cell: i32, end_cell: i32, diagonals: bool) -> Vec<PathStep> {
        self.shortest_path_through(start_cell, end_cell, diagonals, true)
    }

    /// Full-option variant. With `allow_through_occupied` the search also
    /// tracks the relaxed cell closest to an unreachable destination and
    /// routes there instead; without it an unreachable destination yields an
    /// empty path.
    pub fn shortest_path_through(
        &self,
        start_cell: i32,
        end_cell: i32,
        diagonals: bool,
        allow_through_occupied: bool,
    ) -> Vec<PathStep> {
        if !geometry::is_valid_cell(start_cell) || !geometry::is_valid_cell(end_cell) {
            warn!(
                target: "gridghost::bot",
                start_cell, end_cell, "path requested between invalid cells"
            );
            return Vec::new();
        }

        let cell_count = geometry::CELL_COUNT as usize;
        let mut g_cost = vec![0f32; cell_count];
        let mut parent = vec![-1i32; cell_count];
        let mut closed = vec![false; cell_count];
        let mut open = BinaryHeap::new();

        let start_pos = geometry::coord_from_cell(start_cell);
        let end_pos = geometry::coord_from_cell(end_cell);

        open.push(OpenEntry {
            f_cost: 0.0,
            cell_id: start_cell,
        });

        // Best-effort destination when the real one turns out unreachable.
        let mut fallback_end = start_cell;
        let mut fallback_distance = geometry::distance(start_cell, end_cell);

        while let Some(entry) = open.pop() {
            let parent_id = entry.cell_id;
            if closed[parent_id as usize] {
                continue;
            }
            closed[parent_id as usize] = true;
            let parent_pos = geometry::coord_from_cell(parent_id);

            for y in parent_pos.y - 1..=parent_pos.y + 1 {
                for x in parent_pos.x - 1..=parent_pos.x + 1 {
                    let cell_id = match geometry::cell_from_coord(GridPoint::new(x, y)) {
                        Some(cell_id) => cell_id,
                        None => continue,
                    };
                    if closed[cell_id as usize] || cell_id == parent_id {
                        continue;
                    }

                    // A diagonal step squeezes between the two orthogonal
                    // corner cells; at least one of them must be walkable.
                    let reachable = self.point_mov(x, y, parent_id)
                        && (y == parent_pos.y
                            || x == parent_pos.x
                            || (diagonals
                                && (self.point_mov(parent_pos.x, y, parent_id)
                                    || self.point_mov(x, parent_pos.y, parent_id))));
                    if !reachable {
                        continue;
                    }

                    let step_cost = if y == parent_pos.y || x == parent_pos.x {
                        HV_COST
                    } else {
                        DIAG_COST
                    };
                    // The client truncates the weighted cost to whole units.
                    let mut tentative = (g_cost[parent_id as usize]
                        + step_cost as f32
                            * self.point_weight_to(cell_id, end_cell, allow_through_occupied))
                        as i32;

                    if allow_through_occupied {
                        let on_end_column = x + y == end_pos.x + end_pos.y;
                        let on_start_column = x + y == start_pos.x + start_pos.y;
                        let on_end_line = x - y == end_pos.x - end_pos.y;
                        let on_start_line = x - y == start_pos.x - start_pos.y;

                        // Steer the search toward the rows and columns of the
                        // two endpoints, the way the client shapes its paths.
                        if (!on_end_column && !on_end_line)
                            || (!on_start_column && !on_start_line)
                        {
                            tentative += geometry::distance(cell_id, end_cell);
                            tentative += geometry::distance(cell_id, start_cell);
                        }
                        if x == end_pos.x || y == end_pos.y {
                            tentative -= 3;
                        }
                        if on_end_column
                            || on_end_line
                            || x + y == parent_pos.x + parent_pos.y
                            || x - y == parent_pos.x - parent_pos.y
                        {
                            tentative -= 2;
                        }
                        if x == start_pos.x || y == start_pos.y {
                            tentative -= 3;
                        }
                        if on_start_column || on_start_line {
                            tentative -= 2;
                        }

                        let to_end = geometry::distance(cell_id, end_cell);
                        if to_end < fallback_distance {
                            fallback_distance = to_end;
                            fallback_end = cell_id;
                        }
                    }

                    let tentative = tentative as f32;
                    if parent[cell_id as usize] == -1 || tentative < g_cost[cell_id as usize] {
                        parent[cell_id as usize] = parent_id;
                        g_cost[cell_id as usize] = tentative;
                        let dx = (end_pos.x - x) as f32;
                        let dy = (end_pos.y - y) as f32;
                        open.push(OpenEntry {
                            f_cost: tentative + HEURISTIC_COST * (dx * dx + dy * dy).sqrt(),
                            cell_id,
                        });
                    }
                }
            }
        }

        let mut end_id = end_cell;
        if parent[end_id as usize] == -1 {
            end_id = fallback_end;
        }

        // Walk the parent chain back from the end, smoothing zig-zags into
        // diagonals as we go, and emit one step per hop.
        let mut steps = Vec::new();
        let mut cursor = end_id;
        let mut hops = 0;
        while cursor != start_cell {
            hops += 1;
            if hops > geometry::CELL_COUNT {
                warn!(target: "gridghost::bot", start_cell, end_cell, "parent chain does not terminate");
                return Vec::new();
            }
            if diagonals {
                self.smooth_parent(&mut parent, cursor);
            }
            let parent_id = parent[cursor as usize];
            if !geometry::is_valid_cell(parent_id) || parent_id == cursor {
                warn!(target: "gridghost::bot", start_cell, end_cell, cursor, "parent chain is broken");
                return Vec::new();
            }
            let direction = geometry::exact_direction(
                geometry::coord_from_cell(parent_id),
                geometry::coord_from_cell(cursor),
            )
            .unwrap_or(Direction::East);
            steps.push(PathStep {
                cell_id: parent_id,
                direction,
            });
            cursor = parent_id;
        }
        steps.reverse();

        if let Some(last) = steps.last().copied() {
            let direction = geometry::exact_direction(
                geometry::coord_from_cell(last.cell_id),
                geometry::coord_from_cell(end_id),
            )
            .unwrap_or(last.direction);
            steps.push(PathStep {
                cell_id: end_id,
                direction,
            });
        }

        compress_path(&steps)
    }

    /// Picks the cell to stand on to harvest `target_cell`: the free walkable
    /// neighbor closest to `from_cell`, with straight north/south/east/west
    /// approaches penalized by one step. Ties go to the later candidate in
    /// scan order.
    pub fn nearest_approach_cell(&self, from_cell: i32, target_cell: i32) -> Option<i32> {
        let target = geometry::coord_from_cell(target_cell);
        let from = geometry::coord_from_cell(from_cell);

        let mut best = None;
        let mut best_distance = f64::MAX;
        for y in target.y - 1..=target.y + 1 {
            for x in target.x - 1..=target.x + 1 {
                let candidate = GridPoint::new(x, y);
                let cell_id = match geometry::cell_from_coord(candidate) {
                    Some(cell_id) => cell_id,
                    None => continue,
                };
                if cell_id == target_cell {
                    continue;
                }
                if !self.is_walkable(cell_id) || self.is_occupied(cell_id) {
                    continue;
                }
                let mut distance = geometry::euclidean_distance(from, candidate);
                match geometry::exact_direction(candidate, target) {
                    Some(
                        Direction::North | Direction::South | Direction::East | Direction::West,
                    ) => distance += 1.0,
                    _ => {}
                }
                if distance <= best_distance {
                    best_distance = distance;
                    best = Some(cell_id);
                }
            }
        }
        best
    }

    /// Whether walking from `(x, y)`'s predecessor onto it is allowed:
    /// walkable, and not across a zone boundary or an elevation jump above
    /// the tolerance.
    fn point_mov(&self, x: i32, y: i32, previous: i32) -> bool {
        let cell_id = match geometry::cell_from_coord(GridPoint::new(x, y)) {
            Some(cell_id) => cell_id,
            None => return false,
        };
        let cell = match self.cell(cell_id) {
            Some(cell) => cell,
            None => return false,
        };
        let mut walkable = cell.walkable;
        if walkable && previous != -1 && previous != cell_id {
            if let Some(previous_cell) = self.cell(previous) {
                let diff = (cell.floor.abs() - previous_cell.floor.abs()).abs();
                if (previous_cell.move_zone != cell.move_zone && diff > 0)
                    || (previous_cell.move_zone == cell.move_zone
                        && cell.move_zone == 0
                        && diff > ELEVATION_TOLERANCE)
                {
                    walkable = false;
                }
            }
        }
        walkable
    }

    /// Zone boundary at equal elevation, which the smoothing passes refuse
    /// to cut across.
    fn is_change_zone(&self, cell_a: i32, cell_b: i32) -> bool {
        match (self.cell(cell_a), self.cell(cell_b)) {
            (Some(a), Some(b)) => {
                a.move_zone != b.move_zone && (a.floor.abs() - b.floor.abs()).abs() == 0
            }
            _ => false,
        }
    }

    fn point_weight_to(&self, cell_id: i32, end_cell: i32, allow_through_occupied: bool) -> f32 {
        if cell_id == end_cell {
            return 1.0;
        }
        self.point_weight(cell_id, allow_through_occupied)
    }

    fn point_weight(&self, cell_id: i32, allow_through_occupied: bool) -> f32 {
        let cell = match self.cell(cell_id) {
            Some(cell) => cell,
            None => return f32::MAX,
        };
        if allow_through_occupied {
            if self.is_occupied(cell_id) {
                20.0
            } else if cell.speed >= 0 {
                (6 - cell.speed) as f32
            } else {
                (12 + cell.speed.abs()) as f32
            }
        } else {
            let mut weight = 1.0;
            let pos = cell.position;
            if self.is_occupied(cell_id) {
                weight += 0.3;
            }
            for (dx, dy) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
                if let Some(neighbor) =
                    geometry::cell_from_coord(GridPoint::new(pos.x + dx, pos.y + dy))
                {
                    if self.is_occupied(neighbor) {
                        weight += 0.3;
                    }
                }
            }
            if cell.special_effects & 2 == 2 {
                weight += 0.2;
            }
            weight
        }
    }

    /// Rewires the parent chain at `cursor` so that an orthogonal zig-zag
    /// becomes a single diagonal where the grid allows it.
    fn smooth_parent(&self, parent: &mut [i32], cursor: i32) {
        let parent_id = parent[cursor as usize];
        let grand = if parent_id == -1 {
            -1
        } else {
            parent[parent_id as usize]
        };
        let great = if grand == -1 { -1 } else { parent[grand as usize] };
        let k = geometry::coord_from_cell(cursor);

        if grand != -1 && geometry::distance(cursor, grand) == 1 {
            if self.point_mov(k.x, k.y, grand) {
                parent[cursor as usize] = grand;
            }
        } else if great != -1 && geometry::distance(cursor, great) == 2 {
            let next = geometry::coord_from_cell(great);
            let inter = GridPoint::new(k.x + (next.x - k.x) / 2, k.y + (next.y - k.y) / 2);
            if let Some(inter_id) = geometry::cell_from_coord(inter) {
                if inter_id != cursor
                    && self.point_mov(inter.x, inter.y, cursor)
                    && self.point_weight(inter_id, true) < 2.0
                {
                    parent[cursor as usize] = inter_id;
                }
            }
        } else if grand != -1 && geometry::distance(cursor, grand) == 2 {
            let next = geometry::coord_from_cell(grand);
            let inter = geometry::coord_from_cell(parent_id);
            if k.x + k.y == next.x + next.y
                && k.x - k.y != inter.x - inter.y
                && !self.is_change_zone(cursor, parent_id)
                && !self.is_change_zone(parent_id, grand)
            {
                parent[cursor as usize] = grand;
            } else if k.x - k.y == next.x - next.y
                && k.x - k.y != inter.x - inter.y
                && !self.is_change_zone(cursor, parent_id)
                && !self.is_change_zone(parent_id, grand)
            {
                parent[cursor as usize] = grand;
            } else if k.x == next.x && k.x != inter.x {
                if let Some(corner) = geometry::cell_from_coord(GridPoint::new(k.x, inter.y)) {
                    if self.point_weight(corner, true) < 2.0
                        && self.point_mov(k.x, inter.y, cursor)
                    {
                        parent[cursor as usize] = corner;
                    }
                }
            } else if k.y == next.y && k.y != inter.y {
                if let Some(corner) = geometry::cell_from_coord(GridPoint::new(inter.x, k.y)) {
                    if self.point_weight(corner, true) < 2.0
                        && self.point_mov(inter.x, k.y, cursor)
                    {
                        parent[cursor as usize] = corner;
                    }
                }
            }
        }
    }
}
