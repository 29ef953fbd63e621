//! Movement duration model. The client animates walks and runs at fixed
//! per-step speeds that depend on the on-screen axis of each step; the bot
//! reproduces them to predict when an actor reaches its destination, with a
//! little random jitter so forged confirmations do not land on exact
//! multiples.

use std::time::Duration;

use rand::Rng;

use crate::geometry::MAP_WIDTH;

const WALKING_HORIZONTAL_MS: u64 = 510;
const WALKING_STRAIGHT_MS: u64 = 480;
const WALKING_VERTICAL_MS: u64 = 425;

const RUNNING_HORIZONTAL_MS: u64 = 255;
const RUNNING_STRAIGHT_MS: u64 = 170;
const RUNNING_VERTICAL_MS: u64 = 150;

/// Milliseconds a path takes, before jitter. Actors walk when cautious or
/// when the path is three cells or fewer, and run otherwise.
fn base_duration_ms(cells: &[i32], cautious: bool) -> u64 {
    let (horizontal, vertical, straight) = if cautious || cells.len() <= 3 {
        (
            WALKING_HORIZONTAL_MS,
            WALKING_VERTICAL_MS,
            WALKING_STRAIGHT_MS,
        )
    } else {
        (
            RUNNING_HORIZONTAL_MS,
            RUNNING_VERTICAL_MS,
            RUNNING_STRAIGHT_MS,
        )
    };

    let mut total = 0;
    for pair in cells.windows(2) {
        // Consecutive ids one apart sit on the same row (horizontal step);
        // one grid width apart, the same column (vertical step).
        let delta = (pair[0] - pair[1]).abs();
        total += if delta == 1 {
            horizontal
        } else if delta == MAP_WIDTH {
            vertical
        } else {
            straight
        };
    }
    total
}

/// Predicted travel time for a path of cell ids, jittered by 1-50 ms.
pub fn movement_duration(cells: &[i32], cautious: bool) -> Duration {
    let jitter = rand::thread_rng().gen_range(1..=50);
    Duration::from_millis(base_duration_ms(cells, cautious) + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_paths_walk_and_long_paths_run() {
        // Two horizontal steps, at most three cells: walking speeds apply.
        assert_eq!(base_duration_ms(&[100, 101, 102], false), 2 * 510);
        // Four cells: running speeds apply.
        assert_eq!(base_duration_ms(&[100, 101, 102, 103], false), 3 * 255);
        // Cautious forces walking regardless of length.
        assert_eq!(base_duration_ms(&[100, 101, 102, 103], true), 3 * 510);
    }

    #[test]
    fn step_axis_picks_the_speed() {
        // Vertical (one row down), then a diagonal, running pace.
        let cells = [100, 114, 129, 130];
        assert_eq!(base_duration_ms(&cells, false), 150 + 170 + 255);
    }

    #[test]
    fn jitter_stays_in_range() {
        let base = base_duration_ms(&[100, 101], false);
        for _ in 0..32 {
            let total = movement_duration(&[100, 101], false).as_millis() as u64;
            assert!(total > base && total <= base + 50);
        }
    }
}
