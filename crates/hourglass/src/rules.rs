//! Grain rule: fall straight, otherwise slip diagonally.

use rand::Rng;

use crate::api::GrainApi;

/// Advance one grain by at most one cell. Returns whether it moved.
///
/// When both diagonals are open a coin flip picks one, which is what lets a
/// pile settle into a slope instead of leaning to one side.
pub fn update_grain<R: Rng + ?Sized>(api: &mut GrainApi, rng: &mut R) -> bool {
    if api.is_free(0, 1) {
        api.shift(0, 1);
        return true;
    }

    let left = api.is_free(-1, 1);
    let right = api.is_free(1, 1);
    let dx = match (left, right) {
        (true, true) => {
            if rng.gen_bool(0.5) {
                -1
            } else {
                1
            }
        }
        (true, false) => -1,
        (false, true) => 1,
        (false, false) => return false,
    };
    api.shift(dx, 1);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::grid::Grid;
    use crate::mask::Mask;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn run(rows: &[&str], x: i32, y: i32, gravity: i32, seed: u64) -> (bool, Grid) {
        let mut grid = Grid::new(Mask::from_ascii(rows).unwrap());
        for (gy, row) in rows.iter().enumerate() {
            for (gx, c) in row.chars().enumerate() {
                if c == 'o' {
                    grid.place(gx as i32, gy as i32).unwrap();
                }
            }
        }
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut api = GrainApi::new(&mut grid, x, y, gravity);
        let moved = update_grain(&mut api, &mut rng);
        (moved, grid)
    }

    #[test]
    fn falls_straight_when_open() {
        let (moved, grid) = run(&["...", ".o.", "..."], 1, 1, 1, 0);
        assert!(moved);
        assert_eq!(grid.get(1, 2), Cell::Grain);
        assert_eq!(grid.get(1, 1), Cell::Empty);
    }

    #[test]
    fn inverted_falls_up() {
        let (moved, grid) = run(&["...", ".o.", "..."], 1, 1, -1, 0);
        assert!(moved);
        assert_eq!(grid.get(1, 0), Cell::Grain);
    }

    #[test]
    fn slips_to_the_only_open_diagonal() {
        let (moved, grid) = run(&[".o.", "#o."], 1, 0, 1, 0);
        assert!(moved);
        assert_eq!(grid.get(2, 1), Cell::Grain);
        assert_eq!(grid.grain_count(), 2);
    }

    #[test]
    fn both_diagonals_are_chosen_over_many_seeds() {
        let mut seen_left = false;
        let mut seen_right = false;
        for seed in 0..64 {
            let (moved, grid) = run(&[".o.", ".o."], 1, 0, 1, seed);
            assert!(moved);
            assert_eq!(grid.get(1, 0), Cell::Empty);
            seen_left |= grid.get(0, 1) == Cell::Grain;
            seen_right |= grid.get(2, 1) == Cell::Grain;
        }
        assert!(seen_left && seen_right);
    }

    #[test]
    fn fully_blocked_stays() {
        let (moved, grid) = run(&[".o.", "#o#"], 1, 0, 1, 3);
        assert!(!moved);
        assert_eq!(grid.get(1, 0), Cell::Grain);
    }

    #[test]
    fn grid_edge_blocks_like_a_wall() {
        let (moved, grid) = run(&["o.", "o."], 0, 0, 1, 0);
        assert!(moved);
        assert_eq!(grid.get(1, 1), Cell::Grain);
        let (moved, _) = run(&["..", "o."], 0, 1, 1, 0);
        assert!(!moved);
    }
}
