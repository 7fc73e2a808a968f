//! Gravity-relative neighbour API for the grain rule.
//!
//! Offsets are expressed in the falling frame: `dy = +1` is always one step
//! toward the gravity target, whichever way up the glass is.

use crate::cell::Cell;
use crate::grid::Grid;

/// Out-of-bounds reads return Wall.
#[derive(Debug)]
pub struct GrainApi<'a> {
    pub grid: &'a mut Grid,
    pub x: i32,
    pub y: i32,
    pub gravity: i32,
}

impl<'a> GrainApi<'a> {
    pub fn new(grid: &'a mut Grid, x: i32, y: i32, gravity: i32) -> Self {
        Self { grid, x, y, gravity }
    }

    fn target(&self, dx: i32, dy: i32) -> (i32, i32) {
        (self.x + dx, self.y + dy * self.gravity)
    }

    #[must_use]
    pub fn get(&self, dx: i32, dy: i32) -> Cell {
        let (x, y) = self.target(dx, dy);
        self.grid.get(x, y)
    }

    #[must_use]
    pub fn is_free(&self, dx: i32, dy: i32) -> bool {
        self.get(dx, dy) == Cell::Empty
    }

    /// Move this grain by `(dx, dy)` and follow it. The target must be free.
    pub fn shift(&mut self, dx: i32, dy: i32) {
        let (x, y) = self.target(dx, dy);
        let (Some(from), Some(to)) = (self.grid.index(self.x, self.y), self.grid.index(x, y)) else {
            return;
        };
        self.grid.move_grain(from, to);
        self.x = x;
        self.y = y;
    }
}
