//! Wall mask plus grain occupancy over one `W×H` index space.

use std::fmt;

use rand::Rng;

use crate::cell::Cell;
use crate::error::PlaceError;
use crate::mask::Mask;

/// Half-open rectangle of cells, `x0..x1` by `y0..y1`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Region {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Region {
    #[must_use]
    pub fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    #[must_use]
    pub fn fits(&self, width: usize, height: usize) -> bool {
        !self.is_empty() && self.x1 <= width && self.y1 <= height
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| (x, y)))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x {}..{}, y {}..{}", self.x0, self.x1, self.y0, self.y1)
    }
}

/// Out-of-bounds reads return Wall. Grains never occupy wall cells.
#[derive(Clone, Debug)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    mask: Mask,
    occupancy: Vec<bool>,
}

impl Grid {
    #[must_use]
    pub fn new(mask: Mask) -> Self {
        Self {
            width: mask.width(),
            height: mask.height(),
            occupancy: vec![false; mask.width() * mask.height()],
            mask,
        }
    }

    #[must_use]
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    #[must_use]
    pub fn occupancy(&self) -> &[bool] {
        &self.occupancy
    }

    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height
    }

    #[must_use]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y)
            .then(|| y as usize * self.width + x as usize)
    }

    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Cell {
        match self.index(x, y) {
            Some(i) if self.mask.walls()[i] => Cell::Wall,
            Some(i) if self.occupancy[i] => Cell::Grain,
            Some(_) => Cell::Empty,
            None => Cell::Wall,
        }
    }

    /// In bounds, not wall, not occupied.
    #[must_use]
    pub fn is_free(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Cell::Empty
    }

    pub fn place(&mut self, x: i32, y: i32) -> Result<(), PlaceError> {
        let i = self.index(x, y).ok_or(PlaceError::OutOfBounds { x, y })?;
        if self.mask.walls()[i] {
            return Err(PlaceError::Wall { x, y });
        }
        self.occupancy[i] = true;
        Ok(())
    }

    /// Removes a grain if one is there. Out-of-bounds is a no-op.
    pub fn clear(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.occupancy[i] = false;
        }
    }

    /// Move the grain at `from` to the free cell `to`.
    pub(crate) fn move_grain(&mut self, from: usize, to: usize) {
        debug_assert!(self.occupancy[from], "no grain at source {from}");
        debug_assert!(!self.mask.walls()[to], "grain moved into wall cell {to}");
        debug_assert!(!self.occupancy[to], "grain moved onto grain at {to}");
        self.occupancy[from] = false;
        self.occupancy[to] = true;
    }

    /// Fill open cells of `region` independently with probability `density`.
    /// Returns how many grains were added.
    pub fn seed<R: Rng + ?Sized>(&mut self, region: Region, density: f64, rng: &mut R) -> usize {
        let density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        let mut added = 0;
        for (x, y) in region.cells() {
            if x >= self.width || y >= self.height {
                continue;
            }
            let i = y * self.width + x;
            if self.mask.walls()[i] || self.occupancy[i] {
                continue;
            }
            if rng.gen_bool(density) {
                self.occupancy[i] = true;
                added += 1;
            }
        }
        added
    }

    #[must_use]
    pub fn grain_count(&self) -> usize {
        self.occupancy.iter().filter(|&&g| g).count()
    }

    /// Whether every grain sits on an open cell.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.occupancy
            .iter()
            .zip(self.mask.walls())
            .all(|(&grain, &wall)| !(grain && wall))
    }

    /// One glyph per cell, rows separated by newlines.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height as i32 {
            out.extend((0..self.width as i32).map(|x| self.get(x, y).glyph()));
            out.push('\n');
        }
        out
    }
}
