//! Rasterizes a silhouette into the static wall buffer.

use crate::silhouette::Silhouette;

/// Sub-samples per cell along each axis.
const SUPERSAMPLE: usize = 4;

/// Immutable collision mask: `true` where grains may never sit.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Mask {
    width: usize,
    height: usize,
    walls: Vec<bool>,
}

impl Mask {
    /// Mask with no walls at all. Only the grid edges confine grains.
    #[must_use]
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            walls: vec![false; width * height],
        }
    }

    /// Build from a row-major wall buffer. Returns `None` on a size mismatch.
    #[must_use]
    pub fn from_walls(width: usize, height: usize, walls: Vec<bool>) -> Option<Self> {
        (walls.len() == width * height).then_some(Self {
            width,
            height,
            walls,
        })
    }

    /// Parse an ASCII picture: `#` is wall, anything else is open.
    /// Rows must share one width.
    #[must_use]
    pub fn from_ascii(rows: &[&str]) -> Option<Self> {
        let width = rows.first()?.chars().count();
        let mut walls = Vec::with_capacity(width * rows.len());
        for row in rows {
            if row.chars().count() != width {
                return None;
            }
            walls.extend(row.chars().map(|c| c == '#'));
        }
        Self::from_walls(width, rows.len(), walls)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn walls(&self) -> &[bool] {
        &self.walls
    }

    /// Out-of-bounds is wall.
    #[must_use]
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return true;
        }
        self.walls[y as usize * self.width + x as usize]
    }

    #[must_use]
    pub fn open_cells(&self) -> usize {
        self.walls.iter().filter(|&&w| !w).count()
    }
}

/// Rasterize `silhouette` (already in grid units) onto a `width`×`height` grid.
///
/// A cell is open when at least half of its sub-samples fall inside the
/// outline, matching a 50% alpha threshold on an anti-aliased fill.
#[must_use]
pub fn rasterize(silhouette: &Silhouette, width: usize, height: usize) -> Mask {
    let samples = SUPERSAMPLE * SUPERSAMPLE;
    let step = 1.0 / SUPERSAMPLE as f64;
    let mut walls = vec![true; width * height];

    for y in 0..height {
        for x in 0..width {
            let mut inside = 0;
            for sy in 0..SUPERSAMPLE {
                for sx in 0..SUPERSAMPLE {
                    let px = x as f64 + (sx as f64 + 0.5) * step;
                    let py = y as f64 + (sy as f64 + 0.5) * step;
                    if silhouette.contains(px, py) {
                        inside += 1;
                    }
                }
            }
            walls[y * width + x] = inside * 2 < samples;
        }
    }

    Mask {
        width,
        height,
        walls,
    }
}
