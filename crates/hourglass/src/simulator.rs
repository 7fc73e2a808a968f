//! The hourglass sand simulator: one grid, one mask, one update per frame.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::api::GrainApi;
use crate::config::HourglassConfig;
use crate::error::ConfigError;
use crate::grid::Grid;
use crate::mask::rasterize;
use crate::orientation::Orientation;
use crate::palette::Palette;
use crate::rules::update_grain;

/// Identity-free falling-grain simulation confined to a silhouette.
///
/// Owns its buffers exclusively. Gravity comes from the orientation passed to
/// each [`update`](Self::update); the simulator never stores it.
#[derive(Debug)]
pub struct GranularFlowSimulator {
    grid: Grid,
    palette: Palette,
    rng: SmallRng,
    pixels: Vec<u8>,
    frames: u64,
}

impl GranularFlowSimulator {
    /// Rasterize the configured silhouette and seed the fill region.
    pub fn new(config: &HourglassConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let (width, height) = (config.grid.width, config.grid.height);
        let mask = rasterize(&config.silhouette()?, width, height);

        let region = config.fill_region();
        if region
            .cells()
            .all(|(x, y)| mask.is_wall(x as i32, y as i32))
        {
            return Err(ConfigError::FillRegionClosed(region.to_string()));
        }

        let open = mask.open_cells();
        let mut grid = Grid::new(mask);
        let mut rng = SmallRng::seed_from_u64(seed);
        let seeded = grid.seed(region, config.fill.density, &mut rng);
        log::info!(
            "Hourglass {width}x{height}: {open} open cells, {seeded} grains seeded in {region}"
        );

        Ok(Self::from_parts(grid, config.palette.clone(), rng))
    }

    /// Wrap an already populated grid, default palette.
    #[must_use]
    pub fn from_grid(grid: Grid, seed: u64) -> Self {
        Self::from_parts(grid, Palette::default(), SmallRng::seed_from_u64(seed))
    }

    fn from_parts(grid: Grid, palette: Palette, rng: SmallRng) -> Self {
        let pixels = vec![0; grid.width * grid.height * 4];
        Self {
            grid,
            palette,
            rng,
            pixels,
            frames: 0,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.grid.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.grid.height
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn grain_count(&self) -> usize {
        self.grid.grain_count()
    }

    /// Updates run so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Advance one step. Returns whether any grain moved.
    ///
    /// Rows are scanned starting at the gravity target and moving away from
    /// it, so a grain that lands in an already scanned row is not moved again
    /// this pass. Each row picks its column direction with a coin flip.
    pub fn update(&mut self, orientation: Orientation) -> bool {
        let gravity = orientation.gravity();
        let w = self.grid.width as i32;
        let h = self.grid.height as i32;
        let mut moved = false;

        for k in 0..h {
            let y = if gravity > 0 { h - 1 - k } else { k };
            let left_to_right = self.rng.gen_bool(0.5);
            for j in 0..w {
                let x = if left_to_right { j } else { w - 1 - j };
                let i = y as usize * self.grid.width + x as usize;
                if !self.grid.occupancy()[i] {
                    continue;
                }
                let mut api = GrainApi::new(&mut self.grid, x, y, gravity);
                moved |= update_grain(&mut api, &mut self.rng);
            }
        }

        debug_assert!(self.grid.is_consistent(), "grain inside a wall after update");
        self.frames += 1;
        moved
    }

    /// Paint the grid into the RGBA buffer and return it.
    ///
    /// One pixel per cell; grains get their index colour, everything else is
    /// transparent. Scaling up (nearest-neighbour) is left to the surface.
    pub fn render(&mut self) -> &[u8] {
        let occupancy = self.grid.occupancy();
        for (i, (px, &grain)) in self.pixels.chunks_exact_mut(4).zip(occupancy).enumerate() {
            let rgba = if grain {
                self.palette.color_for_index(i)
            } else {
                [0, 0, 0, 0]
            };
            px.copy_from_slice(&rgba);
        }
        &self.pixels
    }

    /// Last rendered frame.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}
