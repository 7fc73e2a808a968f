//! Simulator configuration
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults (the portfolio widget's hourglass)
//! 2. A TOML document handed over by the host page
//! 3. Environment variables (`HOURGLASS_SECTION__KEY`), native builds only

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid::Region;
use crate::palette::Palette;
use crate::silhouette::{Silhouette, HOURGLASS_PATH};

/// Largest grid accepted, in cells. 2048×2048 keeps the RGBA buffer at 16 MiB.
pub const MAX_CELLS: usize = 1 << 22;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HourglassConfig {
    /// Simulation resolution
    #[serde(default)]
    pub grid: GridConfig,
    /// Cavity outline
    #[serde(default)]
    pub silhouette: SilhouetteConfig,
    /// Initial pile
    #[serde(default)]
    pub fill: FillConfig,
    /// Grain colours
    #[serde(default)]
    pub palette: Palette,
}

impl HourglassConfig {
    /// Layer `toml` and the environment over the defaults, then validate.
    pub fn load(toml: Option<&str>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(src) = toml {
            figment = figment.merge(Toml::string(src));
        }
        // HOURGLASS_FILL__DENSITY=0.5 -> fill.density = 0.5
        figment = figment.merge(Env::prefixed("HOURGLASS_").split("__"));

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that do not need the rasterized mask.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = (self.grid.width, self.grid.height);
        if width == 0 || height == 0 {
            return Err(ConfigError::ZeroSize { width, height });
        }
        if !matches!(width.checked_mul(height), Some(cells) if cells <= MAX_CELLS) {
            return Err(ConfigError::GridTooLarge { width, height });
        }
        let density = self.fill.density;
        if !(0.0..=1.0).contains(&density) {
            return Err(ConfigError::DensityOutOfRange(density));
        }
        let region = self.fill_region();
        if !region.fits(width, height) {
            return Err(ConfigError::FillRegionOutOfBounds {
                region: region.to_string(),
                width,
                height,
            });
        }
        if self.palette.bands.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        self.silhouette()?;
        Ok(())
    }

    /// Outline scaled into grid units.
    pub fn silhouette(&self) -> Result<Silhouette, ConfigError> {
        let s = &self.silhouette;
        Ok(Silhouette::parse(&s.path)?.scaled(s.scale_x, s.scale_y))
    }

    #[must_use]
    pub fn fill_region(&self) -> Region {
        let [y0, y1] = self.fill.rows;
        let [x0, x1] = self.fill.columns.unwrap_or([0, self.grid.width]);
        Region::new(x0, y0, x1, y1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Cells across, independent of on-screen size
    pub width: usize,
    /// Cells down
    pub height: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 160,
            height: 320,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilhouetteConfig {
    /// Absolute SVG path data (`M L H V Q Z`)
    pub path: String,
    /// Path units to grid cells, horizontally
    pub scale_x: f64,
    /// Path units to grid cells, vertically
    pub scale_y: f64,
}

impl Default for SilhouetteConfig {
    /// The 100×200 view-box outline blown up to the 160×320 grid.
    fn default() -> Self {
        Self {
            path: HOURGLASS_PATH.to_string(),
            scale_x: 1.6,
            scale_y: 1.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillConfig {
    /// Half-open row range `[start, end)` seeded at construction
    pub rows: [usize; 2],
    /// Half-open column range, all columns when absent
    #[serde(default)]
    pub columns: Option<[usize; 2]>,
    /// Probability that an open cell in the region starts with a grain
    pub density: f64,
}

impl Default for FillConfig {
    /// Lower bulb, 90% full.
    fn default() -> Self {
        Self {
            rows: [180, 300],
            columns: None,
            density: 0.9,
        }
    }
}
