//! Grain colours, picked from a cheap hash of the cell index.

use serde::{Deserialize, Serialize};

const HASH_MULTIPLIER: u64 = 1_234_567;

/// Grains whose index noise (0..100) is below `below` get `rgb`, brightened
/// per channel by `noise % jitter` when `jitter > 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteBand {
    pub below: u8,
    pub rgb: [u8; 3],
    #[serde(default)]
    pub jitter: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub bands: Vec<PaletteBand>,
}

impl Default for Palette {
    /// Gold accent, warm terracotta, darker grain.
    fn default() -> Self {
        Self {
            bands: vec![
                PaletteBand { below: 30, rgb: [212, 175, 55], jitter: 0 },
                PaletteBand { below: 80, rgb: [199, 125, 99], jitter: 10 },
                PaletteBand { below: 100, rgb: [141, 110, 99], jitter: 0 },
            ],
        }
    }
}

/// Index noise in `0..100`.
#[must_use]
pub fn noise(index: usize) -> u8 {
    ((index as u64).wrapping_mul(HASH_MULTIPLIER) % 100) as u8
}

impl Palette {
    /// RGBA for a grain at linear `index`. Falls back to the last band when
    /// no threshold matches; transparent only for an empty palette.
    #[must_use]
    pub fn color_for_index(&self, index: usize) -> [u8; 4] {
        let n = noise(index);
        let Some(band) = self
            .bands
            .iter()
            .find(|b| n < b.below)
            .or_else(|| self.bands.last())
        else {
            return [0, 0, 0, 0];
        };
        let lift = if band.jitter > 0 { n % band.jitter } else { 0 };
        [
            band.rgb[0].saturating_add(lift),
            band.rgb[1].saturating_add(lift),
            band.rgb[2].saturating_add(lift),
            255,
        ]
    }
}
