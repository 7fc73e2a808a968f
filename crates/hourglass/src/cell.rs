//! What sits at one grid position.

use std::fmt;

/// Composed view of the wall and occupancy buffers at one index.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Cell {
    #[default]
    Empty = 0,
    Grain = 1,
    Wall = 2,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Grain => write!(f, "Grain"),
            Self::Wall => write!(f, "Wall"),
        }
    }
}

impl Cell {
    /// Single-character glyph used by grid dumps.
    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Grain => 'o',
            Self::Wall => '#',
        }
    }
}
