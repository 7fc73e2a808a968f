//! Error types. Nothing here is fatal to the page: the widget logs and stops.

/// Silhouette path parsing errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("unsupported path command '{0}'")]
    UnknownCommand(char),
    #[error("expected a number after '{command}'")]
    MissingNumber { command: char },
    #[error("malformed number '{0}'")]
    BadNumber(String),
    #[error("'{0}' before any moveto")]
    NoCurrentPoint(char),
    #[error("number {0} without a command")]
    StrayNumber(f64),
}

/// Construction-time configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("grid size {width}x{height} has a zero dimension")]
    ZeroSize { width: usize, height: usize },
    #[error("grid size {width}x{height} exceeds {max} cells", max = crate::config::MAX_CELLS)]
    GridTooLarge { width: usize, height: usize },
    #[error("fill density {0} is outside [0, 1]")]
    DensityOutOfRange(f64),
    #[error("fill region {region} does not fit a {width}x{height} grid")]
    FillRegionOutOfBounds {
        region: String,
        width: usize,
        height: usize,
    },
    #[error("fill region {0} contains no open cell inside the silhouette")]
    FillRegionClosed(String),
    #[error("palette has no colour bands")]
    EmptyPalette,
    #[error("silhouette path: {0}")]
    Path(#[from] PathError),
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Load(Box::new(e))
    }
}

/// Rejected grain placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlaceError {
    #[error("({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },
    #[error("({x}, {y}) is a wall cell")]
    Wall { x: i32, y: i32 },
}
