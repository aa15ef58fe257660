use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

/// Real-valued single-channel image data (rows x columns)
pub type FciRealImage = Array2<f32>;

/// RGB composite image data (rows x columns x 3)
pub type FciRgbImage = Array3<f32>;

/// 1-based index of one of the 40 horizontal strips of a full-disc scan
pub type ChunkIndex = usize;

/// Geographic bounding box in degrees (west < east, south < north).
///
/// The ordering invariant is not enforced; a flipped box still produces a
/// chunk range via the corner min/max, it is just semantically wrong.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self { west, south, east, north }
    }

    /// The four (lon, lat) corners: SW, NW, SE, NE.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.west, self.south),
            (self.west, self.north),
            (self.east, self.south),
            (self.east, self.north),
        ]
    }
}

/// FCI processing level of an archive collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingLevel {
    /// Calibrated imagery on the fixed grid, split into 40 chunks
    Level1c,
    /// Derived geophysical products, not chunked on the fixed grid
    Level2,
}

impl ProcessingLevel {
    /// Derive the level from an archive product type string (eg "FCIL2CLM").
    pub fn from_product_type(product_type: &str) -> Self {
        if product_type.contains("L2") {
            ProcessingLevel::Level2
        } else {
            ProcessingLevel::Level1c
        }
    }

    pub fn is_level2(&self) -> bool {
        matches!(self, ProcessingLevel::Level2)
    }
}

impl std::fmt::Display for ProcessingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingLevel::Level1c => write!(f, "L1c"),
            ProcessingLevel::Level2 => write!(f, "L2"),
        }
    }
}

/// Error types for FCI tooling
#[derive(Debug, thiserror::Error)]
pub enum FciError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Time parsing error: {0}")]
    TimeParse(#[from] chrono::ParseError),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Geolocation error: {0}")]
    Geolocation(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for FCI operations
pub type FciResult<T> = Result<T, FciError>;
