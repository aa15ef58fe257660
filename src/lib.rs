//! fcitools: locate, download and animate MTG FCI imagery
//!
//! Three concerns around the Flexible Combined Imager Level 1c/2 archive:
//! mapping geographic regions to the fixed-grid chunks that cover them,
//! fetching matching products from the EUMETSAT Data Store in parallel, and
//! rendering downloaded repeat cycles into a PNG frame sequence for
//! animation.

pub mod config;
pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use config::{AnimationConfig, DownloadConfig};
pub use core::{chunks_for_bbox, download_collection, render_frames, FdssGrid, FixedGrid};
pub use io::{Collection, Credentials, DataStore, RemoteProduct};
pub use types::{BoundingBox, ChunkIndex, FciError, FciResult, ProcessingLevel};
