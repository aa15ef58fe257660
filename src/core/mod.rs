//! Core FCI tooling: chunk geometry, download orchestration, frame rendering

pub mod chunks;
pub mod download;
pub mod grid;
pub mod render;

// Re-export main types
pub use chunks::{chunk_for_point, chunks_for_bbox, CHUNK_END_ROWS, N_CHUNKS};
pub use download::{
    build_download_tasks, download_collection, filter_chunks, find_products, DownloadSummary,
    DownloadTask, Downloader, N_PARALLEL_DOWNLOADS,
};
pub use grid::{FdssGrid, FixedGrid};
pub use render::{
    available_repeat_cycles, encode_video, find_cycle_files, render_frames, value_range,
    CompositeScene, ExternalCompositor, FrameData, SceneCompositor,
};
