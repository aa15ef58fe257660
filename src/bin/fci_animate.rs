//! Render downloaded FCI repeat cycles into PNG frames and encode a video.
//!
//! Usage: `fci_animate [config.json]`. The config must name a compositor
//! helper command (`compositor_cmd`) that stitches and enhances one repeat
//! cycle; scene composition itself is delegated to external imaging tooling.

use anyhow::Result;
use fcitools::config::{load_config, AnimationConfig};
use fcitools::core::{render_frames, ExternalCompositor, FdssGrid};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config::<AnimationConfig>(Path::new(&path))?,
        None => AnimationConfig::default(),
    };

    let compositor_cmd = config
        .compositor_cmd
        .clone()
        .ok_or_else(|| anyhow::anyhow!("config sets no compositor_cmd"))?;
    let compositor = ExternalCompositor::new(compositor_cmd);

    let grid = FdssGrid::fdss_1km();
    let frames = render_frames(&config, &grid, &compositor)?;
    log::info!("Rendered {} frames", frames.len());
    Ok(())
}
