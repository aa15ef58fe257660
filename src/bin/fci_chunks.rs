//! Print the chunk range covering a geographic bounding box.
//!
//! Usage: `fci_chunks [west south east north]`; without arguments the
//! reference box over the Black Sea coast is used.

use anyhow::{Context, Result};
use fcitools::core::{chunks_for_bbox, FdssGrid};
use fcitools::BoundingBox;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let bbox = if args.is_empty() {
        BoundingBox::new(26.5, 41.7, 27.3, 42.3)
    } else if args.len() == 4 {
        let mut v = [0.0f64; 4];
        for (slot, arg) in v.iter_mut().zip(&args) {
            *slot = arg.parse().with_context(|| format!("not a number: '{}'", arg))?;
        }
        BoundingBox::new(v[0], v[1], v[2], v[3])
    } else {
        anyhow::bail!("expected no arguments or: west south east north");
    };

    let grid = FdssGrid::fdss_1km();
    let chunks = chunks_for_bbox(&grid, Some(&bbox))?;
    println!(
        "The chunks for area [{}, {}, {}, {}] are {:?}",
        bbox.west, bbox.south, bbox.east, bbox.north, chunks
    );
    Ok(())
}
