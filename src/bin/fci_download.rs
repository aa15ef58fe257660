//! Download FCI products from the EUMETSAT Data Store.
//!
//! Usage: `fci_download [config.json]`; without a config file the built-in
//! N Germany reference case is downloaded. Credentials come from the
//! EUMDAC_KEY and EUMDAC_SECRET environment variables.

use anyhow::Result;
use fcitools::config::{load_config, DownloadConfig};
use fcitools::core::{download_collection, FdssGrid};
use fcitools::io::{Credentials, DataStore};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config::<DownloadConfig>(Path::new(&path))?,
        None => DownloadConfig::default(),
    };

    let credentials = Credentials::from_env()?;
    let datastore = DataStore::new(&credentials)?;
    let grid = FdssGrid::fdss_1km();

    for collection_id in &config.collections {
        let collection = datastore.collection(collection_id)?;
        let summary = download_collection(
            &collection,
            &grid,
            &config.start_time,
            &config.end_time,
            config.lonlat_bbox.as_ref(),
            &config.output_folder,
            &config.run_name,
            config.n_parallel_downloads,
        )?;

        if let Some(summary) = summary {
            log::info!(
                "Collection {}: {} files downloaded, {} failed",
                collection_id,
                summary.completed.len(),
                summary.failed.len()
            );
        }
    }
    Ok(())
}
