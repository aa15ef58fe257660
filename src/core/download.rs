use crate::core::chunks::chunks_for_bbox;
use crate::core::grid::FixedGrid;
use crate::io::archive::{parse_time, Collection, RemoteProduct};
use crate::types::{BoundingBox, ChunkIndex, FciError, FciResult};
use chrono::{Duration, NaiveDateTime};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default worker pool size
pub const N_PARALLEL_DOWNLOADS: usize = 4;

/// Subdirectory of `<output_root>/<run_name>/` that receives the files
pub const INPUT_SUBDIR: &str = "fci_l1c_input_data";

/// One file to fetch: remote product handle, entry name, destination folder.
/// Consumed exactly once by a download worker.
pub struct DownloadTask {
    pub product: Arc<dyn RemoteProduct>,
    pub entry: String,
    pub output_folder: PathBuf,
}

/// Outcome of one downloader run. Per-task failures never abort the batch,
/// they are collected here instead.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    /// Paths of files written
    pub completed: Vec<PathBuf>,
    /// (entry name, error description) per failed task
    pub failed: Vec<(String, String)>,
}

/// Narrow a Level 2 query window by one second on each side; derived products
/// carry coverage times that make boundary matches over-inclusive. Level 1
/// windows are used as-is.
pub fn narrowed_window(
    is_level2: bool,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> (NaiveDateTime, NaiveDateTime) {
    if is_level2 {
        (start + Duration::seconds(1), end - Duration::seconds(1))
    } else {
        (start, end)
    }
}

/// Query a collection for products in the given time range (fixed
/// "YYYY-MM-DDTHH:MM:SS" strings), applying the Level 2 window narrowing.
pub fn find_products(
    collection: &dyn Collection,
    start_time: &str,
    end_time: &str,
) -> FciResult<Vec<Arc<dyn RemoteProduct>>> {
    let start = parse_time(start_time)?;
    let end = parse_time(end_time)?;
    let (start, end) = narrowed_window(collection.level().is_level2(), start, end);
    collection.search(start, end)
}

/// Keep only the entries whose embedded 4-digit chunk number is in
/// `chunks_list`. Entry names follow `..._<rc:4>_<chunk:4>.nc`; one glob-style
/// pattern per chunk of the form `*_????_00<chunk:2>.nc` is matched against
/// every entry.
pub fn filter_chunks(chunks_list: &[ChunkIndex], entries: &[String]) -> FciResult<Vec<String>> {
    let mut patterns = Vec::with_capacity(chunks_list.len());
    for chunk in chunks_list {
        patterns.push(glob::Pattern::new(&format!("*_????_00{:02}.nc", chunk))?);
    }

    let mut filtered = Vec::new();
    for entry in entries {
        if patterns.iter().any(|p| p.matches(entry)) {
            filtered.push(entry.clone());
        }
    }
    Ok(filtered)
}

/// Build one task per matching file of every product.
///
/// `chunks_list = None` selects every entry (Level 2 products are not gridded
/// into the chunk scheme); otherwise entries are chunk-filtered.
pub fn build_download_tasks(
    products: &[Arc<dyn RemoteProduct>],
    chunks_list: Option<&[ChunkIndex]>,
    output_folder: &Path,
) -> FciResult<Vec<DownloadTask>> {
    let mut tasks = Vec::new();
    for product in products {
        let entries = match chunks_list {
            Some(chunks) => filter_chunks(chunks, product.entries())?,
            None => product.entries().to_vec(),
        };
        for entry in entries {
            tasks.push(DownloadTask {
                product: product.clone(),
                entry,
                output_folder: output_folder.to_path_buf(),
            });
        }
    }
    Ok(tasks)
}

/// Stream one entry to `<output_folder>/<entry>`, creating parents as needed.
fn download_file(task: &DownloadTask) -> FciResult<PathBuf> {
    let dest = task.output_folder.join(&task.entry);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut src = task.product.open_entry(&task.entry)?;
    let mut dst = fs::File::create(&dest)?;
    std::io::copy(&mut src, &mut dst)?;

    log::info!("Download of file {} finished.", dest.display());
    Ok(dest)
}

/// Fixed-size worker pool over a task list. Blocks until every task has
/// completed or individually failed; there is no cancellation and no retry.
pub struct Downloader {
    pub n_workers: usize,
}

impl Default for Downloader {
    fn default() -> Self {
        Self { n_workers: N_PARALLEL_DOWNLOADS }
    }
}

impl Downloader {
    pub fn new(n_workers: usize) -> Self {
        Self { n_workers: n_workers.max(1) }
    }

    /// Run all tasks, oldest product first (input order is newest-first, so
    /// the list is reversed before dispatch). A failing task is logged and
    /// does not affect the others.
    pub fn run(&self, tasks: Vec<DownloadTask>) -> FciResult<DownloadSummary> {
        let tasks: Vec<DownloadTask> = tasks.into_iter().rev().collect();
        log::info!(
            "Dispatching {} download tasks on {} workers",
            tasks.len(),
            self.n_workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.n_workers)
            .build()
            .map_err(|e| FciError::Processing(format!("failed to build worker pool: {}", e)))?;

        let results: Vec<(String, FciResult<PathBuf>)> = pool.install(|| {
            tasks
                .par_iter()
                .map(|task| (task.entry.clone(), download_file(task)))
                .collect()
        });

        let mut summary = DownloadSummary::default();
        for (entry, result) in results {
            match result {
                Ok(path) => summary.completed.push(path),
                Err(error) => {
                    match &error {
                        FciError::Archive(_) => {
                            log::error!(
                                "Error related to the product while downloading '{}': {}",
                                entry,
                                error
                            );
                        }
                        FciError::Http(_) => {
                            log::error!(
                                "Error related to the connection while downloading '{}': {}",
                                entry,
                                error
                            );
                        }
                        _ => log::error!("Unexpected error while downloading '{}': {}", entry, error),
                    }
                    summary.failed.push((entry, error.to_string()));
                }
            }
        }
        Ok(summary)
    }
}

/// Full download run for one collection: search the time window, restrict
/// Level 1 products to the chunks covering the bounding box, fetch everything
/// into `<output_root>/<run_name>/fci_l1c_input_data/`.
///
/// Returns `None` when the query matched no products (logged as a warning,
/// not an error).
#[allow(clippy::too_many_arguments)]
pub fn download_collection(
    collection: &dyn Collection,
    grid: &dyn FixedGrid,
    start_time: &str,
    end_time: &str,
    lonlat_bbox: Option<&BoundingBox>,
    output_root: &Path,
    run_name: &str,
    n_parallel: usize,
) -> FciResult<Option<DownloadSummary>> {
    log::info!(
        "Downloading collection_id {} and time range {} to {}.",
        collection.id(),
        start_time,
        end_time
    );

    let products = find_products(collection, start_time, end_time)?;
    log::info!("Found products:");
    for product in &products {
        log::info!("  {}", product.id());
    }

    if products.is_empty() {
        log::warn!(
            "No products found for collection_id {} and time range {} to {}. Exiting.",
            collection.id(),
            start_time,
            end_time
        );
        return Ok(None);
    }

    let output_folder = output_root.join(run_name).join(INPUT_SUBDIR);
    fs::create_dir_all(&output_folder)?;

    let chunks_list = if collection.level().is_level2() {
        None
    } else {
        let chunks = chunks_for_bbox(grid, lonlat_bbox)?;
        log::info!("Will be retrieving chunks: {:?}", chunks);
        Some(chunks)
    };

    let tasks = build_download_tasks(&products, chunks_list.as_deref(), &output_folder)?;
    let summary = Downloader::new(n_parallel).run(tasks)?;
    Ok(Some(summary))
}
