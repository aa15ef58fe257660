use chrono::NaiveDateTime;
use fcitools::core::{build_download_tasks, download_collection, FdssGrid, Downloader};
use fcitools::io::{Collection, RemoteProduct};
use fcitools::types::{FciError, FciResult};
use fcitools::BoundingBox;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// In-memory archive product; entries named in `failing` refuse to open.
struct FakeProduct {
    id: String,
    entries: Vec<String>,
    failing: Vec<String>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl FakeProduct {
    fn new(id: &str, entries: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            entries: entries.iter().map(|e| e.to_string()).collect(),
            failing: Vec::new(),
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl RemoteProduct for FakeProduct {
    fn id(&self) -> &str {
        &self.id
    }

    fn entries(&self) -> &[String] {
        &self.entries
    }

    fn open_entry(&self, entry: &str) -> FciResult<Box<dyn Read + Send>> {
        self.opened.lock().unwrap().push(entry.to_string());
        if self.failing.iter().any(|f| f == entry) {
            return Err(FciError::Archive(format!(
                "entry '{}' of {} is not accessible",
                entry, self.id
            )));
        }
        let content = format!("payload of {}", entry);
        Ok(Box::new(std::io::Cursor::new(content.into_bytes())))
    }
}

/// Search returns a fixed product list regardless of the window; the queried
/// window is recorded for assertions.
struct FakeCollection {
    id: String,
    product_type: String,
    products: Vec<Arc<dyn RemoteProduct>>,
    queried: Arc<Mutex<Vec<(NaiveDateTime, NaiveDateTime)>>>,
}

impl Collection for FakeCollection {
    fn id(&self) -> &str {
        &self.id
    }

    fn product_type(&self) -> &str {
        &self.product_type
    }

    fn search(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> FciResult<Vec<Arc<dyn RemoteProduct>>> {
        self.queried.lock().unwrap().push((start, end));
        Ok(self.products.clone())
    }
}

fn chunk_entry(rc: u32, chunk: usize) -> String {
    format!("FCI-1C-RRAD-FDHSI-FD--CHK-BODY---NC4E_C_EUMT_{:04}_{:04}.nc", rc, chunk)
}

#[test]
fn test_failing_task_does_not_abort_the_pool() {
    let out = TempDir::new().unwrap();

    let mut product = FakeProduct::new("p1", &[]);
    product.entries = vec!["a.nc".to_string(), "b.nc".to_string(), "c.nc".to_string()];
    product.failing = vec!["b.nc".to_string()];
    let products: Vec<Arc<dyn RemoteProduct>> = vec![Arc::new(product)];

    let tasks = build_download_tasks(&products, None, out.path()).unwrap();
    let summary = Downloader::default().run(tasks).unwrap();

    assert_eq!(summary.completed.len(), 2);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "b.nc");
    assert!(out.path().join("a.nc").exists());
    assert!(!out.path().join("b.nc").exists());
    assert!(out.path().join("c.nc").exists());

    let content = std::fs::read_to_string(out.path().join("a.nc")).unwrap();
    assert_eq!(content, "payload of a.nc");
}

#[test]
fn test_tasks_run_oldest_product_first() {
    // products arrive newest first; a single worker must fetch them reversed
    let out = TempDir::new().unwrap();
    let opened = Arc::new(Mutex::new(Vec::new()));

    let mut newest = FakeProduct::new("newest", &["new_1.nc", "new_2.nc"]);
    newest.opened = opened.clone();
    let mut oldest = FakeProduct::new("oldest", &["old_1.nc", "old_2.nc"]);
    oldest.opened = opened.clone();
    let products: Vec<Arc<dyn RemoteProduct>> = vec![Arc::new(newest), Arc::new(oldest)];

    let tasks = build_download_tasks(&products, None, out.path()).unwrap();
    Downloader::new(1).run(tasks).unwrap();

    let order = opened.lock().unwrap().clone();
    assert_eq!(order, vec!["old_2.nc", "old_1.nc", "new_2.nc", "new_1.nc"]);
}

#[test]
fn test_level1_collection_downloads_only_roi_chunks() {
    let out = TempDir::new().unwrap();
    let entries: Vec<String> = (1..=40).map(|c| chunk_entry(40, c)).collect();
    let entry_refs: Vec<&str> = entries.iter().map(|s| s.as_str()).collect();

    let collection = FakeCollection {
        id: "EO:EUM:DAT:0662".to_string(),
        product_type: "MTGFCIL1FD".to_string(),
        products: vec![Arc::new(FakeProduct::new("rc40", &entry_refs))],
        queried: Arc::new(Mutex::new(Vec::new())),
    };

    let grid = FdssGrid::fdss_1km();
    let bbox = BoundingBox::new(6.0, 50.0, 12.0, 55.0);
    let summary = download_collection(
        &collection,
        &grid,
        "2025-06-19T06:30:00",
        "2025-06-19T06:50:00",
        Some(&bbox),
        out.path(),
        "fci",
        2,
    )
    .unwrap()
    .expect("products were found");

    assert_eq!(summary.failed.len(), 0);
    assert_eq!(summary.completed.len(), 2);

    let dest = out.path().join("fci").join("fci_l1c_input_data");
    assert!(dest.join(chunk_entry(40, 37)).exists());
    assert!(dest.join(chunk_entry(40, 38)).exists());
    assert!(!dest.join(chunk_entry(40, 36)).exists());

    // L1 window is used as-is
    let windows = collection.queried.lock().unwrap().clone();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].0.to_string(), "2025-06-19 06:30:00");
    assert_eq!(windows[0].1.to_string(), "2025-06-19 06:50:00");
}

#[test]
fn test_level2_collection_takes_every_entry_and_narrows_window() {
    let out = TempDir::new().unwrap();
    let collection = FakeCollection {
        id: "EO:EUM:DAT:0678".to_string(),
        product_type: "FCIL2CLM".to_string(),
        products: vec![Arc::new(FakeProduct::new(
            "clm",
            &["clm_full_disc.nc", "clm_aux.nc"],
        ))],
        queried: Arc::new(Mutex::new(Vec::new())),
    };

    let grid = FdssGrid::fdss_1km();
    let summary = download_collection(
        &collection,
        &grid,
        "2025-06-19T06:30:00",
        "2025-06-19T06:50:00",
        None,
        out.path(),
        "fci",
        2,
    )
    .unwrap()
    .expect("products were found");

    // no chunk filtering on L2
    assert_eq!(summary.completed.len(), 2);

    // window narrowed by one second on each side
    let windows = collection.queried.lock().unwrap().clone();
    assert_eq!(windows[0].0.to_string(), "2025-06-19 06:30:01");
    assert_eq!(windows[0].1.to_string(), "2025-06-19 06:49:59");
}

#[test]
fn test_zero_products_returns_none_without_touching_disk() {
    let out = TempDir::new().unwrap();
    let collection = FakeCollection {
        id: "EO:EUM:DAT:0662".to_string(),
        product_type: "MTGFCIL1FD".to_string(),
        products: Vec::new(),
        queried: Arc::new(Mutex::new(Vec::new())),
    };

    let grid = FdssGrid::fdss_1km();
    let result = download_collection(
        &collection,
        &grid,
        "2025-06-19T06:30:00",
        "2025-06-19T06:50:00",
        None,
        out.path(),
        "fci",
        4,
    )
    .unwrap();

    assert!(result.is_none());
    assert!(!out.path().join("fci").exists());
}

#[test]
fn test_bad_time_string_is_an_error() {
    let collection = FakeCollection {
        id: "EO:EUM:DAT:0662".to_string(),
        product_type: "MTGFCIL1FD".to_string(),
        products: Vec::new(),
        queried: Arc::new(Mutex::new(Vec::new())),
    };
    let grid = FdssGrid::fdss_1km();
    let result = download_collection(
        &collection,
        &grid,
        "19.06.2025 06:30",
        "2025-06-19T06:50:00",
        None,
        Path::new("/tmp"),
        "fci",
        4,
    );
    assert!(matches!(result, Err(FciError::TimeParse(_))));
}
