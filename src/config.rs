use crate::types::{BoundingBox, FciResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// FCI cloud mask (Level 2)
pub const COLLECTION_CLM: &str = "EO:EUM:DAT:0678";
/// FCI optimal cloud analysis (Level 2)
pub const COLLECTION_OCA: &str = "EO:EUM:DAT:0684";
/// FCI Level 1c normal resolution (FDHSI), operational dissemination
pub const COLLECTION_FDHSI: &str = "EO:EUM:DAT:0662";
/// FCI Level 1c high resolution (HRFI), operational dissemination
pub const COLLECTION_HRFI: &str = "EO:EUM:DAT:0665";

/// The N Germany case used as the built-in default scene
fn default_bbox() -> BoundingBox {
    BoundingBox::new(6.0, 50.0, 12.0, 55.0)
}

/// Parameters of one archive download run. Defaults reproduce the
/// N Germany reference case; data is available every 10 minutes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Collections to query, one run each
    pub collections: Vec<String>,
    /// Window start, "YYYY-MM-DDTHH:MM:SS"
    pub start_time: String,
    /// Window end, "YYYY-MM-DDTHH:MM:SS"
    pub end_time: String,
    /// Geographic search area; None retrieves the full disc
    pub lonlat_bbox: Option<BoundingBox>,
    pub output_folder: PathBuf,
    pub run_name: String,
    pub n_parallel_downloads: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            collections: vec![
                COLLECTION_CLM.to_string(),
                COLLECTION_OCA.to_string(),
                COLLECTION_FDHSI.to_string(),
                COLLECTION_HRFI.to_string(),
            ],
            start_time: "2025-06-19T06:30:00".to_string(),
            end_time: "2025-06-19T06:50:00".to_string(),
            lonlat_bbox: Some(default_bbox()),
            output_folder: PathBuf::from("data"),
            run_name: "fci".to_string(),
            n_parallel_downloads: crate::core::download::N_PARALLEL_DOWNLOADS,
        }
    }
}

/// Parameters of one animation run over downloaded Level 1c data.
///
/// `repeat_cycles` should exist in the data under `data_dir`; a daytime
/// animation from ~6Z to ~19Z covers roughly RC 30 to 120.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Folder holding the downloaded chunk files
    pub data_dir: PathBuf,
    /// Channel or RGB composite to visualize, eg "vis_06" or "true_color"
    pub channel: String,
    /// Region of interest; also restricts which chunk files are read
    pub bbox: BoundingBox,
    /// Repeat cycle numbers to render, one frame each; empty renders every
    /// cycle found in the data
    pub repeat_cycles: Vec<u32>,
    /// Folder receiving `frame_NNNN.png`
    pub frame_dir: PathBuf,
    /// Encode the frames into `video_output` after rendering
    pub make_video: bool,
    pub video_output: PathBuf,
    /// Compositor helper command (see `render::ExternalCompositor`)
    pub compositor_cmd: Option<PathBuf>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/fci/fci_l1c_input_data"),
            channel: "true_color".to_string(),
            bbox: default_bbox(),
            repeat_cycles: (37..40).collect(),
            frame_dir: PathBuf::from("."),
            make_video: true,
            video_output: PathBuf::from("test.mp4"),
            compositor_cmd: None,
        }
    }
}

/// Load a config structure from a JSON file.
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> FciResult<T> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| crate::types::FciError::InvalidFormat(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_defaults_match_reference_case() {
        let cfg = DownloadConfig::default();
        assert_eq!(cfg.collections.len(), 4);
        assert_eq!(cfg.n_parallel_downloads, 4);
        let bbox = cfg.lonlat_bbox.unwrap();
        assert_eq!((bbox.west, bbox.south, bbox.east, bbox.north), (6.0, 50.0, 12.0, 55.0));
    }

    #[test]
    fn test_partial_json_overrides_defaults() {
        let cfg: DownloadConfig = serde_json::from_str(
            r#"{"run_name": "storm_case", "lonlat_bbox": null}"#,
        )
        .unwrap();
        assert_eq!(cfg.run_name, "storm_case");
        assert!(cfg.lonlat_bbox.is_none());
        assert_eq!(cfg.start_time, "2025-06-19T06:30:00");
    }

    #[test]
    fn test_animation_defaults() {
        let cfg = AnimationConfig::default();
        assert_eq!(cfg.repeat_cycles, vec![37, 38, 39]);
        assert_eq!(cfg.channel, "true_color");
        assert!(cfg.make_video);
    }
}
