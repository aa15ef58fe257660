use crate::config::AnimationConfig;
use crate::core::chunks::chunks_for_bbox;
use crate::core::grid::FixedGrid;
use crate::types::{ChunkIndex, FciError, FciRealImage, FciResult, FciRgbImage};
use chrono::NaiveDateTime;
use image::{GrayImage, RgbImage};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Pixel data of one composited frame
pub enum FrameData {
    /// Single channel in physical units (radiance or brightness temperature)
    Gray(FciRealImage),
    /// Enhanced RGB composite, values in [0, 1]
    Rgb(FciRgbImage),
}

/// One composited, cropped repeat-cycle frame
pub struct CompositeScene {
    pub data: FrameData,
    /// Scene end time, when the compositor knows it
    pub end_time: Option<NaiveDateTime>,
}

/// Scene compositor seam: stitches the chunk files of one repeat cycle into a
/// composite of the requested channel, resampled to a common resolution and
/// cropped to the region of interest. Geolocation, resampling and enhancement
/// all live behind this interface.
pub trait SceneCompositor {
    fn composite(
        &self,
        files: &[PathBuf],
        channel: &str,
        crop: Option<&crate::types::BoundingBox>,
    ) -> FciResult<CompositeScene>;
}

/// Fixed display range for a channel, by name substring: reflective channels
/// (vis/nir) in percent, thermal channels (ir/wv) in Kelvin, everything else
/// autoscaled. Matched before `ir` so that `nir_13` lands in the reflective
/// branch.
pub fn value_range(channel_name: &str) -> Option<(f32, f32)> {
    if channel_name.contains("vis") || channel_name.contains("nir") {
        Some((0.0, 40.0))
    } else if channel_name.contains("ir") || channel_name.contains("wv") {
        Some((260.0, 300.0))
    } else {
        None
    }
}

/// Locate the local chunk files of one repeat cycle.
///
/// Filenames embed the zero-padded 4-digit repeat cycle and 4-digit chunk
/// number; one glob per requested chunk keeps the scan restricted to the ROI.
pub fn find_cycle_files(
    data_dir: &Path,
    repeat_cycle: u32,
    chunks: &[ChunkIndex],
) -> FciResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for chunk in chunks {
        let pattern = format!(
            "{}/*BODY---*_{:04}_{:04}*nc",
            data_dir.display(),
            repeat_cycle,
            chunk
        );
        log::debug!("Globbing {}", pattern);
        for path in glob::glob(&pattern)? {
            files.push(path.map_err(|e| FciError::Io(e.into_error()))?);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Repeat cycles present in the downloaded data, sorted and deduplicated.
///
/// Cycle and chunk numbers sit in the last two underscore-separated fields of
/// a chunk body filename.
pub fn available_repeat_cycles(data_dir: &Path) -> FciResult<Vec<u32>> {
    let field_re = regex::Regex::new(r"_(\d{4})_(\d{4})\.nc$")
        .map_err(|e| FciError::InvalidFormat(e.to_string()))?;

    let pattern = format!("{}/*BODY---*nc", data_dir.display());
    let mut cycles = Vec::new();
    for path in glob::glob(&pattern)? {
        let path = path.map_err(|e| FciError::Io(e.into_error()))?;
        let name = path.file_name().map(|n| n.to_string_lossy().to_string());
        if let Some(name) = name {
            if let Some(caps) = field_re.captures(&name) {
                if let Ok(rc) = caps[1].parse::<u32>() {
                    cycles.push(rc);
                }
            }
        }
    }
    cycles.sort_unstable();
    cycles.dedup();
    Ok(cycles)
}

/// Render one frame per repeat cycle and optionally encode the sequence.
///
/// Each frame is computed independently: chunk files are located, handed to
/// the compositor, scaled to 8 bit with the channel's display range, and
/// written as `frame_NNNN.png`. An empty `repeat_cycles` list renders every
/// cycle present in the data.
pub fn render_frames(
    config: &AnimationConfig,
    grid: &dyn FixedGrid,
    compositor: &dyn SceneCompositor,
) -> FciResult<Vec<PathBuf>> {
    let chunks = chunks_for_bbox(grid, Some(&config.bbox))?;
    let range = value_range(&config.channel);
    std::fs::create_dir_all(&config.frame_dir)?;

    let repeat_cycles = if config.repeat_cycles.is_empty() {
        available_repeat_cycles(&config.data_dir)?
    } else {
        config.repeat_cycles.clone()
    };
    let mut frames = Vec::with_capacity(repeat_cycles.len());

    for &rc in &repeat_cycles {
        let files = find_cycle_files(&config.data_dir, rc, &chunks)?;
        if files.is_empty() {
            return Err(FciError::Processing(format!(
                "no chunk files for repeat cycle {} in {}",
                rc,
                config.data_dir.display()
            )));
        }
        log::info!("Repeat cycle {}: compositing {} chunk files", rc, files.len());

        let scene = compositor.composite(&files, &config.channel, Some(&config.bbox))?;
        if let Some(end_time) = scene.end_time {
            log::info!("Scene end time: {}", end_time);
        }

        let frame_path = config.frame_dir.join(format!("frame_{:04}.png", rc));
        write_frame(&frame_path, &scene, range)?;
        log::info!("fig {:04} done", rc);
        frames.push(frame_path);
    }

    if config.make_video {
        encode_video(&config.frame_dir, &config.video_output)?;
    }
    Ok(frames)
}

/// Scale a frame to 8 bit and write it as PNG.
///
/// Grayscale data is stretched over the display range (or its own min/max
/// when autoscaled); RGB composites arrive enhanced in [0, 1]. NaN pixels map
/// to black.
pub fn write_frame(
    path: &Path,
    scene: &CompositeScene,
    range: Option<(f32, f32)>,
) -> FciResult<()> {
    match &scene.data {
        FrameData::Gray(values) => {
            let (vmin, vmax) = match range {
                Some(range) => range,
                None => autoscale_range(values),
            };
            let span = (vmax - vmin).max(f32::EPSILON);
            let (rows, cols) = values.dim();
            let img = GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
                let v = values[(y as usize, x as usize)];
                if v.is_nan() {
                    image::Luma([0])
                } else {
                    let scaled = ((v - vmin) / span).clamp(0.0, 1.0);
                    image::Luma([(scaled * 255.0) as u8])
                }
            });
            img.save(path)?;
        }
        FrameData::Rgb(values) => {
            let (rows, cols, bands) = values.dim();
            if bands != 3 {
                return Err(FciError::InvalidFormat(format!(
                    "RGB frame carries {} bands",
                    bands
                )));
            }
            let img = RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
                let mut px = [0u8; 3];
                for (b, out) in px.iter_mut().enumerate() {
                    let v = values[(y as usize, x as usize, b)];
                    if !v.is_nan() {
                        *out = (v.clamp(0.0, 1.0) * 255.0) as u8;
                    }
                }
                image::Rgb(px)
            });
            img.save(path)?;
        }
    }
    Ok(())
}

fn autoscale_range(values: &FciRealImage) -> (f32, f32) {
    let mut vmin = f32::INFINITY;
    let mut vmax = f32::NEG_INFINITY;
    for &v in values.iter() {
        if v.is_nan() {
            continue;
        }
        vmin = vmin.min(v);
        vmax = vmax.max(v);
    }
    if vmin > vmax {
        (0.0, 1.0)
    } else {
        (vmin, vmax)
    }
}

/// Encode the PNG sequence in `frame_dir` into an H.264 video with ffmpeg
/// (fixed framerate 10, scaled to 1080 rows).
pub fn encode_video(frame_dir: &Path, output: &Path) -> FciResult<()> {
    let pattern = format!("{}/*.png", frame_dir.display());
    log::info!("Encoding {} into {}", pattern, output.display());

    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-framerate", "10"])
        .args(["-pattern_type", "glob", "-i", &pattern])
        .args(["-b:v", "10000k", "-vcodec", "libx264"])
        .args(["-vf", "scale=-2:1080", "-pix_fmt", "yuv420p"])
        .arg(output)
        .arg("-y")
        .status()?;

    if !status.success() {
        return Err(FciError::Processing(format!(
            "ffmpeg exited with {}",
            status
        )));
    }
    Ok(())
}

/// Compositor that delegates to an external helper command (typically a thin
/// satpy wrapper), mirroring how video encoding delegates to ffmpeg.
///
/// The helper is invoked as
/// `<cmd> <channel> <west> <south> <east> <north> <out.png> <files...>`
/// and must write the composited, cropped, enhanced scene as PNG; the PNG is
/// read back as an RGB frame.
pub struct ExternalCompositor {
    command: PathBuf,
}

impl ExternalCompositor {
    pub fn new(command: PathBuf) -> Self {
        Self { command }
    }
}

impl SceneCompositor for ExternalCompositor {
    fn composite(
        &self,
        files: &[PathBuf],
        channel: &str,
        crop: Option<&crate::types::BoundingBox>,
    ) -> FciResult<CompositeScene> {
        static SCRATCH_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
        let out_png = std::env::temp_dir().join(format!(
            "fci_composite_{}_{}.png",
            std::process::id(),
            SCRATCH_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
        ));

        let mut cmd = Command::new(&self.command);
        cmd.arg(channel);
        match crop {
            Some(bbox) => {
                cmd.args([
                    bbox.west.to_string(),
                    bbox.south.to_string(),
                    bbox.east.to_string(),
                    bbox.north.to_string(),
                ]);
            }
            None => {
                cmd.args(["-", "-", "-", "-"]);
            }
        }
        cmd.arg(&out_png);
        cmd.args(files);

        let status = cmd.status()?;
        if !status.success() {
            return Err(FciError::Processing(format!(
                "compositor command {} exited with {}",
                self.command.display(),
                status
            )));
        }

        let rgb = image::open(&out_png)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        let mut data = FciRgbImage::zeros((height as usize, width as usize, 3));
        for (x, y, px) in rgb.enumerate_pixels() {
            for b in 0..3 {
                data[(y as usize, x as usize, b)] = px.0[b] as f32 / 255.0;
            }
        }
        let _ = std::fs::remove_file(&out_png);

        Ok(CompositeScene { data: FrameData::Rgb(data), end_time: None })
    }
}
