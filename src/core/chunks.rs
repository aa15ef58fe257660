use crate::core::grid::FixedGrid;
use crate::types::{BoundingBox, ChunkIndex, FciError, FciResult};

/// Number of chunks one full-disc repeat cycle is split into
pub const N_CHUNKS: usize = 40;

/// Last scan row covered by each chunk, counted from the southern edge of the
/// disc in scan order. Chunk k (1-based) ends at `CHUNK_END_ROWS[k - 1]`; the
/// last entry equals the grid height of the 1 km full-disc grid.
///
/// The rows are not perfectly equidistant: the instrument widens some swaths
/// around the disc centre.
pub const CHUNK_END_ROWS: [usize; N_CHUNKS] = [
    278, 556, 835, 1113, 1392, 1670, 1948, 2227, 2505, 2784, 3062, 3340, 3619, 3897, 4176, 4454,
    4732, 5011, 5289, 5568, 5846, 6124, 6403, 6681, 6960, 7258, 7556, 7856, 8133, 8391, 8649,
    8908, 9187, 9465, 9744, 10022, 10300, 10579, 10857, 11136,
];

/// 1-based index of the first threshold >= `value`, or None when `value`
/// exceeds every threshold.
fn first_index_bigger_than(value: usize, sorted: &[usize]) -> Option<usize> {
    sorted.iter().position(|&item| item >= value).map(|i| i + 1)
}

/// Chunk covering the given geographic point.
///
/// The grid row (0 at the north edge) is inverted to scan order before the
/// threshold lookup, since `CHUNK_END_ROWS` counts rows from the south.
pub fn chunk_for_point(grid: &dyn FixedGrid, lon: f64, lat: f64) -> FciResult<ChunkIndex> {
    let (_, row) = grid.array_indices_from_lonlat(lon, lat)?;
    let scan_row = grid.height() - row;
    first_index_bigger_than(scan_row, &CHUNK_END_ROWS).ok_or_else(|| {
        FciError::Geolocation(format!(
            "scan row {} of point ({:.3}, {:.3}) exceeds the last chunk boundary",
            scan_row, lon, lat
        ))
    })
}

/// Contiguous, gap-free chunk range covering a bounding box.
///
/// `None` selects the full disc, `[1..=40]`. Otherwise the four box corners
/// are located and the inclusive min/max of their chunks is returned. This is
/// a deliberate approximation: for this scan-row grid the true coverage of a
/// box is the range spanned by its corners.
pub fn chunks_for_bbox(
    grid: &dyn FixedGrid,
    lonlat_bbox: Option<&BoundingBox>,
) -> FciResult<Vec<ChunkIndex>> {
    let bbox = match lonlat_bbox {
        None => {
            log::info!("Retrieving all chunks for full disc");
            return Ok((1..=N_CHUNKS).collect());
        }
        Some(bbox) => bbox,
    };

    let mut corner_chunks = Vec::with_capacity(4);
    for (lon, lat) in bbox.corners() {
        corner_chunks.push(chunk_for_point(grid, lon, lat)?);
    }

    let lo = *corner_chunks.iter().min().unwrap();
    let hi = *corner_chunks.iter().max().unwrap();
    let chunks: Vec<ChunkIndex> = (lo..=hi).collect();
    log::info!("The chunks for area {:?} are {:?}", bbox, chunks);
    Ok(chunks)
}
